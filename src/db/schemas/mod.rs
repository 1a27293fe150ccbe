//! Database schemas for Lectern
//!
//! MongoDB document structures for accounts and posts.

mod account;
mod post;

pub use account::{AccountDoc, ACCOUNT_COLLECTION};
pub use post::{PostDoc, POST_COLLECTION};
