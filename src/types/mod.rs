//! Shared types for Lectern

mod error;

pub use error::{LecternError, Result};
