//! Persistence for Lectern
//!
//! Store traits plus their MongoDB and in-memory implementations.

pub mod memory;
pub mod mongo;
pub mod mongo_store;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use mongo_store::MongoStore;
pub use store::{
    last_page, Account, AccountStore, NewPost, Post, PostPage, PostPatch, PostQuery, PostStore,
};
