//! Lectern - blog backend with role-gated sessions
//!
//! Accounts register and log in with Argon2-hashed passwords and receive a
//! signed session token in a cookie. Posts are public to read; accounts and
//! post mutations are gated to the ADMIN role.
//!
//! ## Layers
//!
//! - **auth**: password hashing, JWT sessions, session guard and role gate
//! - **db**: account/post store traits with MongoDB and in-memory backends
//! - **routes**: JSON handlers for /register, /login, /logout, /posts, /users
//! - **server**: hyper accept loop and request router

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{handle_request, run, AppState, StoreKind};
pub use types::{LecternError, Result};
