//! HTTP routes for Lectern

pub mod auth_routes;
pub mod common;
pub mod health;
pub mod posts;
pub mod users;

pub use auth_routes::handle_auth_request;
pub use common::{
    error_response, error_to_response, json_response, method_not_allowed, not_found_response,
    preflight_response, FullBody,
};
pub use health::{health_check, version_info};
pub use posts::{handle_posts_request, PostResponse};
pub use users::{handle_users_request, UserResponse};
