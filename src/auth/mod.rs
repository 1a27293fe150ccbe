//! Authentication and authorization for Lectern
//!
//! Provides:
//! - Password hashing with Argon2
//! - JWT session token generation and validation
//! - Session guard and role gate for protected routes
//! - The fixed role set

pub mod guard;
pub mod jwt;
pub mod password;
pub mod permissions;

pub use guard::{authenticate, require_role, token_from_headers, AuthContext};
pub use jwt::{
    cleared_session_cookie, extract_token_from_cookie, extract_token_from_header,
    session_cookie, Claims, JwtValidator, TokenInput, TokenValidationResult, TOKEN_COOKIE,
};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
pub use permissions::{role_catalogue, Role, RoleInfo};
