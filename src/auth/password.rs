//! Password hashing and verification using Argon2
//!
//! Uses argon2id with the crate's default (fixed) cost parameters. Digests are
//! PHC strings carrying their own salt and parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::LecternError;

/// Hash a password using Argon2id
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_password(password: &str) -> Result<String, LecternError> {
    if password.is_empty() {
        return Err(LecternError::Validation("Password is empty".into()));
    }

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LecternError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
///
/// Returns false on mismatch; a digest that is not a PHC string is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, LecternError> {
    if password.is_empty() {
        return Err(LecternError::Validation("Password is empty".into()));
    }

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| LecternError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash on the blocking pool; Argon2 is CPU-bound.
pub async fn hash_password_blocking(password: String) -> Result<String, LecternError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Verify on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, LecternError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
}
