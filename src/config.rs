//! Configuration for Lectern
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

use crate::auth::JwtValidator;
use crate::types::LecternError;

/// Thirty days
const DEFAULT_JWT_EXPIRY_SECONDS: &str = "2592000";

/// Lectern - blog backend with role-gated sessions
#[derive(Parser, Debug, Clone)]
#[command(name = "lectern")]
#[command(about = "Blog backend: accounts, sessions and posts over MongoDB")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3001")]
    pub listen: SocketAddr,

    /// Enable development mode (dev JWT secret, in-memory store if MongoDB is down)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "blog")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (also the cookie Max-Age)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = DEFAULT_JWT_EXPIRY_SECONDS)]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Largest accepted JSON request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10240")]
    pub max_body_bytes: usize,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None | Some("") => {
                    return Err("JWT_SECRET is required in production mode".to_string())
                }
                Some(secret) if secret.len() < 32 => {
                    return Err("JWT_SECRET must be at least 32 characters".to_string())
                }
                Some(_) => {}
            }
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            ));
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Build the token issuer; dev mode falls back to a fixed secret
    pub fn jwt_validator(&self) -> Result<JwtValidator, LecternError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev(self.jwt_expiry_seconds)),
            (None, false) => Err(LecternError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lectern").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--dev-mode"]);
        assert_eq!(args.listen.port(), 3001);
        assert_eq!(args.mongodb_db, "blog");
        assert_eq!(args.jwt_expiry_seconds, 2_592_000);
        assert_ok!(args.validate());
        assert_ok!(args.jwt_validator());
    }

    #[test]
    fn test_production_requires_secret() {
        let mut args = parse(&["--dev-mode"]);
        args.dev_mode = false;
        args.jwt_secret = None;
        assert_err!(args.validate());
        assert_err!(args.jwt_validator());

        args.jwt_secret = Some("short".into());
        assert_err!(args.validate());

        args.jwt_secret = Some("a-production-secret-of-at-least-32-chars".into());
        assert!(args.validate().is_ok());
        assert!(args.jwt_validator().is_ok());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let args = parse(&["--dev-mode", "--log-format", "xml"]);
        assert!(args.validate().is_err());

        let args = parse(&["--dev-mode", "--log-format", "json"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let args = parse(&["--dev-mode", "--jwt-expiry-seconds", "0"]);
        assert!(args.validate().is_err());
    }
}
