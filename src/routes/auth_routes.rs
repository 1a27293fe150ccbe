//! HTTP Routes for Authentication
//!
//! - POST /register - Create an account and start a session
//! - POST /login    - Check credentials and start a session
//! - POST /logout   - Clear the session cookie
//!
//! Sessions are stateless: the JWT in the `token` cookie is the whole session.

use bytes::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    cleared_session_cookie, hash_password_blocking, session_cookie, verify_password_blocking,
    Role, TokenInput,
};
use crate::db::Account;
use crate::routes::common::{
    error_to_response, json_response_with_cookie, method_not_allowed, parse_json_body, FullBody,
};
use crate::routes::users::UserResponse;
use crate::server::AppState;
use crate::types::{LecternError, Result};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Body of both /register and /login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// `{error: null, user}` returned when a session starts
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub error: Option<String>,
    pub user: UserResponse,
}

/// Logout answers with an empty object
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

// =============================================================================
// Route Handler
// =============================================================================

/// Handle /register, /login and /logout; `None` for any other path
pub async fn handle_auth_request(
    req: Request<Bytes>,
    state: Arc<AppState>,
) -> Option<Response<FullBody>> {
    let path = req.uri().path();
    if !matches!(path, "/register" | "/login" | "/logout") {
        return None;
    }
    if *req.method() != Method::POST {
        return Some(method_not_allowed("POST, OPTIONS"));
    }

    let result = match path {
        "/register" => handle_register(&req, &state).await,
        "/login" => handle_login(&req, &state).await,
        _ => Ok(handle_logout()),
    };

    Some(result.unwrap_or_else(|e| error_to_response(&e)))
}

// =============================================================================
// Endpoint Handlers
// =============================================================================

/// POST /register
async fn handle_register(req: &Request<Bytes>, state: &AppState) -> Result<Response<FullBody>> {
    let body: CredentialsRequest = parse_json_body(req)?;

    let login = body.login.trim();
    if login.is_empty() {
        return Err(LecternError::Validation("Login is empty".into()));
    }

    let password_hash = hash_password_blocking(body.password).await?;
    let account = state
        .accounts
        .create(login, &password_hash, Role::default())
        .await
        .inspect_err(|e| {
            if matches!(e, LecternError::Conflict(_)) {
                warn!("Registration refused: login {} is taken", login);
            }
        })?;

    info!("Registered account {} ({})", account.login, account.id);
    start_session(state, &account, StatusCode::CREATED)
}

/// POST /login
async fn handle_login(req: &Request<Bytes>, state: &AppState) -> Result<Response<FullBody>> {
    let body: CredentialsRequest = parse_json_body(req)?;

    let account = match state.accounts.find_by_login(body.login.trim()).await? {
        Some(account) => account,
        None => {
            warn!("Login attempt for unknown account {}", body.login);
            return Err(LecternError::NotFound("User not found!".into()));
        }
    };

    let valid = !body.password.is_empty()
        && verify_password_blocking(body.password, account.password_hash.clone()).await?;
    if !valid {
        warn!("Wrong password for account {}", account.login);
        return Err(LecternError::Unauthenticated("Wrong password!".into()));
    }

    info!("Account {} logged in", account.login);
    start_session(state, &account, StatusCode::OK)
}

/// POST /logout
fn handle_logout() -> Response<FullBody> {
    json_response_with_cookie(StatusCode::OK, &EmptyResponse {}, &cleared_session_cookie())
}

/// Issue a token for the account and set it as the session cookie
fn start_session(
    state: &AppState,
    account: &Account,
    status: StatusCode,
) -> Result<Response<FullBody>> {
    let token = state.jwt.generate_token(TokenInput {
        account_id: account.id.clone(),
        login: account.login.clone(),
    })?;

    Ok(json_response_with_cookie(
        status,
        &SessionResponse {
            error: None,
            user: UserResponse::from(account),
        },
        &session_cookie(&token, state.jwt.expiry_seconds()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let body: CredentialsRequest = serde_json::from_str(r#"{"login":"erin"}"#).unwrap();
        assert_eq!(body.login, "erin");
        assert!(body.password.is_empty());
    }

    #[test]
    fn test_session_response_shape() {
        let response = SessionResponse {
            error: None,
            user: UserResponse {
                id: "65f0c0ffee0000000000abcd".into(),
                login: "erin".into(),
                role_id: Role::User,
                registered_at: "2024-03-01T12:00:00.000Z".into(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["error"].is_null());
        assert_eq!(json["user"]["login"], "erin");
        assert_eq!(json["user"]["roleId"], "USER");
    }

    #[test]
    fn test_empty_response_is_empty_object() {
        assert_eq!(serde_json::to_string(&EmptyResponse {}).unwrap(), "{}");
    }
}
