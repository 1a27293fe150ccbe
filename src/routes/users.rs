//! Account administration routes
//!
//! Every route here is ADMIN-gated:
//! - GET    /users        - List accounts
//! - GET    /users/roles  - Role catalogue
//! - PATCH  /users/{id}   - Change an account's role
//! - DELETE /users/{id}   - Delete an account

use bytes::Bytes;
use chrono::SecondsFormat;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{role_catalogue, Role};
use crate::db::Account;
use crate::routes::common::{
    error_to_response, json_response, method_not_allowed, not_found_response, parse_json_body,
    require_admin, resource_id, Acknowledged, DataResponse, FullBody,
};
use crate::server::AppState;
use crate::types::{LecternError, Result};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Public view of an account; never carries the password digest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub login: String,
    pub role_id: Role,
    pub registered_at: String,
}

impl From<&Account> for UserResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            login: account.login.clone(),
            role_id: account.role,
            registered_at: account
                .registered_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role_id: Role,
}

// =============================================================================
// Route Handler
// =============================================================================

/// Main handler for /users routes
pub async fn handle_users_request(
    req: Request<Bytes>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let subpath = path.strip_prefix("/users").unwrap_or("");
    let method = req.method().clone();

    let result = match (method, subpath, resource_id(subpath)) {
        (Method::GET, "" | "/", _) => handle_list_users(&req, &state).await,
        (Method::GET, "/roles", _) => handle_list_roles(&req, &state).await,
        (_, "" | "/" | "/roles", _) => return method_not_allowed("GET, OPTIONS"),

        (Method::PATCH, _, Some(id)) => handle_update_user(&req, &state, id).await,
        (Method::DELETE, _, Some(id)) => handle_delete_user(&req, &state, id).await,
        (_, _, Some(_)) => return method_not_allowed("PATCH, DELETE, OPTIONS"),

        _ => return not_found_response(path),
    };

    result.unwrap_or_else(|e| error_to_response(&e))
}

// =============================================================================
// Endpoint Handlers
// =============================================================================

/// GET /users
async fn handle_list_users(req: &Request<Bytes>, state: &AppState) -> Result<Response<FullBody>> {
    require_admin(req, state).await?;

    let accounts = state.accounts.list().await?;
    let users: Vec<UserResponse> = accounts.iter().map(UserResponse::from).collect();

    Ok(json_response(StatusCode::OK, &DataResponse { data: users }))
}

/// GET /users/roles
async fn handle_list_roles(req: &Request<Bytes>, state: &AppState) -> Result<Response<FullBody>> {
    require_admin(req, state).await?;

    Ok(json_response(
        StatusCode::OK,
        &DataResponse {
            data: role_catalogue(),
        },
    ))
}

/// PATCH /users/{id}
async fn handle_update_user(
    req: &Request<Bytes>,
    state: &AppState,
    id: &str,
) -> Result<Response<FullBody>> {
    let admin = require_admin(req, state).await?;
    let body: UpdateUserRequest = parse_json_body(req)?;

    let account = state
        .accounts
        .update_role(id, body.role_id)
        .await?
        .ok_or_else(|| LecternError::NotFound("User not found".into()))?;

    info!(
        "Admin {} set role of {} to {}",
        admin.account.login, account.login, account.role
    );

    Ok(json_response(
        StatusCode::OK,
        &DataResponse {
            data: UserResponse::from(&account),
        },
    ))
}

/// DELETE /users/{id}
async fn handle_delete_user(
    req: &Request<Bytes>,
    state: &AppState,
    id: &str,
) -> Result<Response<FullBody>> {
    let admin = require_admin(req, state).await?;

    if !state.accounts.delete(id).await? {
        return Err(LecternError::NotFound("User not found".into()));
    }

    info!("Admin {} deleted account {}", admin.account.login, id);
    Ok(json_response(StatusCode::OK, &Acknowledged::ok()))
}
