//! Shared helpers for route handlers
//!
//! Response builders, typed body/query parsing, the admin gate, and the
//! conversion from `LecternError` to a JSON error response.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, SET_COOKIE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::auth::{authenticate, require_role, AuthContext, Role};
use crate::server::AppState;
use crate::types::{LecternError, Result};

pub type FullBody = Full<Bytes>;

/// Error payload: `{error, code}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// `{data: ...}` envelope used by every read and admin mutation
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// `{error: null}` acknowledgement for deletions
#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub error: Option<String>,
}

impl Acknowledged {
    pub fn ok() -> Self {
        Self { error: None }
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// JSON response that also sets (or clears) the session cookie
pub fn json_response_with_cookie<T: Serialize>(
    status: StatusCode,
    body: &T,
    cookie: &str,
) -> Response<FullBody> {
    let mut response = json_response(status, body);
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        Err(e) => error!("Session cookie is not a valid header value: {}", e),
    }
    response
}

pub fn error_response(status: StatusCode, error: &str, code: Option<&str>) -> Response<FullBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.to_string(),
            code: code.map(|c| c.to_string()),
        },
    )
}

/// Map a handler error onto its status; infrastructure detail stays in the log
pub fn error_to_response(err: &LecternError) -> Response<FullBody> {
    let status = err.status_code();
    if err.is_client_error() {
        return error_response(status, &err.to_string(), Some(err.code()));
    }

    error!("Request failed: {}", err);
    let message = status.canonical_reason().unwrap_or("Internal Server Error");
    error_response(status, message, Some(err.code()))
}

pub fn not_found_response(path: &str) -> Response<FullBody> {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("Cannot find {}", path),
        Some("NOT_FOUND"),
    )
}

/// 405 listing the methods the path does accept
pub fn method_not_allowed(allowed: &'static str) -> Response<FullBody> {
    let mut response = error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        Some("METHOD_NOT_ALLOWED"),
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allowed));
    response
}

pub fn preflight_response(allowed: &'static str) -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allowed));
    response
}

/// Deserialize a buffered JSON body into a typed request
pub fn parse_json_body<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T> {
    Ok(serde_json::from_slice(req.body())?)
}

/// Deserialize the query string; a missing query parses as empty
pub fn parse_query<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T> {
    Ok(serde_urlencoded::from_str(req.uri().query().unwrap_or(""))?)
}

/// Session guard followed by the ADMIN role gate
pub async fn require_admin(req: &Request<Bytes>, state: &AppState) -> Result<AuthContext> {
    let ctx = authenticate(req.headers(), &state.jwt, state.accounts.as_ref()).await?;
    require_role(&ctx, &[Role::Admin])?;
    Ok(ctx)
}

/// `/{id}` under a collection prefix, rejecting nested segments
pub fn resource_id(subpath: &str) -> Option<&str> {
    let id = subpath.strip_prefix('/')?;
    if id.is_empty() || id.contains('/') {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(resp: Response<FullBody>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_resource_id() {
        assert_eq!(resource_id("/abc"), Some("abc"));
        assert_eq!(resource_id("/"), None);
        assert_eq!(resource_id(""), None);
        assert_eq!(resource_id("/abc/def"), None);
    }

    #[tokio::test]
    async fn test_infrastructure_errors_are_generic() {
        let resp = error_to_response(&LecternError::Database("connection refused".into()));
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_text(resp).await;
        assert!(!body.contains("connection refused"));
        assert!(body.contains("DB_ERROR"));
    }

    #[tokio::test]
    async fn test_client_errors_keep_message() {
        let resp = error_to_response(&LecternError::Conflict("Such a user already exists!".into()));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_text(resp).await;
        assert!(body.contains("Such a user already exists!"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let resp = method_not_allowed("GET, POST");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(ALLOW).unwrap(), "GET, POST");
    }
}
