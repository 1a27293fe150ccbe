//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one spawned task per connection. Request
//! bodies are buffered (up to `MAX_BODY_BYTES`) before routing, so handlers
//! work on `Request<Bytes>`.

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::{AccountStore, MemoryStore, MongoStore, PostStore};
use crate::routes::{self, error_response, not_found_response, preflight_response, FullBody};
use crate::types::LecternError;

/// Which backend the stores run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MongoDb,
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::MongoDb => "mongodb",
            StoreKind::Memory => "memory",
        }
    }
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    pub accounts: Arc<dyn AccountStore>,
    pub posts: Arc<dyn PostStore>,
    pub store_kind: StoreKind,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        jwt: JwtValidator,
        accounts: Arc<dyn AccountStore>,
        posts: Arc<dyn PostStore>,
        store_kind: StoreKind,
    ) -> Self {
        Self {
            args,
            jwt,
            accounts,
            posts,
            store_kind,
            started_at: Instant::now(),
        }
    }

    /// State backed by MongoDB collections
    pub fn with_mongo(args: Args, jwt: JwtValidator, store: MongoStore) -> Self {
        let store = Arc::new(store);
        Self::new(args, jwt, store.clone(), store, StoreKind::MongoDb)
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(args: Args, jwt: JwtValidator) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(args, jwt, store.clone(), store, StoreKind::Memory)
    }
}

/// Start the HTTP server; returns once Ctrl-C stops the accept loop
pub async fn run(state: Arc<AppState>) -> Result<(), LecternError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Lectern listening on {} ({} store)",
        state.args.listen,
        state.store_kind.as_str()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - sessions are signed with an insecure secret");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move {
                                debug!("Request from {}", addr);
                                Ok::<_, Infallible>(handle_request(state, req).await)
                            }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    Ok(())
}

/// Route an HTTP request
///
/// Generic over the body so tests can drive the router without a socket.
pub async fn handle_request<B>(state: Arc<AppState>, req: Request<B>) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("{} {}", method, path);

    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, state.args.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Rejected {} {}: body over {} bytes", method, path, state.args.max_body_bytes);
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
                Some("PAYLOAD_TOO_LARGE"),
            );
        }
        Err(e) => {
            warn!("Failed to read body of {} {}: {}", method, path, e);
            return error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
                Some("BAD_REQUEST"),
            );
        }
    };
    let req = Request::from_parts(parts, body);

    match (method, path.as_str()) {
        (Method::GET, "/health") => routes::health_check(state),
        (Method::GET, "/version") => routes::version_info(),

        (Method::OPTIONS, p) => preflight_response(allowed_methods(p)),
        (_, "/health" | "/version") => routes::method_not_allowed("GET, OPTIONS"),

        (_, "/register" | "/login" | "/logout") => routes::handle_auth_request(req, state)
            .await
            .unwrap_or_else(|| not_found_response(&path)),

        (_, p) if p == "/posts" || p.starts_with("/posts/") => {
            routes::handle_posts_request(req, state, p).await
        }

        (_, p) if p == "/users" || p.starts_with("/users/") => {
            routes::handle_users_request(req, state, p).await
        }

        _ => not_found_response(&path),
    }
}

/// Methods advertised in the `Allow` header of an OPTIONS response
fn allowed_methods(path: &str) -> &'static str {
    match path {
        "/register" | "/login" | "/logout" => "POST, OPTIONS",
        "/posts" | "/posts/" => "GET, POST, OPTIONS",
        "/users" | "/users/" | "/users/roles" => "GET, OPTIONS",
        p if p.starts_with("/posts/") => "GET, PATCH, DELETE, OPTIONS",
        p if p.starts_with("/users/") => "PATCH, DELETE, OPTIONS",
        _ => "GET, OPTIONS",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_methods() {
        assert_eq!(allowed_methods("/login"), "POST, OPTIONS");
        assert_eq!(allowed_methods("/posts"), "GET, POST, OPTIONS");
        assert_eq!(
            allowed_methods("/posts/65f0c0ffee0000000000abcd"),
            "GET, PATCH, DELETE, OPTIONS"
        );
        assert_eq!(allowed_methods("/users/roles"), "GET, OPTIONS");
        assert_eq!(allowed_methods("/health"), "GET, OPTIONS");
    }

    #[test]
    fn test_store_kind_labels() {
        assert_eq!(StoreKind::MongoDb.as_str(), "mongodb");
        assert_eq!(StoreKind::Memory.as_str(), "memory");
    }
}
