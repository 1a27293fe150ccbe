//! Blog post routes
//!
//! - GET    /posts        - Paginated, title-searchable listing (public)
//! - GET    /posts/{id}   - Single post (public)
//! - POST   /posts        - Create (ADMIN)
//! - PATCH  /posts/{id}   - Partial update (ADMIN)
//! - DELETE /posts/{id}   - Delete (ADMIN)

use bytes::Bytes;
use chrono::SecondsFormat;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{NewPost, Post, PostPatch, PostQuery};
use crate::routes::common::{
    error_to_response, json_response, method_not_allowed, not_found_response, parse_json_body,
    parse_query, require_admin, resource_id, Acknowledged, DataResponse, FullBody,
};
use crate::server::AppState;
use crate::types::{LecternError, Result};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published_at: String,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            published_at: post.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub last_page: u64,
}

/// `?search=&limit=&page=`
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl From<ListPostsQuery> for PostQuery {
    fn from(query: ListPostsQuery) -> Self {
        PostQuery::new(query.search, query.limit, query.page)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreatePostRequest {
    fn into_new_post(self) -> Result<NewPost> {
        if self.title.trim().is_empty() {
            return Err(LecternError::Validation("Title is required".into()));
        }
        Ok(NewPost {
            title: self.title,
            content: self.content,
            image_url: self.image_url.filter(|url| !url.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

impl UpdatePostRequest {
    /// Same title rule as create; an empty `imageUrl` removes the image
    fn into_patch(self) -> Result<PostPatch> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(LecternError::Validation("Title is required".into()));
        }
        Ok(PostPatch {
            title: self.title,
            content: self.content,
            image_url: self.image_url.map(|url| Some(url).filter(|u| !u.is_empty())),
        })
    }
}

// =============================================================================
// Route Handler
// =============================================================================

/// Main handler for /posts routes
pub async fn handle_posts_request(
    req: Request<Bytes>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let subpath = path.strip_prefix("/posts").unwrap_or("");
    let method = req.method().clone();

    let result = match (method, subpath, resource_id(subpath)) {
        (Method::GET, "" | "/", _) => handle_list_posts(&req, &state).await,
        (Method::POST, "" | "/", _) => handle_create_post(&req, &state).await,
        (_, "" | "/", _) => return method_not_allowed("GET, POST, OPTIONS"),

        (Method::GET, _, Some(id)) => handle_get_post(&state, id).await,
        (Method::PATCH, _, Some(id)) => handle_update_post(&req, &state, id).await,
        (Method::DELETE, _, Some(id)) => handle_delete_post(&req, &state, id).await,
        (_, _, Some(_)) => return method_not_allowed("GET, PATCH, DELETE, OPTIONS"),

        _ => return not_found_response(path),
    };

    result.unwrap_or_else(|e| error_to_response(&e))
}

// =============================================================================
// Endpoint Handlers
// =============================================================================

/// GET /posts
async fn handle_list_posts(req: &Request<Bytes>, state: &AppState) -> Result<Response<FullBody>> {
    let query: PostQuery = parse_query::<ListPostsQuery>(req)?.into();
    let page = state.posts.find_page(&query).await?;

    debug!(
        "Listed {} of {} posts (page {} of {})",
        page.posts.len(),
        page.total,
        query.page,
        page.last_page
    );

    Ok(json_response(
        StatusCode::OK,
        &DataResponse {
            data: PostListResponse {
                posts: page.posts.iter().map(PostResponse::from).collect(),
                last_page: page.last_page,
            },
        },
    ))
}

/// GET /posts/{id}
async fn handle_get_post(state: &AppState, id: &str) -> Result<Response<FullBody>> {
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| LecternError::NotFound("Post not found".into()))?;

    Ok(json_response(
        StatusCode::OK,
        &DataResponse {
            data: PostResponse::from(&post),
        },
    ))
}

/// POST /posts
async fn handle_create_post(req: &Request<Bytes>, state: &AppState) -> Result<Response<FullBody>> {
    let admin = require_admin(req, state).await?;
    let new_post = parse_json_body::<CreatePostRequest>(req)?.into_new_post()?;

    let post = state.posts.create(new_post).await?;
    info!("Admin {} created post {}", admin.account.login, post.id);

    Ok(json_response(
        StatusCode::CREATED,
        &DataResponse {
            data: PostResponse::from(&post),
        },
    ))
}

/// PATCH /posts/{id}
async fn handle_update_post(
    req: &Request<Bytes>,
    state: &AppState,
    id: &str,
) -> Result<Response<FullBody>> {
    let admin = require_admin(req, state).await?;
    let patch = parse_json_body::<UpdatePostRequest>(req)?.into_patch()?;

    let post = state
        .posts
        .update(id, patch)
        .await?
        .ok_or_else(|| LecternError::NotFound("Post not found".into()))?;
    info!("Admin {} updated post {}", admin.account.login, post.id);

    Ok(json_response(
        StatusCode::OK,
        &DataResponse {
            data: PostResponse::from(&post),
        },
    ))
}

/// DELETE /posts/{id}
async fn handle_delete_post(
    req: &Request<Bytes>,
    state: &AppState,
    id: &str,
) -> Result<Response<FullBody>> {
    let admin = require_admin(req, state).await?;

    if !state.posts.delete(id).await? {
        return Err(LecternError::NotFound("Post not found".into()));
    }

    info!("Admin {} deleted post {}", admin.account.login, id);
    Ok(json_response(StatusCode::OK, &Acknowledged::ok()))
}
