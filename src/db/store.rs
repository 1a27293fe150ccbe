//! Storage traits for accounts and posts
//!
//! Handlers only see these traits; `MongoStore` backs them in production and
//! `MemoryStore` in dev mode and tests. Every operation is a single pass-through
//! with no transactions, so concurrent writers race and the last one wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::Role;
use crate::types::Result;

/// Default page size for post listings
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Upper bound on a single page
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Reported when a login is already taken
pub const DUPLICATE_LOGIN: &str = "Such a user already exists!";

/// A registered account
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub login: String,
    /// Argon2 PHC digest, never sent to clients
    pub password_hash: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

/// A blog post
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new post
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Partial post update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` removes the image
    pub image_url: Option<Option<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.image_url.is_none()
    }
}

/// Search and pagination parameters for post listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Case-insensitive substring matched against the title only
    pub search: String,
    pub limit: u32,
    /// 1-based page number
    pub page: u32,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            limit: DEFAULT_PAGE_LIMIT,
            page: 1,
        }
    }
}

impl PostQuery {
    pub fn new(search: Option<String>, limit: Option<u32>, page: Option<u32>) -> Self {
        Self {
            search: search.unwrap_or_default(),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            page: page.unwrap_or(1).max(1),
        }
    }

    /// Number of matching records to skip
    pub fn skip(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

/// One page of posts
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// Total matching records at count time
    pub total: u64,
    pub last_page: u64,
}

/// Number of pages needed to show `total` records `limit` at a time
pub fn last_page(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account; a taken login is a `Conflict`
    async fn create(&self, login: &str, password_hash: &str, role: Role) -> Result<Account>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>>;
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>>;
    /// All accounts, oldest first
    async fn list(&self) -> Result<Vec<Account>>;
    /// Change the role and return the updated account
    async fn update_role(&self, id: &str, role: Role) -> Result<Option<Account>>;
    /// Returns whether anything was deleted
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>>;
    /// Newest first. The page and the count are separate reads and may
    /// observe different snapshots under concurrent writes.
    async fn find_page(&self, query: &PostQuery) -> Result<PostPage>;
    /// Apply the patch and return the updated post
    async fn update(&self, id: &str, patch: PostPatch) -> Result<Option<Post>>;
    /// Returns whether anything was deleted
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page() {
        assert_eq!(last_page(15, 10), 2);
        assert_eq!(last_page(20, 10), 2);
        assert_eq!(last_page(21, 10), 3);
        assert_eq!(last_page(0, 10), 0);
        assert_eq!(last_page(1, 1), 1);
    }

    #[test]
    fn test_query_defaults_and_clamps() {
        let q = PostQuery::new(None, None, None);
        assert_eq!(q, PostQuery::default());
        assert_eq!(q.skip(), 0);

        let q = PostQuery::new(Some("rust".into()), Some(0), Some(0));
        assert_eq!(q.limit, 1);
        assert_eq!(q.page, 1);

        let q = PostQuery::new(None, Some(5000), Some(3));
        assert_eq!(q.limit, MAX_PAGE_LIMIT);
        assert_eq!(q.skip(), 200);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(PostPatch::default().is_empty());
        let patch = PostPatch {
            title: Some("New".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        let clear_image = PostPatch {
            image_url: Some(None),
            ..Default::default()
        };
        assert!(!clear_image.is_empty());
    }
}
