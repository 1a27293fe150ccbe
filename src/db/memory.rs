//! In-memory account and post stores
//!
//! Used in dev mode when MongoDB is unreachable, and by the tests. Mirrors the
//! MongoDB store's behavior: ObjectId-shaped ids, unique logins, newest-first
//! post pages with a case-insensitive title search.

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::Role;
use crate::db::store::{
    last_page, Account, AccountStore, NewPost, Post, PostPage, PostPatch, PostQuery, PostStore,
    DUPLICATE_LOGIN,
};
use crate::types::{LecternError, Result};

/// Account and post storage held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Insertion order is registration order
    accounts: RwLock<Vec<Account>>,
    posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reject ids the MongoDB store could not parse either
fn check_id(id: &str) -> Result<()> {
    ObjectId::parse_str(id)?;
    Ok(())
}

fn title_matches(title: &str, search: &str) -> bool {
    search.is_empty() || title.to_lowercase().contains(&search.to_lowercase())
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, login: &str, password_hash: &str, role: Role) -> Result<Account> {
        let mut accounts = self.accounts.write().await;

        if accounts.iter().any(|a| a.login == login) {
            return Err(LecternError::Conflict(DUPLICATE_LOGIN.into()));
        }

        let account = Account {
            id: ObjectId::new().to_hex(),
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            role,
            registered_at: Utc::now(),
        };
        accounts.push(account.clone());

        debug!("Stored account {} in memory", account.id);
        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        check_id(id)?;
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.login == login).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.read().await.clone())
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<Account>> {
        check_id(id)?;
        let mut accounts = self.accounts.write().await;
        Ok(accounts.iter_mut().find(|a| a.id == id).map(|account| {
            account.role = role;
            account.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        check_id(id)?;
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(accounts.len() < before)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post> {
        let post = Post {
            id: ObjectId::new().to_hex(),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            created_at: Utc::now(),
        };
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>> {
        check_id(id)?;
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_page(&self, query: &PostQuery) -> Result<PostPage> {
        let posts = self.posts.read().await;

        // Reverse insertion order first so equal timestamps still list newest first
        let mut matching: Vec<&Post> = posts
            .iter()
            .rev()
            .filter(|p| title_matches(&p.title, &query.search))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(PostPage {
            posts: page,
            total,
            last_page: last_page(total, query.limit),
        })
    }

    async fn update(&self, id: &str, patch: PostPatch) -> Result<Option<Post>> {
        check_id(id)?;
        let mut posts = self.posts.write().await;
        Ok(posts.iter_mut().find(|p| p.id == id).map(|post| {
            if let Some(title) = patch.title {
                post.title = title;
            }
            if let Some(content) = patch.content {
                post.content = content;
            }
            if let Some(image_url) = patch.image_url {
                post.image_url = image_url;
            }
            post.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        check_id(id)?;
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }
}
