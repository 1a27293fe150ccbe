//! MongoDB-backed account and post stores

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use mongodb::options::FindOptions;
use tracing::debug;

use crate::auth::Role;
use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{AccountDoc, PostDoc, ACCOUNT_COLLECTION, POST_COLLECTION};
use crate::db::store::{
    last_page, Account, AccountStore, NewPost, Post, PostPage, PostPatch, PostQuery, PostStore,
    DUPLICATE_LOGIN,
};
use crate::types::{LecternError, Result};

/// Both stores over one MongoDB database
#[derive(Clone, Debug)]
pub struct MongoStore {
    accounts: MongoCollection<AccountDoc>,
    posts: MongoCollection<PostDoc>,
}

impl MongoStore {
    /// Open the collections and apply their indexes
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            accounts: mongo.collection(ACCOUNT_COLLECTION).await?,
            posts: mongo.collection(POST_COLLECTION).await?,
        })
    }
}

fn id_filter(id: &str) -> Result<Document> {
    let oid = ObjectId::parse_str(id)?;
    Ok(doc! { "_id": oid })
}

/// Case-insensitive substring match on the title; input is escaped so it
/// never acts as a pattern.
fn title_filter(search: &str) -> Document {
    if search.is_empty() {
        return doc! {};
    }
    doc! { "title": { "$regex": regex::escape(search), "$options": "i" } }
}

/// `$set` for present fields, `$unset` for a cleared image; empty operators are left out
fn patch_update(patch: PostPatch) -> Document {
    let mut set = Document::new();
    let mut unset = Document::new();
    if let Some(title) = patch.title {
        set.insert("title", title);
    }
    if let Some(content) = patch.content {
        set.insert("content", content);
    }
    match patch.image_url {
        Some(Some(image_url)) => {
            set.insert("image_url", image_url);
        }
        Some(None) => {
            unset.insert("image_url", "");
        }
        None => {}
    }

    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

fn stored_account(doc: AccountDoc) -> Result<Account> {
    doc.into_account()
        .ok_or_else(|| LecternError::Database("Account document without _id".into()))
}

fn stored_post(doc: PostDoc) -> Result<Post> {
    doc.into_post()
        .ok_or_else(|| LecternError::Database("Post document without _id".into()))
}

#[async_trait]
impl AccountStore for MongoStore {
    async fn create(&self, login: &str, password_hash: &str, role: Role) -> Result<Account> {
        let mut account = AccountDoc::new(login.to_string(), password_hash.to_string(), role);
        let id = self
            .accounts
            .insert_one(account.clone())
            .await
            .map_err(|e| match e {
                LecternError::Conflict(_) => LecternError::Conflict(DUPLICATE_LOGIN.into()),
                other => other,
            })?;
        account.id = Some(id);
        stored_account(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.accounts
            .find_one(id_filter(id)?)
            .await?
            .map(stored_account)
            .transpose()
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Account>> {
        self.accounts
            .find_one(doc! { "login": login })
            .await?
            .map(stored_account)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1 })
            .build();

        self.accounts
            .find_many(doc! {}, Some(options))
            .await?
            .into_iter()
            .map(stored_account)
            .collect()
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<Account>> {
        self.accounts
            .find_one_and_update(id_filter(id)?, doc! { "$set": { "role": role.as_str() } })
            .await?
            .map(stored_account)
            .transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.accounts.delete_one(id_filter(id)?).await? > 0)
    }
}

#[async_trait]
impl PostStore for MongoStore {
    async fn create(&self, post: NewPost) -> Result<Post> {
        let mut post = PostDoc::new(post);
        let id = self.posts.insert_one(post.clone()).await?;
        post.id = Some(id);
        stored_post(post)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>> {
        self.posts
            .find_one(id_filter(id)?)
            .await?
            .map(stored_post)
            .transpose()
    }

    async fn find_page(&self, query: &PostQuery) -> Result<PostPage> {
        let filter = title_filter(&query.search);
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(query.skip())
            .limit(i64::from(query.limit))
            .build();

        // Two independent reads; no snapshot ties them together.
        let (docs, total) = futures::try_join!(
            self.posts.find_many(filter.clone(), Some(options)),
            self.posts.count(filter),
        )?;

        debug!(
            "Post page {} (limit {}): {} of {} matching",
            query.page,
            query.limit,
            docs.len(),
            total
        );

        Ok(PostPage {
            posts: docs.into_iter().map(stored_post).collect::<Result<_>>()?,
            total,
            last_page: last_page(total, query.limit),
        })
    }

    async fn update(&self, id: &str, patch: PostPatch) -> Result<Option<Post>> {
        let filter = id_filter(id)?;
        if patch.is_empty() {
            return self.posts.find_one(filter).await?.map(stored_post).transpose();
        }

        self.posts
            .find_one_and_update(filter, patch_update(patch))
            .await?
            .map(stored_post)
            .transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.posts.delete_one(id_filter(id)?).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_filter() {
        let oid = ObjectId::new();
        let filter = id_filter(&oid.to_hex()).unwrap();
        assert_eq!(filter.get_object_id("_id").unwrap(), oid);

        assert!(matches!(
            id_filter("not-an-id"),
            Err(LecternError::Validation(_))
        ));
    }

    #[test]
    fn test_title_filter_escapes_input() {
        assert!(title_filter("").is_empty());

        let filter = title_filter("C++ (intro)");
        let title = filter.get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"C\+\+ \(intro\)");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_patch_update_only_sets_present_fields() {
        let update = patch_update(PostPatch {
            title: Some("New title".into()),
            content: None,
            image_url: None,
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("title").unwrap(), "New title");
        assert!(!update.contains_key("$unset"));
    }

    #[test]
    fn test_patch_update_unsets_cleared_image() {
        let update = patch_update(PostPatch {
            title: None,
            content: None,
            image_url: Some(None),
        });
        assert!(!update.contains_key("$set"));
        let unset = update.get_document("$unset").unwrap();
        assert!(unset.contains_key("image_url"));

        let update = patch_update(PostPatch {
            image_url: Some(Some("https://img.example/2.png".into())),
            ..Default::default()
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("image_url").unwrap(), "https://img.example/2.png");
    }
}
