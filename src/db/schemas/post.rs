//! Post document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::store::{NewPost, Post};

/// Collection name for posts
pub const POST_COLLECTION: &str = "posts";

/// Post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    pub created_at: DateTime,
}

impl PostDoc {
    pub fn new(post: NewPost) -> Self {
        Self {
            id: None,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            created_at: DateTime::now(),
        }
    }

    pub fn into_post(self) -> Option<Post> {
        Some(Post {
            id: self.id?.to_hex(),
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            created_at: self.created_at.to_chrono(),
        })
    }
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("created_at_desc".to_string())
                    .build(),
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_is_optional() {
        let post = PostDoc::new(NewPost {
            title: "Hello".into(),
            content: "World".into(),
            image_url: None,
        });
        let document = bson::to_document(&post).unwrap();
        assert!(!document.contains_key("image_url"));

        let back: PostDoc = bson::from_document(document).unwrap();
        assert_eq!(back.image_url, None);
    }

    #[test]
    fn test_into_post() {
        let mut post = PostDoc::new(NewPost {
            title: "Hello".into(),
            content: "World".into(),
            image_url: Some("https://img.example/1.png".into()),
        });
        post.id = Some(ObjectId::new());

        let converted = post.clone().into_post().unwrap();
        assert_eq!(converted.title, "Hello");
        assert_eq!(converted.image_url.as_deref(), Some("https://img.example/1.png"));
        assert_eq!(converted.created_at, post.created_at.to_chrono());
    }
}
