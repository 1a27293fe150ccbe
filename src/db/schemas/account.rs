//! Account document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::IntoIndexes;
use crate::db::store::Account;

/// Collection name for accounts
pub const ACCOUNT_COLLECTION: &str = "users";

/// Account document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AccountDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Unique login
    pub login: String,

    /// Argon2 password hash
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,

    pub created_at: DateTime,
}

impl AccountDoc {
    pub fn new(login: String, password_hash: String, role: Role) -> Self {
        Self {
            id: None,
            login,
            password_hash,
            role,
            created_at: DateTime::now(),
        }
    }

    /// Convert to the store-level account; `None` if the document has no id
    pub fn into_account(self) -> Option<Account> {
        Some(Account {
            id: self.id?.to_hex(),
            login: self.login,
            password_hash: self.password_hash,
            role: self.role,
            registered_at: self.created_at.to_chrono(),
        })
    }
}

impl IntoIndexes for AccountDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "login": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("login_unique".to_string())
                    .build(),
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let account = AccountDoc::new("alice".into(), "$argon2id$stub".into(), Role::Admin);
        let document = bson::to_document(&account).unwrap();

        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("login").unwrap(), "alice");
        assert_eq!(document.get_str("role").unwrap(), "ADMIN");
    }

    #[test]
    fn test_into_account_requires_id() {
        let mut account = AccountDoc::new("bob".into(), "hash".into(), Role::User);
        assert!(account.clone().into_account().is_none());

        let oid = ObjectId::new();
        account.id = Some(oid);
        let converted = account.into_account().unwrap();
        assert_eq!(converted.id, oid.to_hex());
        assert_eq!(converted.role, Role::User);
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let document = doc! {
            "_id": ObjectId::new(),
            "login": "legacy",
            "password_hash": "hash",
            "created_at": DateTime::now(),
        };
        let account: AccountDoc = bson::from_document(document).unwrap();
        assert_eq!(account.role, Role::User);
    }
}
