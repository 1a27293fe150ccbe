//! Account roles and the fixed role catalogue served by `/users/roles`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::LecternError;

/// Role attached to every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access, including account and post management
    Admin,
    Moderator,
    /// Default role for new registrations
    #[default]
    User,
}

impl Role {
    /// Every role, in catalogue order
    pub const ALL: [Role; 3] = [Role::Admin, Role::Moderator, Role::User];

    /// Wire identifier (also the stored value)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Moderator => "MODERATOR",
            Role::User => "USER",
        }
    }

    /// Human-readable name for the role catalogue
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MODERATOR" => Ok(Role::Moderator),
            "USER" => Ok(Role::User),
            _ => Err(LecternError::Validation(
                "Invalid role. Must be ADMIN, MODERATOR, or USER".into(),
            )),
        }
    }
}

/// Entry of the role catalogue
#[derive(Debug, Clone, Serialize)]
pub struct RoleInfo {
    pub id: Role,
    pub name: &'static str,
}

/// The fixed role catalogue
pub fn role_catalogue() -> Vec<RoleInfo> {
    Role::ALL
        .iter()
        .map(|role| RoleInfo {
            id: *role,
            name: role.display_name(),
        })
        .collect()
}
