//! User records.

use super::{EntityKind, Record};
use serde::{Deserialize, Serialize};

/// A user owning an ordered list of paste hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub posts: Vec<String>,
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Request payload for creating a user.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
}

/// Request payload for attaching a paste to a user.
#[derive(Debug, Default, Deserialize)]
pub struct AddPostRequest {
    #[serde(default)]
    pub hash: String,
}
