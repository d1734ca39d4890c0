use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use surrealdb::sql::Datetime;

use crate::types::{UserId, Username};

/// Column list shared by every query that loads a full user row.
///
/// The SurrealDB record id is never projected; users are addressed by the
/// generated `uid` instead.
pub const USER_FIELDS: &str =
    "uid, username, first_name, last_name, password_hash, created_at, updated_at";

/// Persisted representation of a user in the credential store.
#[derive(Clone, Deserialize)]
pub struct UserRecord {
    /// Generated identifier, stored in the `uid` column.
    #[serde(rename = "uid")]
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// bcrypt hash of the password. Never serialized into responses.
    pub password_hash: String,
    #[serde(default)]
    pub created_at: Option<Datetime>,
    #[serde(default)]
    pub updated_at: Option<Datetime>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Payload for inserting a new user.
#[derive(Debug, Clone, Serialize)]
pub struct UserCreate {
    pub id: UserId,
    pub username: Username,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
}

/// Store-level partial update.
///
/// `username` and `password_hash` can only be replaced, never removed, so
/// they are plain options. The name fields can also be cleared.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<Username>,
    pub first_name: FieldUpdate<String>,
    pub last_name: FieldUpdate<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_unchanged()
            && self.last_name.is_unchanged()
            && self.password_hash.is_none()
    }
}

/// A single field of a partial update.
///
/// Deserialized from JSON as: field absent → `Unchanged`, explicit `null` →
/// `Clear`, any value → `Set`. Struct fields using it need
/// `#[serde(default)]` so that absence maps to `Unchanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        })
    }
}
