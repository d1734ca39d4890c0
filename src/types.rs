//! NewType wrappers for account identifiers.
//!
//! A user is addressed by its generated `UserId` in URLs and by its
//! `Username` inside tokens; keeping them as distinct types stops one being
//! passed where the other is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }
    };
}

newtype_string!(
    /// Generated identifier of a user record (UUID v4, hyphenated).
    ///
    /// This is the value that appears in `/users/{id}/` paths and in the
    /// `id` field of every user response.
    UserId
);

newtype_string!(
    /// Login name of a user. Unique across the store and used as the
    /// `sub` claim of issued tokens.
    Username
);

impl UserId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
