//! Credential store backed by SurrealDB.

use tracing::{debug, warn};

use crate::accounts::{AccountError, AccountResult};
use crate::db::Db;
use crate::db::schema::{FieldUpdate, USER_FIELDS, UserCreate, UserPatch, UserRecord};
use crate::types::{UserId, Username};

/// User store for database operations.
///
/// Holds a clone of the shared database handle; one is created per request
/// and dropped when the request finishes.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
}

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Get a user by generated id.
    pub async fn get_by_id(&self, id: &UserId) -> AccountResult<Option<UserRecord>> {
        let query = format!("SELECT {} FROM user WHERE uid = $uid LIMIT 1", USER_FIELDS);

        let mut res = self
            .db
            .query(query)
            .bind(("uid", id.clone()))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AccountResult<Option<UserRecord>> {
        let query = format!(
            "SELECT {} FROM user WHERE username = $username LIMIT 1",
            USER_FIELDS
        );

        let mut res = self
            .db
            .query(query)
            .bind(("username", username.to_string()))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// All users, oldest first.
    pub async fn list_all(&self) -> AccountResult<Vec<UserRecord>> {
        let query = format!("SELECT {} FROM user ORDER BY created_at ASC", USER_FIELDS);

        let mut res = self.db.query(query).await?;
        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users)
    }

    /// Insert a new user.
    ///
    /// Does not check the username first; callers do that to give a clean
    /// error. If two registrations race past that check, the UNIQUE index
    /// rejects the second insert and it is reported as `DuplicateUsername`.
    pub async fn create(&self, create: &UserCreate) -> AccountResult<UserRecord> {
        let query = r#"
            CREATE user CONTENT {
                uid: $uid,
                username: $username,
                first_name: $first_name,
                last_name: $last_name,
                password_hash: $password_hash,
                created_at: time::now(),
                updated_at: time::now()
            }
        "#;

        self.db
            .query(query)
            .bind(("uid", create.id.clone()))
            .bind(("username", create.username.clone()))
            .bind(("first_name", create.first_name.clone()))
            .bind(("last_name", create.last_name.clone()))
            .bind(("password_hash", create.password_hash.clone()))
            .await?
            .check()
            .map_err(|e| write_error(e, &create.username))?;

        debug!(user_id = %create.id, username = %create.username, "User created");

        self.get_by_id(&create.id)
            .await?
            .ok_or_else(|| AccountError::Database("failed to create user".to_string()))
    }

    /// Apply a partial update. Only the fields present in the patch are
    /// written; `updated_at` is always refreshed.
    pub async fn update(&self, id: &UserId, patch: &UserPatch) -> AccountResult<UserRecord> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;

        if patch.is_empty() {
            return Ok(existing);
        }

        let mut updates = Vec::new();

        if patch.username.is_some() {
            updates.push("username = $username");
        }
        match patch.first_name {
            FieldUpdate::Set(_) => updates.push("first_name = $first_name"),
            FieldUpdate::Clear => updates.push("first_name = NONE"),
            FieldUpdate::Unchanged => {}
        }
        match patch.last_name {
            FieldUpdate::Set(_) => updates.push("last_name = $last_name"),
            FieldUpdate::Clear => updates.push("last_name = NONE"),
            FieldUpdate::Unchanged => {}
        }
        if patch.password_hash.is_some() {
            updates.push("password_hash = $password_hash");
        }
        updates.push("updated_at = time::now()");

        let query = format!("UPDATE user SET {} WHERE uid = $uid", updates.join(", "));

        let mut query_builder = self.db.query(query).bind(("uid", id.clone()));
        if let Some(username) = &patch.username {
            query_builder = query_builder.bind(("username", username.clone()));
        }
        if let Some(first_name) = patch.first_name.as_set() {
            query_builder = query_builder.bind(("first_name", first_name.clone()));
        }
        if let Some(last_name) = patch.last_name.as_set() {
            query_builder = query_builder.bind(("last_name", last_name.clone()));
        }
        if let Some(hash) = &patch.password_hash {
            query_builder = query_builder.bind(("password_hash", hash.clone()));
        }

        let target_username = patch.username.as_ref().unwrap_or(&existing.username);
        query_builder
            .await?
            .check()
            .map_err(|e| write_error(e, target_username))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    /// Remove a user.
    pub async fn delete(&self, id: &UserId) -> AccountResult<()> {
        if self.get_by_id(id).await?.is_none() {
            return Err(AccountError::NotFound(id.to_string()));
        }

        self.db
            .query("DELETE user WHERE uid = $uid")
            .bind(("uid", id.clone()))
            .await?
            .check()?;

        debug!(user_id = %id, "User deleted");
        Ok(())
    }
}

/// Name of the UNIQUE index on `user.username`.
const USERNAME_INDEX: &str = "user_username";

/// Translate a failed write, recognising violations of the username index.
fn write_error(err: surrealdb::Error, username: &Username) -> AccountError {
    if is_username_conflict(&err) {
        warn!(username = %username, "Username collision rejected by unique index");
        AccountError::DuplicateUsername(username.to_string())
    } else {
        AccountError::Database(err.to_string())
    }
}

fn is_username_conflict(err: &surrealdb::Error) -> bool {
    match err {
        surrealdb::Error::Db(surrealdb::error::Db::IndexExists { index, .. }) => {
            index == USERNAME_INDEX
        }
        // Remote engines only hand back the rendered message.
        surrealdb::Error::Api(surrealdb::error::Api::Query(msg)) => {
            msg.contains(&format!("index `{}` already contains", USERNAME_INDEX))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    async fn setup_store() -> UserStore {
        UserStore::new(connect_in_memory().await.unwrap())
    }

    fn new_user(username: &str) -> UserCreate {
        UserCreate {
            id: UserId::generate(),
            username: Username::new(username),
            first_name: Some("Ada".to_string()),
            last_name: None,
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = setup_store().await;
        let created = store.create(&new_user("alice")).await.unwrap();

        assert_eq!(created.username.as_str(), "alice");
        assert_eq!(created.first_name.as_deref(), Some("Ada"));
        assert_eq!(created.last_name, None);

        let by_id = store.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, created.username);

        let by_name = store.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_lookup_missing_returns_none() {
        let store = setup_store().await;
        assert!(store.get_by_id(&UserId::new("nope")).await.unwrap().is_none());
        assert!(store.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_username() {
        let store = setup_store().await;
        store.create(&new_user("alice")).await.unwrap();

        let result = store.create(&new_user("alice")).await;
        assert!(matches!(result, Err(AccountError::DuplicateUsername(name)) if name == "alice"));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_index_violations_are_not_username_conflicts() {
        let store = setup_store().await;
        let first = new_user("alice");
        store.create(&first).await.unwrap();

        let mut same_id = new_user("bob");
        same_id.id = first.id.clone();
        let result = store.create(&same_id).await;
        assert!(matches!(result, Err(AccountError::Database(_))), "{:?}", result);
        assert!(store.get_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all() {
        let store = setup_store().await;
        store.create(&new_user("alice")).await.unwrap();
        store.create(&new_user("bob")).await.unwrap();

        let users = store.list_all().await.unwrap();
        let mut names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_update_only_touches_present_fields() {
        let store = setup_store().await;
        let user = store.create(&new_user("alice")).await.unwrap();

        let patch = UserPatch {
            last_name: FieldUpdate::Set("Lovelace".to_string()),
            ..Default::default()
        };
        let updated = store.update(&user.id, &patch).await.unwrap();

        assert_eq!(updated.username.as_str(), "alice");
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert_eq!(updated.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(updated.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_update_clears_name() {
        let store = setup_store().await;
        let user = store.create(&new_user("alice")).await.unwrap();

        let patch = UserPatch {
            first_name: FieldUpdate::Clear,
            ..Default::default()
        };
        let updated = store.update(&user.id, &patch).await.unwrap();
        assert_eq!(updated.first_name, None);
    }

    #[tokio::test]
    async fn test_update_rename_collision() {
        let store = setup_store().await;
        store.create(&new_user("alice")).await.unwrap();
        let bob = store.create(&new_user("bob")).await.unwrap();

        let patch = UserPatch {
            username: Some(Username::new("alice")),
            ..Default::default()
        };
        let result = store.update(&bob.id, &patch).await;
        assert!(matches!(result, Err(AccountError::DuplicateUsername(_))));

        let still_bob = store.get_by_id(&bob.id).await.unwrap().unwrap();
        assert_eq!(still_bob.username.as_str(), "bob");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = setup_store().await;
        let result = store
            .update(&UserId::new("missing"), &UserPatch::default())
            .await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup_store().await;
        let user = store.create(&new_user("alice")).await.unwrap();

        store.delete(&user.id).await.unwrap();
        assert!(store.get_by_id(&user.id).await.unwrap().is_none());

        let again = store.delete(&user.id).await;
        assert!(matches!(again, Err(AccountError::NotFound(_))));
    }
}
