use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use tracing::debug;

/// Shared handle to the credential store. Cloning is cheap; every clone talks
/// to the same underlying connection pool.
pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("ACCOUNTS_DB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("ACCOUNTS_DB_NAMESPACE")
                .unwrap_or_else(|_| "accounts".to_string()),
            database: env::var("ACCOUNTS_DB_DATABASE").unwrap_or_else(|_| "users".to_string()),
            username: env::var("ACCOUNTS_DB_USERNAME").ok(),
            password: env::var("ACCOUNTS_DB_PASSWORD").ok(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a throwaway in-process store.
    pub fn in_memory() -> Self {
        Self {
            url: "memory".to_string(),
            namespace: "accounts".to_string(),
            database: "users".to_string(),
            username: None,
            password: None,
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    debug!("Connecting to credential store at {}", config.url);
    let db = surrealdb::engine::any::connect(config.url).await?;

    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

/// Define the `user` table and its indexes.
///
/// Safe to run on every start. The UNIQUE index on `username` is what
/// actually guarantees uniqueness; the check done before registering is only
/// advisory.
pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = [
        "DEFINE TABLE IF NOT EXISTS user SCHEMALESS;",
        "DEFINE INDEX IF NOT EXISTS user_uid ON TABLE user COLUMNS uid UNIQUE;",
        "DEFINE INDEX IF NOT EXISTS user_username ON TABLE user COLUMNS username UNIQUE;",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}

/// Connect to an in-memory store with the schema applied. Used by tests and
/// by the CLI when no database URL is configured.
pub async fn connect_in_memory() -> Result<Db> {
    let db = create_connection(DatabaseConfig::in_memory()).await?;
    ensure_schema(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = connect_in_memory().await.unwrap();
        ensure_schema(&db).await.unwrap();
        ensure_schema(&db).await.unwrap();
    }

    #[test]
    fn test_in_memory_config() {
        let config = DatabaseConfig::in_memory();
        assert_eq!(config.url, "memory");
        assert!(config.username.is_none());
        assert!(config.password.is_none());
    }
}
