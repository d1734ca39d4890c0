//! HTTP server bootstrap.

use anyhow::Result;
use tracing::info;

use crate::api::{AppState, create_router};
use crate::config::AuthConfig;
use crate::db::{DatabaseConfig, create_connection, ensure_schema};

/// Connect to the store, apply the schema and serve the account API on
/// `bind` until the process is stopped.
///
/// # Arguments
/// * `bind` - The address to bind to (e.g., "127.0.0.1:8000")
/// * `db_config` - Where the credential store lives
/// * `auth_config` - Token signing and password hashing settings
pub async fn start_http(
    bind: &str,
    db_config: DatabaseConfig,
    auth_config: &AuthConfig,
) -> Result<()> {
    info!("Using credential store at {}", db_config.url);
    let db = create_connection(db_config).await?;
    ensure_schema(&db).await?;

    let state = AppState::from_config(db, auth_config)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(
        "Account API listening on http://{} (tokens: {}, ttl {} min)",
        bind, auth_config.algorithm, auth_config.access_token_expire_minutes
    );

    axum::serve(listener, router).await?;

    Ok(())
}
