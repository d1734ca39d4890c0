// REST API for user accounts

mod error;
mod extract;
pub mod users;


pub use error::ApiError;
pub use extract::{Accounts, BearerToken, CurrentUser};

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    response::Json,
    routing::{delete, get, patch, post},
};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::accounts::AccountService;
use crate::auth::{PasswordHasher, TokenService, UserStore};
use crate::config::AuthConfig;
use crate::db::Db;

/// Shared, read-only state handed to every request.
///
/// Holds the database handle rather than a store: each request builds its
/// own `AccountService` from it.
#[derive(Clone)]
pub struct AppState {
    db: Db,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: Db, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            db,
            hasher: Arc::new(hasher),
            tokens: Arc::new(tokens),
        }
    }

    pub fn from_config(db: Db, config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            db,
            PasswordHasher::new(config.bcrypt_cost)?,
            TokenService::from_config(config)?,
        ))
    }

    /// Account service bound to a fresh store handle.
    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            UserStore::new(self.db.clone()),
            self.hasher.clone(),
            self.tokens.clone(),
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/register/", post(users::register))
        .route("/login/", post(users::login))
        .route("/users/", get(users::list_users))
        .route("/users/{id}/", get(users::get_user))
        .route("/users/{id}/delete/", delete(users::delete_user))
        .route("/user/me/", get(users::me))
        .route("/user/me/edit/", patch(users::update_me))
        .route("/user/me/delete/", delete(users::delete_me))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
