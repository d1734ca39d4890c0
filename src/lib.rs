mod config;
mod types;
pub mod accounts;
pub mod api;
pub mod auth;
pub mod db;
pub mod server;

pub use accounts::{AccountError, AccountService, User, UserUpdate};
pub use api::{AppState, create_router};
pub use auth::{AccessToken, AuthError, AuthGate, PasswordHasher, TokenService, UserStore};
pub use config::AuthConfig;
pub use db::{DatabaseConfig, Db, create_connection, ensure_schema};
pub use types::{UserId, Username};
