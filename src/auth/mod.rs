//! Authentication primitives.
//!
//! - **password**: bcrypt hashing and verification of stored credentials
//! - **token**: HMAC-signed JWT issuance and verification
//! - **gate**: username/password checks and bearer-token resolution
//! - **user_store**: the SurrealDB-backed credential store
//!
//! ## Security Model
//!
//! - Tokens are stateless and carry only the username and an expiry
//! - There is no revocation; a token outlives changes to its account
//! - Login failures never reveal whether the username exists

mod error;
pub mod gate;
pub mod password;
pub mod token;
pub mod user_store;

pub use error::AuthError;
pub use gate::AuthGate;
pub use password::PasswordHasher;
pub use token::{AccessToken, Claims, TOKEN_TYPE, TokenService};
pub use user_store::UserStore;
