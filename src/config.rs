use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::auth::password::{MAX_COST, MIN_COST};

pub const DEFAULT_ALGORITHM: &str = "HS256";
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
/// One year.
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 365;

/// Process-wide authentication settings, fixed at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens
    pub secret_key: String,
    /// JWT algorithm name (HS256, HS384 or HS512)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Lifetime of issued access tokens, in minutes
    #[serde(default = "default_expire_minutes")]
    pub access_token_expire_minutes: i64,
    /// bcrypt work factor for new password hashes
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

fn default_expire_minutes() -> i64 {
    DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthConfig {
    /// Config with the given secret and defaults for everything else.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_expire_minutes(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }

    /// Read `SECRET_KEY`, `ALGORITHM`, `ACCESS_TOKEN_EXPIRE_MINUTES` and
    /// `BCRYPT_COST` from the environment. Only the secret is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret_key = lookup("SECRET_KEY").ok_or_else(|| anyhow!("SECRET_KEY is not set"))?;
        let mut config = Self::new(secret_key);

        if let Some(algorithm) = lookup("ALGORITHM") {
            config.algorithm = algorithm;
        }
        if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            config.access_token_expire_minutes = minutes
                .trim()
                .parse()
                .with_context(|| format!("ACCESS_TOKEN_EXPIRE_MINUTES is not a number: {}", minutes))?;
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            config.bcrypt_cost = cost
                .trim()
                .parse()
                .with_context(|| format!("BCRYPT_COST is not a number: {}", cost))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.is_empty() {
            return Err(anyhow!("SECRET_KEY must not be empty"));
        }
        self.algorithm()?;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&self.access_token_expire_minutes) {
            return Err(anyhow!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {}, got {}",
                MAX_ACCESS_TOKEN_EXPIRE_MINUTES,
                self.access_token_expire_minutes
            ));
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            return Err(anyhow!(
                "BCRYPT_COST must be between {} and {}, got {}",
                MIN_COST,
                MAX_COST,
                self.bcrypt_cost
            ));
        }
        Ok(())
    }

    /// Parsed signing algorithm. Only HMAC variants are allowed.
    pub fn algorithm(&self) -> Result<Algorithm> {
        let algorithm = Algorithm::from_str(self.algorithm.trim())
            .map_err(|_| anyhow!("Unknown token algorithm: {}", self.algorithm))?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(anyhow!(
                "Token algorithm {:?} needs a key pair; only HS256, HS384 and HS512 are supported",
                other
            )),
        }
    }

    /// Token lifetime. Saturates instead of panicking on values that
    /// [`AuthConfig::validate`] would reject.
    pub fn token_ttl(&self) -> Duration {
        Duration::try_minutes(self.access_token_expire_minutes).unwrap_or(Duration::MAX)
    }
}
