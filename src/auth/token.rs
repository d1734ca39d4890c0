//! Signed, time-limited access tokens.
//!
//! Tokens are HMAC-signed JWTs carrying only `sub` (the username) and `exp`
//! (unix seconds). Nothing is persisted: a token stays valid until it expires,
//! even if the account it names changes or disappears in the meantime.

use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::error::AuthError;
use crate::config::AuthConfig;

/// Type tag returned alongside every issued token.
pub const TOKEN_TYPE: &str = "bearer";

/// JWT claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (unix timestamp, seconds)
    pub exp: i64,
}

/// Token response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Issues and verifies access tokens with a fixed secret and algorithm.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service. Only HMAC algorithms are accepted since the
    /// key is a shared secret.
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("token signing secret must not be empty");
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            anyhow::bail!("unsupported token algorithm {:?}; use HS256, HS384 or HS512", algorithm);
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        let algorithm = config.algorithm()?;
        Self::new(&config.secret_key, algorithm, config.token_ttl())
    }

    /// Issue a token for `subject` with the configured lifetime.
    pub fn issue(&self, subject: &str) -> Result<AccessToken> {
        self.issue_with_ttl(subject, self.ttl)
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<AccessToken> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, ttl: Duration, now: DateTime<Utc>) -> Result<AccessToken> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow::anyhow!("token lifetime {} is out of range", ttl))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .context("Failed to create access token")?;

        Ok(AccessToken {
            access_token: token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and payload, then check expiry against `now`.
    ///
    /// A token is expired once `now >= exp`; there is no leeway.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp {
            debug!(subject = %claims.sub, "Rejected expired token");
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Algorithm::HS256, Duration::minutes(30)).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let issued = tokens.issue("alice").unwrap();
        assert_eq!(issued.token_type, "bearer");

        let claims = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let tokens = service();
        let issued = tokens.issue_with_ttl("alice", Duration::zero()).unwrap();
        assert_eq!(tokens.verify(&issued.access_token), Err(AuthError::Expired));
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = service();
        let issued_at = Utc::now();
        let ttl = Duration::minutes(15);
        let issued = tokens.issue_at("alice", ttl, issued_at).unwrap();
        let token = &issued.access_token;

        let just_before = issued_at + ttl - Duration::seconds(1);
        assert_eq!(tokens.verify_at(token, just_before).unwrap().sub, "alice");

        assert_eq!(tokens.verify_at(token, issued_at + ttl), Err(AuthError::Expired));

        let just_after = issued_at + ttl + Duration::seconds(1);
        assert_eq!(tokens.verify_at(token, just_after), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issued = service().issue("alice").unwrap();
        let other =
            TokenService::new("other-secret", Algorithm::HS256, Duration::minutes(30)).unwrap();

        assert!(matches!(
            other.verify(&issued.access_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_algorithm_is_invalid() {
        let issued = TokenService::new("test-secret", Algorithm::HS512, Duration::minutes(30))
            .unwrap()
            .issue("alice")
            .unwrap();

        assert!(matches!(
            service().verify(&issued.access_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = service();
        assert!(matches!(tokens.verify("not.a.jwt"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(tokens.verify(""), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_missing_subject_is_invalid() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoSubject {
                exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(service().verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_out_of_range_expiry_is_an_error() {
        let tokens = service();
        assert!(tokens.issue_with_ttl("alice", Duration::MAX).is_err());
        assert!(tokens.issue_at("alice", Duration::days(1), DateTime::<Utc>::MAX_UTC).is_err());
    }

    #[test]
    fn test_from_config_rejects_oversized_lifetime() {
        let mut config = AuthConfig::new("s3cret");
        config.access_token_expire_minutes = 1_000_000_000_000;
        assert!(TokenService::from_config(&config).is_err());

        config.access_token_expire_minutes = 60;
        let tokens = TokenService::from_config(&config).unwrap();
        let issued = tokens.issue("alice").unwrap();
        assert_eq!(tokens.verify(&issued.access_token).unwrap().sub, "alice");
    }

    #[test]
    fn test_rejects_non_hmac_or_empty_secret() {
        assert!(TokenService::new("secret", Algorithm::RS256, Duration::minutes(1)).is_err());
        assert!(TokenService::new("", Algorithm::HS256, Duration::minutes(1)).is_err());
    }
}
