//! Password hashing with bcrypt.

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// Longest password bcrypt can hash without truncating it. The algorithm
/// reads 72 bytes including a trailing NUL.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// One-way salted hashing of stored credentials.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit work factor (4..=31).
    pub fn new(cost: u32) -> Result<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            anyhow::bail!("bcrypt cost must be between {} and {}, got {}", MIN_COST, MAX_COST, cost);
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Whether `password` fits in a bcrypt hash without truncation.
    pub fn accepts(password: &str) -> bool {
        password.len() <= MAX_PASSWORD_BYTES
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Fails for passwords longer than [`MAX_PASSWORD_BYTES`] instead of
    /// hashing a truncated prefix.
    pub fn hash(&self, password: &str) -> Result<String> {
        if !Self::accepts(password) {
            anyhow::bail!(
                "password is {} bytes; at most {} are allowed",
                password.len(),
                MAX_PASSWORD_BYTES
            );
        }
        bcrypt::non_truncating_hash(password, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A hash that cannot be parsed counts as a mismatch, and so does a
    /// password too long to have been hashed in the first place.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        if !Self::accepts(plain) {
            debug!(len = plain.len(), "Password exceeds bcrypt input length");
            return false;
        }
        match bcrypt::non_truncating_verify(plain, hash) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("Stored password hash is unusable: {}", e);
                false
            }
        }
    }

    /// [`PasswordHasher::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("Password hashing task failed")?
    }

    /// [`PasswordHasher::verify`] on the blocking thread pool.
    pub async fn verify_blocking(&self, plain: String, hash: String) -> bool {
        let hasher = self.clone();
        match tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Password verification task failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_COST).unwrap()
    }

    #[test]
    fn test_hash_and_verify_correct() {
        let hasher = fast_hasher();
        let hash = hasher.hash("my-secure-password").unwrap();
        assert!(hasher.verify("my-secure-password", &hash));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct-password").unwrap();
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn test_distinct_passwords_never_cross_verify() {
        let hasher = fast_hasher();
        let passwords = ["", "a", "A", "password", "password ", "pässwörd", "0123456789"];
        let hashes: Vec<String> = passwords.iter().map(|p| hasher.hash(p).unwrap()).collect();

        for (i, hash) in hashes.iter().enumerate() {
            for (j, candidate) in passwords.iter().enumerate() {
                assert_eq!(hasher.verify(candidate, hash), i == j, "{:?} vs #{}", candidate, i);
            }
        }
    }

    #[test]
    fn test_salts_differ() {
        let hasher = fast_hasher();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same-password", &hash1));
        assert!(hasher.verify("same-password", &hash2));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn test_long_passwords_are_not_truncated() {
        let hasher = fast_hasher();
        let longest = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hasher.hash(&longest).unwrap();
        assert!(hasher.verify(&longest, &hash));
        assert!(!hasher.verify(&"a".repeat(MAX_PASSWORD_BYTES - 1), &hash));

        let shared_prefix = "a".repeat(72);
        assert!(hasher.hash(&format!("{}first", shared_prefix)).is_err());
        assert!(hasher.hash(&"a".repeat(MAX_PASSWORD_BYTES + 1)).is_err());
        assert!(!hasher.verify(&format!("{}second", shared_prefix), &hash));
    }

    #[test]
    fn test_multibyte_length_counts_bytes() {
        // 36 two-byte characters = 72 bytes
        let password = "ä".repeat(36);
        assert!(!PasswordHasher::accepts(&password));
        assert!(PasswordHasher::accepts(&"ä".repeat(35)));
    }

    #[tokio::test]
    async fn test_blocking_pool_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash_blocking("wonderland".to_string()).await.unwrap();
        assert!(hasher.verify_blocking("wonderland".to_string(), hash.clone()).await);
        assert!(!hasher.verify_blocking("looking-glass".to_string(), hash).await);
        assert!(hasher.hash_blocking("x".repeat(100)).await.is_err());
    }

    #[test]
    fn test_cost_bounds() {
        assert!(PasswordHasher::new(3).is_err());
        assert!(PasswordHasher::new(32).is_err());
        assert_eq!(PasswordHasher::new(10).unwrap().cost(), 10);
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}
