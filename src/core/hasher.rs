//! Password Hasher
//!
//! Deterministic one-way password digests.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::sync::Mutex;

use crate::error::ConfigurationError;

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the hashing secret.
pub const ENV_HASHING_SECRET: &str = "HASHING_SECRET";

/// Password hasher interface (for dependency injection).
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password. Same input, same digest.
    fn hash(&self, plaintext: &str) -> String;
}

/// HMAC-SHA256 hasher keyed with a server-side secret, hex encoded.
#[derive(Clone)]
pub struct HmacPasswordHasher {
    mac: HmacSha256,
}

impl HmacPasswordHasher {
    /// Create hasher keyed with `secret`.
    pub fn new(secret: &SecretString) -> Result<Self, ConfigurationError> {
        let key = secret.expose_secret();
        if key.is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "hashing_secret".to_string(),
            });
        }

        let mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| {
            ConfigurationError::InvalidConfig {
                message: format!("hashing secret rejected: {}", e),
            }
        })?;

        Ok(Self { mac })
    }

    /// Create hasher keyed from the `HASHING_SECRET` environment variable.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let secret = std::env::var(ENV_HASHING_SECRET).map_err(|_| {
            ConfigurationError::MissingRequired {
                field: ENV_HASHING_SECRET.to_string(),
            }
        })?;
        Self::new(&SecretString::new(secret))
    }
}

impl PasswordHasher for HmacPasswordHasher {
    fn hash(&self, plaintext: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for HmacPasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacPasswordHasher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Mock password hasher for testing.
///
/// Digest is `hashed:<plaintext>`.
#[derive(Default)]
pub struct MockPasswordHasher {
    hash_history: Mutex<Vec<String>>,
}

impl MockPasswordHasher {
    /// Create new mock password hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest the mock produces for `plaintext`.
    pub fn digest_of(plaintext: &str) -> String {
        format!("hashed:{}", plaintext)
    }

    /// Get number of hash calls.
    pub fn hash_count(&self) -> usize {
        self.hash_history.lock().unwrap().len()
    }
}

impl PasswordHasher for MockPasswordHasher {
    fn hash(&self, plaintext: &str) -> String {
        self.hash_history
            .lock()
            .unwrap()
            .push(plaintext.to_string());
        Self::digest_of(plaintext)
    }
}

/// Create mock password hasher for testing.
pub fn create_mock_password_hasher() -> MockPasswordHasher {
    MockPasswordHasher::new()
}
