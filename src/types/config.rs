//! Configuration Types
//!
//! Token manager configuration.

use std::time::Duration;

/// Default token lifetime (1 hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Default token identifier length.
pub const DEFAULT_TOKEN_ID_LENGTH: usize = 20;

/// Default subject length (10-digit phone number).
pub const DEFAULT_SUBJECT_LENGTH: usize = 10;

/// Default collection holding token records.
pub const DEFAULT_TOKENS_COLLECTION: &str = "tokens";

/// Default collection holding user account records.
pub const DEFAULT_USERS_COLLECTION: &str = "users";

/// Token manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenManagerConfig {
    /// Lifetime granted on issuance and on each renewal.
    pub ttl: Duration,
    /// Length of generated token identifiers.
    pub token_id_length: usize,
    /// Exact length a subject must have.
    pub subject_length: usize,
    /// Collection token records live in.
    pub tokens_collection: String,
    /// Collection account records are read from.
    pub users_collection: String,
}

impl TokenManagerConfig {
    /// TTL in milliseconds.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TOKEN_TTL,
            token_id_length: DEFAULT_TOKEN_ID_LENGTH,
            subject_length: DEFAULT_SUBJECT_LENGTH,
            tokens_collection: DEFAULT_TOKENS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
        }
    }
}
