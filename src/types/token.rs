//! Token Types
//!
//! Persisted token record and the validated inputs the manager works with.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Persisted session token.
///
/// Field names on the wire follow the stored record format (`phone`,
/// `expires`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token identifier, also the record key.
    pub id: String,
    /// Identity the token authenticates.
    #[serde(rename = "phone")]
    pub subject: String,
    /// Absolute expiry in epoch milliseconds.
    #[serde(rename = "expires")]
    pub expires_at: u64,
}

impl Token {
    /// Create a new token record.
    pub fn new(id: impl Into<String>, subject: impl Into<String>, expires_at: u64) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            expires_at,
        }
    }

    /// Check if token is still valid at `now_ms`.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        self.expires_at > now_ms
    }

    /// Check if token is expired at `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        !self.is_valid_at(now_ms)
    }

    /// Get remaining lifetime in milliseconds.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Check if token authenticates `subject` at `now_ms`.
    pub fn authenticates(&self, subject: &str, now_ms: u64) -> bool {
        self.subject == subject && self.is_valid_at(now_ms)
    }

    /// Short id prefix for log lines.
    pub fn log_id(&self) -> &str {
        id_prefix(&self.id)
    }
}

/// Shape-checked token identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenId(String);

impl TokenId {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    /// Get the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short id prefix for log lines.
    pub fn log_id(&self) -> &str {
        id_prefix(&self.0)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shape-checked subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subject(String);

impl Subject {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    /// Get the subject.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Non-empty, trimmed password.
#[derive(Clone)]
pub struct Password(SecretString);

impl Password {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(SecretString::new(value))
    }

    /// Get password value (for hashing only).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

fn id_prefix(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
