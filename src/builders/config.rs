//! Configuration Builder
//!
//! Fluent builder for token manager configuration.

use std::time::Duration;

use crate::error::ConfigurationError;
use crate::types::{
    TokenManagerConfig, DEFAULT_SUBJECT_LENGTH, DEFAULT_TOKENS_COLLECTION,
    DEFAULT_TOKEN_ID_LENGTH, DEFAULT_TOKEN_TTL, DEFAULT_USERS_COLLECTION,
};

/// Environment variable overriding the token lifetime in seconds.
pub const ENV_TOKEN_TTL_SECS: &str = "TOKEN_TTL_SECS";
/// Environment variable overriding the token identifier length.
pub const ENV_TOKEN_ID_LENGTH: &str = "TOKEN_ID_LENGTH";
/// Environment variable overriding the subject length.
pub const ENV_SUBJECT_LENGTH: &str = "TOKEN_SUBJECT_LENGTH";

const MIN_TOKEN_ID_LENGTH: usize = 16;
const MAX_TOKEN_ID_LENGTH: usize = 128;

/// Token manager configuration builder.
#[derive(Debug, Clone)]
pub struct TokenManagerConfigBuilder {
    ttl: Duration,
    token_id_length: usize,
    subject_length: usize,
    tokens_collection: String,
    users_collection: String,
}

impl TokenManagerConfigBuilder {
    /// Create new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            ttl: DEFAULT_TOKEN_TTL,
            token_id_length: DEFAULT_TOKEN_ID_LENGTH,
            subject_length: DEFAULT_SUBJECT_LENGTH,
            tokens_collection: DEFAULT_TOKENS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
        }
    }

    /// Create builder seeded from process environment variables.
    ///
    /// Reads `TOKEN_TTL_SECS`, `TOKEN_ID_LENGTH` and `TOKEN_SUBJECT_LENGTH`;
    /// unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create builder seeded from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_TOKEN_TTL_SECS)? {
            builder = builder.ttl(Duration::from_secs(secs));
        }
        if let Some(length) = parse_var::<usize, _>(&lookup, ENV_TOKEN_ID_LENGTH)? {
            builder = builder.token_id_length(length);
        }
        if let Some(length) = parse_var::<usize, _>(&lookup, ENV_SUBJECT_LENGTH)? {
            builder = builder.subject_length(length);
        }

        Ok(builder)
    }

    /// Set token lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set generated token identifier length.
    pub fn token_id_length(mut self, length: usize) -> Self {
        self.token_id_length = length;
        self
    }

    /// Set required subject length.
    pub fn subject_length(mut self, length: usize) -> Self {
        self.subject_length = length;
        self
    }

    /// Set tokens collection name.
    pub fn tokens_collection(mut self, collection: impl Into<String>) -> Self {
        self.tokens_collection = collection.into();
        self
    }

    /// Set users collection name.
    pub fn users_collection(mut self, collection: impl Into<String>) -> Self {
        self.users_collection = collection.into();
        self
    }

    /// Build the token manager configuration.
    pub fn build(self) -> Result<TokenManagerConfig, ConfigurationError> {
        if self.ttl.as_millis() == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "ttl".to_string(),
                value: format!("{:?}", self.ttl),
            });
        }

        if !(MIN_TOKEN_ID_LENGTH..=MAX_TOKEN_ID_LENGTH).contains(&self.token_id_length) {
            return Err(ConfigurationError::InvalidValue {
                field: "token_id_length".to_string(),
                value: self.token_id_length.to_string(),
            });
        }

        if self.subject_length == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "subject_length".to_string(),
                value: "0".to_string(),
            });
        }

        validate_collection("tokens_collection", &self.tokens_collection)?;
        validate_collection("users_collection", &self.users_collection)?;

        if self.tokens_collection == self.users_collection {
            return Err(ConfigurationError::InvalidConfig {
                message: "tokens and users must live in different collections".to_string(),
            });
        }

        Ok(TokenManagerConfig {
            ttl: self.ttl,
            token_id_length: self.token_id_length,
            subject_length: self.subject_length,
            tokens_collection: self.tokens_collection,
            users_collection: self.users_collection,
        })
    }
}

impl Default for TokenManagerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigurationError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidValue {
                field: name.to_string(),
                value: raw,
            }),
    }
}

fn validate_collection(field: &str, name: &str) -> Result<(), ConfigurationError> {
    if name.is_empty() {
        return Err(ConfigurationError::MissingRequired {
            field: field.to_string(),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigurationError::InvalidValue {
            field: field.to_string(),
            value: name.to_string(),
        });
    }

    Ok(())
}

/// Create a new token manager configuration builder.
pub fn token_manager_config() -> TokenManagerConfigBuilder {
    TokenManagerConfigBuilder::new()
}
