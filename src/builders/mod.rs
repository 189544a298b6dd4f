//! Builders
//!
//! Fluent builder patterns for token manager configuration.

pub mod config;

pub use config::{
    token_manager_config, TokenManagerConfigBuilder, ENV_SUBJECT_LENGTH, ENV_TOKEN_ID_LENGTH,
    ENV_TOKEN_TTL_SECS,
};
