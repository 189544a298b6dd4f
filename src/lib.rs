//! Token Lifecycle Module
//!
//! Opaque session tokens for password-authenticated subjects.
//!
//! # Features
//!
//! - Token issuance after password verification
//! - Token lookup (raw record, no expiry filtering)
//! - Explicit renewal with a sliding one-hour window
//! - Revocation
//! - Verification of a token against a subject
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use token_lifecycle::{
//!     token_manager_config, DefaultTokenLifecycleManager, FileRecordStore,
//!     HmacPasswordHasher, TokenLifecycleManager,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = token_manager_config()
//!         .ttl(std::time::Duration::from_secs(3600))
//!         .build()?;
//!
//!     let store = Arc::new(FileRecordStore::new("./.data"));
//!     let hasher = Arc::new(HmacPasswordHasher::from_env()?);
//!     let manager = DefaultTokenLifecycleManager::new(config, store, hasher);
//!
//!     let token = manager.issue("5551234567", "correct horse").await?;
//!     assert!(manager.verify(&token.id, "5551234567").await);
//!
//!     manager.renew(&token.id, true).await?;
//!     manager.revoke(&token.id).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: token, account and configuration types
//! - `error`: error hierarchy with status codes and user messages
//! - `core`: clock, identifier generator, password hasher, input validation
//! - `store`: record store trait with in-memory, file and mock backends
//! - `token`: the lifecycle manager
//! - `handlers`: request handlers over loosely typed payloads
//! - `builders`: fluent builder for configuration
//! - `telemetry`: metrics

pub mod builders;
pub mod core;
pub mod error;
pub mod handlers;
pub mod store;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export builders
pub use builders::{token_manager_config, TokenManagerConfigBuilder};

// Re-export errors
pub use error::{
    get_user_message, AuthenticationError, ConfigurationError, RecordStoreError, StorageError,
    TokenError, TokenLifecycleError, TokenLifecycleResult, ValidationError,
};

// Re-export types
pub use types::{Password, Subject, Token, TokenId, TokenManagerConfig, UserAccount};

// Re-export core components
pub use crate::core::{
    // Clock
    Clock, MockClock, SystemClock,
    // Identifiers
    IdGenerator, MockIdGenerator, RandomIdGenerator,
    // Hashing
    HmacPasswordHasher, MockPasswordHasher, PasswordHasher,
    // Validation
    InputValidator,
};

// Re-export storage
pub use store::{
    create_file_record_store, create_in_memory_record_store, create_mock_record_store,
    FileRecordStore, InMemoryRecordStore, MockRecordStore, RecordStore, StoreCall, StoreOperation,
};

// Re-export token management
pub use token::{
    create_mock_token_lifecycle_manager, DefaultTokenLifecycleManager, MockTokenLifecycleManager,
    TokenLifecycleManager,
};

// Re-export handlers
pub use handlers::{HandlerResponse, TokenHandlers};

// Re-export telemetry
pub use telemetry::{
    create_in_memory_metrics, no_op_metrics, InMemoryMetrics, IssuePhase, MetricEntry,
    MetricLabels, NoOpMetrics, TokenMetrics, TokenOperation,
};
