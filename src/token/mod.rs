//! Token Management
//!
//! Session token lifecycle: issue, lookup, renewal, revocation and
//! verification against a record store.

pub mod manager;

pub use manager::{
    create_mock_token_lifecycle_manager, DefaultTokenLifecycleManager, MockTokenLifecycleManager,
    TokenLifecycleManager, MOCK_EXPIRES_AT,
};
