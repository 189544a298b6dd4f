//! Token Lifecycle Types
//!
//! Data structures shared by the manager, stores and handlers.

pub mod account;
pub mod config;
pub mod token;

pub use account::UserAccount;
pub use config::{
    TokenManagerConfig, DEFAULT_SUBJECT_LENGTH, DEFAULT_TOKENS_COLLECTION,
    DEFAULT_TOKEN_ID_LENGTH, DEFAULT_TOKEN_TTL, DEFAULT_USERS_COLLECTION,
};
pub use token::{Password, Subject, Token, TokenId};
