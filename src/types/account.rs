//! Account Types
//!
//! Read-only view of the user account record used for credential checks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User account record as stored in the users collection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Account key, the token subject.
    pub phone: String,
    /// One-way digest of the account password.
    pub hashed_password: String,
    /// Profile fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl UserAccount {
    /// Create account record.
    pub fn new(phone: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            hashed_password: hashed_password.into(),
            extra: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("phone", &self.phone)
            .field("hashed_password", &"[REDACTED]")
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
