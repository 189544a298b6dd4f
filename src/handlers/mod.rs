//! Request Handlers
//!
//! Adapts loosely typed request data (JSON payloads and query maps) to the
//! token lifecycle manager and maps outcomes to status codes and bodies.
//! Transport wiring (routing, listening, body parsing) belongs to the caller.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::core::{required_bool, required_str};
use crate::error::{get_user_message, TokenError, TokenLifecycleError};
use crate::token::TokenLifecycleManager;
use crate::types::Token;

/// Payload and query field names.
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_ID: &str = "id";
pub const FIELD_EXTEND: &str = "extend";

/// Reason given when a revocation names an unknown token.
pub const REVOKE_NOT_FOUND: &str = "Could not find the specified token";

/// Status code plus optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl HandlerResponse {
    /// 200 with a body.
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    /// 200 without a body.
    pub fn empty() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }

    /// Error response with an `{"Error": reason}` body.
    pub fn error(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(json!({ "Error": reason.into() })),
        }
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn from_error(error: &TokenLifecycleError) -> Self {
        Self::error(error.status_code(), get_user_message(error))
    }

    /// Mutating endpoints report a missing token as a bad request.
    fn from_mutation_error(error: &TokenLifecycleError, not_found_reason: &str) -> Self {
        match error {
            TokenLifecycleError::Token(TokenError::NotFound { .. }) => {
                Self::error(400, not_found_reason)
            }
            _ => Self::from_error(error),
        }
    }
}

/// Token request handlers.
pub struct TokenHandlers<M: TokenLifecycleManager + ?Sized> {
    manager: Arc<M>,
}

impl<M: TokenLifecycleManager + ?Sized> TokenHandlers<M> {
    /// Create handlers over `manager`.
    pub fn new(manager: Arc<M>) -> Self {
        Self { manager }
    }

    /// Underlying manager.
    pub fn manager(&self) -> &Arc<M> {
        &self.manager
    }

    /// Issue a token. Requires `phone` and `password`.
    pub async fn post(&self, payload: &Value) -> HandlerResponse {
        let fields = required_str(payload, FIELD_PHONE)
            .and_then(|phone| Ok((phone, required_str(payload, FIELD_PASSWORD)?)));

        let (phone, password) = match fields {
            Ok(fields) => fields,
            Err(e) => return HandlerResponse::from_error(&e.into()),
        };

        match self.manager.issue(phone, password).await {
            Ok(token) => token_response(&token),
            Err(e) => HandlerResponse::from_error(&e),
        }
    }

    /// Look up a token by the `id` query parameter.
    pub async fn get(&self, query: &HashMap<String, String>) -> HandlerResponse {
        let Some(id) = query.get(FIELD_ID) else {
            return HandlerResponse::error(400, "Missing required fields");
        };

        match self.manager.get(id).await {
            Ok(token) => token_response(&token),
            Err(e) => HandlerResponse::from_error(&e),
        }
    }

    /// Renew a token. Requires `id` and `extend: true`.
    pub async fn put(&self, payload: &Value) -> HandlerResponse {
        let fields = required_str(payload, FIELD_ID)
            .and_then(|id| Ok((id, required_bool(payload, FIELD_EXTEND)?)));

        let (id, extend) = match fields {
            Ok(fields) => fields,
            Err(e) => return HandlerResponse::from_error(&e.into()),
        };

        match self.manager.renew(id, extend).await {
            Ok(()) => HandlerResponse::empty(),
            Err(e) => HandlerResponse::from_mutation_error(&e, &get_user_message(&e)),
        }
    }

    /// Revoke a token. Requires `id`.
    pub async fn delete(&self, payload: &Value) -> HandlerResponse {
        let id = match required_str(payload, FIELD_ID) {
            Ok(id) => id,
            Err(e) => return HandlerResponse::from_error(&e.into()),
        };

        match self.manager.revoke(id).await {
            Ok(()) => HandlerResponse::empty(),
            Err(e) => HandlerResponse::from_mutation_error(&e, REVOKE_NOT_FOUND),
        }
    }

    /// Check that `token_id` currently authenticates `subject`.
    pub async fn verify(&self, token_id: &str, subject: &str) -> bool {
        self.manager.verify(token_id, subject).await
    }
}

fn token_response(token: &Token) -> HandlerResponse {
    match serde_json::to_value(token) {
        Ok(body) => HandlerResponse::ok(body),
        Err(e) => {
            error!(token = token.log_id(), error = %e, "token serialization failed");
            HandlerResponse::error(500, "Could not serialize the token")
        }
    }
}

impl<M: TokenLifecycleManager + ?Sized> Clone for TokenHandlers<M> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}
