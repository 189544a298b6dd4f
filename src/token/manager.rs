//! Token Manager
//!
//! Issues, looks up, renews, revokes and verifies session tokens.
//!
//! Every operation re-reads the current record from the store; nothing is
//! cached between calls. Concurrent renewals of the same token are
//! last-writer-wins, atomicity of a single write is the store's business.

use async_trait::async_trait;
use constant_time_eq::constant_time_eq;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::builders::TokenManagerConfigBuilder;
use crate::core::{
    Clock, HmacPasswordHasher, IdGenerator, InputValidator, PasswordHasher, RandomIdGenerator,
    SystemClock, ENV_HASHING_SECRET,
};
use crate::error::{
    AuthenticationError, ConfigurationError, StorageError, TokenError, TokenLifecycleError,
    TokenLifecycleResult,
};
use crate::store::RecordStore;
use crate::telemetry::{IssuePhase, NoOpMetrics, TokenMetrics, TokenOperation};
use crate::types::{Subject, Token, TokenId, TokenManagerConfig, UserAccount};

/// Token lifecycle manager interface.
#[async_trait]
pub trait TokenLifecycleManager: Send + Sync {
    /// Verify credentials and mint a new token for `subject`.
    async fn issue(&self, subject: &str, password: &str) -> TokenLifecycleResult<Token>;

    /// Get the stored token record, expired or not.
    async fn get(&self, token_id: &str) -> TokenLifecycleResult<Token>;

    /// Push expiry to `now + ttl`. `extend` must be true.
    async fn renew(&self, token_id: &str, extend: bool) -> TokenLifecycleResult<()>;

    /// Delete a token. Expired tokens can still be revoked.
    async fn revoke(&self, token_id: &str) -> TokenLifecycleResult<()>;

    /// Check that `token_id` currently authenticates `subject`. Never errors.
    async fn verify(&self, token_id: &str, subject: &str) -> bool;
}

/// Default token lifecycle manager implementation.
pub struct DefaultTokenLifecycleManager<S: RecordStore + ?Sized> {
    config: TokenManagerConfig,
    validator: InputValidator,
    store: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
    id_generator: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn TokenMetrics>,
}

impl<S: RecordStore + ?Sized> DefaultTokenLifecycleManager<S> {
    /// Create new token manager using the system clock and random ids.
    pub fn new(config: TokenManagerConfig, store: Arc<S>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            validator: InputValidator::new(&config),
            config,
            store,
            hasher,
            id_generator: Arc::new(RandomIdGenerator::new()),
            clock: Arc::new(SystemClock::new()),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Create token manager configured from process environment variables.
    ///
    /// Requires `HASHING_SECRET`; the `TOKEN_*` variables are optional.
    pub fn from_env(store: Arc<S>) -> TokenLifecycleResult<Self> {
        Self::from_lookup(store, |name| std::env::var(name).ok())
    }

    /// Create token manager configured from an arbitrary variable lookup.
    pub fn from_lookup<F>(store: Arc<S>, lookup: F) -> TokenLifecycleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = TokenManagerConfigBuilder::from_lookup(&lookup)?.build()?;

        let secret = lookup(ENV_HASHING_SECRET).ok_or_else(|| {
            ConfigurationError::MissingRequired {
                field: ENV_HASHING_SECRET.to_string(),
            }
        })?;
        let hasher = HmacPasswordHasher::new(&SecretString::new(secret))?;

        Ok(Self::new(config, store, Arc::new(hasher)))
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the identifier generator.
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Replace the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn TokenMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &TokenManagerConfig {
        &self.config
    }

    fn tokens(&self) -> &str {
        &self.config.tokens_collection
    }

    fn expiry_from(&self, now_ms: u64) -> u64 {
        now_ms.saturating_add(self.config.ttl_ms())
    }

    fn record_phase(&self, phase: IssuePhase, started: Instant) {
        self.metrics
            .record_issue_phase(phase, started.elapsed().as_secs_f64() * 1000.0);
    }

    fn observe<T>(&self, operation: TokenOperation, result: &TokenLifecycleResult<T>) {
        self.metrics.record_operation(operation, result.is_ok());
        if let Err(e) = result {
            self.metrics.record_error(operation, e.error_code());
            debug!(
                operation = operation.as_str(),
                code = e.error_code(),
                error = %e,
                "token operation failed"
            );
        }
    }

    async fn load_account(&self, subject: &Subject) -> Result<UserAccount, AuthenticationError> {
        let record = self
            .store
            .read(&self.config.users_collection, subject.as_str())
            .await
            .map_err(|e| {
                if !e.is_not_found() {
                    warn!(error = %e, "account read failed");
                }
                AuthenticationError::UserNotFound
            })?;

        serde_json::from_value(record).map_err(|e| {
            warn!(error = %e, "account record unreadable");
            AuthenticationError::UserNotFound
        })
    }

    /// Read and decode a token; any failure is reported as not found.
    async fn load_token(&self, id: &TokenId) -> TokenLifecycleResult<Token> {
        let not_found = || TokenLifecycleError::from(TokenError::NotFound { id: id.to_string() });

        let record = match self.store.read(self.tokens(), id.as_str()).await {
            Ok(record) => record,
            Err(e) => {
                if !e.is_not_found() {
                    warn!(token = id.log_id(), error = %e, "token read failed");
                }
                return Err(not_found());
            }
        };

        serde_json::from_value(record).map_err(|e| {
            warn!(token = id.log_id(), error = %e, "token record unreadable");
            not_found()
        })
    }

    async fn issue_token(&self, subject: &str, password: &str) -> TokenLifecycleResult<Token> {
        let started = Instant::now();
        let subject = self.validator.subject(subject)?;
        let password = self.validator.password(password)?;
        self.record_phase(IssuePhase::Validation, started);

        let lookup_started = Instant::now();
        let account = self.load_account(&subject).await;
        self.record_phase(IssuePhase::UserLookup, lookup_started);
        let account = account?;

        let hashing_started = Instant::now();
        let digest = self.hasher.hash(password.expose());
        self.record_phase(IssuePhase::PasswordHashing, hashing_started);

        if !constant_time_eq(digest.as_bytes(), account.hashed_password.as_bytes()) {
            warn!("password mismatch on token issue");
            return Err(AuthenticationError::PasswordMismatch.into());
        }

        let storing_started = Instant::now();
        let id = self.id_generator.generate(self.config.token_id_length);
        let token = Token::new(id, subject.as_str(), self.expiry_from(self.clock.now_ms()));

        let record = serde_json::to_value(&token).map_err(|e| StorageError::WriteFailed {
            message: e.to_string(),
        })?;

        let created = self.store.create(self.tokens(), &token.id, record).await;
        self.record_phase(IssuePhase::TokenStoring, storing_started);

        if let Err(e) = created {
            error!(token = token.log_id(), error = %e, "could not store new token");
            return Err(StorageError::WriteFailed {
                message: e.to_string(),
            }
            .into());
        }

        self.record_phase(IssuePhase::Total, started);
        info!(token = token.log_id(), expires_at = token.expires_at, "token issued");
        Ok(token)
    }

    async fn get_token(&self, token_id: &str) -> TokenLifecycleResult<Token> {
        let id = self.validator.token_id(token_id)?;
        self.load_token(&id).await
    }

    async fn renew_token(&self, token_id: &str, extend: bool) -> TokenLifecycleResult<()> {
        let id = self.validator.token_id(token_id)?;
        self.validator.extend(extend)?;

        let mut token = self.load_token(&id).await?;
        let now = self.clock.now_ms();

        if token.is_expired_at(now) {
            info!(
                token = id.log_id(),
                expired_at = token.expires_at,
                "refusing to renew expired token"
            );
            return Err(TokenError::Expired {
                id: id.to_string(),
                expired_at: token.expires_at,
            }
            .into());
        }

        // max() keeps expiry monotonic if the clock steps backwards.
        token.expires_at = token.expires_at.max(self.expiry_from(now));

        let record = serde_json::to_value(&token).map_err(|e| StorageError::UpdateFailed {
            message: e.to_string(),
        })?;

        self.store
            .update(self.tokens(), id.as_str(), record)
            .await
            .map_err(|e| -> TokenLifecycleError {
                if e.is_not_found() {
                    // Revoked between our read and write.
                    return TokenError::NotFound { id: id.to_string() }.into();
                }
                error!(token = id.log_id(), error = %e, "could not update token expiry");
                StorageError::UpdateFailed {
                    message: e.to_string(),
                }
                .into()
            })?;

        info!(token = id.log_id(), expires_at = token.expires_at, "token renewed");
        Ok(())
    }

    async fn revoke_token(&self, token_id: &str) -> TokenLifecycleResult<()> {
        let id = self.validator.token_id(token_id)?;
        self.load_token(&id).await?;

        self.store
            .delete(self.tokens(), id.as_str())
            .await
            .map_err(|e| -> TokenLifecycleError {
                if e.is_not_found() {
                    return TokenError::NotFound { id: id.to_string() }.into();
                }
                error!(token = id.log_id(), error = %e, "could not delete token");
                StorageError::DeleteFailed {
                    message: e.to_string(),
                }
                .into()
            })?;

        info!(token = id.log_id(), "token revoked");
        Ok(())
    }
}

#[async_trait]
impl<S: RecordStore + ?Sized> TokenLifecycleManager for DefaultTokenLifecycleManager<S> {
    #[tracing::instrument(name = "token.issue", skip_all)]
    async fn issue(&self, subject: &str, password: &str) -> TokenLifecycleResult<Token> {
        debug!("issuing token");
        let result = self.issue_token(subject, password).await;
        self.observe(TokenOperation::Issue, &result);
        result
    }

    #[tracing::instrument(name = "token.get", skip_all)]
    async fn get(&self, token_id: &str) -> TokenLifecycleResult<Token> {
        debug!("reading token");
        let result = self.get_token(token_id).await;
        self.observe(TokenOperation::Get, &result);
        result
    }

    #[tracing::instrument(name = "token.renew", skip_all)]
    async fn renew(&self, token_id: &str, extend: bool) -> TokenLifecycleResult<()> {
        debug!(extend, "renewing token");
        let result = self.renew_token(token_id, extend).await;
        self.observe(TokenOperation::Renew, &result);
        result
    }

    #[tracing::instrument(name = "token.revoke", skip_all)]
    async fn revoke(&self, token_id: &str) -> TokenLifecycleResult<()> {
        debug!("revoking token");
        let result = self.revoke_token(token_id).await;
        self.observe(TokenOperation::Revoke, &result);
        result
    }

    #[tracing::instrument(name = "token.verify", skip_all)]
    async fn verify(&self, token_id: &str, subject: &str) -> bool {
        let valid = match self.validator.token_id(token_id) {
            Ok(id) => match self.load_token(&id).await {
                Ok(token) => token.authenticates(subject, self.clock.now_ms()),
                Err(_) => false,
            },
            Err(_) => false,
        };

        self.metrics.record_operation(TokenOperation::Verify, valid);
        valid
    }
}

/// Mock token lifecycle manager for testing.
#[derive(Default)]
pub struct MockTokenLifecycleManager {
    tokens: std::sync::Mutex<HashMap<String, Token>>,
    issue_history: std::sync::Mutex<Vec<String>>,
    renew_history: std::sync::Mutex<Vec<(String, bool)>>,
    revoke_history: std::sync::Mutex<Vec<String>>,
    next_error: std::sync::Mutex<Option<TokenLifecycleError>>,
}

impl MockTokenLifecycleManager {
    /// Create new mock token lifecycle manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next fallible call return `error`.
    pub fn set_next_error(&self, error: TokenLifecycleError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Pre-populate a token.
    pub fn add_token(&self, token: Token) -> &Self {
        self.tokens.lock().unwrap().insert(token.id.clone(), token);
        self
    }

    /// Subjects passed to `issue`.
    pub fn get_issue_history(&self) -> Vec<String> {
        self.issue_history.lock().unwrap().clone()
    }

    /// Arguments passed to `renew`.
    pub fn get_renew_history(&self) -> Vec<(String, bool)> {
        self.renew_history.lock().unwrap().clone()
    }

    /// Ids passed to `revoke`.
    pub fn get_revoke_history(&self) -> Vec<String> {
        self.revoke_history.lock().unwrap().clone()
    }

    fn check_error(&self) -> TokenLifecycleResult<()> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }

    fn not_found(token_id: &str) -> TokenLifecycleError {
        TokenError::NotFound {
            id: token_id.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl TokenLifecycleManager for MockTokenLifecycleManager {
    async fn issue(&self, subject: &str, _password: &str) -> TokenLifecycleResult<Token> {
        self.check_error()?;
        self.issue_history.lock().unwrap().push(subject.to_string());

        let mut tokens = self.tokens.lock().unwrap();
        let token = Token::new(
            format!("{:020}", tokens.len() + 1),
            subject,
            MOCK_EXPIRES_AT,
        );
        tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn get(&self, token_id: &str) -> TokenLifecycleResult<Token> {
        self.check_error()?;
        self.tokens
            .lock()
            .unwrap()
            .get(token_id)
            .cloned()
            .ok_or_else(|| Self::not_found(token_id))
    }

    async fn renew(&self, token_id: &str, extend: bool) -> TokenLifecycleResult<()> {
        self.check_error()?;
        self.renew_history
            .lock()
            .unwrap()
            .push((token_id.to_string(), extend));

        if !self.tokens.lock().unwrap().contains_key(token_id) {
            return Err(Self::not_found(token_id));
        }
        Ok(())
    }

    async fn revoke(&self, token_id: &str) -> TokenLifecycleResult<()> {
        self.check_error()?;
        self.revoke_history.lock().unwrap().push(token_id.to_string());

        self.tokens
            .lock()
            .unwrap()
            .remove(token_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(token_id))
    }

    async fn verify(&self, token_id: &str, subject: &str) -> bool {
        self.tokens
            .lock()
            .unwrap()
            .get(token_id)
            .map(|t| t.subject == subject)
            .unwrap_or(false)
    }
}

/// Expiry stamped on tokens minted by the mock.
pub const MOCK_EXPIRES_AT: u64 = u64::MAX;

/// Create mock token lifecycle manager for testing.
pub fn create_mock_token_lifecycle_manager() -> MockTokenLifecycleManager {
    MockTokenLifecycleManager::new()
}
