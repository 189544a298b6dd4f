//! Metrics
//!
//! Token lifecycle metrics collection interfaces and implementations.

use std::collections::HashMap;
use std::sync::Mutex;

/// Metric labels.
pub type MetricLabels = HashMap<String, String>;

/// Lifecycle operation being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenOperation {
    Issue,
    Get,
    Renew,
    Revoke,
    Verify,
}

impl TokenOperation {
    /// Label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Get => "get",
            Self::Renew => "renew",
            Self::Revoke => "revoke",
            Self::Verify => "verify",
        }
    }
}

/// Timed phase of token issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssuePhase {
    Validation,
    UserLookup,
    PasswordHashing,
    TokenStoring,
    Total,
}

impl IssuePhase {
    /// Label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::UserLookup => "user_lookup",
            Self::PasswordHashing => "password_hashing",
            Self::TokenStoring => "token_storing",
            Self::Total => "total",
        }
    }
}

/// Token metrics interface.
pub trait TokenMetrics: Send + Sync {
    /// Record the outcome of an operation.
    fn record_operation(&self, operation: TokenOperation, success: bool);

    /// Record an error by code.
    fn record_error(&self, operation: TokenOperation, error_code: &str);

    /// Record how long an issuance phase took.
    fn record_issue_phase(&self, phase: IssuePhase, duration_ms: f64);
}

/// No-op metrics implementation.
pub struct NoOpMetrics;

impl TokenMetrics for NoOpMetrics {
    fn record_operation(&self, _operation: TokenOperation, _success: bool) {}
    fn record_error(&self, _operation: TokenOperation, _error_code: &str) {}
    fn record_issue_phase(&self, _phase: IssuePhase, _duration_ms: f64) {}
}

/// No-op metrics singleton.
pub fn no_op_metrics() -> NoOpMetrics {
    NoOpMetrics
}

/// Metric entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct MetricEntry {
    pub name: String,
    pub value: f64,
    pub labels: MetricLabels,
    pub timestamp: u64,
}

/// In-memory metrics for testing.
pub struct InMemoryMetrics {
    entries: Mutex<Vec<MetricEntry>>,
}

impl InMemoryMetrics {
    /// Create new in-memory metrics.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Get all recorded entries.
    pub fn get_entries(&self) -> Vec<MetricEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Get entries by name.
    pub fn get_entries_by_name(&self, name: &str) -> Vec<MetricEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    /// Count entries matching a name and one label.
    pub fn count_with_label(&self, name: &str, label: &str, value: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name == name && e.labels.get(label).map(String::as_str) == Some(value))
            .count()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn record(&self, name: &str, value: f64, labels: MetricLabels) {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;

        self.entries.lock().unwrap().push(MetricEntry {
            name: name.to_string(),
            value,
            labels,
            timestamp: now,
        });
    }
}

impl Default for InMemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenMetrics for InMemoryMetrics {
    fn record_operation(&self, operation: TokenOperation, success: bool) {
        let mut labels = MetricLabels::new();
        labels.insert("operation".to_string(), operation.as_str().to_string());
        labels.insert("success".to_string(), success.to_string());
        self.record("token_operations_total", 1.0, labels);
    }

    fn record_error(&self, operation: TokenOperation, error_code: &str) {
        let mut labels = MetricLabels::new();
        labels.insert("operation".to_string(), operation.as_str().to_string());
        labels.insert("error_code".to_string(), error_code.to_string());
        self.record("token_errors_total", 1.0, labels);
    }

    fn record_issue_phase(&self, phase: IssuePhase, duration_ms: f64) {
        let mut labels = MetricLabels::new();
        labels.insert("phase".to_string(), phase.as_str().to_string());
        self.record("token_issue_phase_duration_ms", duration_ms, labels);
    }
}

/// Create in-memory metrics for testing.
pub fn create_in_memory_metrics() -> InMemoryMetrics {
    InMemoryMetrics::new()
}
