//! Telemetry
//!
//! Observability components for token lifecycle operations. Log events go
//! through `tracing` directly; this module holds the metrics side.

pub mod metrics;

pub use metrics::{
    create_in_memory_metrics, no_op_metrics, InMemoryMetrics, IssuePhase, MetricEntry,
    MetricLabels, NoOpMetrics, TokenMetrics, TokenOperation,
};
