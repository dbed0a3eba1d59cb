//! Observability for the compilers
//!
//! - Structured logging (JSON lines on stderr)
//! - Compile counters
//! - Begin/complete scopes around each compile
//!
//! # Principles
//!
//! 1. Observability is read-only: nothing logged or counted changes output
//! 2. Synchronous, no background threads
//! 3. Deterministic key ordering in log lines
//!
//! # Usage
//!
//! ```ignore
//! use redquery::observability::{Logger, Severity, CompileMetrics, ObservationScope};
//!
//! Logger::set_min_severity(Severity::Info);
//! let metrics = CompileMetrics::new();
//! let scope = ObservationScope::with_fields("COMPILE_QUERY", &[("index", "person-idx")]);
//! // ... compile ...
//! scope.complete();
//! metrics.increment_queries_compiled();
//! ```

mod logger;
mod metrics;
mod scope;

pub use logger::{Logger, Severity};
pub use metrics::{CompileMetrics, MetricsSnapshot};
pub use scope::ObservationScope;
