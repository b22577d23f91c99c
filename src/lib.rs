// countperf - read benchmark for Cassandra-compatible clusters
// Paged scan statistics plus a traced count, over one explicit session

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

// Core types (statistics, observations, traces, errors)
pub mod core;

// Execution profiles (default / long)
pub mod policy;

// Query interface to the cluster (in-memory and native driver)
pub mod backend;

// Explicit session handle shared by the executors
pub mod session;

// Scan, traced count, trace file, populate
pub mod executor;

// Config file + ENV + CLI settings
pub mod settings;

// Text / JSON output
pub mod report;

// tracing-subscriber setup for the binaries
pub mod logging;

// Re-export commonly used types for convenience
pub use crate::core::{BackendError, ConfigError, RowObservation, SizeStatistics, StatisticsAccumulator, TraceEvent};
pub use policy::{ExecutionPolicies, ExecutionPolicy, PolicyKind, Routing};
pub use backend::{Backend, MemoryBackend, MemoryTable, Statement};
pub use session::Session;
pub use executor::{CountReport, PagedScanExecutor, ScanReport, TracedAggregateExecutor};
pub use settings::BenchConfig;
pub use report::RunSummary;
