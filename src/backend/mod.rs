// Backend module - query interface to the cluster and its implementations

mod memory;
mod statement;

#[cfg(feature = "cassandra")]
mod cassandra;

pub use memory::{BufferGauge, MemoryBackend, MemoryTable, QueryRecord};
pub use statement::{Consistency, Statement};

#[cfg(feature = "cassandra")]
pub use cassandra::{CassandraBackend, ConnectOptions};

use crate::core::{BackendError, RowObservation, TraceEvent};
use crate::policy::ExecutionPolicy;
use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

/// Lazy, finite, non-restartable sequence of scanned rows. Pages are fetched
/// as the stream is polled.
pub type RowStream<'a> = BoxStream<'a, Result<RowObservation, BackendError>>;

/// Result of an aggregate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResponse {
    pub count: i64,
    /// Set when tracing was requested and the coordinator recorded a session.
    pub tracing_id: Option<Uuid>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Submits a paged read and returns the row stream.
    async fn scan(
        &self,
        statement: &Statement,
        policy: &ExecutionPolicy,
    ) -> Result<RowStream<'_>, BackendError>;

    /// Submits an aggregate and waits for its single value.
    async fn count(
        &self,
        statement: &Statement,
        policy: &ExecutionPolicy,
    ) -> Result<CountResponse, BackendError>;

    /// Fetches the complete event list of a finished traced query.
    async fn fetch_trace(&self, tracing_id: Uuid) -> Result<Vec<TraceEvent>, BackendError>;

    async fn insert_blob(
        &self,
        statement: &Statement,
        key: i64,
        blob: &str,
        policy: &ExecutionPolicy,
    ) -> Result<(), BackendError>;
}
