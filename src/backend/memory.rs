use super::{Backend, Consistency, CountResponse, RowStream, Statement};
use crate::core::{BackendError, RowObservation, TraceEvent};
use crate::policy::ExecutionPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

type RowGenerator = dyn Fn(u64) -> RowObservation + Send + Sync;

/// Simulated table. Rows are produced on demand by index, so a table of
/// any size costs nothing until it is scanned.
#[derive(Clone)]
pub struct MemoryTable {
    len: u64,
    generator: Arc<RowGenerator>,
}

impl MemoryTable {
    pub fn generated<F>(len: u64, generator: F) -> Self
    where
        F: Fn(u64) -> RowObservation + Send + Sync + 'static,
    {
        Self {
            len,
            generator: Arc::new(generator),
        }
    }

    /// Table with stored `(key, blob)` rows; `None` blobs are null payloads.
    pub fn from_rows(rows: Vec<(i64, Option<Bytes>)>) -> Self {
        let len = rows.len() as u64;
        let rows = Arc::new(rows);
        Self::generated(len, move |index| {
            let (key, blob) = &rows[index as usize];
            RowObservation::new(*key, blob.as_ref().map(|b| b.len() as u64))
        })
    }

    /// `len` rows keyed `0..len`, each with a payload of `payload_len` bytes.
    pub fn uniform(len: u64, payload_len: u64) -> Self {
        Self::generated(len, move |index| RowObservation::new(index as i64, Some(payload_len)))
    }

    pub const fn len(&self) -> u64 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn row(&self, index: u64) -> RowObservation {
        (self.generator)(index)
    }
}

impl fmt::Debug for MemoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTable").field("len", &self.len).finish_non_exhaustive()
    }
}

/// Counts rows that were fetched from the table but not yet handed to the
/// consumer of the scan stream.
#[derive(Debug, Default)]
pub struct BufferGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl BufferGauge {
    fn fill(&self, rows: usize) {
        let now = self.current.fetch_add(rows, Ordering::SeqCst) + rows;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn drain(&self, rows: usize) {
        self.current.fetch_sub(rows, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// What a query was submitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub cql: String,
    pub consistency: Consistency,
    pub page_size: u32,
    pub tracing: bool,
    pub policy: ExecutionPolicy,
}

/// In-process stand-in for a cluster: one table, paged reads, synthetic
/// traces and injectable faults.
pub struct MemoryBackend {
    table: MemoryTable,
    fail_after_pages: Option<(u64, BackendError)>,
    page_latency: Duration,
    count_latency: Duration,
    count_error: Option<BackendError>,
    drop_tracing_id: bool,
    trace: Result<Vec<TraceEvent>, BackendError>,
    insert_error_at: Option<(i64, BackendError)>,
    gauge: Arc<BufferGauge>,
    queries: Mutex<Vec<QueryRecord>>,
    inserted: Mutex<Vec<RowObservation>>,
    trace_fetches: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(table: MemoryTable) -> Self {
        Self {
            table,
            fail_after_pages: None,
            page_latency: Duration::ZERO,
            count_latency: Duration::ZERO,
            count_error: None,
            drop_tracing_id: false,
            trace: Ok(synthetic_trace()),
            insert_error_at: None,
            gauge: Arc::new(BufferGauge::default()),
            queries: Mutex::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
            trace_fetches: AtomicUsize::new(0),
        }
    }

    /// Pages `0..pages` are served, then the stream yields `error` and ends.
    pub fn with_failure_after_pages(mut self, pages: u64, error: BackendError) -> Self {
        self.fail_after_pages = Some((pages, error));
        self
    }

    /// Delay per page fetch, checked against the policy timeout.
    pub const fn with_page_latency(mut self, latency: Duration) -> Self {
        self.page_latency = latency;
        self
    }

    /// Delay of the aggregate, checked against the policy timeout.
    pub const fn with_count_latency(mut self, latency: Duration) -> Self {
        self.count_latency = latency;
        self
    }

    pub fn with_count_error(mut self, error: BackendError) -> Self {
        self.count_error = Some(error);
        self
    }

    /// Traced counts come back without a tracing id.
    pub const fn with_missing_tracing_id(mut self) -> Self {
        self.drop_tracing_id = true;
        self
    }

    pub fn with_trace(mut self, events: Vec<TraceEvent>) -> Self {
        self.trace = Ok(events);
        self
    }

    pub fn with_trace_error(mut self, error: BackendError) -> Self {
        self.trace = Err(error);
        self
    }

    pub fn with_insert_error_at(mut self, key: i64, error: BackendError) -> Self {
        self.insert_error_at = Some((key, error));
        self
    }

    pub fn gauge(&self) -> Arc<BufferGauge> {
        Arc::clone(&self.gauge)
    }

    pub fn queries(&self) -> Vec<QueryRecord> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn inserted(&self) -> Vec<RowObservation> {
        self.inserted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn trace_fetches(&self) -> usize {
        self.trace_fetches.load(Ordering::SeqCst)
    }

    fn record(&self, statement: &Statement, policy: &ExecutionPolicy) {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(QueryRecord {
                cql: statement.cql.clone(),
                consistency: statement.consistency,
                page_size: statement.page_size,
                tracing: statement.tracing,
                policy: policy.clone(),
            });
    }
}

/// Waits `latency`, failing with a timeout once `limit` has passed.
async fn simulate_latency(latency: Duration, limit: Duration) -> Result<(), BackendError> {
    if latency.is_zero() {
        return Ok(());
    }
    tokio::time::timeout(limit, tokio::time::sleep(latency))
        .await
        .map_err(|_| BackendError::Timeout(limit))
}

/// Event list shaped like a single-node coordinator trace of `count(*)`.
fn synthetic_trace() -> Vec<TraceEvent> {
    [
        (120, "Parsing SELECT count(*) statement"),
        (310, "Preparing statement"),
        (640, "Computing ranges to query"),
        (1_850, "Submitting range requests in parallel"),
        (9_400, "Read live rows and tombstone cells"),
        (10_200, "Aggregating results"),
    ]
    .into_iter()
    .map(|(micros, description)| TraceEvent::new(Duration::from_micros(micros), description))
    .collect()
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn scan(
        &self,
        statement: &Statement,
        policy: &ExecutionPolicy,
    ) -> Result<RowStream<'_>, BackendError> {
        self.record(statement, policy);

        if statement.page_size == 0 {
            return Err(BackendError::Server("page size must be positive".to_string()));
        }

        let page_size = u64::from(statement.page_size);
        let pages = self.table.len().div_ceil(page_size);
        let timeout = policy.timeout;
        let gauge = &self.gauge;

        let rows = stream::unfold(Some(0u64), move |state| async move {
            let Some(page) = state else {
                return None;
            };
            if page >= pages {
                return None;
            }
            if let Some((after, error)) = &self.fail_after_pages {
                if page >= *after {
                    return Some((vec![Err(error.clone())], None));
                }
            }
            if let Err(error) = simulate_latency(self.page_latency, timeout).await {
                return Some((vec![Err(error)], None));
            }

            let start = page * page_size;
            let end = (start + page_size).min(self.table.len());
            let batch: Vec<_> = (start..end).map(|index| Ok(self.table.row(index))).collect();
            self.gauge.fill(batch.len());

            Some((batch, Some(page + 1)))
        })
        .flat_map(stream::iter)
        .inspect(move |item| {
            if item.is_ok() {
                gauge.drain(1);
            }
        });

        Ok(rows.boxed())
    }

    async fn count(
        &self,
        statement: &Statement,
        policy: &ExecutionPolicy,
    ) -> Result<CountResponse, BackendError> {
        self.record(statement, policy);
        simulate_latency(self.count_latency, policy.timeout).await?;

        if let Some(error) = &self.count_error {
            return Err(error.clone());
        }

        let count = i64::try_from(self.table.len())
            .map_err(|_| BackendError::Decode(format!("count {} overflows bigint", self.table.len())))?;

        Ok(CountResponse {
            count,
            tracing_id: (statement.tracing && !self.drop_tracing_id).then(Uuid::new_v4),
        })
    }

    async fn fetch_trace(&self, _tracing_id: Uuid) -> Result<Vec<TraceEvent>, BackendError> {
        self.trace_fetches.fetch_add(1, Ordering::SeqCst);
        self.trace.clone()
    }

    async fn insert_blob(
        &self,
        _statement: &Statement,
        key: i64,
        blob: &str,
        policy: &ExecutionPolicy,
    ) -> Result<(), BackendError> {
        if let Some((failing_key, error)) = &self.insert_error_at {
            if key == *failing_key {
                return Err(error.clone());
            }
        }
        simulate_latency(self.page_latency, policy.timeout).await?;

        self.inserted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RowObservation::new(key, Some(blob.len() as u64)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ExecutionPolicies, PolicyKind};

    fn policies() -> ExecutionPolicies {
        ExecutionPolicies::build(Duration::from_secs(5), Duration::from_secs(30), "dc1").unwrap()
    }

    #[tokio::test]
    async fn test_scan_yields_every_row_in_order() {
        let backend = MemoryBackend::new(MemoryTable::uniform(25, 8));
        let policies = policies();
        let stmt = Statement::full_scan("ks.t", 10);

        let rows: Vec<_> = backend
            .scan(&stmt, policies.get(PolicyKind::Default))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(rows.len(), 25);
        let keys: Vec<i64> = rows.into_iter().map(|r| r.unwrap().key).collect();
        assert_eq!(keys, (0..25).collect::<Vec<_>>());
        assert_eq!(backend.gauge().current(), 0);
        assert_eq!(backend.gauge().peak(), 10);
    }

    #[tokio::test]
    async fn test_scan_of_empty_table() {
        let backend = MemoryBackend::new(MemoryTable::uniform(0, 8));
        let policies = policies();
        let stmt = Statement::full_scan("ks.t", 10);

        let rows: Vec<_> = backend
            .scan(&stmt, policies.get(PolicyKind::Default))
            .await
            .unwrap()
            .collect()
            .await;

        assert!(rows.is_empty());
        assert_eq!(backend.gauge().peak(), 0);
    }

    #[tokio::test]
    async fn test_zero_page_size_rejected() {
        let backend = MemoryBackend::new(MemoryTable::uniform(5, 8));
        let policies = policies();
        let stmt = Statement::full_scan("ks.t", 0);

        let result = backend.scan(&stmt, policies.get(PolicyKind::Default)).await;
        assert!(matches!(result, Err(BackendError::Server(_))));
    }

    #[tokio::test]
    async fn test_from_rows_reports_null_payloads() {
        let table = MemoryTable::from_rows(vec![
            (7, Some(Bytes::from_static(b"abc"))),
            (8, None),
        ]);
        let backend = MemoryBackend::new(table);
        let policies = policies();
        let stmt = Statement::full_scan("ks.t", 1);

        let rows: Vec<_> = backend
            .scan(&stmt, policies.get(PolicyKind::Default))
            .await
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(rows, vec![RowObservation::new(7, Some(3)), RowObservation::null_payload(8)]);
    }

    #[tokio::test]
    async fn test_count_tracing_id_only_when_requested() {
        let backend = MemoryBackend::new(MemoryTable::uniform(42, 1));
        let policies = policies();
        let long = policies.get(PolicyKind::Long);

        let traced = backend.count(&Statement::traced_count("ks.t", 10), long).await.unwrap();
        assert_eq!(traced.count, 42);
        assert!(traced.tracing_id.is_some());

        let mut plain = Statement::traced_count("ks.t", 10);
        plain.tracing = false;
        let untraced = backend.count(&plain, long).await.unwrap();
        assert!(untraced.tracing_id.is_none());
    }

    #[tokio::test]
    async fn test_insert_records_rows_and_injected_error() {
        let backend = MemoryBackend::new(MemoryTable::uniform(0, 0))
            .with_insert_error_at(2, BackendError::Server("write rejected".to_string()));
        let policies = policies();
        let stmt = Statement::insert_blob("ks.t");
        let policy = policies.get(PolicyKind::Default);

        backend.insert_blob(&stmt, 0, "ab", policy).await.unwrap();
        backend.insert_blob(&stmt, 1, "abc", policy).await.unwrap();
        assert!(backend.insert_blob(&stmt, 2, "x", policy).await.is_err());

        assert_eq!(
            backend.inserted(),
            vec![RowObservation::new(0, Some(2)), RowObservation::new(1, Some(3))]
        );
    }
}
