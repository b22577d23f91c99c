/// Traced count(*) under the long execution policy
///
/// The aggregate is awaited, then its server-side trace is fetched and
/// written to the diagnostic file before the call returns.

use super::trace_sink;
use crate::backend::Statement;
use crate::core::{BackendError, TraceSinkError};
use crate::policy::PolicyKind;
use crate::session::Session;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountOutcome {
    Completed,
    QueryFailed(BackendError),
    TraceFailed(BackendError),
}

#[derive(Debug)]
pub struct CountReport {
    /// `None` whenever the query or its trace could not be obtained.
    pub rows: Option<i64>,
    pub elapsed: Duration,
    pub fetch_size: u32,
    pub trace_id: Option<Uuid>,
    pub trace_path: PathBuf,
    pub events_written: usize,
    pub outcome: CountOutcome,
    /// Set when the count succeeded but the trace file could not be written.
    pub sink_error: Option<TraceSinkError>,
}

impl CountReport {
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, CountOutcome::Completed) && self.sink_error.is_none()
    }

    pub const fn error(&self) -> Option<&BackendError> {
        match &self.outcome {
            CountOutcome::Completed => None,
            CountOutcome::QueryFailed(error) | CountOutcome::TraceFailed(error) => Some(error),
        }
    }
}

pub struct TracedAggregateExecutor;

impl TracedAggregateExecutor {
    /// Runs the traced count of `table` and persists its trace to `trace_path`.
    /// Backend and sink failures are reported in the returned `CountReport`.
    pub async fn count_with_trace(
        session: &Session,
        table: &str,
        fetch_size: u32,
        trace_path: &Path,
    ) -> CountReport {
        let statement = Statement::traced_count(&session.qualified(table), fetch_size);
        let policy = session.policy(PolicyKind::Long);

        tracing::debug!(cql = %statement.cql, timeout = ?policy.timeout, routing = ?policy.routing, "starting traced count");

        let mut report = CountReport {
            rows: None,
            elapsed: Duration::ZERO,
            fetch_size,
            trace_id: None,
            trace_path: trace_path.to_path_buf(),
            events_written: 0,
            outcome: CountOutcome::Completed,
            sink_error: None,
        };

        let started = Instant::now();

        match session.backend().count(&statement, policy).await {
            Err(error) => {
                tracing::warn!(table, transient = error.is_transient(), %error, "count query failed");
                report.outcome = CountOutcome::QueryFailed(error);
            }
            Ok(response) => match response.tracing_id {
                None => {
                    let error = BackendError::TraceUnavailable("coordinator returned no tracing id".to_string());
                    tracing::warn!(table, %error, "count trace missing");
                    report.outcome = CountOutcome::TraceFailed(error);
                }
                Some(trace_id) => {
                    report.trace_id = Some(trace_id);
                    tracing::info!(%trace_id, "count traced");

                    match session.backend().fetch_trace(trace_id).await {
                        Err(error) => {
                            tracing::warn!(%trace_id, %error, "trace retrieval failed");
                            report.outcome = CountOutcome::TraceFailed(error);
                        }
                        Ok(events) => {
                            report.rows = Some(response.count);
                            tracing::debug!(%trace_id, events = events.len(), "trace fetched");
                            match trace_sink::persist(&events, trace_path) {
                                Ok(written) => report.events_written = written,
                                Err(error) => {
                                    tracing::warn!(%error, "trace file not written");
                                    report.sink_error = Some(error);
                                }
                            }
                        }
                    }
                }
            },
        }

        report.elapsed = started.elapsed();
        tracing::info!(table, rows = ?report.rows, elapsed = ?report.elapsed, "count finished");

        report
    }
}
