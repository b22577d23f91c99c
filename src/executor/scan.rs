/// Paged full-table scan with streaming size statistics
///
/// Rows are pulled from the backend one page at a time and reduced into a
/// `StatisticsAccumulator` as they arrive, so memory use is bounded by a
/// single page no matter how large the table is.

use crate::backend::Statement;
use crate::core::{BackendError, SizeStatistics, StatisticsAccumulator};
use crate::policy::PolicyKind;
use crate::session::Session;
use futures::StreamExt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Completed,
    /// The scan stopped early; the counts cover rows seen before the error.
    Failed(BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    /// Every row streamed, including rows with a null payload.
    pub rows: u64,
    pub stats: SizeStatistics,
    pub elapsed: Duration,
    pub page_size: u32,
    pub outcome: ScanOutcome,
}

impl ScanReport {
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, ScanOutcome::Completed)
    }

    pub const fn error(&self) -> Option<&BackendError> {
        match &self.outcome {
            ScanOutcome::Completed => None,
            ScanOutcome::Failed(error) => Some(error),
        }
    }
}

pub struct PagedScanExecutor;

impl PagedScanExecutor {
    /// Scans `table` under the default policy. Never fails: backend errors end
    /// the scan and are returned inside the report.
    pub async fn scan(session: &Session, table: &str, page_size: u32) -> ScanReport {
        let statement = Statement::full_scan(&session.qualified(table), page_size);
        let policy = session.policy(PolicyKind::Default);

        tracing::debug!(cql = %statement.cql, page_size, consistency = %statement.consistency, "starting scan");

        let mut rows: u64 = 0;
        let mut accumulator = StatisticsAccumulator::new();
        let started = Instant::now();

        let outcome = match session.backend().scan(&statement, policy).await {
            Ok(mut stream) => {
                let mut outcome = ScanOutcome::Completed;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(row) => {
                            rows += 1;
                            accumulator.observe(row.payload_len);
                        }
                        Err(error) => {
                            outcome = ScanOutcome::Failed(error);
                            break;
                        }
                    }
                }
                outcome
            }
            Err(error) => ScanOutcome::Failed(error),
        };

        let elapsed = started.elapsed();

        match &outcome {
            ScanOutcome::Completed => {
                tracing::info!(table, rows, ?elapsed, "scan completed");
            }
            ScanOutcome::Failed(error) => {
                tracing::warn!(
                    table,
                    rows,
                    ?elapsed,
                    transient = error.is_transient(),
                    %error,
                    "scan aborted, reporting partial statistics"
                );
            }
        }

        ScanReport {
            rows,
            stats: accumulator.finalize(),
            elapsed,
            page_size,
            outcome,
        }
    }
}
