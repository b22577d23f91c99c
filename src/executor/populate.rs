/// Bulk insert of random blobs into the benchmark table
///
/// WARNING: overwrites existing rows with the same keys. Only the
/// `countperf-populate` binary calls this, and only after explicit opt-in.

use crate::backend::Statement;
use crate::core::BackendError;
use crate::policy::PolicyKind;
use crate::session::Session;
use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulatePlan {
    pub rows: u64,
    pub blob_len: usize,
    pub progress_every: u64,
}

impl Default for PopulatePlan {
    fn default() -> Self {
        Self {
            rows: 100_000,
            blob_len: 10_000,
            progress_every: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulateReport {
    pub written: u64,
    pub elapsed: Duration,
    pub failure: Option<BackendError>,
}

/// Random lowercase ASCII string of `len` characters.
pub fn random_word(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect()
}

/// Progress is logged on key 0 and every `every`-th key after it.
const fn reports_progress(key: i64, every: u64) -> bool {
    every > 0 && key.unsigned_abs() % every == 0
}

/// Inserts keys `0..plan.rows`, stopping at the first failed write.
pub async fn populate(session: &Session, table: &str, plan: PopulatePlan) -> PopulateReport {
    let statement = Statement::insert_blob(&session.qualified(table));
    let policy = session.policy(PolicyKind::Default);
    let started = Instant::now();
    let mut written = 0;

    for key in 0..plan.rows {
        let Ok(key) = i64::try_from(key) else {
            break;
        };
        let blob = random_word(plan.blob_len);

        if let Err(error) = session.backend().insert_blob(&statement, key, &blob, policy).await {
            tracing::error!(key, written, %error, "insert failed, stopping");
            return PopulateReport {
                written,
                elapsed: started.elapsed(),
                failure: Some(error),
            };
        }
        written += 1;

        if reports_progress(key, plan.progress_every) {
            tracing::info!(key, written, at = %chrono::Local::now(), "populate progress");
        }
    }

    PopulateReport {
        written,
        elapsed: started.elapsed(),
        failure: None,
    }
}
