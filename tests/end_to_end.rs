// Full invocation against the in-memory cluster: scan, then traced count, one session
use bytes::Bytes;
use countperf::backend::{MemoryBackend, MemoryTable};
use countperf::executor::{PagedScanExecutor, TracedAggregateExecutor};
use countperf::{ExecutionPolicies, PolicyKind, RunSummary, Session};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_scan_then_count_share_one_session() {
    let temp_dir = TempDir::new().unwrap();
    let trace_path = temp_dir.path().join("query_debug.log");

    let table = MemoryTable::from_rows(vec![
        (0, Some(Bytes::from(vec![b'x'; 10]))),
        (1, None),
        (2, Some(Bytes::from(vec![b'y'; 30]))),
        (3, Some(Bytes::from(vec![b'z'; 20]))),
    ]);
    let backend = Arc::new(MemoryBackend::new(table));
    let policies = ExecutionPolicies::build(Duration::from_secs(5), Duration::from_secs(30), "dc1").unwrap();
    let session = Session::new(backend.clone(), policies, "perf");

    let scan = PagedScanExecutor::scan(&session, "count_perf", 3).await;
    let count = TracedAggregateExecutor::count_with_trace(&session, "count_perf", 3, &trace_path).await;

    assert_eq!(scan.rows, 4);
    assert_eq!(scan.stats.count, 3);
    assert!((scan.stats.average - 20.0).abs() < f64::EPSILON);
    assert_eq!(count.rows, Some(4));
    assert!(fs::read_to_string(&trace_path).unwrap().lines().count() > 0);

    let kinds: Vec<PolicyKind> = backend.queries().iter().map(|q| q.policy.kind).collect();
    assert_eq!(kinds, vec![PolicyKind::Default, PolicyKind::Long]);

    let json: serde_json::Value =
        serde_json::from_str(&RunSummary::new("count_perf", &scan, &count).render_json().unwrap()).unwrap();
    assert_eq!(json["scan"]["rows"], 4);
    assert_eq!(json["scan"]["size"]["min"], 10);
    assert_eq!(json["count"]["rows"], 4);
    assert_eq!(json["count"]["trace_events"], 6);
}
