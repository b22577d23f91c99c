use crate::core::SizeStatistics;
use crate::executor::{CountReport, ScanReport};
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub rows: u64,
    pub elapsed_ms: f64,
    pub page_size: u32,
    pub size: SizeStatistics,
    pub completed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountSummary {
    pub rows: Option<i64>,
    pub elapsed_ms: f64,
    pub fetch_size: u32,
    pub trace_id: Option<String>,
    pub trace_file: String,
    pub trace_events: usize,
    pub error: Option<String>,
    pub trace_file_error: Option<String>,
}

/// Everything one invocation measured.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub table: String,
    pub finished_at: chrono::DateTime<chrono::Local>,
    pub scan: ScanSummary,
    pub count: CountSummary,
}

impl RunSummary {
    pub fn new(table: &str, scan: &ScanReport, count: &CountReport) -> Self {
        Self {
            table: table.to_string(),
            finished_at: chrono::Local::now(),
            scan: ScanSummary {
                rows: scan.rows,
                elapsed_ms: scan.elapsed.as_secs_f64() * 1000.0,
                page_size: scan.page_size,
                size: scan.stats,
                completed: scan.is_complete(),
                error: scan.error().map(ToString::to_string),
            },
            count: CountSummary {
                rows: count.rows,
                elapsed_ms: count.elapsed.as_secs_f64() * 1000.0,
                fetch_size: count.fetch_size,
                trace_id: count.trace_id.map(|id| id.to_string()),
                trace_file: count.trace_path.display().to_string(),
                trace_events: count.events_written,
                error: count.error().map(ToString::to_string),
                trace_file_error: count.sink_error.as_ref().map(ToString::to_string),
            },
        }
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut output = String::new();

        let mut scan = ComfyTable::new();
        scan.load_preset(UTF8_FULL);
        scan.set_header(vec![Cell::new("# SELECT #"), Cell::new(&self.table)]);
        scan.add_row(vec![Cell::new("Row count"), Cell::new(self.scan.rows)]);
        scan.add_row(vec![
            Cell::new(format!("Query timing with fetch {}", self.scan.page_size)),
            Cell::new(format!("{:.3} ms", self.scan.elapsed_ms)),
        ]);
        scan.add_row(vec![Cell::new("Average row size"), Cell::new(format!("{:.2}", self.scan.size.average))]);
        scan.add_row(vec![Cell::new("Max row size"), Cell::new(self.scan.size.max)]);
        scan.add_row(vec![Cell::new("Min row size"), Cell::new(self.scan.size.min)]);
        if let Some(error) = &self.scan.error {
            scan.add_row(vec![Cell::new("Scan aborted"), Cell::new(error)]);
        }
        output.push_str(&format!("{scan}\n"));

        let mut count = ComfyTable::new();
        count.load_preset(UTF8_FULL);
        count.set_header(vec![Cell::new("# COUNT #"), Cell::new(&self.table)]);
        count.add_row(vec![
            Cell::new("Row count"),
            Cell::new(self.count.rows.map_or_else(|| "-".to_string(), |rows| rows.to_string())),
        ]);
        count.add_row(vec![
            Cell::new(format!("Count timing with fetch {}", self.count.fetch_size)),
            Cell::new(format!("{:.3} ms", self.count.elapsed_ms)),
        ]);
        count.add_row(vec![
            Cell::new("Trace id"),
            Cell::new(self.count.trace_id.as_deref().unwrap_or("-")),
        ]);
        count.add_row(vec![
            Cell::new("Trace file"),
            Cell::new(format!("{} ({} events)", self.count.trace_file, self.count.trace_events)),
        ]);
        if let Some(error) = &self.count.error {
            count.add_row(vec![Cell::new("Count failed"), Cell::new(error)]);
        }
        if let Some(error) = &self.count.trace_file_error {
            count.add_row(vec![Cell::new("Trace file error"), Cell::new(error)]);
        }
        output.push_str(&format!("{count}\n"));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BackendError;
    use crate::executor::{CountOutcome, ScanOutcome};
    use std::path::PathBuf;
    use std::time::Duration;

    fn scan_report(outcome: ScanOutcome) -> ScanReport {
        ScanReport {
            rows: 3,
            stats: SizeStatistics { count: 2, average: 20.0, max: 30, min: 10 },
            elapsed: Duration::from_millis(1500),
            page_size: 5000,
            outcome,
        }
    }

    fn count_report(outcome: CountOutcome, rows: Option<i64>) -> CountReport {
        CountReport {
            rows,
            elapsed: Duration::from_millis(250),
            fetch_size: 5000,
            trace_id: None,
            trace_path: PathBuf::from("query_debug.log"),
            events_written: 0,
            outcome,
            sink_error: None,
        }
    }

    #[test]
    fn test_render_text_lists_measurements() {
        let summary = RunSummary::new(
            "count_perf",
            &scan_report(ScanOutcome::Completed),
            &count_report(CountOutcome::Completed, Some(3)),
        );

        let text = summary.render_text();
        assert!(text.contains("# SELECT #"));
        assert!(text.contains("Query timing with fetch 5000"));
        assert!(text.contains("1500.000 ms"));
        assert!(text.contains("20.00"));
        assert!(text.contains("# COUNT #"));
        assert!(!text.contains("Scan aborted"));
    }

    #[test]
    fn test_render_text_shows_failures() {
        let summary = RunSummary::new(
            "count_perf",
            &scan_report(ScanOutcome::Failed(BackendError::Timeout(Duration::from_secs(5)))),
            &count_report(
                CountOutcome::QueryFailed(BackendError::Server("unconfigured table".to_string())),
                None,
            ),
        );

        let text = summary.render_text();
        assert!(text.contains("Scan aborted"));
        assert!(text.contains("Request timed out after 5s"));
        assert!(text.contains("Server error: unconfigured table"));
    }

    #[test]
    fn test_render_json_fields() {
        let summary = RunSummary::new(
            "count_perf",
            &scan_report(ScanOutcome::Completed),
            &count_report(CountOutcome::Completed, Some(3)),
        );

        let json: serde_json::Value = serde_json::from_str(&summary.render_json().unwrap()).unwrap();
        assert_eq!(json["table"], "count_perf");
        assert_eq!(json["scan"]["rows"], 3);
        assert_eq!(json["scan"]["size"]["max"], 30);
        assert_eq!(json["scan"]["completed"], true);
        assert_eq!(json["count"]["rows"], 3);
        assert!(json["count"]["error"].is_null());
    }
}
