/// Executor module - the two measured queries and the populate tool
///
/// Structure:
/// - scan: paged full scan with streaming size statistics
/// - count: traced count(*) under the long policy
/// - trace_sink: diagnostic trace file writer
/// - populate: destructive bulk insert, opt-in only

pub mod count;
pub mod populate;
pub mod scan;
pub mod trace_sink;

pub use count::{CountOutcome, CountReport, TracedAggregateExecutor};
pub use populate::{PopulatePlan, PopulateReport, populate};
pub use scan::{PagedScanExecutor, ScanOutcome, ScanReport};
