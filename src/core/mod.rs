// Module declarations
pub mod error;
pub mod row;
pub mod stats;
pub mod trace;

// Re-exports for convenience
pub use error::{BackendError, ConfigError, TraceSinkError};
pub use row::RowObservation;
pub use stats::{SizeStatistics, StatisticsAccumulator};
pub use trace::TraceEvent;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trace_event_display() {
        let event = TraceEvent::new(Duration::from_millis(5), "parse");
        assert_eq!(event.to_string(), "5ms\tparse");

        let event = TraceEvent::new(Duration::from_micros(1500), "Read 10 live rows");
        assert_eq!(event.to_string(), "1.5ms\tRead 10 live rows");
    }

    #[test]
    fn test_backend_error_transience() {
        assert!(BackendError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(BackendError::Connection("reset by peer".to_string()).is_transient());
        assert!(BackendError::Unavailable("LOCAL_QUORUM".to_string()).is_transient());
        assert!(!BackendError::Server("syntax error".to_string()).is_transient());
        assert!(!BackendError::Decode("bad key".to_string()).is_transient());
        assert!(!BackendError::TraceUnavailable("no id".to_string()).is_transient());
    }

    #[test]
    fn test_row_observation_constructors() {
        assert_eq!(RowObservation::new(1, Some(10)).payload_len, Some(10));
        assert_eq!(RowObservation::null_payload(2).payload_len, None);
    }
}
