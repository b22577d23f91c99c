use std::fmt;
use std::time::Duration;

/// A single server-side step of a traced query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Time since the coordinator started processing the query.
    pub elapsed: Duration,
    pub description: String,
}

impl TraceEvent {
    pub fn new(elapsed: Duration, description: impl Into<String>) -> Self {
        Self {
            elapsed,
            description: description.into(),
        }
    }
}

/// Artifact line format: `<elapsed>\t<description>`
impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}\t{}", self.elapsed, self.description)
    }
}
