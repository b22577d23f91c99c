use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a backend while submitting or streaming a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Not enough replicas available: {0}")]
    Unavailable(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Could not decode row: {0}")]
    Decode(String),
    #[error("Trace unavailable: {0}")]
    TraceUnavailable(String),
}

impl BackendError {
    /// Transient errors may succeed on a later run without any change on our side.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_) | Self::Unavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {profile} timeout: {value:?} (must be positive)")]
    InvalidTimeout { profile: &'static str, value: Duration },
    #[error("Invalid page size {0} (must be between 1 and {max})", max = i32::MAX)]
    InvalidPageSize(u32),
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Missing required setting '{0}'")]
    MissingSetting(&'static str),
    #[error("Username and password must be supplied together")]
    IncompleteCredentials,
    #[error("CA certificate not found: {0}")]
    CaCertNotFound(PathBuf),
    #[error("Configuration error: {0}")]
    Source(#[from] ::config::ConfigError),
}

/// Failure to persist the diagnostic trace artifact.
#[derive(Error, Debug)]
#[error("Cannot write trace file {path}: {source}")]
pub struct TraceSinkError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
