use crate::core::ConfigError;
use crate::policy::ExecutionPolicies;
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_TABLE: &str = "count_perf";
pub const DEFAULT_FETCH_SIZE: u32 = 5000;
pub const DEFAULT_TRACE_FILE: &str = "query_debug.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const LONG_TIMEOUT_SECS: u64 = 30;

/// Plain-text authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Values given on the command line. The binaries map their clap structs
/// onto this.
#[derive(Debug, Clone)]
pub struct CommandLine {
    pub conf: PathBuf,
    pub host: String,
    pub port: u16,
    pub keyspace: String,
    pub table: String,
    pub fetch_size: u32,
    pub trace_file: PathBuf,
}

/// `[general]` section of the INI file
#[derive(Debug, Default, Deserialize)]
struct GeneralSection {
    dcname: Option<String>,
    username: Option<String>,
    password: Option<String>,
    ca_cert: Option<String>,
    default_timeout_secs: Option<u64>,
    long_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    general: GeneralSection,
}

/// Validated run configuration. Everything here has been checked, so the
/// executors never see malformed values.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub host: String,
    pub port: u16,
    pub keyspace: String,
    pub table: String,
    pub fetch_size: u32,
    pub trace_file: PathBuf,
    pub datacenter: String,
    pub default_timeout: Duration,
    pub long_timeout: Duration,
    pub credentials: Option<Credentials>,
    pub ca_cert: Option<PathBuf>,
}

/// `COUNTPERF_GENERAL__DCNAME` overrides `dcname` in `[general]`
fn environment() -> Environment {
    Environment::with_prefix("COUNTPERF")
        .prefix_separator("_")
        .separator("__")
}

/// Empty INI values (`username =`) count as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl BenchConfig {
    /// Priority: CLI args > ENV (`COUNTPERF_GENERAL__*`) > config file > defaults
    pub fn load(cli: &CommandLine) -> Result<Self, ConfigError> {
        Self::load_with(cli, environment())
    }

    fn load_with(cli: &CommandLine, env: Environment) -> Result<Self, ConfigError> {
        if !cli.conf.exists() {
            return Err(ConfigError::FileNotFound(cli.conf.clone()));
        }
        tracing::info!(path = %cli.conf.display(), "using configuration file");

        let settings: FileSettings = Config::builder()
            .add_source(File::from(cli.conf.as_path()).format(FileFormat::Ini))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Self::from_parts(cli, settings.general)
    }

    fn from_parts(cli: &CommandLine, general: GeneralSection) -> Result<Self, ConfigError> {
        if cli.fetch_size == 0 || i32::try_from(cli.fetch_size).is_err() {
            return Err(ConfigError::InvalidPageSize(cli.fetch_size));
        }
        if cli.host.trim().is_empty() {
            return Err(ConfigError::MissingSetting("host"));
        }
        if cli.keyspace.trim().is_empty() {
            return Err(ConfigError::MissingSetting("keyspace"));
        }

        let datacenter = non_empty(general.dcname).ok_or(ConfigError::MissingSetting("general.dcname"))?;

        let credentials = match (non_empty(general.username), non_empty(general.password)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        let ca_cert = non_empty(general.ca_cert).map(PathBuf::from);
        if let Some(path) = &ca_cert {
            if !path.exists() {
                return Err(ConfigError::CaCertNotFound(path.clone()));
            }
        }

        let config = Self {
            host: cli.host.clone(),
            port: cli.port,
            keyspace: cli.keyspace.clone(),
            table: cli.table.clone(),
            fetch_size: cli.fetch_size,
            trace_file: cli.trace_file.clone(),
            datacenter,
            default_timeout: Duration::from_secs(general.default_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            long_timeout: Duration::from_secs(general.long_timeout_secs.unwrap_or(LONG_TIMEOUT_SECS)),
            credentials,
            ca_cert,
        };

        // Проверяем таймауты сразу, до подключения
        config.policies()?;
        Ok(config)
    }

    pub fn policies(&self) -> Result<ExecutionPolicies, ConfigError> {
        ExecutionPolicies::build(self.default_timeout, self.long_timeout, &self.datacenter)
    }

    #[cfg(feature = "cassandra")]
    pub fn connect_options(&self) -> crate::backend::ConnectOptions {
        crate::backend::ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            credentials: self.credentials.clone(),
            ca_cert: self.ca_cert.clone(),
        }
    }
}
