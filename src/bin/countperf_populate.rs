use anyhow::Context;
use clap::Parser;
use countperf::backend::Backend;
use countperf::executor::{PopulatePlan, populate};
use countperf::logging::init_logging;
use countperf::settings::{self, BenchConfig, CommandLine};
use countperf::Session;
use std::path::PathBuf;
use std::sync::Arc;

/// DO NOT RUN AGAINST PRODUCTION: existing rows with the same keys are overwritten.
#[derive(Debug, Parser)]
#[command(name = "countperf-populate")]
#[command(about = "Fill the benchmark table with random blobs (destructive)", long_about = None)]
struct Args {
    /// Configuration file (INI, section [general])
    #[arg(short = 'c', long)]
    conf: PathBuf,

    /// Contact point address
    #[arg(short = 'i', long)]
    host: String,

    /// Native protocol port
    #[arg(short = 'p', long, default_value_t = settings::DEFAULT_PORT)]
    port: u16,

    /// Keyspace to write into
    #[arg(short = 'k', long)]
    keyspace: String,

    /// Table to write into
    #[arg(short = 't', long, default_value = settings::DEFAULT_TABLE)]
    table: String,

    /// Number of rows (keys 0..rows)
    #[arg(long, default_value_t = 100_000)]
    rows: u64,

    /// Characters per blob
    #[arg(long, default_value_t = 10_000)]
    blob_len: usize,

    /// Log progress every N rows
    #[arg(long, default_value_t = 1_000)]
    progress_every: u64,

    /// Required: confirms that existing data may be overwritten
    #[arg(long)]
    i_understand_this_overwrites_data: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[cfg(feature = "cassandra")]
async fn connect(config: &BenchConfig) -> anyhow::Result<Arc<dyn Backend>> {
    let backend = countperf::backend::CassandraBackend::connect(&config.connect_options(), &config.policies()?)
        .await
        .with_context(|| format!("cannot connect to {}:{}", config.host, config.port))?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "cassandra"))]
async fn connect(config: &BenchConfig) -> anyhow::Result<Arc<dyn Backend>> {
    anyhow::bail!(
        "built without the `cassandra` feature, cannot connect to {}:{}",
        config.host,
        config.port
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.i_understand_this_overwrites_data {
        eprintln!("Error: populate overwrites existing rows; pass --i-understand-this-overwrites-data to continue");
        std::process::exit(2);
    }

    init_logging(&args.log_level)?;

    let config = BenchConfig::load(&CommandLine {
        conf: args.conf.clone(),
        host: args.host.clone(),
        port: args.port,
        keyspace: args.keyspace.clone(),
        table: args.table.clone(),
        fetch_size: settings::DEFAULT_FETCH_SIZE,
        trace_file: PathBuf::from(settings::DEFAULT_TRACE_FILE),
    })
    .context("invalid configuration")?;

    let backend = connect(&config).await?;
    let session = Session::new(backend, config.policies()?, config.keyspace.clone());

    let plan = PopulatePlan {
        rows: args.rows,
        blob_len: args.blob_len,
        progress_every: args.progress_every,
    };
    tracing::warn!(table = %session.qualified(&config.table), rows = plan.rows, "populating, existing keys will be overwritten");

    let report = populate(&session, &config.table, plan).await;
    println!("Written {} records in {:?}", report.written, report.elapsed);

    if let Some(error) = report.failure {
        anyhow::bail!("populate stopped after {} records: {error}", report.written);
    }
    Ok(())
}
