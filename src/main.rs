use anyhow::Context;
use clap::{Parser, ValueEnum};
use countperf::backend::{Backend, MemoryBackend, MemoryTable};
use countperf::executor::{PagedScanExecutor, TracedAggregateExecutor};
use countperf::logging::init_logging;
use countperf::settings::{self, BenchConfig, CommandLine};
use countperf::{RunSummary, Session};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Paged scan and traced count benchmark
#[derive(Debug, Parser)]
#[command(name = "countperf")]
#[command(about = "Measure scan and count(*) latency on a Cassandra-compatible cluster", long_about = None)]
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

    /// Keyspace to query
    #[arg(short = 'k', long)]
    keyspace: String,

    /// Table to query
    #[arg(short = 't', long, default_value = settings::DEFAULT_TABLE)]
    table: String,

    /// Page (fetch) size
    #[arg(short = 'f', long, default_value_t = settings::DEFAULT_FETCH_SIZE)]
    fetch: u32,

    /// Trace output file, overwritten on every run
    #[arg(short = 'd', long, default_value = settings::DEFAULT_TRACE_FILE)]
    debug: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run against an in-memory table of this many rows instead of a cluster
    #[arg(long, value_name = "ROWS")]
    simulate: Option<u64>,
}

impl Args {
    fn command_line(&self) -> CommandLine {
        CommandLine {
            conf: self.conf.clone(),
            host: self.host.clone(),
            port: self.port,
            keyspace: self.keyspace.clone(),
            table: self.table.clone(),
            fetch_size: self.fetch,
            trace_file: self.debug.clone(),
        }
    }
}

async fn open_backend(args: &Args, config: &BenchConfig) -> anyhow::Result<Arc<dyn Backend>> {
    if let Some(rows) = args.simulate {
        tracing::info!(rows, "using simulated in-memory cluster");
        // 1 из 10 строк без payload, остальные от 100 до 10099 байт
        let table = MemoryTable::generated(rows, |index| {
            let payload = (index % 10 != 0).then(|| 100 + (index * 7919) % 10_000);
            countperf::RowObservation::new(index as i64, payload)
        });
        return Ok(Arc::new(MemoryBackend::new(table)));
    }

    connect_cluster(config).await
}

#[cfg(feature = "cassandra")]
async fn connect_cluster(config: &BenchConfig) -> anyhow::Result<Arc<dyn Backend>> {
    let backend = countperf::backend::CassandraBackend::connect(&config.connect_options(), &config.policies()?)
        .await
        .with_context(|| format!("cannot connect to {}:{}", config.host, config.port))?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "cassandra"))]
async fn connect_cluster(config: &BenchConfig) -> anyhow::Result<Arc<dyn Backend>> {
    anyhow::bail!(
        "built without the `cassandra` feature, cannot connect to {}:{} (use --simulate)",
        config.host,
        config.port
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = BenchConfig::load(&args.command_line()).context("invalid configuration")?;
    let policies = config.policies()?;

    tracing::info!(
        host = %config.host,
        keyspace = %config.keyspace,
        table = %config.table,
        fetch = config.fetch_size,
        datacenter = %config.datacenter,
        "starting benchmark"
    );

    let backend = open_backend(&args, &config).await?;
    let session = Session::new(backend, policies, config.keyspace.clone());

    let scan = PagedScanExecutor::scan(&session, &config.table, config.fetch_size).await;
    let count =
        TracedAggregateExecutor::count_with_trace(&session, &config.table, config.fetch_size, &config.trace_file)
            .await;

    let summary = RunSummary::new(&config.table, &scan, &count);
    match args.format {
        OutputFormat::Text => print!("{}", summary.render_text()),
        OutputFormat::Json => println!("{}", summary.render_json()?),
    }

    Ok(())
}
