//! CLI entry point for the write-path stress generator.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rusts_stress::{StressConfig, StressError, Stresser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "rusts-stress")]
#[command(about = "Write-path stress generator for RusTs and InfluxDB-compatible servers")]
#[command(version)]
struct Cli {
    /// YAML config file; flags and environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target database (may come from --config instead)
    #[arg(short, long, env = "STRESS_DATABASE", required_unless_present = "config")]
    database: Option<String>,

    /// Server host [default: localhost]
    #[arg(long, env = "STRESS_HOST")]
    host: Option<String>,

    /// Server port [default: 8086]
    #[arg(long, env = "STRESS_PORT")]
    port: Option<u16>,

    /// Basic auth user
    #[arg(long, env = "STRESS_USER")]
    user: Option<String>,

    /// Basic auth password
    #[arg(long, env = "STRESS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Number of workers [default: 4]
    #[arg(long)]
    concurrency: Option<usize>,

    /// Number of batches to send [default: 100]
    #[arg(long)]
    batches: Option<u64>,

    /// Number of points to send per batch [default: 20]
    #[arg(long)]
    points: Option<usize>,

    /// Batches generated ahead of the workers [default: 1000]
    #[arg(long)]
    queue_depth: Option<usize>,

    /// Write failures buffered before workers block [default: 1024]
    #[arg(long)]
    error_buffer: Option<usize>,

    /// HTTP request timeout in seconds [default: 30]
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    /// Layers flags and environment over the config file (or defaults).
    fn resolve(self) -> Result<StressConfig> {
        let mut config = match &self.config {
            Some(path) => StressConfig::from_yaml_file(path)?,
            None => StressConfig::default(),
        };

        if let Some(v) = self.database {
            config.database = v;
        }
        if let Some(v) = self.host {
            config.host = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.user {
            config.user = Some(v);
        }
        if let Some(v) = self.password {
            config.password = Some(v);
        }
        if let Some(v) = self.concurrency {
            config.concurrency = v;
        }
        if let Some(v) = self.batches {
            config.batches = v;
        }
        if let Some(v) = self.points {
            config.points = v;
        }
        if let Some(v) = self.queue_depth {
            config.queue_depth = v;
        }
        if let Some(v) = self.error_buffer {
            config.error_buffer = v;
        }
        if let Some(v) = self.timeout_secs {
            config.timeout = Duration::from_secs(v);
        }

        Ok(config)
    }
}

/// `RUST_LOG` wins when set; otherwise everything at `info` and above.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter());
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let config = cli.resolve().context("failed to resolve configuration")?;
    let stresser = Stresser::new(config).context("failed to create stresser")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping");
                cancel.cancel();
            }
        }
    });

    match stresser.run(&cancel).await {
        Ok(summary) => {
            summary.log();
            if summary.batches_failed > 0 {
                warn!(
                    "{} of {} batches failed to write",
                    summary.batches_failed, summary.batches_produced
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(StressError::Cancelled) => {
            info!("Stress run cancelled");
            Ok(ExitCode::from(130))
        }
        Err(e) => {
            error!("Stress run failed: {}", e);
            Err(e.into())
        }
    }
}
