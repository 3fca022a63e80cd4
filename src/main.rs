//! HTTP Endpoint Availability Monitor Binary

use clap::Parser;
use endpoint_monitor::{Monitor, MonitorConfig, Result, load_endpoints, logging};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Probe HTTP endpoints on a fixed interval and report per-domain availability
#[derive(Parser, Debug)]
#[command(name = "endpoint_monitor", version)]
struct Cli {
    /// YAML file listing the endpoints to probe
    config: PathBuf,

    /// Seconds between cycle starts
    #[arg(long, env = "CHECK_INTERVAL_SECONDS")]
    interval_secs: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Slowest response still counted as UP, in milliseconds
    #[arg(long, env = "LATENCY_THRESHOLD_MS")]
    latency_threshold_ms: Option<u64>,

    /// File receiving a durable copy of the log
    #[arg(long, env = "MONITOR_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::default();

        if let Some(secs) = self.interval_secs {
            config.check_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.latency_threshold_ms {
            config.latency_threshold = Duration::from_millis(ms);
        }
        if let Some(path) = &self.log_file {
            config.log_file = path.clone();
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // usage errors exit 1; --help and --version exit 0
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print().ok();
            std::process::exit(code);
        }
    };

    let config = cli.monitor_config();

    let _log_guard = match logging::init_logging(&config.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting endpoint monitor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    let endpoints = match load_endpoints(&cli.config) {
        Ok(endpoints) => endpoints,
        Err(e) => {
            error!("Failed to load {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    let mut monitor = Monitor::new(config, endpoints)?;

    if let Err(e) = monitor.start().await {
        error!("Monitor failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
