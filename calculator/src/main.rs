//! Ratebook Calculator Binary
//!
//! Converts amounts between catalog currencies typed one request per line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratebook::config::{CalculatorConfig, ConfigError};
use ratebook::shell::{self, INSTRUCTIONS};
use ratebook::startup::{self, StartupError};
use ratebook_fx::{ConsoleOutput, OutputChannel, TracingDiagnostics};

/// Default properties file, read when present.
const DEFAULT_PROPERTIES: &str = "app.properties";

/// Ratebook console FX calculator
#[derive(Parser, Debug)]
#[command(name = "ratebook")]
#[command(about = "Convert amounts between currencies, one request per line")]
struct Args {
    /// Properties file with converterPermits and directFeedPath
    #[arg(short, long)]
    properties: Option<PathBuf>,

    /// Direct feed JSON file (overrides directFeedPath)
    #[arg(short, long)]
    feed: Option<PathBuf>,

    /// Maximum concurrent conversions (overrides converterPermits)
    #[arg(long)]
    permits: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );
    let (json, plain) = if args.log_json {
        (Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();

    info!("Starting Ratebook calculator");

    let output: Arc<dyn OutputChannel> = Arc::new(ConsoleOutput);

    let service = match load_config(&args).map_err(StartupError::from).and_then(|config| {
        startup::start(&config, output.clone(), Arc::new(TracingDiagnostics))
    }) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            startup::report_failure(&e, output.as_ref());
            std::process::exit(startup::EXIT_STARTUP_FAILURE);
        }
    };

    output.success(INSTRUCTIONS);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let summary = shell::run(service.clone(), output, stdin, shutdown_signal()).await;

    let stats = service.stats();
    info!(
        submitted = summary.submitted,
        succeeded = stats.succeeded,
        failed = stats.failed,
        panicked = summary.panicked,
        peak_in_flight = stats.peak_in_flight,
        "Calculator shutdown complete"
    );

    // A stdin read still blocked in the background would hold the runtime open.
    std::process::exit(0)
}

/// Layer properties file, environment and command line.
fn load_config(args: &Args) -> Result<CalculatorConfig, ConfigError> {
    let config = match &args.properties {
        Some(path) => CalculatorConfig::from_properties(path)?,
        None if Path::new(DEFAULT_PROPERTIES).exists() => {
            CalculatorConfig::from_properties(Path::new(DEFAULT_PROPERTIES))?
        }
        None => CalculatorConfig::default(),
    };

    let mut config = config.with_env();
    if let Some(permits) = &args.permits {
        config.converter_permits = Some(permits.clone());
    }
    if let Some(feed) = &args.feed {
        config.feed_path = Some(feed.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
