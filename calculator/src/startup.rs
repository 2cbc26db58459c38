//! Startup: configuration validation and rate table completion.

use std::sync::Arc;

use ratebook_fx::{ConversionService, DiagnosticSink, FxError, OutputChannel};
use thiserror::Error;
use tracing::{error, info};

use crate::config::{CalculatorConfig, ConfigError};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feed(#[from] FxError),
}

impl StartupError {
    /// The line shown to the user before exiting.
    pub fn user_message(&self) -> &'static str {
        match self {
            StartupError::Config(_) => "Cannot load configuration files.",
            StartupError::Feed(FxError::MalformedFeed(_)) => {
                "Cannot parse direct feed rates from file."
            }
            StartupError::Feed(_) => "Cannot initialize converter.",
        }
    }
}

/// Process exit code after a startup failure.
pub const EXIT_STARTUP_FAILURE: i32 = 1;

/// Write the fixed startup failure line. Details only go to the log.
pub fn report_failure(err: &StartupError, output: &dyn OutputChannel) {
    error!(error = %err, "Startup failed");
    output.failure(err.user_message());
}

/// Validate configuration, load the direct feed and build the service.
pub fn start(
    config: &CalculatorConfig,
    output: Arc<dyn OutputChannel>,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Result<ConversionService, StartupError> {
    let permits = config.permits().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    let source = config.feed_source();
    info!(source = source.name(), permits = permits.get(), "Loading direct feed");

    let service = ConversionService::from_feed(source.as_ref(), permits, output, diagnostics)
        .map_err(|e| {
            error!(error = %e, "Cannot build rate table");
            e
        })?;

    Ok(service)
}
