//! Diagnostic sink for per-request failures.

use serde::Serialize;
use tracing::{error, warn};

use crate::error::FxError;

/// How bad a recorded failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Expected, user-caused failure.
    Warning,
    /// Failure that points at a defect.
    Severe,
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Request line that failed.
    pub input: String,
    pub message: String,
}

impl Diagnostic {
    /// Describe the failure of `input`.
    pub fn from_error(input: &str, err: &FxError) -> Self {
        let severity = match err {
            FxError::Unexpected(_) | FxError::MalformedFeed(_) => Severity::Severe,
            _ => Severity::Warning,
        };
        let message = match err {
            FxError::MalformedRequest { input } => format!("Invalid user input: {}", input),
            FxError::Unexpected(detail) => detail.clone(),
            other => other.to_string(),
        };
        Self {
            severity,
            input: input.to_string(),
            message,
        }
    }
}

/// Where failure diagnostics are recorded.
pub trait DiagnosticSink: Send + Sync {
    /// Record a diagnostic.
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!(input = %diagnostic.input, "{}", diagnostic.message),
            Severity::Severe => error!(input = %diagnostic.input, "{}", diagnostic.message),
        }
    }
}

/// Keeps diagnostics in memory for inspection.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    records: parking_lot::Mutex<Vec<Diagnostic>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryDiagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl DiagnosticSink for MemoryDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        self.records.lock().push(diagnostic);
    }
}
