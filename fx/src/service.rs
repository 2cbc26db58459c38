//! Bounded-concurrency conversion service.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::completion::complete;
use crate::conversion::{Conversion, ConversionRequest};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{FxError, FxResult};
use crate::feed::FeedSource;
use crate::gate::AdmissionGate;
use crate::output::OutputChannel;
use crate::table::{RateTable, SharedRateTable};

/// Request counters.
#[derive(Debug, Default)]
struct ServiceMetrics {
    admitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl ServiceMetrics {
    fn admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    fn succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Answers conversion requests against a frozen rate table.
pub struct ConversionService {
    table: SharedRateTable,
    gate: AdmissionGate,
    output: Arc<dyn OutputChannel>,
    diagnostics: Arc<dyn DiagnosticSink>,
    metrics: ServiceMetrics,
}

impl ConversionService {
    /// Create a service over a completed table.
    pub fn new(
        table: SharedRateTable,
        permits: NonZeroUsize,
        output: Arc<dyn OutputChannel>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            table,
            gate: AdmissionGate::new(permits),
            output,
            diagnostics,
            metrics: ServiceMetrics::default(),
        }
    }

    /// Load a feed, complete the rate graph and create the service.
    #[instrument(skip_all, fields(source = source.name()))]
    pub fn from_feed(
        source: &dyn FeedSource,
        permits: NonZeroUsize,
        output: Arc<dyn OutputChannel>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> FxResult<Self> {
        let feed = source.load()?;
        let table = complete(&feed)?;
        info!(rates = table.len(), permits = permits.get(), "Conversion service ready");
        Ok(Self::new(Arc::new(table), permits, output, diagnostics))
    }

    /// The rate table in use.
    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Handle one request line, writing exactly one response line.
    ///
    /// Failures go to the error channel and the diagnostic sink. A panic while
    /// handling the request is reported as `Unexpected`. The permit is released
    /// on every path.
    #[instrument(skip(self))]
    pub async fn try_convert(&self, input: &str) {
        match self.gate.admit().await {
            Ok(_admission) => {
                self.metrics.admitted();
                let handled = panic::catch_unwind(AssertUnwindSafe(|| {
                    match self.evaluate(input) {
                        Ok(conversion) => self.report_success(&conversion),
                        Err(err) => self.report_failure(input, &err),
                    }
                }));
                if let Err(payload) = handled {
                    let detail = panic_message(payload.as_ref());
                    error!(detail = %detail, "Conversion panicked");
                    self.report_failure(input, &FxError::Unexpected(detail));
                }
            }
            Err(err) => self.report_failure(input, &err),
        }
    }

    /// Handle one request line under the gate and return the result.
    pub async fn convert(&self, input: &str) -> FxResult<Conversion> {
        let _admission = self.gate.admit().await?;
        self.metrics.admitted();
        self.evaluate(input)
    }

    /// Parse and evaluate a request without going through the gate.
    pub fn evaluate(&self, input: &str) -> FxResult<Conversion> {
        let request = ConversionRequest::parse(input)?;
        Conversion::evaluate(request, &self.table)
    }

    /// Stop admitting requests. Requests still waiting are interrupted.
    pub fn close(&self) {
        debug!("Closing admission gate");
        self.gate.close();
    }

    /// Whether the service still admits requests.
    pub fn is_accepting_requests(&self) -> bool {
        !self.gate.is_closed()
    }

    /// Get service statistics.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            permits: self.gate.permits(),
            admitted: self.metrics.admitted.load(Ordering::Relaxed),
            succeeded: self.metrics.succeeded.load(Ordering::Relaxed),
            failed: self.metrics.failed.load(Ordering::Relaxed),
            in_flight: self.gate.in_flight(),
            peak_in_flight: self.gate.peak_in_flight(),
        }
    }

    fn report_success(&self, conversion: &Conversion) {
        info!(
            conversion_id = %conversion.id,
            pair = %conversion.pair(),
            output = %conversion.output,
            "Conversion completed"
        );
        self.output.success(&conversion.to_string());
        self.metrics.succeeded();
    }

    fn report_failure(&self, input: &str, err: &FxError) {
        self.metrics.failed();
        self.output.failure(&err.to_string());
        self.diagnostics.record(Diagnostic::from_error(input, err));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

/// Service statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    pub permits: usize,
    pub admitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub in_flight: usize,
    pub peak_in_flight: usize,
}
