//! Ratebook FX Engine
//!
//! Completes a sparse direct feed of FX quotes into a rate for every ordered
//! pair of catalog currencies, and answers text conversion requests against
//! that table under a bounded-concurrency gate.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//! use ratebook_fx::{ConsoleOutput, ConversionService, ReferenceFeed, TracingDiagnostics};
//!
//! let service = ConversionService::from_feed(
//!     &ReferenceFeed,
//!     NonZeroUsize::new(4).unwrap(),
//!     Arc::new(ConsoleOutput),
//!     Arc::new(TracingDiagnostics),
//! )?;
//!
//! // Prints "NOK 100.34 = JPY 1711"
//! service.try_convert("NOK 100.34 in JPY").await;
//! ```

pub mod completion;
pub mod conversion;
pub mod diagnostics;
pub mod error;
pub mod feed;
pub mod gate;
pub mod output;
pub mod service;
pub mod table;

pub use completion::{complete, complete_in_order, Hub};
pub use conversion::{format_amount, round_amount, Conversion, ConversionRequest};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity, TracingDiagnostics};
pub use error::{FeedError, FxError, FxResult, MALFORMED_REQUEST_MESSAGE};
pub use feed::{DirectFeed, DirectQuote, FeedSource, JsonFileFeed, ReferenceFeed, StaticFeed};
pub use gate::{Admission, AdmissionGate};
pub use output::{ConsoleOutput, OutputChannel};
pub use service::{ConversionService, ServiceStats};
pub use table::{RateTable, RateTableBuilder, SharedRateTable, TableStats};

#[cfg(any(test, feature = "test-utils"))]
pub use diagnostics::MemoryDiagnostics;
#[cfg(any(test, feature = "test-utils"))]
pub use output::BufferedOutput;
