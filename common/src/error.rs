//! Catalog error types.

use thiserror::Error;

/// Errors raised when resolving values against the currency catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Code is not part of the catalog.
    #[error("Unknown currency code: {0}")]
    UnknownCode(String),

    /// Display label is not part of the catalog.
    #[error("Unknown currency label: {0}")]
    UnknownLabel(String),
}
