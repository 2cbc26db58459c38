//! Ratebook Calculator
//!
//! Console front end: loads configuration, completes the rate table from the
//! direct feed and dispatches typed request lines to the conversion service.

pub mod config;
pub mod shell;
pub mod startup;

pub use config::{CalculatorConfig, ConfigError};
pub use shell::ShellSummary;
pub use startup::{start, StartupError};
