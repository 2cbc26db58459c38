//! Ratebook Common Types
//!
//! This crate contains the closed currency catalog and the rate edge type shared
//! by the rate engine and the calculator binary.

pub mod currency;
pub mod rate;
pub mod error;

pub use currency::*;
pub use rate::*;
pub use error::*;
