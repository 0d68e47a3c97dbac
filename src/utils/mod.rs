//!
//! Utility module for the Cardano wallet sync engine.
//!
//! Re-exports amount parsing and formatting helpers for use throughout the codebase.
/// Amount parsing and formatting helpers
pub mod index;

pub use index::{format_lovelace, parse_quantity, sum_unit, LOVELACE};
