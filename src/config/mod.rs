//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (pagination ceilings, import caps, CSV delimiter)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Command, FilterArgs, LogFormat, LogLevel, NumericParsing, Opt};
