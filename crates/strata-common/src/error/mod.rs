//! Error handling for strata.
//!
//! This module provides the unified error type and result alias used
//! across the storage and table crates.

mod engine;

pub use engine::{ErrorCode, Severity, StrataError};

/// Result type alias for strata operations.
pub type StrataResult<T> = std::result::Result<T, StrataError>;
