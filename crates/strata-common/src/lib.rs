//! # strata-common
//!
//! Common types, errors, and configuration for the strata table engine.
//!
//! This crate provides the foundational pieces shared by the storage and
//! table crates:
//!
//! - **Types**: Identifiers for externally streamed values and table versions
//! - **Errors**: The engine-wide error taxonomy with stable numeric codes
//! - **Config**: Index and cursor tuning parameters
//! - **Constants**: Defaults and limits
//!
//! ## Example
//!
//! ```rust
//! use strata_common::error::{ErrorCode, StrataError, StrataResult};
//!
//! fn lookup() -> StrataResult<()> {
//!     Err(StrataError::NoActiveRow)
//! }
//!
//! assert_eq!(lookup().unwrap_err().code(), ErrorCode::NoActiveRow);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::{CursorConfig, EngineConfig, IndexConfig};
pub use error::{ErrorCode, Severity, StrataError, StrataResult};
pub use types::{StreamId, TableVersion};
