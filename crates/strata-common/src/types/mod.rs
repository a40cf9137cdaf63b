//! Type definitions for strata.
//!
//! This module contains identifier types shared across the engine.

mod ids;

pub use ids::{StreamId, TableVersion};
