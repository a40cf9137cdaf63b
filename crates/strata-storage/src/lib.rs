//! # strata-storage
//!
//! Value representation and native indexes for the strata table engine.
//!
//! This crate provides:
//! - **Schema descriptors**: row and table types consumed as immutable inputs
//! - **Values**: scalars with typed representations, rows with per-column
//!   presence tracking, and their physical encoding
//! - **Managers**: the stream subsystem boundary and the value manager that
//!   copies and disposes rows on behalf of indexes
//! - **Native indexes**: ordered B+trees mapping key rows to data rows

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Row and table type descriptors
pub mod schema;

/// Scalars, rows, and physical encoding
pub mod value;

/// Ordered native indexes
pub mod index;

pub use index::{IndexPosition, IndexStats, NativeIndex};
pub use schema::{Column, Order, OrderColumn, RowType, ScalarType, SortDirection, TableType};
pub use value::{
    DefaultValueManager, MemoryStreamManager, NativeValue, Representation, Row, Scalar,
    StreamManager, Value, ValueManager,
};
