//! # strata-table
//!
//! Native tables and the table scan cursor.
//!
//! - **Native tables**: one clustered index plus any number of non-clustered
//!   indexes, mutated together with rollback on failure
//! - **Shared tables**: versioned, copy-on-write tables that many cursors can
//!   read while snapshots stay pinned
//! - **Cursors**: the [`TableScan`] state machine with capability and
//!   isolation contracts
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_common::EngineConfig;
//! use strata_storage::schema::{Column, Order, RowType, ScalarType, TableType};
//! use strata_storage::value::{DefaultValueManager, Row};
//! use strata_table::{SharedTable, TableScan};
//!
//! let row_type = RowType::new(vec![
//!     Column::new("id", ScalarType::Int32),
//!     Column::new("name", ScalarType::String),
//! ])
//! .unwrap();
//! let table_type = TableType::new("People", row_type).with_key(Order::key("People_PK", &[0]));
//! let table = SharedTable::new(
//!     &table_type,
//!     Arc::new(DefaultValueManager::new()),
//!     EngineConfig::default(),
//! )
//! .unwrap();
//!
//! let row = Row::from_values(Arc::clone(table_type.row_type()), vec![1i32.into(), "Ada".into()]).unwrap();
//! table.insert(&row, false).unwrap();
//!
//! let mut scan = TableScan::new(table.clone());
//! scan.open().unwrap();
//! assert!(scan.next().unwrap());
//! assert_eq!(scan.select().unwrap().to_string(), "(1, Ada)");
//! assert!(!scan.next().unwrap());
//! scan.close();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Multi-index tables
pub mod native_table;

/// Versioned tables shared between cursors
pub mod shared;

/// The table scan cursor
pub mod cursor;

pub use cursor::{
    Bookmark, CursorCapabilities, CursorIsolation, CursorState, ScanDirection, TableScan,
};
pub use native_table::{IndexDefinition, NativeTable, TableIndex};
pub use shared::{SharedTable, TableSnapshot};
