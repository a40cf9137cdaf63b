//! Type descriptors.
//!
//! Row and table types are produced by the catalog and treated as immutable
//! inputs here. Rows share their [`RowType`] through an `Arc`.

mod row_type;
mod scalar_type;
mod table_type;

pub use row_type::{Column, RowType};
pub use scalar_type::ScalarType;
pub use table_type::{Order, OrderColumn, SortDirection, TableType};
