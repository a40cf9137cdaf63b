//! The table scan cursor.
//!
//! ## State Machine
//!
//! ```text
//!            open()                 next() / first()
//! Closed ------------> BeforeFirst ------------------> Positioned
//!   ^                      ^                            |      ^
//!   |   close()            |  prior() past the start    |      | prior() / last()
//!   +----------------------+----------------------------+      |
//!                                    next() past the end |      |
//!                                                        v      |
//!                                                    AfterLast -+
//! ```
//!
//! What a cursor may do is fixed when it is built: [`CursorCapabilities`]
//! gate every operation, and [`CursorIsolation`] decides whether it reads a
//! snapshot pinned at open time or the live table.

mod bookmark;
mod capability;
mod state;
mod table_scan;

pub use bookmark::Bookmark;
pub use capability::{CursorCapabilities, CursorIsolation, ScanDirection};
pub use state::CursorState;
pub use table_scan::TableScan;
