//! Native indexes: ordered B+trees of key rows to data rows.
//!
//! ## Structure
//!
//! ```text
//!                 [Internal: 40]
//!                /              \
//!     [Internal: 20]          [Internal: 60]
//!      /        \               /        \
//!  [10,15] <-> [20,30] <-> [40,50] <-> [60,70]
//! ```
//!
//! Keys compare column by column with each column's sort direction. A key
//! with trailing columns unset compares equal to every key it is a prefix
//! of, which is how partial-key searches find the first matching entry.

mod node;
mod tree;

pub use node::{IndexEntry, IndexPosition, NodeId};
pub use tree::{IndexIter, IndexStats, NativeIndex};
