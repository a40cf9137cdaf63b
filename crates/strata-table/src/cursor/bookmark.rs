//! Bookmarks.

use strata_common::TableVersion;
use strata_storage::index::IndexPosition;
use strata_storage::value::Row;

/// A saved cursor position.
///
/// A bookmark holds a full copy of the row it was taken on, so it can be
/// resolved again after the table changes. While the table is unchanged it
/// also remembers the exact index position. Release it with
/// [`TableScan::release_bookmark`](super::TableScan::release_bookmark) to
/// free any streams the copy owns.
#[derive(Debug)]
pub struct Bookmark {
    pub(crate) row: Row,
    /// Order the position belongs to.
    pub(crate) order: String,
    pub(crate) version: TableVersion,
    /// Only valid at `version`.
    pub(crate) position: IndexPosition,
}

impl Bookmark {
    /// The row the bookmark was taken on.
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Name of the order the bookmark was taken in.
    pub fn order(&self) -> &str {
        &self.order
    }

    /// The table version the bookmark was taken at.
    pub fn version(&self) -> TableVersion {
        self.version
    }
}
