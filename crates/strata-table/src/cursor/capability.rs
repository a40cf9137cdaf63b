//! Cursor capabilities, isolation levels, and scan directions.

use std::fmt;

use strata_common::{StrataError, StrataResult};

bitflags::bitflags! {
    /// Operations a cursor may perform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CursorCapabilities: u16 {
        /// Forward navigation: `first`, `next`.
        const NAVIGABLE = 0b0000_0000_0001;
        /// Backward navigation: `last`, `prior`.
        const BACKWARDS_NAVIGABLE = 0b0000_0000_0010;
        /// Bookmarks: `get_bookmark`, `goto_bookmark`, `compare_bookmarks`.
        const BOOKMARKABLE = 0b0000_0000_0100;
        /// Keyed lookup: `find_key`, `find_nearest`.
        const SEARCHABLE = 0b0000_0000_1000;
        /// Row insertion.
        const INSERTABLE = 0b0000_0001_0000;
        /// Row update.
        const UPDATABLE = 0b0000_0010_0000;
        /// Row deletion.
        const DELETABLE = 0b0000_0100_0000;
        /// Removing every row.
        const TRUNCATEABLE = 0b0000_1000_0000;
        /// `row_count`.
        const COUNTABLE = 0b0001_0000_0000;

        /// Every read-only capability.
        const READ_ONLY = Self::NAVIGABLE.bits()
            | Self::BACKWARDS_NAVIGABLE.bits()
            | Self::BOOKMARKABLE.bits()
            | Self::SEARCHABLE.bits()
            | Self::COUNTABLE.bits();
        /// Every mutating capability.
        const WRITABLE = Self::INSERTABLE.bits()
            | Self::UPDATABLE.bits()
            | Self::DELETABLE.bits()
            | Self::TRUNCATEABLE.bits();
    }
}

impl Default for CursorCapabilities {
    fn default() -> Self {
        Self::READ_ONLY
    }
}

impl CursorCapabilities {
    /// Fails with `CapabilityViolation` unless every capability in `needed`
    /// is present.
    pub fn require(self, needed: CursorCapabilities) -> StrataResult<()> {
        let missing = needed.difference(self);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StrataError::capability(missing.to_string()))
        }
    }
}

impl fmt::Display for CursorCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        for (i, (name, _)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// What a cursor observes.
///
/// Isolation only changes which version of the table a cursor reads, never
/// how it navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorIsolation {
    /// The live table. Writes by other cursors show up on the next move,
    /// and `select` re-reads the current row once the table has changed.
    #[default]
    Browse,
    /// The version current at open time. The cursor moves to a new version
    /// only after writing through itself.
    Isolated,
}

impl CursorIsolation {
    /// Returns true if the cursor reads a pinned snapshot.
    #[inline]
    pub fn pins_snapshot(self) -> bool {
        self == Self::Isolated
    }
}

impl fmt::Display for CursorIsolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Browse => "browse",
            Self::Isolated => "isolated",
        };
        f.write_str(name)
    }
}

/// Direction a cursor traverses its order in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanDirection {
    /// In index order.
    #[default]
    Forward,
    /// Against index order.
    Backward,
}

impl ScanDirection {
    /// Returns true for `Forward`.
    #[inline]
    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::ErrorCode;

    #[test]
    fn test_require_names_missing_capabilities() {
        let caps = CursorCapabilities::READ_ONLY;
        assert!(caps.require(CursorCapabilities::NAVIGABLE).is_ok());

        let err = caps
            .require(CursorCapabilities::UPDATABLE | CursorCapabilities::NAVIGABLE)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CapabilityViolation);
        assert_eq!(err.params(), vec!["UPDATABLE".to_string()]);
    }

    #[test]
    fn test_display() {
        let caps = CursorCapabilities::NAVIGABLE | CursorCapabilities::COUNTABLE;
        assert_eq!(caps.to_string(), "NAVIGABLE | COUNTABLE");
        assert_eq!(CursorCapabilities::empty().to_string(), "NONE");
    }

    #[test]
    fn test_only_isolated_pins_a_snapshot() {
        assert_eq!(CursorIsolation::default(), CursorIsolation::Browse);
        assert!(!CursorIsolation::Browse.pins_snapshot());
        assert!(CursorIsolation::Isolated.pins_snapshot());
        assert_eq!(CursorIsolation::Browse.to_string(), "browse");
        assert_eq!(CursorIsolation::Isolated.to_string(), "isolated");
    }

    #[test]
    fn test_read_only_and_writable_partition_all() {
        assert_eq!(
            CursorCapabilities::READ_ONLY | CursorCapabilities::WRITABLE,
            CursorCapabilities::all()
        );
        assert!(CursorCapabilities::READ_ONLY
            .intersection(CursorCapabilities::WRITABLE)
            .is_empty());
    }
}
