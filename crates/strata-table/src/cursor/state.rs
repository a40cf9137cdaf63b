//! Cursor states.

use std::fmt;

/// Where a cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    /// Not open.
    #[default]
    Closed,
    /// Before the first row.
    BeforeFirst,
    /// On a row.
    Positioned,
    /// After the last row.
    AfterLast,
}

impl CursorState {
    /// Returns true for every state but `Closed`.
    #[inline]
    pub fn is_active(self) -> bool {
        self != Self::Closed
    }

    /// Returns true on either boundary sentinel.
    #[inline]
    pub fn is_sentinel(self) -> bool {
        matches!(self, Self::BeforeFirst | Self::AfterLast)
    }
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::BeforeFirst => "before first",
            Self::Positioned => "positioned",
            Self::AfterLast => "after last",
        };
        f.write_str(name)
    }
}
