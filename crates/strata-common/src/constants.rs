//! Engine-wide constants.
//!
//! Defaults and limits for the index structure and the cursor protocol.

// =============================================================================
// Index Structure
// =============================================================================

/// Default branching factor of internal index nodes.
pub const DEFAULT_FANOUT: usize = 64;

/// Default number of entries held by a leaf node before it splits.
pub const DEFAULT_CAPACITY: usize = 64;

/// Smallest fanout that still produces a balanced tree.
pub const MIN_FANOUT: usize = 3;

/// Smallest leaf capacity accepted by the index.
pub const MIN_CAPACITY: usize = 2;

/// Largest fanout or capacity accepted by the index.
pub const MAX_NODE_ENTRIES: usize = 4096;

// =============================================================================
// Cursor Protocol
// =============================================================================

/// Default number of positional searches `optimistic_refresh` attempts
/// before reporting failure.
pub const DEFAULT_OPTIMISTIC_REFRESH_RETRIES: u32 = 3;

/// Upper bound for the configurable optimistic refresh retry count.
pub const MAX_OPTIMISTIC_REFRESH_RETRIES: u32 = 64;

// =============================================================================
// Physical Encoding
// =============================================================================

/// Format marker written at the start of every physical row image.
pub const PHYSICAL_ROW_MARKER: u8 = 0xA7;

/// Format marker written at the start of every physical scalar image.
pub const PHYSICAL_SCALAR_MARKER: u8 = 0x5C;
