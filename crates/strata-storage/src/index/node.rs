//! Node types for the native index.
//!
//! - Internal nodes: separator keys and child pointers
//! - Leaf nodes: key/data row pairs, chained to their siblings
//!
//! Every key in the subtree left of a separator orders before it; every key
//! in the subtree to its right orders at or after it.

use std::fmt;

use crate::value::Row;

/// Identifier of a node within one index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// No node; terminates sibling chains.
    pub const INVALID: Self = Self(0);

    /// Creates a node ID.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true unless this is `INVALID`.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "NodeId({})", self.0)
        } else {
            write!(f, "NodeId(INVALID)")
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out node IDs, reusing freed ones.
#[derive(Debug)]
pub(crate) struct NodeAllocator {
    next: u64,
    free: Vec<NodeId>,
}

impl NodeAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: 1,
            free: Vec::new(),
        }
    }

    pub(crate) fn allocate(&mut self) -> NodeId {
        if let Some(id) = self.free.pop() {
            return id;
        }
        let id = NodeId::new(self.next);
        self.next += 1;
        id
    }

    pub(crate) fn free(&mut self, id: NodeId) {
        self.free.push(id);
    }
}

/// A key row and the data row it maps to.
#[derive(Debug)]
pub struct IndexEntry {
    /// Key row, owned by the index.
    pub key: Row,
    /// Data row, owned by the index.
    pub data: Row,
}

/// Something ordered by a key row.
pub(crate) trait Keyed {
    fn key(&self) -> &Row;
}

impl Keyed for IndexEntry {
    fn key(&self) -> &Row {
        &self.key
    }
}

/// A leaf node.
#[derive(Debug)]
pub(crate) struct LeafNode {
    pub(crate) id: NodeId,
    pub(crate) entries: Vec<IndexEntry>,
    pub(crate) prev: NodeId,
    pub(crate) next: NodeId,
}

impl LeafNode {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            entries: Vec::new(),
            prev: NodeId::INVALID,
            next: NodeId::INVALID,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Moves the upper half into a new right sibling.
    ///
    /// The caller relinks the old right sibling's `prev` pointer.
    pub(crate) fn split(&mut self, new_id: NodeId) -> LeafNode {
        let mid = self.entries.len() / 2;
        let mut right = LeafNode::new(new_id);
        right.entries = self.entries.drain(mid..).collect();
        right.prev = self.id;
        right.next = self.next;
        self.next = new_id;
        right
    }
}

/// A separator key and the child to its right.
#[derive(Debug)]
pub(crate) struct InternalEntry {
    pub(crate) key: Row,
    pub(crate) child: NodeId,
}

impl Keyed for InternalEntry {
    fn key(&self) -> &Row {
        &self.key
    }
}

/// An internal node.
#[derive(Debug)]
pub(crate) struct InternalNode {
    pub(crate) id: NodeId,
    pub(crate) leftmost_child: NodeId,
    pub(crate) entries: Vec<InternalEntry>,
}

impl InternalNode {
    pub(crate) fn new(id: NodeId, leftmost_child: NodeId) -> Self {
        Self {
            id,
            leftmost_child,
            entries: Vec::new(),
        }
    }

    /// Child at position `pos`; position 0 is the leftmost child.
    pub(crate) fn child_at(&self, pos: usize) -> NodeId {
        if pos == 0 {
            self.leftmost_child
        } else {
            self.entries
                .get(pos - 1)
                .map_or(NodeId::INVALID, |e| e.child)
        }
    }

    pub(crate) fn child_count(&self) -> usize {
        self.entries.len() + 1
    }

    pub(crate) fn last_child(&self) -> NodeId {
        self.entries.last().map_or(self.leftmost_child, |e| e.child)
    }

    /// Inserts `key` with `child` immediately right of the child at `pos`.
    pub(crate) fn insert_after(&mut self, pos: usize, key: Row, child: NodeId) {
        self.entries.insert(pos, InternalEntry { key, child });
    }

    /// Splits around the middle separator, which moves up to the parent.
    pub(crate) fn split(&mut self, new_id: NodeId) -> Option<(Row, InternalNode)> {
        let mid = self.entries.len() / 2;
        let mut upper = self.entries.drain(mid..);
        let middle = upper.next()?;
        let mut right = InternalNode::new(new_id, middle.child);
        right.entries = upper.collect();
        Some((middle.key, right))
    }
}

/// A position within an index: a leaf and a slot in it.
///
/// Positions are invalidated by any mutation of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPosition {
    pub(crate) leaf: NodeId,
    pub(crate) slot: usize,
}

impl IndexPosition {
    /// The leaf holding the entry.
    pub fn leaf(&self) -> NodeId {
        self.leaf
    }

    /// Slot of the entry within its leaf.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, RowType, ScalarType};
    use std::sync::Arc;

    fn key(v: i32) -> Row {
        let row_type = Arc::new(RowType::new(vec![Column::new("k", ScalarType::Int32)]).unwrap());
        Row::from_values(row_type, vec![v.into()]).unwrap()
    }

    fn leaf_with(id: u64, keys: &[i32]) -> LeafNode {
        let mut leaf = LeafNode::new(NodeId::new(id));
        for &k in keys {
            leaf.entries.push(IndexEntry {
                key: key(k),
                data: key(k),
            });
        }
        leaf
    }

    #[test]
    fn test_allocator_reuses_freed_ids() {
        let mut allocator = NodeAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_eq!(a, NodeId::new(1));
        assert_eq!(b, NodeId::new(2));
        allocator.free(a);
        assert_eq!(allocator.allocate(), a);
        assert_eq!(allocator.allocate(), NodeId::new(3));
    }

    #[test]
    fn test_leaf_split_links_siblings() {
        let mut leaf = leaf_with(1, &[1, 2, 3, 4, 5]);
        leaf.next = NodeId::new(9);
        let right = leaf.split(NodeId::new(2));

        assert_eq!(leaf.len(), 2);
        assert_eq!(right.len(), 3);
        assert_eq!(leaf.next, NodeId::new(2));
        assert_eq!(right.prev, NodeId::new(1));
        assert_eq!(right.next, NodeId::new(9));
    }

    #[test]
    fn test_internal_split_moves_middle_up() {
        let mut node = InternalNode::new(NodeId::new(1), NodeId::new(10));
        for (i, k) in [10, 20, 30, 40].iter().enumerate() {
            node.insert_after(i, key(*k), NodeId::new(11 + i as u64));
        }
        assert_eq!(node.child_count(), 5);

        let (separator, right) = node.split(NodeId::new(2)).unwrap();
        assert_eq!(separator.to_string(), "(30)");
        assert_eq!(node.entries.len(), 2);
        assert_eq!(node.last_child(), NodeId::new(12));
        assert_eq!(right.leftmost_child, NodeId::new(13));
        assert_eq!(right.entries.len(), 1);
        assert_eq!(right.child_at(1), NodeId::new(14));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{:?}", NodeId::INVALID), "NodeId(INVALID)");
        assert_eq!(NodeId::new(4).to_string(), "4");
    }
}
