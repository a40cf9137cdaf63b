//! The native index B+tree.
//!
//! Entries live in leaves chained in key order. Internal nodes route by
//! separator keys. Leaves that become empty are unlinked and removed, and a
//! root left with a single child is collapsed; nodes are otherwise never
//! merged.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use strata_common::{IndexConfig, StrataError, StrataResult};

use super::node::{
    IndexEntry, IndexPosition, InternalNode, Keyed, LeafNode, NodeAllocator, NodeId,
};
use crate::schema::{RowType, SortDirection};
use crate::value::{Row, ValueManager};

/// Statistics about an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of entries.
    pub entry_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Number of internal nodes.
    pub internal_count: usize,
    /// Levels above the leaves.
    pub height: usize,
    /// Node splits performed.
    pub splits: usize,
    /// Nodes removed after becoming empty.
    pub removals: usize,
}

/// Path from the root to a leaf: each internal node and the child taken.
type Path = Vec<(NodeId, usize)>;

/// An ordered index of key rows to data rows.
///
/// Keys are unique. The index takes its own copies of the rows it is given
/// and disposes them when entries are removed.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use strata_common::IndexConfig;
/// use strata_storage::index::NativeIndex;
/// use strata_storage::schema::{Column, RowType, ScalarType, SortDirection};
/// use strata_storage::value::{DefaultValueManager, Row};
///
/// let manager = DefaultValueManager::new();
/// let key_type = Arc::new(RowType::new(vec![Column::new("id", ScalarType::Int32)]).unwrap());
/// let mut index = NativeIndex::new(
///     "ById",
///     Arc::clone(&key_type),
///     Arc::clone(&key_type),
///     vec![SortDirection::Ascending],
///     IndexConfig::default(),
/// )
/// .unwrap();
///
/// let key = Row::from_values(Arc::clone(&key_type), vec![7i32.into()]).unwrap();
/// index.insert(&manager, &key, &key).unwrap();
/// assert!(index.contains(&manager, &key).unwrap());
/// assert_eq!(index.len(), 1);
/// ```
#[derive(Debug)]
pub struct NativeIndex {
    name: String,
    key_type: Arc<RowType>,
    data_type: Arc<RowType>,
    directions: Vec<SortDirection>,
    config: IndexConfig,
    root: NodeId,
    /// Levels of internal nodes above the leaves.
    height: usize,
    leaves: HashMap<NodeId, LeafNode>,
    internals: HashMap<NodeId, InternalNode>,
    allocator: NodeAllocator,
    len: usize,
    stats: IndexStats,
    dropped: bool,
}

impl NativeIndex {
    /// Creates an empty index.
    pub fn new(
        name: impl Into<String>,
        key_type: Arc<RowType>,
        data_type: Arc<RowType>,
        directions: Vec<SortDirection>,
        config: IndexConfig,
    ) -> StrataResult<Self> {
        config.validate()?;
        let name = name.into();
        if directions.len() != key_type.width() {
            return Err(StrataError::invalid_argument(format!(
                "index '{name}' has {} key columns but {} directions",
                key_type.width(),
                directions.len()
            )));
        }
        let mut allocator = NodeAllocator::new();
        let root = allocator.allocate();
        let mut leaves = HashMap::new();
        leaves.insert(root, LeafNode::new(root));
        Ok(Self {
            name,
            key_type,
            data_type,
            directions,
            config,
            root,
            height: 0,
            leaves,
            internals: HashMap::new(),
            allocator,
            len: 0,
            stats: IndexStats {
                leaf_count: 1,
                ..IndexStats::default()
            },
            dropped: false,
        })
    }

    /// Index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row type of keys.
    pub fn key_type(&self) -> &Arc<RowType> {
        &self.key_type
    }

    /// Row type of data rows.
    pub fn data_type(&self) -> &Arc<RowType> {
        &self.data_type
    }

    /// Sort direction of each key column.
    pub fn directions(&self) -> &[SortDirection] {
        &self.directions
    }

    /// Layout configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the index has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true once the index has been dropped.
    pub fn is_dropped(&self) -> bool {
        self.dropped
    }

    /// Returns index statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entry_count: self.len,
            leaf_count: self.leaves.len(),
            internal_count: self.internals.len(),
            height: self.height,
            ..self.stats.clone()
        }
    }

    // =========================================================================
    // Key Comparison
    // =========================================================================

    /// Compares two key rows column by column, honoring sort directions.
    ///
    /// Comparison stops at the first column either row has no value for, so
    /// a partial key compares equal to every key it is a prefix of.
    pub fn compare_keys(
        &self,
        manager: &dyn ValueManager,
        a: &Row,
        b: &Row,
    ) -> StrataResult<Ordering> {
        for (column, direction) in self.directions.iter().enumerate() {
            if !a.has_value(column) || !b.has_value(column) {
                break;
            }
            let ordering = manager.compare_scalars(a.value(column)?, b.value(column)?)?;
            if ordering != Ordering::Equal {
                return Ok(direction.apply(ordering));
            }
        }
        Ok(Ordering::Equal)
    }

    fn check_usable(&self) -> StrataResult<()> {
        if self.dropped {
            Err(StrataError::IndexDropped {
                index: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }

    fn check_search_key(&self, key: &Row) -> StrataResult<()> {
        self.check_usable()?;
        if key.width() != self.key_type.width() {
            return Err(StrataError::IncompatibleRowTypes {
                expected: self.key_type.width(),
                actual: key.width(),
            });
        }
        Ok(())
    }

    fn check_full_key(&self, key: &Row) -> StrataResult<()> {
        self.check_search_key(key)?;
        match key.first_missing_column() {
            Some(column) => Err(StrataError::IncompleteRow { column }),
            None => Ok(()),
        }
    }

    fn check_data(&self, data: &Row) -> StrataResult<()> {
        if data.width() != self.data_type.width() {
            return Err(StrataError::IncompatibleRowTypes {
                expected: self.data_type.width(),
                actual: data.width(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Node Access
    // =========================================================================

    fn leaf(&self, id: NodeId) -> StrataResult<&LeafNode> {
        self.leaves
            .get(&id)
            .ok_or_else(|| StrataError::internal(format!("index '{}': leaf {id} missing", self.name)))
    }

    fn leaf_mut(&mut self, id: NodeId) -> StrataResult<&mut LeafNode> {
        let name = &self.name;
        self.leaves
            .get_mut(&id)
            .ok_or_else(|| StrataError::internal(format!("index '{name}': leaf {id} missing")))
    }

    fn internal(&self, id: NodeId) -> StrataResult<&InternalNode> {
        self.internals.get(&id).ok_or_else(|| {
            StrataError::internal(format!("index '{}': internal node {id} missing", self.name))
        })
    }

    fn internal_mut(&mut self, id: NodeId) -> StrataResult<&mut InternalNode> {
        let name = &self.name;
        self.internals.get_mut(&id).ok_or_else(|| {
            StrataError::internal(format!("index '{name}': internal node {id} missing"))
        })
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Counts the leading rows that route before `key`.
    ///
    /// With `inclusive`, rows equal to `key` count as before it.
    fn partition<T: Keyed>(
        &self,
        manager: &dyn ValueManager,
        items: &[T],
        key: &Row,
        inclusive: bool,
    ) -> StrataResult<usize> {
        let (mut lo, mut hi) = (0, items.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let ordering = self.compare_keys(manager, items[mid].key(), key)?;
            let before = match ordering {
                Ordering::Less => true,
                Ordering::Equal => inclusive,
                Ordering::Greater => false,
            };
            if before {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Descends to the leaf `key` routes to.
    ///
    /// With `inclusive`, separators equal to the key route right (where an
    /// equal full key lives); otherwise they route left (so a partial key
    /// reaches the first leaf that can hold a match).
    fn descend(
        &self,
        manager: &dyn ValueManager,
        key: &Row,
        inclusive: bool,
    ) -> StrataResult<(NodeId, Path)> {
        let mut node = self.root;
        let mut path = Vec::with_capacity(self.height);
        for _ in 0..self.height {
            let internal = self.internal(node)?;
            let pos = self.partition(manager, &internal.entries, key, inclusive)?;
            path.push((node, pos));
            node = internal.child_at(pos);
        }
        Ok((node, path))
    }

    /// First position at or after `slot` in `leaf`, following the chain.
    fn forward_from(&self, leaf: NodeId, slot: usize) -> StrataResult<Option<IndexPosition>> {
        let (mut id, mut slot) = (leaf, slot);
        loop {
            let node = self.leaf(id)?;
            if slot < node.len() {
                return Ok(Some(IndexPosition { leaf: id, slot }));
            }
            if !node.next.is_valid() {
                return Ok(None);
            }
            id = node.next;
            slot = 0;
        }
    }

    /// Last position before `end` in `leaf`, following the chain back.
    fn backward_from(&self, leaf: NodeId, end: usize) -> StrataResult<Option<IndexPosition>> {
        let (mut id, mut end) = (leaf, end);
        loop {
            let node = self.leaf(id)?;
            let end_here = end.min(node.len());
            if end_here > 0 {
                return Ok(Some(IndexPosition {
                    leaf: id,
                    slot: end_here - 1,
                }));
            }
            if !node.prev.is_valid() {
                return Ok(None);
            }
            id = node.prev;
            end = usize::MAX;
        }
    }

    fn bound(
        &self,
        manager: &dyn ValueManager,
        key: &Row,
        inclusive: bool,
    ) -> StrataResult<Option<IndexPosition>> {
        self.check_search_key(key)?;
        let (leaf_id, _) = self.descend(manager, key, inclusive)?;
        let leaf = self.leaf(leaf_id)?;
        let slot = self.partition(manager, &leaf.entries, key, inclusive)?;
        self.forward_from(leaf_id, slot)
    }

    /// First entry whose key orders at or after `key`.
    pub fn seek(&self, manager: &dyn ValueManager, key: &Row) -> StrataResult<Option<IndexPosition>> {
        self.bound(manager, key, false)
    }

    /// First entry whose key orders strictly after `key`.
    pub fn seek_after(
        &self,
        manager: &dyn ValueManager,
        key: &Row,
    ) -> StrataResult<Option<IndexPosition>> {
        self.bound(manager, key, true)
    }

    /// Last entry whose key orders strictly before `key`.
    pub fn seek_before(
        &self,
        manager: &dyn ValueManager,
        key: &Row,
    ) -> StrataResult<Option<IndexPosition>> {
        match self.seek(manager, key)? {
            Some(position) => self.prior(position),
            None => self.last(),
        }
    }

    /// Last entry whose key orders at or before `key`.
    pub fn seek_at_or_before(
        &self,
        manager: &dyn ValueManager,
        key: &Row,
    ) -> StrataResult<Option<IndexPosition>> {
        match self.seek_after(manager, key)? {
            Some(position) => self.prior(position),
            None => self.last(),
        }
    }

    /// First entry matching `key`. A partial key matches every key it
    /// is a prefix of.
    pub fn find(&self, manager: &dyn ValueManager, key: &Row) -> StrataResult<Option<IndexPosition>> {
        match self.seek(manager, key)? {
            Some(position) => {
                let (found, _) = self.entry_at(position)?;
                if self.compare_keys(manager, found, key)? == Ordering::Equal {
                    Ok(Some(position))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Returns true if an entry matches `key`.
    pub fn contains(&self, manager: &dyn ValueManager, key: &Row) -> StrataResult<bool> {
        Ok(self.find(manager, key)?.is_some())
    }

    /// Data row of the entry matching `key`.
    pub fn get(&self, manager: &dyn ValueManager, key: &Row) -> StrataResult<Option<&Row>> {
        match self.find(manager, key)? {
            Some(position) => Ok(Some(self.entry_at(position)?.1)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn edge_leaf(&self, rightmost: bool) -> StrataResult<NodeId> {
        let mut node = self.root;
        for _ in 0..self.height {
            let internal = self.internal(node)?;
            node = if rightmost {
                internal.last_child()
            } else {
                internal.leftmost_child
            };
        }
        Ok(node)
    }

    /// First entry in key order.
    pub fn first(&self) -> StrataResult<Option<IndexPosition>> {
        self.check_usable()?;
        self.forward_from(self.edge_leaf(false)?, 0)
    }

    /// Last entry in key order.
    pub fn last(&self) -> StrataResult<Option<IndexPosition>> {
        self.check_usable()?;
        self.backward_from(self.edge_leaf(true)?, usize::MAX)
    }

    /// Entry after `position`.
    pub fn next(&self, position: IndexPosition) -> StrataResult<Option<IndexPosition>> {
        self.check_usable()?;
        self.forward_from(position.leaf, position.slot + 1)
    }

    /// Entry before `position`.
    pub fn prior(&self, position: IndexPosition) -> StrataResult<Option<IndexPosition>> {
        self.check_usable()?;
        self.backward_from(position.leaf, position.slot)
    }

    /// Key and data rows at `position`.
    pub fn entry_at(&self, position: IndexPosition) -> StrataResult<(&Row, &Row)> {
        self.check_usable()?;
        let entry = self
            .leaves
            .get(&position.leaf)
            .and_then(|leaf| leaf.entries.get(position.slot))
            .ok_or_else(|| {
                StrataError::internal(format!(
                    "index '{}': stale position {}:{}",
                    self.name, position.leaf, position.slot
                ))
            })?;
        Ok((&entry.key, &entry.data))
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> IndexIter<'_> {
        let first = if self.dropped {
            None
        } else {
            self.first().ok().flatten()
        };
        IndexIter {
            index: self,
            position: first,
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Inserts copies of `key` and `data`.
    ///
    /// Fails with `IndexKeyCollision` if the key is present.
    pub fn insert(&mut self, manager: &dyn ValueManager, key: &Row, data: &Row) -> StrataResult<()> {
        self.check_full_key(key)?;
        self.check_data(data)?;
        let mut key = manager.copy_row(key)?;
        let data = match manager.copy_row(data) {
            Ok(data) => data,
            Err(e) => {
                manager.dispose_row(&mut key);
                return Err(e);
            }
        };
        self.insert_owned(manager, key, data)
    }

    fn insert_owned(&mut self, manager: &dyn ValueManager, mut key: Row, mut data: Row) -> StrataResult<()> {
        let (leaf_id, path) = self.descend(manager, &key, true)?;
        let leaf = self.leaf(leaf_id)?;
        let slot = self.partition(manager, &leaf.entries, &key, false)?;
        if slot < leaf.len()
            && self.compare_keys(manager, &leaf.entries[slot].key, &key)? == Ordering::Equal
        {
            let err = StrataError::IndexKeyCollision {
                index: self.name.clone(),
                key: key.to_string(),
            };
            manager.dispose_row(&mut key);
            manager.dispose_row(&mut data);
            return Err(err);
        }

        let capacity = self.config.capacity;
        let leaf = self.leaf_mut(leaf_id)?;
        leaf.entries.insert(slot, IndexEntry { key, data });
        let overflow = leaf.len() > capacity;
        self.len += 1;

        if overflow {
            self.split_leaf(manager, leaf_id, path)?;
        }
        Ok(())
    }

    fn split_leaf(&mut self, manager: &dyn ValueManager, leaf_id: NodeId, path: Path) -> StrataResult<()> {
        let separator = {
            let leaf = self.leaf(leaf_id)?;
            manager.copy_row(&leaf.entries[leaf.len() / 2].key)?
        };
        let new_id = self.allocator.allocate();
        let right = self.leaf_mut(leaf_id)?.split(new_id);
        if right.next.is_valid() {
            self.leaf_mut(right.next)?.prev = new_id;
        }
        self.leaves.insert(new_id, right);
        self.stats.splits += 1;
        tracing::trace!(index = %self.name, left = %leaf_id, right = %new_id, "split leaf");

        self.insert_into_parent(path, leaf_id, separator, new_id)
    }

    fn insert_into_parent(
        &mut self,
        mut path: Path,
        left: NodeId,
        separator: Row,
        right: NodeId,
    ) -> StrataResult<()> {
        match path.pop() {
            None => {
                let root_id = self.allocator.allocate();
                let mut root = InternalNode::new(root_id, left);
                root.insert_after(0, separator, right);
                self.internals.insert(root_id, root);
                self.root = root_id;
                self.height += 1;
                tracing::trace!(index = %self.name, height = self.height, "grew root");
                Ok(())
            }
            Some((parent_id, pos)) => {
                let max_keys = self.config.max_internal_keys();
                let parent = self.internal_mut(parent_id)?;
                parent.insert_after(pos, separator, right);
                if parent.entries.len() > max_keys {
                    self.split_internal(parent_id, path)?;
                }
                Ok(())
            }
        }
    }

    fn split_internal(&mut self, node_id: NodeId, path: Path) -> StrataResult<()> {
        let new_id = self.allocator.allocate();
        let (separator, right) = self
            .internal_mut(node_id)?
            .split(new_id)
            .ok_or_else(|| StrataError::internal("split of an internal node without separators"))?;
        self.internals.insert(new_id, right);
        self.stats.splits += 1;
        self.insert_into_parent(path, node_id, separator, new_id)
    }

    /// Removes the entry for `key`, disposing its rows.
    pub fn delete(&mut self, manager: &dyn ValueManager, key: &Row) -> StrataResult<()> {
        self.check_full_key(key)?;
        let (leaf_id, path) = self.descend(manager, key, true)?;
        let leaf = self.leaf(leaf_id)?;
        let slot = self.partition(manager, &leaf.entries, key, false)?;
        let found = slot < leaf.len()
            && self.compare_keys(manager, &leaf.entries[slot].key, key)? == Ordering::Equal;
        if !found {
            return Err(StrataError::KeyNotFound {
                index: self.name.clone(),
                key: key.to_string(),
            });
        }

        let leaf = self.leaf_mut(leaf_id)?;
        let mut entry = leaf.entries.remove(slot);
        let emptied = leaf.entries.is_empty();
        manager.dispose_row(&mut entry.key);
        manager.dispose_row(&mut entry.data);
        self.len -= 1;

        if emptied && self.height > 0 {
            self.remove_leaf(manager, leaf_id, path)?;
        }
        Ok(())
    }

    fn remove_leaf(&mut self, manager: &dyn ValueManager, leaf_id: NodeId, path: Path) -> StrataResult<()> {
        let leaf = self
            .leaves
            .remove(&leaf_id)
            .ok_or_else(|| StrataError::internal(format!("leaf {leaf_id} missing")))?;
        if leaf.prev.is_valid() {
            self.leaf_mut(leaf.prev)?.next = leaf.next;
        }
        if leaf.next.is_valid() {
            self.leaf_mut(leaf.next)?.prev = leaf.prev;
        }
        self.allocator.free(leaf_id);
        self.stats.removals += 1;

        self.remove_child(manager, path)?;
        self.collapse_root(manager)
    }

    /// Detaches the child the last path step points at.
    fn remove_child(&mut self, manager: &dyn ValueManager, mut path: Path) -> StrataResult<()> {
        let Some((parent_id, pos)) = path.pop() else {
            return Err(StrataError::internal("removed node has no parent"));
        };
        let parent = self.internal_mut(parent_id)?;
        if parent.entries.is_empty() {
            self.internals.remove(&parent_id);
            self.allocator.free(parent_id);
            self.stats.removals += 1;
            if path.is_empty() {
                return self.reset_root();
            }
            return self.remove_child(manager, path);
        }

        let mut separator = if pos == 0 {
            let first = parent.entries.remove(0);
            parent.leftmost_child = first.child;
            first.key
        } else {
            parent.entries.remove(pos - 1).key
        };
        manager.dispose_row(&mut separator);
        Ok(())
    }

    fn collapse_root(&mut self, manager: &dyn ValueManager) -> StrataResult<()> {
        while self.height > 0 {
            let root = self.internal(self.root)?;
            if !root.entries.is_empty() {
                break;
            }
            let child = root.leftmost_child;
            if let Some(mut old) = self.internals.remove(&self.root) {
                for entry in &mut old.entries {
                    manager.dispose_row(&mut entry.key);
                }
            }
            self.allocator.free(self.root);
            self.root = child;
            self.height -= 1;
            tracing::trace!(index = %self.name, height = self.height, "collapsed root");
        }
        Ok(())
    }

    fn reset_root(&mut self) -> StrataResult<()> {
        let root = self.allocator.allocate();
        self.leaves.insert(root, LeafNode::new(root));
        self.root = root;
        self.height = 0;
        Ok(())
    }

    /// Replaces the entry for `old_key` with `new_key` and `new_data`.
    ///
    /// Either the whole change applies or the index is left unchanged.
    pub fn update(
        &mut self,
        manager: &dyn ValueManager,
        old_key: &Row,
        new_key: &Row,
        new_data: &Row,
    ) -> StrataResult<()> {
        self.check_full_key(old_key)?;
        self.check_full_key(new_key)?;
        self.check_data(new_data)?;

        let Some(position) = self.find(manager, old_key)? else {
            return Err(StrataError::KeyNotFound {
                index: self.name.clone(),
                key: old_key.to_string(),
            });
        };

        if self.compare_keys(manager, old_key, new_key)? == Ordering::Equal {
            let data = manager.copy_row(new_data)?;
            let entry = self
                .leaf_mut(position.leaf)?
                .entries
                .get_mut(position.slot)
                .ok_or_else(|| StrataError::internal("entry vanished during update"))?;
            let mut previous = std::mem::replace(&mut entry.data, data);
            manager.dispose_row(&mut previous);
            return Ok(());
        }

        if self.contains(manager, new_key)? {
            return Err(StrataError::IndexKeyCollision {
                index: self.name.clone(),
                key: new_key.to_string(),
            });
        }
        let mut key = manager.copy_row(new_key)?;
        let data = match manager.copy_row(new_data) {
            Ok(data) => data,
            Err(e) => {
                manager.dispose_row(&mut key);
                return Err(e);
            }
        };
        if let Err(e) = self.delete(manager, old_key) {
            let mut data = data;
            manager.dispose_row(&mut key);
            manager.dispose_row(&mut data);
            return Err(e);
        }
        self.insert_owned(manager, key, data)
    }

    /// Removes every entry, leaving an empty usable index.
    pub fn truncate(&mut self, manager: &dyn ValueManager) -> StrataResult<()> {
        self.check_usable()?;
        self.release_all(manager);
        self.reset_root()?;
        tracing::debug!(index = %self.name, "truncated index");
        Ok(())
    }

    /// Removes every entry and retires the index.
    pub fn drop_index(&mut self, manager: &dyn ValueManager) {
        if self.dropped {
            return;
        }
        self.release_all(manager);
        self.dropped = true;
        tracing::debug!(index = %self.name, "dropped index");
    }

    fn release_all(&mut self, manager: &dyn ValueManager) {
        for (_, mut leaf) in self.leaves.drain() {
            for entry in &mut leaf.entries {
                manager.dispose_row(&mut entry.key);
                manager.dispose_row(&mut entry.data);
            }
        }
        for (_, mut node) in self.internals.drain() {
            for entry in &mut node.entries {
                manager.dispose_row(&mut entry.key);
            }
        }
        self.allocator = NodeAllocator::new();
        self.height = 0;
        self.len = 0;
    }

    /// Builds an independent index with copies of every entry.
    pub fn deep_copy(&self, manager: &dyn ValueManager) -> StrataResult<NativeIndex> {
        self.check_usable()?;
        let mut copy = NativeIndex::new(
            self.name.clone(),
            Arc::clone(&self.key_type),
            Arc::clone(&self.data_type),
            self.directions.clone(),
            self.config,
        )?;
        for (key, data) in self.iter() {
            if let Err(e) = copy.insert(manager, key, data) {
                copy.drop_index(manager);
                return Err(e);
            }
        }
        Ok(copy)
    }

    /// Checks ordering, sibling links, and the entry count.
    pub fn validate(&self, manager: &dyn ValueManager) -> StrataResult<()> {
        self.check_usable()?;
        let fault = |what: String| StrataError::internal(format!("index '{}': {what}", self.name));

        let mut id = self.edge_leaf(false)?;
        let mut prev = NodeId::INVALID;
        let mut count = 0;
        let mut last_key: Option<&Row> = None;
        while id.is_valid() {
            let leaf = self.leaf(id)?;
            if leaf.prev != prev {
                return Err(fault(format!("leaf {id} has prev {} not {prev}", leaf.prev)));
            }
            for entry in &leaf.entries {
                if let Some(last) = last_key {
                    if self.compare_keys(manager, last, &entry.key)? != Ordering::Less {
                        return Err(fault(format!("{} does not follow {last}", entry.key)));
                    }
                }
                last_key = Some(&entry.key);
                count += 1;
            }
            prev = id;
            id = leaf.next;
        }
        if count != self.len {
            return Err(fault(format!("{count} entries reachable, {} counted", self.len)));
        }
        if prev != self.edge_leaf(true)? {
            return Err(fault("leaf chain does not end at the rightmost leaf".into()));
        }
        for node in self.internals.values() {
            if node.child_count() < 1 || !node.leftmost_child.is_valid() {
                return Err(fault(format!("internal node {} has no children", node.id)));
            }
        }
        Ok(())
    }
}

/// Iterator over index entries in key order.
pub struct IndexIter<'a> {
    index: &'a NativeIndex,
    position: Option<IndexPosition>,
}

impl<'a> Iterator for IndexIter<'a> {
    type Item = (&'a Row, &'a Row);

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.position?;
        let entry = self.index.entry_at(position).ok()?;
        self.position = self.index.next(position).ok().flatten();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ScalarType};
    use crate::value::{DefaultValueManager, Scalar};
    use strata_common::ErrorCode;

    fn key_type() -> Arc<RowType> {
        Arc::new(
            RowType::new(vec![
                Column::new("a", ScalarType::Int32),
                Column::new("b", ScalarType::Int32),
            ])
            .unwrap(),
        )
    }

    fn data_type() -> Arc<RowType> {
        Arc::new(RowType::new(vec![Column::new("v", ScalarType::String)]).unwrap())
    }

    fn index_with(config: IndexConfig, directions: Vec<SortDirection>) -> NativeIndex {
        NativeIndex::new("Test", key_type(), data_type(), directions, config).unwrap()
    }

    fn small_index() -> NativeIndex {
        index_with(
            IndexConfig::for_testing(),
            vec![SortDirection::Ascending, SortDirection::Ascending],
        )
    }

    fn key(a: i32, b: i32) -> Row {
        Row::from_values(key_type(), vec![a.into(), b.into()]).unwrap()
    }

    fn partial(a: i32) -> Row {
        let mut row = Row::new(key_type());
        row.set_value(&crate::value::MemoryStreamManager::new(), 0, a.into())
            .unwrap();
        row
    }

    fn data(v: &str) -> Row {
        Row::from_values(data_type(), vec![v.into()]).unwrap()
    }

    fn keys(index: &NativeIndex) -> Vec<String> {
        index.iter().map(|(k, _)| k.to_string()).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        index.insert(&m, &key(1, 1), &data("one")).unwrap();
        assert_eq!(index.len(), 1);
        let found = index.get(&m, &key(1, 1)).unwrap().unwrap();
        assert_eq!(found.value(0).unwrap().as_string().unwrap(), "one");
        assert!(index.get(&m, &key(2, 2)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        index.insert(&m, &key(1, 1), &data("one")).unwrap();
        let err = index.insert(&m, &key(1, 1), &data("again")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert_eq!(err.params(), vec!["Test".to_string(), "(1, 1)".to_string()]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_incomplete_key_rejected() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        let err = index.insert(&m, &partial(1), &data("x")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IncompleteRow);
    }

    #[test]
    fn test_many_inserts_split_and_stay_ordered() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for i in (0..200).rev() {
            index.insert(&m, &key(i % 10, i), &data(&i.to_string())).unwrap();
        }
        assert_eq!(index.len(), 200);
        let stats = index.stats();
        assert!(stats.height >= 2);
        assert!(stats.splits > 0);
        index.validate(&m).unwrap();

        let first = index.first().unwrap().unwrap();
        assert_eq!(index.entry_at(first).unwrap().0.to_string(), "(0, 0)");
        let last = index.last().unwrap().unwrap();
        assert_eq!(index.entry_at(last).unwrap().0.to_string(), "(9, 199)");
    }

    #[test]
    fn test_descending_direction() {
        let m = DefaultValueManager::new();
        let mut index = index_with(
            IndexConfig::for_testing(),
            vec![SortDirection::Descending, SortDirection::Ascending],
        );
        for (a, b) in [(1, 1), (3, 1), (2, 2), (2, 1)] {
            index.insert(&m, &key(a, b), &data("")).unwrap();
        }
        assert_eq!(keys(&index), vec!["(3, 1)", "(2, 1)", "(2, 2)", "(1, 1)"]);
        index.validate(&m).unwrap();
    }

    #[test]
    fn test_partial_key_seek() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for a in 0..8 {
            for b in 0..4 {
                index.insert(&m, &key(a, b), &data("")).unwrap();
            }
        }
        let first_match = index.find(&m, &partial(5)).unwrap().unwrap();
        assert_eq!(index.entry_at(first_match).unwrap().0.to_string(), "(5, 0)");

        let after = index.seek_after(&m, &partial(5)).unwrap().unwrap();
        assert_eq!(index.entry_at(after).unwrap().0.to_string(), "(6, 0)");

        let at_or_before = index.seek_at_or_before(&m, &partial(5)).unwrap().unwrap();
        assert_eq!(index.entry_at(at_or_before).unwrap().0.to_string(), "(5, 3)");

        let before = index.seek_before(&m, &partial(5)).unwrap().unwrap();
        assert_eq!(index.entry_at(before).unwrap().0.to_string(), "(4, 3)");

        assert!(index.find(&m, &partial(42)).unwrap().is_none());
        assert!(index.seek(&m, &partial(42)).unwrap().is_none());
        assert!(index.seek_before(&m, &partial(0)).unwrap().is_none());
    }

    #[test]
    fn test_navigation_round_trip() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for i in 0..25 {
            index.insert(&m, &key(i, 0), &data("")).unwrap();
        }
        let mut forward = Vec::new();
        let mut position = index.first().unwrap();
        while let Some(p) = position {
            forward.push(index.entry_at(p).unwrap().0.to_string());
            position = index.next(p).unwrap();
        }
        let mut backward = Vec::new();
        let mut position = index.last().unwrap();
        while let Some(p) = position {
            backward.push(index.entry_at(p).unwrap().0.to_string());
            position = index.prior(p).unwrap();
        }
        backward.reverse();
        assert_eq!(forward.len(), 25);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_delete_everything_collapses_tree() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for i in 0..60 {
            index.insert(&m, &key(i, i), &data("x")).unwrap();
        }
        for i in (0..60).filter(|i| i % 2 == 0) {
            index.delete(&m, &key(i, i)).unwrap();
        }
        index.validate(&m).unwrap();
        assert_eq!(index.len(), 30);
        for i in (0..60).filter(|i| i % 2 == 1) {
            index.delete(&m, &key(i, i)).unwrap();
            index.validate(&m).unwrap();
        }
        assert!(index.is_empty());
        assert_eq!(index.stats().height, 0);
        assert!(index.first().unwrap().is_none());

        let err = index.delete(&m, &key(1, 1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyNotFound);

        index.insert(&m, &key(5, 5), &data("back")).unwrap();
        assert_eq!(keys(&index), vec!["(5, 5)"]);
    }

    #[test]
    fn test_update_in_place_and_moving() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for i in 0..10 {
            index.insert(&m, &key(i, 0), &data(&i.to_string())).unwrap();
        }

        index.update(&m, &key(3, 0), &key(3, 0), &data("three")).unwrap();
        let found = index.get(&m, &key(3, 0)).unwrap().unwrap();
        assert_eq!(found.value(0).unwrap().as_string().unwrap(), "three");

        index.update(&m, &key(3, 0), &key(30, 0), &data("thirty")).unwrap();
        assert!(!index.contains(&m, &key(3, 0)).unwrap());
        assert!(index.contains(&m, &key(30, 0)).unwrap());
        assert_eq!(index.len(), 10);

        let err = index.update(&m, &key(4, 0), &key(5, 0), &data("")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert!(index.contains(&m, &key(4, 0)).unwrap());

        let err = index.update(&m, &key(99, 0), &key(98, 0), &data("")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyNotFound);
        index.validate(&m).unwrap();
    }

    #[test]
    fn test_index_owns_copies() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        let mut payload = Row::new(data_type());
        let text = Scalar::new_stream(m.streams(), ScalarType::String, "big".into()).unwrap();
        payload.set_value(m.streams(), 0, text).unwrap();

        index.insert(&m, &key(1, 1), &payload).unwrap();
        assert_eq!(m.streams().stream_count(), 2);

        m.dispose_row(&mut payload);
        assert_eq!(m.streams().stream_count(), 1);
        let stored = index.get(&m, &key(1, 1)).unwrap().unwrap();
        assert_eq!(
            stored.value(0).unwrap().materialize(m.streams()).unwrap(),
            Some(crate::value::NativeValue::String("big".into()))
        );

        index.delete(&m, &key(1, 1)).unwrap();
        assert_eq!(m.streams().stream_count(), 0);
    }

    #[test]
    fn test_truncate_and_drop() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for i in 0..20 {
            index.insert(&m, &key(i, 0), &data("")).unwrap();
        }
        index.truncate(&m).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.stats().leaf_count, 1);
        index.insert(&m, &key(1, 0), &data("")).unwrap();

        index.drop_index(&m);
        assert!(index.is_dropped());
        let err = index.insert(&m, &key(2, 0), &data("")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexDropped);
        assert_eq!(index.first().unwrap_err().code(), ErrorCode::IndexDropped);
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        for i in 0..15 {
            index.insert(&m, &key(i, 0), &data("")).unwrap();
        }
        let mut copy = index.deep_copy(&m).unwrap();
        copy.delete(&m, &key(0, 0)).unwrap();
        assert_eq!(index.len(), 15);
        assert_eq!(copy.len(), 14);
        assert_eq!(keys(&index)[1..], keys(&copy)[..]);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let m = DefaultValueManager::new();
        let mut index = small_index();
        let err = index.insert(&m, &data("x"), &data("x")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IncompatibleRowTypes);
        let err = index.insert(&m, &key(1, 1), &key(1, 1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IncompatibleRowTypes);
    }
}
