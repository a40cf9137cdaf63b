//! The table scan cursor.

use std::cmp::Ordering;
use std::sync::Arc;

use strata_common::{StrataError, StrataResult, TableVersion};
use strata_storage::index::IndexPosition;
use strata_storage::value::{Row, Scalar, StreamManager, ValueManager};

use super::bookmark::Bookmark;
use super::capability::{CursorCapabilities, CursorIsolation, ScanDirection};
use super::state::CursorState;
use crate::native_table::{is_not_found, NativeTable, TableIndex};
use crate::shared::{SharedTable, TableSnapshot};

/// The row a cursor is on.
#[derive(Debug)]
struct Current {
    /// Owned copy of the row's key in the active order.
    key: Row,
    /// Owned copy of the full row.
    row: Row,
    /// Version `position` is valid for.
    version: TableVersion,
    position: IndexPosition,
}

/// Outcome of resolving a bookmark.
enum Resolution {
    Found(Current),
    Missing {
        nearest: Option<Current>,
        error: StrataError,
    },
}

/// A positionable cursor over a shared table.
///
/// Rows are visited in the order of one of the table's indexes, in either
/// direction. The cursor keeps its own copy of the current row, so it stays
/// valid while other cursors change the table; on the next move it finds
/// its place again by key.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use strata_common::EngineConfig;
/// use strata_storage::schema::{Column, Order, RowType, ScalarType, TableType};
/// use strata_storage::value::{DefaultValueManager, Row};
/// use strata_table::{CursorCapabilities, SharedTable, TableScan};
///
/// let row_type = RowType::new(vec![Column::new("id", ScalarType::Int32)]).unwrap();
/// let table_type = TableType::new("Ids", row_type).with_key(Order::key("Ids_PK", &[0]));
/// let table = SharedTable::new(&table_type, Arc::new(DefaultValueManager::new()), EngineConfig::default()).unwrap();
///
/// let mut scan = TableScan::new(table.clone())
///     .with_capabilities(CursorCapabilities::READ_ONLY | CursorCapabilities::INSERTABLE);
/// scan.open().unwrap();
/// for id in [3i32, 1, 2] {
///     let row = Row::from_values(Arc::clone(table_type.row_type()), vec![id.into()]).unwrap();
///     scan.insert(&row, false).unwrap();
/// }
/// assert!(scan.first().unwrap());
/// assert_eq!(scan.select().unwrap().to_string(), "(1)");
/// assert_eq!(scan.row_count().unwrap(), 3);
/// ```
pub struct TableScan {
    table: SharedTable,
    order: String,
    direction: ScanDirection,
    capabilities: CursorCapabilities,
    isolation: CursorIsolation,
    state: CursorState,
    snapshot: Option<TableSnapshot>,
    current: Option<Current>,
    /// Runs between a failed lookup and the retry decision in
    /// `optimistic_refresh`.
    #[cfg(test)]
    refresh_hook: Option<Box<dyn FnMut(&SharedTable, u32) + Send>>,
}

impl TableScan {
    /// Creates a closed, read-only cursor over the clustered order.
    pub fn new(table: SharedTable) -> Self {
        let order = table.read(|t, _| t.clustered().definition().name().to_string());
        Self {
            table,
            order,
            direction: ScanDirection::default(),
            capabilities: CursorCapabilities::default(),
            isolation: CursorIsolation::default(),
            state: CursorState::Closed,
            snapshot: None,
            current: None,
            #[cfg(test)]
            refresh_hook: None,
        }
    }

    /// Visits rows in the order named `order`.
    #[must_use]
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    /// Sets the traversal direction.
    #[must_use]
    pub fn with_direction(mut self, direction: ScanDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the requested capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: CursorCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the isolation level.
    #[must_use]
    pub fn with_isolation(mut self, isolation: CursorIsolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// The table.
    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    /// Name of the order rows are visited in.
    pub fn order(&self) -> &str {
        &self.order
    }

    /// Traversal direction.
    pub fn direction(&self) -> ScanDirection {
        self.direction
    }

    /// Requested capabilities.
    pub fn capabilities(&self) -> CursorCapabilities {
        self.capabilities
    }

    /// Isolation level.
    pub fn isolation(&self) -> CursorIsolation {
        self.isolation
    }

    /// Current state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Returns true unless the cursor is closed.
    pub fn is_open(&self) -> bool {
        self.state.is_active()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn manager(&self) -> Arc<dyn ValueManager> {
        Arc::clone(self.table.manager())
    }

    fn check_active(&self) -> StrataResult<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(StrataError::ScanInactive)
        }
    }

    /// Checks capabilities, then that the cursor is open.
    fn require(&self, needed: CursorCapabilities) -> StrataResult<()> {
        self.capabilities.require(needed)?;
        self.check_active()
    }

    fn positioned(&self) -> StrataResult<&Current> {
        match (&self.current, self.state) {
            (Some(current), CursorState::Positioned) => Ok(current),
            _ => Err(StrataError::NoActiveRow),
        }
    }

    /// Runs `f` against the version this cursor reads.
    fn view<R>(&self, f: impl FnOnce(&NativeTable, TableVersion) -> StrataResult<R>) -> StrataResult<R> {
        match &self.snapshot {
            Some(snapshot) => f(snapshot.table(), snapshot.version()),
            None => self.table.read(f),
        }
    }

    fn view_version(&self) -> TableVersion {
        match &self.snapshot {
            Some(snapshot) => snapshot.version(),
            None => self.table.version(),
        }
    }

    fn active_index<'t>(&self, table: &'t NativeTable) -> StrataResult<&'t TableIndex> {
        table.index_for_order(&self.order)
    }

    /// Moves onto `next`, or onto `sentinel` when there is no row.
    fn land(&mut self, next: Option<Current>, sentinel: CursorState) {
        self.release_current();
        match next {
            Some(current) => {
                self.current = Some(current);
                self.state = CursorState::Positioned;
            }
            None => self.state = sentinel,
        }
    }

    fn release_current(&mut self) {
        if let Some(mut current) = self.current.take() {
            let manager = self.manager();
            manager.dispose_row(&mut current.key);
            manager.dispose_row(&mut current.row);
        }
    }

    /// After a write through this cursor, an isolated cursor moves to the
    /// version it just produced.
    fn repin(&mut self) {
        if self.isolation.pins_snapshot() {
            self.snapshot = Some(self.table.snapshot());
        }
    }

    /// First row in scan order, or last with `at_end`.
    fn edge(&self, at_end: bool) -> StrataResult<Option<Current>> {
        let manager = self.manager();
        self.view(|table, version| {
            let index = self.active_index(table)?;
            let position = if at_end == self.direction.is_forward() {
                index.index().last()?
            } else {
                index.index().first()?
            };
            position
                .map(|p| load(manager.as_ref(), table, index, p, version))
                .transpose()
        })
    }

    /// The row after the current one in scan order, or before with
    /// `forward == false`.
    fn neighbour(&self, forward: bool) -> StrataResult<Option<Current>> {
        let manager = self.manager();
        let current = self.current.as_ref().ok_or(StrataError::NoActiveRow)?;
        self.view(|table, version| {
            let index = self.active_index(table)?;
            let tree = index.index();
            let index_forward = forward == self.direction.is_forward();
            // A cached position is only valid for the version it came from.
            let position = match (current.version == version, index_forward) {
                (true, true) => tree.next(current.position)?,
                (true, false) => tree.prior(current.position)?,
                (false, true) => tree.seek_after(manager.as_ref(), &current.key)?,
                (false, false) => tree.seek_before(manager.as_ref(), &current.key)?,
            };
            position
                .map(|p| load(manager.as_ref(), table, index, p, version))
                .transpose()
        })
    }

    /// Locates the stored row with `row`'s clustered key.
    fn locate(&self, row: &Row) -> StrataResult<Current> {
        let manager = self.manager();
        self.view(|table, version| {
            let clustered_key = table.clustered().definition().full_key_of(row)?;
            let lookup_failure = || StrataError::ClusteredLookupFailure {
                table: table.name().to_string(),
                key: clustered_key.to_string(),
            };
            let stored = table
                .get(manager.as_ref(), &clustered_key)?
                .ok_or_else(lookup_failure)?;
            let index = self.active_index(table)?;
            let key = index.definition().key_of(stored)?;
            let position = index
                .index()
                .find(manager.as_ref(), &key)?
                .ok_or_else(lookup_failure)?;
            load(manager.as_ref(), table, index, position, version)
        })
    }

    #[cfg(test)]
    fn after_refresh_attempt(&mut self, attempt: u32) {
        if let Some(hook) = self.refresh_hook.as_mut() {
            hook(&self.table, attempt);
        }
    }

    #[cfg(not(test))]
    #[inline]
    fn after_refresh_attempt(&mut self, _attempt: u32) {}

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens the cursor, leaving it before the first row.
    ///
    /// Fails with `CapabilityViolation` if the table does not support every
    /// requested capability.
    pub fn open(&mut self) -> StrataResult<()> {
        if self.state.is_active() {
            return Err(StrataError::invalid_argument("cursor is already open"));
        }
        self.table.capabilities().require(self.capabilities)?;
        self.table
            .read(|table, _| self.active_index(table).map(|_| ()))?;
        if self.isolation.pins_snapshot() {
            self.snapshot = Some(self.table.snapshot());
        }
        self.state = CursorState::BeforeFirst;
        tracing::debug!(
            table = %self.table.name(),
            order = %self.order,
            isolation = %self.isolation,
            capabilities = %self.capabilities,
            "opened cursor"
        );
        Ok(())
    }

    /// Closes the cursor, releasing its row buffers and any snapshot.
    pub fn close(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.release_current();
        self.snapshot = None;
        self.state = CursorState::Closed;
        if self.table.config().cursor.collect_retired_versions {
            self.table.collect_garbage();
        }
        tracing::debug!(table = %self.table.name(), order = %self.order, "closed cursor");
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Moves to the first row. Returns false, before the first row, if the
    /// table is empty.
    pub fn first(&mut self) -> StrataResult<bool> {
        self.require(CursorCapabilities::NAVIGABLE)?;
        let next = self.edge(false)?;
        let found = next.is_some();
        self.land(next, CursorState::BeforeFirst);
        Ok(found)
    }

    /// Moves to the last row. Returns false, after the last row, if the
    /// table is empty.
    pub fn last(&mut self) -> StrataResult<bool> {
        self.require(CursorCapabilities::NAVIGABLE | CursorCapabilities::BACKWARDS_NAVIGABLE)?;
        let next = self.edge(true)?;
        let found = next.is_some();
        self.land(next, CursorState::AfterLast);
        Ok(found)
    }

    /// Moves to the next row. Returns false, after the last row, once there
    /// are no more rows.
    pub fn next(&mut self) -> StrataResult<bool> {
        self.require(CursorCapabilities::NAVIGABLE)?;
        let next = match self.state {
            CursorState::AfterLast | CursorState::Closed => return Ok(false),
            CursorState::BeforeFirst => self.edge(false)?,
            CursorState::Positioned => self.neighbour(true)?,
        };
        let found = next.is_some();
        self.land(next, CursorState::AfterLast);
        Ok(found)
    }

    /// Moves to the previous row. Returns false, before the first row, once
    /// there are no more rows.
    pub fn prior(&mut self) -> StrataResult<bool> {
        self.require(CursorCapabilities::NAVIGABLE | CursorCapabilities::BACKWARDS_NAVIGABLE)?;
        let next = match self.state {
            CursorState::BeforeFirst | CursorState::Closed => return Ok(false),
            CursorState::AfterLast => self.edge(true)?,
            CursorState::Positioned => self.neighbour(false)?,
        };
        let found = next.is_some();
        self.land(next, CursorState::BeforeFirst);
        Ok(found)
    }

    /// Returns true before the first row, or on either sentinel of an empty
    /// table.
    pub fn bof(&self) -> StrataResult<bool> {
        self.check_active()?;
        Ok(match self.state {
            CursorState::BeforeFirst => true,
            CursorState::AfterLast => self.is_empty()?,
            _ => false,
        })
    }

    /// Returns true after the last row, or on either sentinel of an empty
    /// table.
    pub fn eof(&self) -> StrataResult<bool> {
        self.check_active()?;
        Ok(match self.state {
            CursorState::AfterLast => true,
            CursorState::BeforeFirst => self.is_empty()?,
            _ => false,
        })
    }

    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> StrataResult<bool> {
        self.check_active()?;
        self.view(|table, _| Ok(table.is_empty()))
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// An owned copy of the current row.
    ///
    /// A cursor reading the live table returns the row as currently stored;
    /// if it has been deleted meanwhile this fails with
    /// `ClusteredLookupFailure`.
    pub fn select(&self) -> StrataResult<Row> {
        self.check_active()?;
        let current = self.positioned()?;
        let manager = self.manager();
        self.view(|table, version| {
            if version == current.version {
                return manager.copy_row(&current.row);
            }
            let key = table.clustered().definition().full_key_of(&current.row)?;
            match table.get(manager.as_ref(), &key)? {
                Some(row) => manager.copy_row(row),
                None => Err(StrataError::ClusteredLookupFailure {
                    table: table.name().to_string(),
                    key: key.to_string(),
                }),
            }
        })
    }

    /// Copies the current row into `target`.
    pub fn select_into(&self, target: &mut Row) -> StrataResult<()> {
        let mut row = self.select()?;
        let manager = self.manager();
        let result = row.copy_to(manager.streams(), target);
        manager.dispose_row(&mut row);
        result
    }

    /// An owned copy of the current row's key in the active order.
    pub fn get_key(&self) -> StrataResult<Row> {
        self.check_active()?;
        let current = self.positioned()?;
        self.manager().copy_row(&current.key)
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> StrataResult<usize> {
        self.require(CursorCapabilities::COUNTABLE)?;
        self.view(|table, _| Ok(table.row_count()))
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// Saves the current position.
    pub fn get_bookmark(&self) -> StrataResult<Bookmark> {
        self.require(CursorCapabilities::BOOKMARKABLE)?;
        let current = self.positioned()?;
        Ok(Bookmark {
            row: self.manager().copy_row(&current.row)?,
            order: self.order.clone(),
            version: current.version,
            position: current.position,
        })
    }

    /// Frees the row copy held by `bookmark`.
    pub fn release_bookmark(&self, mut bookmark: Bookmark) {
        self.manager().dispose_row(&mut bookmark.row);
    }

    /// Returns to a saved position.
    ///
    /// A bookmark taken in this order at the version the cursor reads goes
    /// straight back to its saved position. Otherwise the row is found again
    /// through its clustered key. If it has been deleted, the cursor moves
    /// to the nearest row in the requested direction and the call fails
    /// with `ClusteredLookupFailure`.
    pub fn goto_bookmark(&mut self, bookmark: &Bookmark, forward: bool) -> StrataResult<()> {
        self.require(CursorCapabilities::BOOKMARKABLE)?;
        let manager = self.manager();
        let resolution = self.view(|table, version| {
            let index = self.active_index(table)?;
            if bookmark.version == version && bookmark.order == self.order {
                return Ok(Resolution::Found(load(
                    manager.as_ref(),
                    table,
                    index,
                    bookmark.position,
                    version,
                )?));
            }

            let clustered_key = table.clustered().definition().full_key_of(bookmark.row())?;
            if let Some(stored) = table.get(manager.as_ref(), &clustered_key)? {
                let key = index.definition().key_of(stored)?;
                if let Some(position) = index.index().find(manager.as_ref(), &key)? {
                    return Ok(Resolution::Found(load(
                        manager.as_ref(),
                        table,
                        index,
                        position,
                        version,
                    )?));
                }
            }

            let key = index.definition().key_of(bookmark.row())?;
            let position = if forward == self.direction.is_forward() {
                index.index().seek(manager.as_ref(), &key)?
            } else {
                index.index().seek_at_or_before(manager.as_ref(), &key)?
            };
            let nearest = position
                .map(|p| load(manager.as_ref(), table, index, p, version))
                .transpose()?;
            Ok(Resolution::Missing {
                nearest,
                error: StrataError::ClusteredLookupFailure {
                    table: table.name().to_string(),
                    key: clustered_key.to_string(),
                },
            })
        })?;

        match resolution {
            Resolution::Found(current) => {
                self.land(Some(current), CursorState::BeforeFirst);
                Ok(())
            }
            Resolution::Missing { nearest, error } => {
                let sentinel = if forward {
                    CursorState::AfterLast
                } else {
                    CursorState::BeforeFirst
                };
                self.land(nearest, sentinel);
                Err(error)
            }
        }
    }

    /// Orders two bookmarks as this cursor would visit them.
    pub fn compare_bookmarks(&self, a: &Bookmark, b: &Bookmark) -> StrataResult<Ordering> {
        self.require(CursorCapabilities::BOOKMARKABLE)?;
        let manager = self.manager();
        self.view(|table, _| {
            let index = self.active_index(table)?;
            let a = index.definition().key_of(a.row())?;
            let b = index.definition().key_of(b.row())?;
            let ordering = index.index().compare_keys(manager.as_ref(), &a, &b)?;
            Ok(if self.direction.is_forward() {
                ordering
            } else {
                ordering.reverse()
            })
        })
    }

    // =========================================================================
    // Searching
    // =========================================================================

    /// Moves to the first row, in scan order, whose key matches `key`.
    ///
    /// `key` supplies values by column name for a prefix of the active
    /// order. Returns false and leaves the position unchanged if no row
    /// matches.
    pub fn find_key(&mut self, key: &Row) -> StrataResult<bool> {
        self.require(CursorCapabilities::SEARCHABLE)?;
        let manager = self.manager();
        let found = self.view(|table, version| {
            let index = self.active_index(table)?;
            let search = search_key(index, manager.streams(), key)?;
            let position = if self.direction.is_forward() {
                index.index().find(manager.as_ref(), &search)?
            } else {
                match index.index().seek_at_or_before(manager.as_ref(), &search)? {
                    Some(position) => {
                        let (candidate, _) = index.index().entry_at(position)?;
                        let ordering = index.index().compare_keys(manager.as_ref(), candidate, &search)?;
                        (ordering == Ordering::Equal).then_some(position)
                    }
                    None => None,
                }
            };
            position
                .map(|p| load(manager.as_ref(), table, index, p, version))
                .transpose()
        })?;

        match found {
            Some(current) => {
                self.land(Some(current), CursorState::BeforeFirst);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Moves to the first row, in scan order, at or beyond `key`; after the
    /// last row if there is none.
    pub fn find_nearest(&mut self, key: &Row) -> StrataResult<()> {
        self.require(CursorCapabilities::SEARCHABLE)?;
        let manager = self.manager();
        let nearest = self.view(|table, version| {
            let index = self.active_index(table)?;
            let search = search_key(index, manager.streams(), key)?;
            let position = if self.direction.is_forward() {
                index.index().seek(manager.as_ref(), &search)?
            } else {
                index.index().seek_at_or_before(manager.as_ref(), &search)?
            };
            position
                .map(|p| load(manager.as_ref(), table, index, p, version))
                .transpose()
        })?;
        self.land(nearest, CursorState::AfterLast);
        Ok(())
    }

    /// Moves to the stored row with `row`'s clustered key.
    ///
    /// Fails with `ClusteredLookupFailure`, leaving the position unchanged,
    /// if there is no such row.
    pub fn refresh(&mut self, row: &Row) -> StrataResult<()> {
        self.require(CursorCapabilities::NAVIGABLE)?;
        let current = self.locate(row)?;
        self.land(Some(current), CursorState::BeforeFirst);
        Ok(())
    }

    /// Like [`refresh`](Self::refresh), but a miss while the table is
    /// changing is retried.
    ///
    /// A miss against an unchanged table fails with
    /// `ClusteredLookupFailure`. After the configured number of attempts
    /// the call fails with `OptimisticRefreshExhausted`.
    pub fn optimistic_refresh(&mut self, row: &Row) -> StrataResult<()> {
        self.require(CursorCapabilities::NAVIGABLE)?;
        let attempts = self.table.config().cursor.optimistic_refresh_retries;
        for attempt in 1..=attempts {
            let before = self.view_version();
            let located = self.locate(row);
            if located.is_err() {
                self.after_refresh_attempt(attempt);
            }
            match located {
                Ok(current) => {
                    self.land(Some(current), CursorState::BeforeFirst);
                    return Ok(());
                }
                Err(e) if is_not_found(&e) && self.view_version() != before => {
                    tracing::trace!(table = %self.table.name(), attempt, "table moved during refresh");
                }
                Err(e) => return Err(e),
            }
        }
        Err(StrataError::OptimisticRefreshExhausted { attempts })
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Inserts a row and moves onto it.
    ///
    /// With `unchecked`, columns outside the index keys may be left
    /// without a value.
    pub fn insert(&mut self, row: &Row, unchecked: bool) -> StrataResult<()> {
        self.require(CursorCapabilities::INSERTABLE)?;
        self.table.insert(row, unchecked)?;
        self.repin();
        let current = self.locate(row)?;
        self.land(Some(current), CursorState::BeforeFirst);
        Ok(())
    }

    /// Replaces the current row with `row` and moves onto it.
    pub fn update(&mut self, row: &Row, unchecked: bool) -> StrataResult<()> {
        self.require(CursorCapabilities::UPDATABLE)?;
        let current = self.positioned()?;
        self.table.update(&current.row, row, unchecked)?;
        self.repin();
        let current = self.locate(row)?;
        self.land(Some(current), CursorState::BeforeFirst);
        Ok(())
    }

    /// Deletes the current row and moves to the row after it.
    pub fn delete(&mut self) -> StrataResult<()> {
        self.require(CursorCapabilities::DELETABLE)?;
        let current = self.positioned()?;
        self.table.delete(&current.row)?;
        self.repin();
        let next = self.neighbour(true)?;
        self.land(next, CursorState::AfterLast);
        Ok(())
    }

    /// Removes every row, leaving the cursor before the first row.
    pub fn truncate(&mut self) -> StrataResult<()> {
        self.require(CursorCapabilities::TRUNCATEABLE)?;
        self.table.truncate()?;
        self.repin();
        self.land(None, CursorState::BeforeFirst);
        Ok(())
    }
}

impl Drop for TableScan {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TableScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableScan")
            .field("table", &self.table.name())
            .field("order", &self.order)
            .field("direction", &self.direction)
            .field("isolation", &self.isolation)
            .field("state", &self.state)
            .finish()
    }
}

/// Copies the entry at `position` out of the table.
fn load(
    manager: &dyn ValueManager,
    table: &NativeTable,
    index: &TableIndex,
    position: IndexPosition,
    version: TableVersion,
) -> StrataResult<Current> {
    let (key, data) = index.index().entry_at(position)?;
    let row = if index.definition().is_clustered() {
        data
    } else {
        table
            .get(manager, data)?
            .ok_or_else(|| StrataError::ClusteredLookupFailure {
                table: table.name().to_string(),
                key: data.to_string(),
            })?
    };
    let mut key = manager.copy_row(key)?;
    let row = match manager.copy_row(row) {
        Ok(row) => row,
        Err(e) => {
            manager.dispose_row(&mut key);
            return Err(e);
        }
    };
    Ok(Current {
        key,
        row,
        version,
        position,
    })
}

/// Builds a search key for `index` from the columns of `key`, matched by
/// name. The key ends at the first order column `key` has no value for.
fn search_key(index: &TableIndex, streams: &dyn StreamManager, key: &Row) -> StrataResult<Row> {
    let key_type = index.definition().key_type();
    let mut search = Row::new(Arc::clone(key_type));
    let mut filled = 0;
    for (target, column) in key_type.columns().iter().enumerate() {
        let Some(source) = key.row_type().index_of_column(&column.name) else {
            break;
        };
        if !key.has_value(source) {
            break;
        }
        search.set_value(streams, target, Scalar::borrow_from(key.value(source)?))?;
        filled += 1;
    }
    if filled == 0 {
        return Err(StrataError::invalid_argument(format!(
            "key {} supplies no leading column of order '{}'",
            key.row_type(),
            index.definition().name()
        )));
    }
    Ok(search)
}
