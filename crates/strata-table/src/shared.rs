//! Versioned tables shared between cursors.
//!
//! A [`SharedTable`] publishes one current [`NativeTable`] and a version
//! counter that moves on every mutation. Readers take the read lock for the
//! duration of one operation. Snapshots pin the current table by reference;
//! a writer that finds the current table pinned mutates a deep copy instead
//! and publishes it as the new current version, retiring the old one.
//!
//! # Version Lifecycle
//!
//! ```text
//! current(v3) --snapshot--> pinned by cursor
//!      |
//!   mutate --> deep copy --> current(v4)
//!      |
//!   retired(v3) --snapshot dropped--> collect_garbage --> disposed
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use strata_common::{EngineConfig, StrataError, StrataResult, TableVersion};
use strata_storage::schema::TableType;
use strata_storage::value::{Row, ValueManager};

use crate::cursor::CursorCapabilities;
use crate::native_table::NativeTable;

/// A pinned, immutable version of a shared table.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    table: Arc<NativeTable>,
    version: TableVersion,
}

impl TableSnapshot {
    /// The pinned table.
    pub fn table(&self) -> &NativeTable {
        &self.table
    }

    /// The version the snapshot was taken at.
    pub fn version(&self) -> TableVersion {
        self.version
    }
}

#[derive(Debug)]
struct TableState {
    current: Arc<NativeTable>,
    version: TableVersion,
}

#[derive(Debug)]
struct SharedInner {
    name: String,
    manager: Arc<dyn ValueManager>,
    config: EngineConfig,
    capabilities: CursorCapabilities,
    state: RwLock<TableState>,
    /// Superseded versions still pinned when they were replaced.
    retired: Mutex<Vec<Arc<NativeTable>>>,
}

impl Drop for SharedInner {
    fn drop(&mut self) {
        let manager = Arc::clone(&self.manager);
        if let Some(table) = Arc::get_mut(&mut self.state.get_mut().current) {
            table.drop_table(manager.as_ref());
        }
        for table in self.retired.get_mut().drain(..) {
            if let Ok(mut table) = Arc::try_unwrap(table) {
                table.drop_table(manager.as_ref());
            }
        }
    }
}

/// A table shared by many cursors.
///
/// Cloning is cheap and yields another handle to the same table.
#[derive(Clone)]
pub struct SharedTable {
    inner: Arc<SharedInner>,
}

impl SharedTable {
    /// Creates an empty shared table supporting every cursor capability.
    pub fn new(
        table_type: &TableType,
        manager: Arc<dyn ValueManager>,
        config: EngineConfig,
    ) -> StrataResult<Self> {
        Self::with_capabilities(table_type, manager, config, CursorCapabilities::all())
    }

    /// Creates an empty shared table that supports only `capabilities`.
    pub fn with_capabilities(
        table_type: &TableType,
        manager: Arc<dyn ValueManager>,
        config: EngineConfig,
        capabilities: CursorCapabilities,
    ) -> StrataResult<Self> {
        config.validate()?;
        let table = NativeTable::new(table_type, config.index)?;
        Ok(Self {
            inner: Arc::new(SharedInner {
                name: table_type.name().to_string(),
                manager,
                config,
                capabilities,
                state: RwLock::new(TableState {
                    current: Arc::new(table),
                    version: TableVersion::INITIAL,
                }),
                retired: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The value manager rows are copied and disposed with.
    pub fn manager(&self) -> &Arc<dyn ValueManager> {
        &self.inner.manager
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Capabilities cursors over this table may request.
    pub fn capabilities(&self) -> CursorCapabilities {
        self.inner.capabilities
    }

    /// The current version.
    pub fn version(&self) -> TableVersion {
        self.inner.state.read().version
    }

    /// Number of rows in the current version.
    pub fn row_count(&self) -> usize {
        self.inner.state.read().current.row_count()
    }

    /// Number of retired versions awaiting collection.
    pub fn retired_count(&self) -> usize {
        self.inner.retired.lock().len()
    }

    /// Pins the current version.
    pub fn snapshot(&self) -> TableSnapshot {
        let state = self.inner.state.read();
        TableSnapshot {
            table: Arc::clone(&state.current),
            version: state.version,
        }
    }

    /// Runs `f` against the current version under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&NativeTable, TableVersion) -> R) -> R {
        let state = self.inner.state.read();
        f(&state.current, state.version)
    }

    /// Runs `f` against a writable current version under the write lock.
    ///
    /// If a snapshot pins the current version, `f` runs against a deep copy
    /// that replaces it only when `f` succeeds. The version moves whenever
    /// the published table may have changed.
    pub fn mutate<R>(
        &self,
        f: impl FnOnce(&mut NativeTable, &dyn ValueManager) -> StrataResult<R>,
    ) -> StrataResult<R> {
        let manager = self.inner.manager.as_ref();
        let mut guard = self.inner.state.write();
        let state = &mut *guard;

        if let Some(table) = Arc::get_mut(&mut state.current) {
            let result = f(table, manager);
            state.version = state.version.next();
            return result;
        }

        let mut copy = state.current.deep_copy(manager)?;
        tracing::debug!(
            table = %self.inner.name,
            version = %state.version,
            "current version is pinned; writing to a copy"
        );
        match f(&mut copy, manager) {
            Ok(value) => {
                let previous = std::mem::replace(&mut state.current, Arc::new(copy));
                state.version = state.version.next();
                self.inner.retired.lock().push(previous);
                Ok(value)
            }
            Err(e) => {
                copy.drop_table(manager);
                Err(e)
            }
        }
    }

    /// Disposes retired versions no snapshot pins any more.
    ///
    /// Returns the number of versions collected.
    pub fn collect_garbage(&self) -> usize {
        let manager = self.inner.manager.as_ref();
        let mut retired = self.inner.retired.lock();
        let mut kept = Vec::with_capacity(retired.len());
        let mut collected = 0;
        for table in retired.drain(..) {
            match Arc::try_unwrap(table) {
                Ok(mut table) => {
                    table.drop_table(manager);
                    collected += 1;
                }
                Err(table) => kept.push(table),
            }
        }
        *retired = kept;
        if collected > 0 {
            tracing::debug!(table = %self.inner.name, collected, "collected retired versions");
        }
        collected
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Inserts a row.
    pub fn insert(&self, row: &Row, unchecked: bool) -> StrataResult<()> {
        self.mutate(|table, manager| table.insert(manager, row, unchecked))
    }

    /// Replaces the row with `old_row`'s clustered key by `new_row`.
    pub fn update(&self, old_row: &Row, new_row: &Row, unchecked: bool) -> StrataResult<()> {
        self.mutate(|table, manager| table.update(manager, old_row, new_row, unchecked))
    }

    /// Deletes the row with `row`'s clustered key.
    pub fn delete(&self, row: &Row) -> StrataResult<()> {
        self.mutate(|table, manager| table.delete(manager, row))
    }

    /// Removes every row.
    pub fn truncate(&self) -> StrataResult<()> {
        self.mutate(|table, manager| table.truncate(manager))
    }

    /// Returns true if a row with `row`'s clustered key is present.
    pub fn has_row(&self, row: &Row) -> StrataResult<bool> {
        self.read(|table, _| table.has_row(self.inner.manager.as_ref(), row))
    }

    /// An owned copy of the row with the given clustered key.
    pub fn select(&self, key: &Row) -> StrataResult<Option<Row>> {
        self.read(|table, _| table.select(self.inner.manager.as_ref(), key))
    }

    /// Audits the current version's indexes against each other.
    ///
    /// The version does not move. An unpinned table that fails the audit is
    /// marked corrupted; a pinned one only reports the fault.
    pub fn verify(&self) -> StrataResult<()> {
        let manager = self.inner.manager.as_ref();
        let mut guard = self.inner.state.write();
        let state = &mut *guard;

        if let Some(table) = Arc::get_mut(&mut state.current) {
            return table.verify(manager);
        }
        match state.current.audit(manager)? {
            None => Ok(()),
            Some((index, key)) => {
                tracing::error!(
                    table = %self.inner.name,
                    version = %state.version,
                    index = %index,
                    key = %key,
                    "index consistency fault in pinned version"
                );
                Err(StrataError::IndexConsistencyFault { index, key })
            }
        }
    }
}

impl fmt::Debug for SharedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTable")
            .field("name", &self.inner.name)
            .field("version", &self.version())
            .field("rows", &self.row_count())
            .field("retired", &self.retired_count())
            .finish()
    }
}
