//! Native tables: one clustered index plus non-clustered indexes.
//!
//! The clustered index maps the clustered key to the full row and owns the
//! canonical copy of every row. Each non-clustered index maps its own key
//! projection to the clustered key of the row. Mutations touch the clustered
//! index first and then every non-clustered index in declaration order; a
//! failure part way through undoes what was already applied before the error
//! is returned.

use std::cmp::Ordering;
use std::sync::Arc;

use strata_common::{ErrorCode, IndexConfig, StrataError, StrataResult};
use strata_storage::index::NativeIndex;
use strata_storage::schema::{Order, RowType, SortDirection, TableType};
use strata_storage::value::{Row, ValueManager};

// =============================================================================
// Index Definitions
// =============================================================================

/// How an order is materialized as an index.
///
/// A non-unique order is made unique by appending columns: the remaining
/// table columns for the clustered index, the clustered key columns for a
/// non-clustered one.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    order: Order,
    key_columns: Vec<usize>,
    directions: Vec<SortDirection>,
    key_type: Arc<RowType>,
    clustered: bool,
}

impl IndexDefinition {
    fn build(
        order: &Order,
        row_type: &RowType,
        suffix: &[(usize, SortDirection)],
        clustered: bool,
    ) -> StrataResult<Self> {
        let mut key_columns = order.column_indices();
        let mut directions: Vec<SortDirection> =
            order.columns.iter().map(|c| c.direction).collect();
        if !order.unique {
            for &(column, direction) in suffix {
                if !key_columns.contains(&column) {
                    key_columns.push(column);
                    directions.push(direction);
                }
            }
        }
        let key_type = Arc::new(row_type.project(&key_columns)?);
        Ok(Self {
            order: order.clone(),
            key_columns,
            directions,
            key_type,
            clustered,
        })
    }

    fn clustered(order: &Order, row_type: &RowType) -> StrataResult<Self> {
        let suffix: Vec<_> = (0..row_type.width())
            .map(|column| (column, SortDirection::Ascending))
            .collect();
        Self::build(order, row_type, &suffix, true)
    }

    fn non_clustered(
        order: &Order,
        row_type: &RowType,
        clustered: &IndexDefinition,
    ) -> StrataResult<Self> {
        let suffix: Vec<_> = clustered
            .key_columns
            .iter()
            .copied()
            .zip(clustered.directions.iter().copied())
            .collect();
        Self::build(order, row_type, &suffix, false)
    }

    /// Index name, taken from the order.
    pub fn name(&self) -> &str {
        &self.order.name
    }

    /// The declared order.
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Table column ordinals of the key, including appended columns.
    pub fn key_columns(&self) -> &[usize] {
        &self.key_columns
    }

    /// Sort direction of each key column.
    pub fn directions(&self) -> &[SortDirection] {
        &self.directions
    }

    /// Row type of keys.
    pub fn key_type(&self) -> &Arc<RowType> {
        &self.key_type
    }

    /// Returns true for the clustered index.
    pub fn is_clustered(&self) -> bool {
        self.clustered
    }

    /// Projects a table row onto this index's key.
    ///
    /// The key borrows from `row` and must not outlive it.
    pub fn key_of(&self, row: &Row) -> StrataResult<Row> {
        row.project_borrowed(Arc::clone(&self.key_type), &self.key_columns)
    }

    /// Projects a table row onto this index's key, requiring every key
    /// column to have a value.
    pub fn full_key_of(&self, row: &Row) -> StrataResult<Row> {
        let key = self.key_of(row)?;
        match key.first_missing_column() {
            Some(column) => Err(StrataError::IncompleteRow { column }),
            None => Ok(key),
        }
    }
}

/// An index of a table together with its definition.
#[derive(Debug)]
pub struct TableIndex {
    definition: IndexDefinition,
    index: NativeIndex,
}

impl TableIndex {
    /// The definition.
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// The underlying ordered index.
    pub fn index(&self) -> &NativeIndex {
        &self.index
    }

    fn insert_row(&mut self, manager: &dyn ValueManager, row: &Row, data: &Row) -> StrataResult<()> {
        let key = self.definition.key_of(row)?;
        self.index.insert(manager, &key, data)
    }

    fn update_row(
        &mut self,
        manager: &dyn ValueManager,
        old_row: &Row,
        new_row: &Row,
        data: &Row,
    ) -> StrataResult<()> {
        let old_key = self.definition.key_of(old_row)?;
        let new_key = self.definition.key_of(new_row)?;
        self.index.update(manager, &old_key, &new_key, data)
    }

    fn delete_row(&mut self, manager: &dyn ValueManager, row: &Row) -> StrataResult<()> {
        let key = self.definition.key_of(row)?;
        self.index.delete(manager, &key)
    }

    fn deep_copy(&self, manager: &dyn ValueManager) -> StrataResult<TableIndex> {
        Ok(TableIndex {
            definition: self.definition.clone(),
            index: self.index.deep_copy(manager)?,
        })
    }
}

// =============================================================================
// Native Table
// =============================================================================

/// A table held in native indexes.
///
/// Every row is reachable exactly once through the clustered index and
/// through each non-clustered index. If a non-clustered index is found to
/// be missing an entry, the table is marked corrupted and refuses further
/// mutation until it is truncated.
#[derive(Debug)]
pub struct NativeTable {
    table_type: TableType,
    clustered: TableIndex,
    non_clustered: Vec<TableIndex>,
    /// Index and key of the consistency fault that corrupted the table.
    fault: Option<(String, String)>,
    dropped: bool,
}

impl NativeTable {
    /// Creates an empty table with an index per order of `table_type`.
    pub fn new(table_type: &TableType, config: IndexConfig) -> StrataResult<Self> {
        table_type.validate()?;
        let row_type = table_type.row_type();

        let definition = IndexDefinition::clustered(&table_type.clustered(), row_type)?;
        let index = NativeIndex::new(
            definition.name(),
            Arc::clone(&definition.key_type),
            Arc::clone(row_type),
            definition.directions.clone(),
            config,
        )?;
        let clustered = TableIndex { definition, index };

        let non_clustered = table_type
            .non_clustered()
            .iter()
            .map(|order| {
                let definition =
                    IndexDefinition::non_clustered(order, row_type, &clustered.definition)?;
                let index = NativeIndex::new(
                    definition.name(),
                    Arc::clone(&definition.key_type),
                    Arc::clone(&clustered.definition.key_type),
                    definition.directions.clone(),
                    config,
                )?;
                Ok(TableIndex { definition, index })
            })
            .collect::<StrataResult<Vec<_>>>()?;

        tracing::debug!(
            table = %table_type.name(),
            indexes = non_clustered.len() + 1,
            "created native table"
        );
        Ok(Self {
            table_type: table_type.clone(),
            clustered,
            non_clustered,
            fault: None,
            dropped: false,
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        self.table_type.name()
    }

    /// The table type.
    pub fn table_type(&self) -> &TableType {
        &self.table_type
    }

    /// Row type of the table.
    pub fn row_type(&self) -> &Arc<RowType> {
        self.table_type.row_type()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.clustered.index.len()
    }

    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns true once a consistency fault has been detected.
    pub fn is_corrupted(&self) -> bool {
        self.fault.is_some()
    }

    /// Returns true once the table has been dropped.
    pub fn is_dropped(&self) -> bool {
        self.dropped
    }

    /// The clustered index.
    pub fn clustered(&self) -> &TableIndex {
        &self.clustered
    }

    /// The non-clustered indexes, in declaration order.
    pub fn non_clustered(&self) -> &[TableIndex] {
        &self.non_clustered
    }

    /// All indexes, clustered first.
    pub fn indexes(&self) -> impl Iterator<Item = &TableIndex> {
        std::iter::once(&self.clustered).chain(self.non_clustered.iter())
    }

    /// The index materializing the order called `name`.
    pub fn index_for_order(&self, name: &str) -> StrataResult<&TableIndex> {
        self.indexes()
            .find(|index| index.definition.name() == name)
            .ok_or_else(|| {
                StrataError::invalid_argument(format!(
                    "table '{}' has no order named '{name}'",
                    self.name()
                ))
            })
    }

    fn check_healthy(&self) -> StrataResult<()> {
        match &self.fault {
            Some((index, key)) => Err(StrataError::IndexConsistencyFault {
                index: index.clone(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_row(&self, row: &Row, unchecked: bool) -> StrataResult<()> {
        if !row.row_type().is_compatible(self.row_type()) {
            return Err(StrataError::IncompatibleRowTypes {
                expected: self.row_type().width(),
                actual: row.width(),
            });
        }
        if !unchecked {
            if let Some(column) = row.first_missing_column() {
                return Err(StrataError::IncompleteRow { column });
            }
        }
        Ok(())
    }

    /// Records a consistency fault; the table refuses mutation afterwards.
    fn corrupt(&mut self, index: &str, key: String, cause: &StrataError) -> StrataError {
        tracing::error!(
            table = %self.name(),
            index = %index,
            key = %key,
            cause = %cause,
            "index consistency fault; table marked corrupted"
        );
        self.fault = Some((index.to_string(), key.clone()));
        StrataError::IndexConsistencyFault {
            index: index.to_string(),
            key,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns true if a row with `row`'s clustered key is present.
    pub fn has_row(&self, manager: &dyn ValueManager, row: &Row) -> StrataResult<bool> {
        self.check_row(row, true)?;
        let key = self.clustered.definition.full_key_of(row)?;
        self.clustered.index.contains(manager, &key)
    }

    /// The stored row for a clustered key.
    pub fn get(&self, manager: &dyn ValueManager, key: &Row) -> StrataResult<Option<&Row>> {
        self.clustered.index.get(manager, key)
    }

    /// An owned copy of the stored row for a clustered key.
    pub fn select(&self, manager: &dyn ValueManager, key: &Row) -> StrataResult<Option<Row>> {
        self.get(manager, key)?
            .map(|row| manager.copy_row(row))
            .transpose()
    }

    /// The stored row with the same clustered key as `row`.
    pub fn stored_row(&self, manager: &dyn ValueManager, row: &Row) -> StrataResult<Option<&Row>> {
        let key = self.clustered.definition.full_key_of(row)?;
        self.get(manager, &key)
    }

    fn stored_copy(&self, manager: &dyn ValueManager, row: &Row) -> StrataResult<Row> {
        let key = self.clustered.definition.full_key_of(row)?;
        match self.clustered.index.get(manager, &key)? {
            Some(stored) => manager.copy_row(stored),
            None => Err(StrataError::ClusteredLookupFailure {
                table: self.name().to_string(),
                key: key.to_string(),
            }),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Inserts a copy of `row` into every index.
    ///
    /// With `unchecked`, columns outside the index keys may be left
    /// without a value.
    pub fn insert(&mut self, manager: &dyn ValueManager, row: &Row, unchecked: bool) -> StrataResult<()> {
        self.check_healthy()?;
        self.check_row(row, unchecked)?;
        let clustered_key = self.clustered.definition.key_of(row)?;
        self.clustered.index.insert(manager, &clustered_key, row)?;

        for position in 0..self.non_clustered.len() {
            if let Err(e) = self.non_clustered[position].insert_row(manager, row, &clustered_key) {
                tracing::debug!(
                    table = %self.name(),
                    index = %self.non_clustered[position].definition.name(),
                    error = %e,
                    "rolling back insert"
                );
                self.undo_insert(manager, row, &clustered_key, position)?;
                return Err(e);
            }
        }
        Ok(())
    }

    fn undo_insert(
        &mut self,
        manager: &dyn ValueManager,
        row: &Row,
        clustered_key: &Row,
        applied: usize,
    ) -> StrataResult<()> {
        for position in (0..applied).rev() {
            if let Err(e) = self.non_clustered[position].delete_row(manager, row) {
                let index = self.non_clustered[position].definition.name().to_string();
                return Err(self.corrupt(&index, row.to_string(), &e));
            }
        }
        if let Err(e) = self.clustered.index.delete(manager, clustered_key) {
            let index = self.clustered.definition.name().to_string();
            return Err(self.corrupt(&index, clustered_key.to_string(), &e));
        }
        Ok(())
    }

    /// Replaces the stored row with `old_row`'s clustered key by `new_row`.
    pub fn update(
        &mut self,
        manager: &dyn ValueManager,
        old_row: &Row,
        new_row: &Row,
        unchecked: bool,
    ) -> StrataResult<()> {
        self.check_healthy()?;
        self.check_row(old_row, true)?;
        self.check_row(new_row, unchecked)?;
        let mut old = self.stored_copy(manager, old_row)?;
        let result = self.apply_update(manager, &old, new_row);
        manager.dispose_row(&mut old);
        result
    }

    fn apply_update(&mut self, manager: &dyn ValueManager, old: &Row, new: &Row) -> StrataResult<()> {
        let new_key = self.clustered.definition.key_of(new)?;
        self.clustered.update_row(manager, old, new, new)?;

        for position in 0..self.non_clustered.len() {
            if let Err(e) = self.non_clustered[position].update_row(manager, old, new, &new_key) {
                tracing::debug!(
                    table = %self.name(),
                    index = %self.non_clustered[position].definition.name(),
                    error = %e,
                    "rolling back update"
                );
                self.undo_update(manager, old, new, position)?;
                return Err(e);
            }
        }
        Ok(())
    }

    fn undo_update(
        &mut self,
        manager: &dyn ValueManager,
        old: &Row,
        new: &Row,
        applied: usize,
    ) -> StrataResult<()> {
        let old_key = self.clustered.definition.key_of(old)?;
        for position in (0..applied).rev() {
            if let Err(e) = self.non_clustered[position].update_row(manager, new, old, &old_key) {
                let index = self.non_clustered[position].definition.name().to_string();
                return Err(self.corrupt(&index, new.to_string(), &e));
            }
        }
        if let Err(e) = self.clustered.update_row(manager, new, old, old) {
            let index = self.clustered.definition.name().to_string();
            return Err(self.corrupt(&index, new.to_string(), &e));
        }
        Ok(())
    }

    /// Deletes the stored row with `row`'s clustered key.
    ///
    /// Non-clustered entries are located from the stored row. A missing
    /// entry is a consistency fault.
    pub fn delete(&mut self, manager: &dyn ValueManager, row: &Row) -> StrataResult<()> {
        self.check_healthy()?;
        self.check_row(row, true)?;
        let mut stored = self.stored_copy(manager, row)?;
        let result = self.delete_stored(manager, &stored);
        manager.dispose_row(&mut stored);
        result
    }

    fn delete_stored(&mut self, manager: &dyn ValueManager, stored: &Row) -> StrataResult<()> {
        for position in 0..self.non_clustered.len() {
            if let Err(e) = self.non_clustered[position].delete_row(manager, stored) {
                let index = self.non_clustered[position].definition.name().to_string();
                return Err(self.corrupt(&index, stored.to_string(), &e));
            }
        }
        if let Err(e) = self.clustered.delete_row(manager, stored) {
            let index = self.clustered.definition.name().to_string();
            return Err(self.corrupt(&index, stored.to_string(), &e));
        }
        Ok(())
    }

    /// Removes every row and clears any recorded fault.
    pub fn truncate(&mut self, manager: &dyn ValueManager) -> StrataResult<()> {
        self.clustered.index.truncate(manager)?;
        for index in &mut self.non_clustered {
            index.index.truncate(manager)?;
        }
        self.fault = None;
        tracing::debug!(table = %self.name(), "truncated table");
        Ok(())
    }

    /// Releases every index. The table is unusable afterwards.
    pub fn drop_table(&mut self, manager: &dyn ValueManager) {
        if self.dropped {
            return;
        }
        self.clustered.index.drop_index(manager);
        for index in &mut self.non_clustered {
            index.index.drop_index(manager);
        }
        self.dropped = true;
        tracing::debug!(table = %self.name(), "dropped table");
    }

    /// Builds an independent copy of the table and all of its indexes.
    pub fn deep_copy(&self, manager: &dyn ValueManager) -> StrataResult<NativeTable> {
        self.check_healthy()?;
        let clustered = self.clustered.deep_copy(manager)?;
        let mut copy = NativeTable {
            table_type: self.table_type.clone(),
            clustered,
            non_clustered: Vec::with_capacity(self.non_clustered.len()),
            fault: None,
            dropped: false,
        };
        for index in &self.non_clustered {
            match index.deep_copy(manager) {
                Ok(index) => copy.non_clustered.push(index),
                Err(e) => {
                    copy.drop_table(manager);
                    return Err(e);
                }
            }
        }
        Ok(copy)
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Audits the indexes against each other.
    ///
    /// Every index must be structurally sound and hold one entry per row,
    /// and every non-clustered entry must point back at its row. A failed
    /// audit marks the table corrupted.
    pub fn verify(&mut self, manager: &dyn ValueManager) -> StrataResult<()> {
        if let Some((index, key)) = self.audit(manager)? {
            let cause = StrataError::internal("verification failed");
            return Err(self.corrupt(&index, key, &cause));
        }
        Ok(())
    }

    /// Read-only form of [`verify`](Self::verify): returns the index and key
    /// of the first fault found without marking the table corrupted.
    pub(crate) fn audit(&self, manager: &dyn ValueManager) -> StrataResult<Option<(String, String)>> {
        self.check_healthy()?;
        for index in self.indexes() {
            index.index.validate(manager)?;
        }
        self.find_fault(manager)
    }

    fn find_fault(&self, manager: &dyn ValueManager) -> StrataResult<Option<(String, String)>> {
        let row_count = self.row_count();
        for index in &self.non_clustered {
            if index.index.len() != row_count {
                return Ok(Some((
                    index.definition.name().to_string(),
                    format!("{} entries for {row_count} rows", index.index.len()),
                )));
            }
        }
        for (clustered_key, row) in self.clustered.index.iter() {
            for index in &self.non_clustered {
                let key = index.definition.key_of(row)?;
                let consistent = match index.index.get(manager, &key)? {
                    Some(target) => {
                        self.clustered.index.compare_keys(manager, target, clustered_key)?
                            == Ordering::Equal
                    }
                    None => false,
                };
                if !consistent {
                    return Ok(Some((index.definition.name().to_string(), key.to_string())));
                }
            }
        }
        Ok(None)
    }
}

/// Returns true if `error` reports a key that was not found.
pub(crate) fn is_not_found(error: &StrataError) -> bool {
    matches!(
        error.root_cause().code(),
        ErrorCode::KeyNotFound | ErrorCode::ClusteredLookupFailure
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::ErrorCode;
    use strata_storage::schema::{Column, OrderColumn, ScalarType};
    use strata_storage::value::{DefaultValueManager, Scalar};

    fn users_type() -> TableType {
        let row_type = RowType::new(vec![
            Column::new("id", ScalarType::Int32),
            Column::new("email", ScalarType::String),
            Column::new("city", ScalarType::String),
        ])
        .unwrap();
        TableType::new("Users", row_type)
            .with_key(Order::key("Users_PK", &[0]))
            .with_key(Order::key("Users_Email", &[1]))
            .with_order(Order::new("Users_City", vec![OrderColumn::ascending(2)], false))
    }

    fn table() -> NativeTable {
        NativeTable::new(&users_type(), IndexConfig::for_testing()).unwrap()
    }

    fn user(table: &NativeTable, id: i32, email: &str, city: &str) -> Row {
        Row::from_values(
            Arc::clone(table.row_type()),
            vec![id.into(), email.into(), city.into()],
        )
        .unwrap()
    }

    fn entries(index: &TableIndex) -> Vec<String> {
        index.index().iter().map(|(k, _)| k.to_string()).collect()
    }

    fn snapshot(table: &NativeTable) -> Vec<Vec<String>> {
        table.indexes().map(entries).collect()
    }

    #[test]
    fn test_non_unique_order_appends_clustered_key() {
        let table = table();
        let city = table.index_for_order("Users_City").unwrap();
        assert_eq!(city.definition().key_columns(), &[2, 0]);
        assert!(!city.definition().is_clustered());
        assert_eq!(city.index().key_type().to_string(), "row { city : String, id : Int32 }");

        let email = table.index_for_order("Users_Email").unwrap();
        assert_eq!(email.definition().key_columns(), &[1]);
        assert!(table.index_for_order("Nope").is_err());
    }

    #[test]
    fn test_insert_reaches_every_index() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let ada = user(&table, 1, "ada@x", "London");
        table.insert(&m, &ada, false).unwrap();
        table.insert(&m, &user(&table, 2, "bob@x", "London"), false).unwrap();

        assert!(table.has_row(&m, &ada).unwrap());
        assert_eq!(table.row_count(), 2);
        for index in table.indexes() {
            assert_eq!(index.index().len(), 2);
        }
        let city = table.index_for_order("Users_City").unwrap();
        assert_eq!(entries(city), vec!["(London, 1)", "(London, 2)"]);
        table.verify(&m).unwrap();
    }

    #[test]
    fn test_insert_failure_in_later_index_rolls_back() {
        let m = DefaultValueManager::new();
        let mut table = table();
        table.insert(&m, &user(&table, 1, "ada@x", "London"), false).unwrap();
        let before = snapshot(&table);

        let err = table
            .insert(&m, &user(&table, 2, "ada@x", "Paris"), false)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert_eq!(snapshot(&table), before);
        assert!(!table.is_corrupted());
        table.verify(&m).unwrap();
    }

    #[test]
    fn test_incomplete_row_needs_unchecked() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let mut partial = Row::new(Arc::clone(table.row_type()));
        partial.set_value(m.streams(), 0, 5i32.into()).unwrap();
        partial.set_value(m.streams(), 1, "e@x".into()).unwrap();

        let err = table.insert(&m, &partial, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IncompleteRow);

        // The city index key still needs its column.
        let err = table.insert(&m, &partial, true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IncompleteRow);
        assert!(table.is_empty());
        table.verify(&m).unwrap();
    }

    #[test]
    fn test_update_moves_every_index() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let ada = user(&table, 1, "ada@x", "London");
        table.insert(&m, &ada, false).unwrap();

        let moved = user(&table, 7, "ada@y", "Paris");
        table.update(&m, &ada, &moved, false).unwrap();
        assert!(!table.has_row(&m, &ada).unwrap());
        assert!(table.has_row(&m, &moved).unwrap());
        assert_eq!(entries(table.index_for_order("Users_City").unwrap()), vec!["(Paris, 7)"]);
        table.verify(&m).unwrap();
    }

    #[test]
    fn test_update_colliding_with_third_row_changes_nothing() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let ada = user(&table, 1, "ada@x", "London");
        table.insert(&m, &ada, false).unwrap();
        table.insert(&m, &user(&table, 2, "bob@x", "Rome"), false).unwrap();
        table.insert(&m, &user(&table, 3, "cy@x", "Oslo"), false).unwrap();
        let before = snapshot(&table);

        // New clustered key is free, new email belongs to row 3.
        let err = table
            .update(&m, &ada, &user(&table, 9, "cy@x", "Paris"), false)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert_eq!(snapshot(&table), before);

        // Clustered collision is caught before anything changes.
        let err = table
            .update(&m, &ada, &user(&table, 2, "new@x", "Paris"), false)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert_eq!(snapshot(&table), before);
        table.verify(&m).unwrap();
    }

    /// City is declared before the unique email key, so a collision on
    /// email has already changed the city index.
    fn city_first_table() -> NativeTable {
        let row_type = users_type().row_type().as_ref().clone();
        let table_type = TableType::new("Users", row_type)
            .with_key(Order::key("Users_PK", &[0]))
            .with_order(Order::new("Users_City", vec![OrderColumn::ascending(2)], false))
            .with_key(Order::key("Users_Email", &[1]));
        NativeTable::new(&table_type, IndexConfig::for_testing()).unwrap()
    }

    #[test]
    fn test_insert_failure_in_last_index_undoes_earlier_ones() {
        let m = DefaultValueManager::new();
        let mut table = city_first_table();
        let names: Vec<&str> = table.non_clustered().iter().map(|i| i.definition().name()).collect();
        assert_eq!(names, vec!["Users_City", "Users_Email"]);

        table.insert(&m, &user(&table, 1, "ada@x", "London"), false).unwrap();
        table.insert(&m, &user(&table, 2, "bob@x", "Rome"), false).unwrap();
        let before = snapshot(&table);

        let err = table
            .insert(&m, &user(&table, 3, "bob@x", "Oslo"), false)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert_eq!(err.params()[0], "Users_Email");
        assert_eq!(snapshot(&table), before);
        assert_eq!(entries(table.index_for_order("Users_City").unwrap()), vec!["(London, 1)", "(Rome, 2)"]);
        assert!(!table.is_corrupted());
        table.verify(&m).unwrap();
    }

    #[test]
    fn test_update_failure_in_last_index_undoes_earlier_ones() {
        let m = DefaultValueManager::new();
        let mut table = city_first_table();
        let ada = user(&table, 1, "ada@x", "London");
        table.insert(&m, &ada, false).unwrap();
        table.insert(&m, &user(&table, 2, "bob@x", "Rome"), false).unwrap();
        let before = snapshot(&table);

        // Both the clustered key and the city change before email collides.
        let err = table
            .update(&m, &ada, &user(&table, 9, "bob@x", "Paris"), false)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
        assert_eq!(err.params()[0], "Users_Email");
        assert_eq!(snapshot(&table), before);
        assert!(table.has_row(&m, &ada).unwrap());
        assert!(!table.is_corrupted());
        table.verify(&m).unwrap();
    }

    #[test]
    fn test_delete_uses_stored_row() {
        let m = DefaultValueManager::new();
        let mut table = table();
        table.insert(&m, &user(&table, 1, "ada@x", "London"), false).unwrap();

        // Only the clustered key of the argument matters.
        let stale = user(&table, 1, "other@x", "Nowhere");
        table.delete(&m, &stale).unwrap();
        assert!(table.is_empty());
        for index in table.indexes() {
            assert!(index.index().is_empty());
        }

        let err = table.delete(&m, &stale).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ClusteredLookupFailure);
        let err = table.update(&m, &stale, &stale, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ClusteredLookupFailure);
    }

    #[test]
    fn test_missing_non_clustered_entry_corrupts_table() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let ada = user(&table, 1, "ada@x", "London");
        table.insert(&m, &ada, false).unwrap();

        let key = table.non_clustered[0].definition.key_of(&ada).unwrap();
        table.non_clustered[0].index.delete(&m, &key).unwrap();

        let err = table.delete(&m, &ada).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexConsistencyFault);
        assert!(err.is_fatal());
        assert!(table.is_corrupted());

        let err = table.insert(&m, &user(&table, 2, "b@x", "Rome"), false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexConsistencyFault);

        table.truncate(&m).unwrap();
        assert!(!table.is_corrupted());
        table.insert(&m, &user(&table, 2, "b@x", "Rome"), false).unwrap();
    }

    #[test]
    fn test_verify_detects_missing_entry() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let ada = user(&table, 1, "ada@x", "London");
        table.insert(&m, &ada, false).unwrap();
        let key = table.non_clustered[1].definition.key_of(&ada).unwrap();
        table.non_clustered[1].index.delete(&m, &key).unwrap();

        let (index, _) = table.audit(&m).unwrap().unwrap();
        assert_eq!(index, "Users_City");
        assert!(!table.is_corrupted());

        let err = table.verify(&m).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexConsistencyFault);
        assert_eq!(err.params()[0], "Users_City");
        assert!(table.is_corrupted());
    }

    #[test]
    fn test_streams_are_released_with_rows() {
        let m = DefaultValueManager::new();
        let mut table = table();
        let mut row = Row::new(Arc::clone(table.row_type()));
        row.set_value(m.streams(), 0, 1i32.into()).unwrap();
        row.set_value(m.streams(), 1, "a@x".into()).unwrap();
        let city = Scalar::new_stream(m.streams(), ScalarType::String, "Big City".into()).unwrap();
        row.set_value(m.streams(), 2, city).unwrap();

        table.insert(&m, &row, false).unwrap();
        m.dispose_row(&mut row);
        // The clustered row and the city key each own a copy.
        assert_eq!(m.streams().stream_count(), 2);

        let key = Row::from_values(
            Arc::clone(table.clustered().definition().key_type()),
            vec![1i32.into()],
        )
        .unwrap();
        let stored = table.select(&m, &key).unwrap().unwrap();
        table.delete(&m, &stored).unwrap();
        assert_eq!(m.streams().stream_count(), 1);
        let mut stored = stored;
        m.dispose_row(&mut stored);
        assert_eq!(m.streams().stream_count(), 0);
    }

    #[test]
    fn test_deep_copy_and_drop() {
        let m = DefaultValueManager::new();
        let mut table = table();
        for id in 0..10 {
            let email = format!("u{id}@x");
            table.insert(&m, &user(&table, id, &email, "Oslo"), false).unwrap();
        }
        let mut copy = table.deep_copy(&m).unwrap();
        copy.truncate(&m).unwrap();
        assert_eq!(table.row_count(), 10);
        assert!(copy.is_empty());

        table.drop_table(&m);
        assert!(table.is_dropped());
        assert_eq!(table.row_count(), 0);
        let err = table.insert(&m, &user(&copy, 1, "a", "b"), false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexDropped);
    }

    #[test]
    fn test_keyless_table_clusters_on_all_columns() {
        let m = DefaultValueManager::new();
        let row_type = RowType::new(vec![
            Column::new("a", ScalarType::Int32),
            Column::new("b", ScalarType::Int32),
        ])
        .unwrap();
        let mut table = NativeTable::new(&TableType::new("Pairs", row_type), IndexConfig::default()).unwrap();
        let row = |a: i32, b: i32| {
            Row::from_values(Arc::clone(table.row_type()), vec![a.into(), b.into()]).unwrap()
        };
        let (r1, r2) = (row(1, 2), row(1, 3));
        table.insert(&m, &r1, false).unwrap();
        table.insert(&m, &r2, false).unwrap();
        assert_eq!(table.clustered().definition().name(), "Pairs_Clustered");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.insert(&m, &r1, false).unwrap_err().code(), ErrorCode::IndexKeyCollision);
    }
}
