//! Table type descriptors: columns plus declared keys and orders.

use std::fmt;
use std::sync::Arc;

use strata_common::{StrataError, StrataResult};

use super::RowType;

/// Sort direction of one order column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// Applies the direction to an ascending comparison result.
    #[inline]
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// One column of an order, by ordinal into the table's row type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderColumn {
    /// Ordinal of the column in the table row type.
    pub column: usize,
    /// Direction the column sorts in.
    pub direction: SortDirection,
}

impl OrderColumn {
    /// An ascending order column.
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    /// A descending order column.
    pub fn descending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// A named ordering over table columns.
///
/// Keys are unique orders. Non-unique orders get the clustered key appended
/// when they are materialized as indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    /// Order name, also used as the index name.
    pub name: String,
    /// The columns, most significant first.
    pub columns: Vec<OrderColumn>,
    /// Whether the columns alone identify a row.
    pub unique: bool,
}

impl Order {
    /// Creates an order.
    pub fn new(name: impl Into<String>, columns: Vec<OrderColumn>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
        }
    }

    /// Creates a unique ascending order over the given column ordinals.
    pub fn key(name: impl Into<String>, columns: &[usize]) -> Self {
        Self::new(
            name,
            columns.iter().map(|&c| OrderColumn::ascending(c)).collect(),
            true,
        )
    }

    /// Column ordinals of this order.
    pub fn column_indices(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.column).collect()
    }

    /// Returns true if the order contains the column ordinal.
    pub fn contains(&self, column: usize) -> bool {
        self.columns.iter().any(|c| c.column == column)
    }
}

/// A table type: its row type, clustered order, and additional orders.
///
/// # Example
///
/// ```rust
/// use strata_storage::schema::{Column, Order, RowType, ScalarType, TableType};
///
/// let row_type = RowType::new(vec![
///     Column::new("id", ScalarType::Int32),
///     Column::new("email", ScalarType::String),
/// ])
/// .unwrap();
/// let table_type = TableType::new("Users", row_type)
///     .with_key(Order::key("Users_PK", &[0]))
///     .with_key(Order::key("Users_Email", &[1]));
/// assert!(table_type.validate().is_ok());
/// assert_eq!(table_type.clustered().name, "Users_PK");
/// assert_eq!(table_type.non_clustered().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableType {
    name: String,
    row_type: Arc<RowType>,
    clustered: Option<Order>,
    non_clustered: Vec<Order>,
}

impl TableType {
    /// Creates a table type with no declared keys.
    pub fn new(name: impl Into<String>, row_type: RowType) -> Self {
        Self {
            name: name.into(),
            row_type: Arc::new(row_type),
            clustered: None,
            non_clustered: Vec::new(),
        }
    }

    /// Declares a key. The first key declared becomes the clustered order.
    #[must_use]
    pub fn with_key(mut self, mut key: Order) -> Self {
        key.unique = true;
        if self.clustered.is_none() {
            self.clustered = Some(key);
        } else {
            self.non_clustered.push(key);
        }
        self
    }

    /// Declares an additional order.
    #[must_use]
    pub fn with_order(mut self, order: Order) -> Self {
        self.non_clustered.push(order);
        self
    }

    /// Makes `order` the clustered order, demoting any previous one.
    #[must_use]
    pub fn with_clustered_order(mut self, order: Order) -> Self {
        if let Some(previous) = self.clustered.replace(order) {
            self.non_clustered.insert(0, previous);
        }
        self
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's row type.
    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }

    /// The clustered order.
    ///
    /// A table declared without keys is clustered on all of its columns.
    pub fn clustered(&self) -> Order {
        match &self.clustered {
            Some(order) => order.clone(),
            None => Order::key(
                format!("{}_Clustered", self.name),
                &(0..self.row_type.width()).collect::<Vec<_>>(),
            ),
        }
    }

    /// The non-clustered orders, in declaration order.
    pub fn non_clustered(&self) -> &[Order] {
        &self.non_clustered
    }

    /// Validates column references and order names.
    pub fn validate(&self) -> StrataResult<()> {
        let width = self.row_type.width();
        if width == 0 {
            return Err(StrataError::invalid_argument(format!(
                "table '{}' has no columns",
                self.name
            )));
        }

        let clustered = self.clustered();
        let mut names: Vec<&str> = Vec::new();
        for order in std::iter::once(&clustered).chain(self.non_clustered.iter()) {
            if order.columns.is_empty() {
                return Err(StrataError::invalid_argument(format!(
                    "order '{}' has no columns",
                    order.name
                )));
            }
            for (i, column) in order.columns.iter().enumerate() {
                if column.column >= width {
                    return Err(StrataError::ColumnOutOfRange {
                        index: column.column,
                        width,
                    });
                }
                if order.columns[..i].iter().any(|c| c.column == column.column) {
                    return Err(StrataError::invalid_argument(format!(
                        "order '{}' repeats column {}",
                        order.name, column.column
                    )));
                }
            }
            if names.contains(&order.name.as_str()) {
                return Err(StrataError::invalid_argument(format!(
                    "duplicate order name '{}'",
                    order.name
                )));
            }
            names.push(&order.name);
        }
        Ok(())
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {} {}", self.name, self.row_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ScalarType};

    fn row_type() -> RowType {
        RowType::new(vec![
            Column::new("id", ScalarType::Int32),
            Column::new("name", ScalarType::String),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_key_is_clustered() {
        let table_type = TableType::new("T", row_type())
            .with_key(Order::key("T_PK", &[0]))
            .with_order(Order::new("T_Name", vec![OrderColumn::descending(1)], false));

        assert_eq!(table_type.clustered().name, "T_PK");
        assert_eq!(table_type.non_clustered()[0].name, "T_Name");
        assert!(table_type.validate().is_ok());
    }

    #[test]
    fn test_keyless_table_clusters_on_all_columns() {
        let table_type = TableType::new("T", row_type());
        let clustered = table_type.clustered();
        assert!(clustered.unique);
        assert_eq!(clustered.column_indices(), vec![0, 1]);
    }

    #[test]
    fn test_clustered_override_demotes_key() {
        let table_type = TableType::new("T", row_type())
            .with_key(Order::key("T_PK", &[0]))
            .with_clustered_order(Order::new("T_Name", vec![OrderColumn::ascending(1)], false));
        assert_eq!(table_type.clustered().name, "T_Name");
        assert_eq!(table_type.non_clustered()[0].name, "T_PK");
    }

    #[test]
    fn test_validation_errors() {
        let out_of_range = TableType::new("T", row_type()).with_key(Order::key("T_PK", &[5]));
        assert!(out_of_range.validate().is_err());

        let repeated = TableType::new("T", row_type()).with_key(Order::key("T_PK", &[0, 0]));
        assert!(repeated.validate().is_err());

        let duplicate_name = TableType::new("T", row_type())
            .with_key(Order::key("K", &[0]))
            .with_key(Order::key("K", &[1]));
        assert!(duplicate_name.validate().is_err());
    }

    #[test]
    fn test_direction_apply() {
        use std::cmp::Ordering;
        assert_eq!(SortDirection::Ascending.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortDirection::Descending.apply(Ordering::Less), Ordering::Greater);
    }
}
