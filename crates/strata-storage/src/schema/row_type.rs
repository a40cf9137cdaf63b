//! Row type descriptors.

use std::fmt;

use strata_common::{StrataError, StrataResult};

use super::ScalarType;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Column name, unique within its row type.
    pub name: String,
    /// Canonical type of the column's values.
    pub data_type: ScalarType,
}

impl Column {
    /// Creates a column.
    pub fn new(name: impl Into<String>, data_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered list of columns.
///
/// # Example
///
/// ```rust
/// use strata_storage::schema::{Column, RowType, ScalarType};
///
/// let row_type = RowType::new(vec![
///     Column::new("id", ScalarType::Int32),
///     Column::new("name", ScalarType::String),
/// ])
/// .unwrap();
/// assert_eq!(row_type.index_of_column("name"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowType {
    columns: Vec<Column>,
}

impl RowType {
    /// Creates a row type, rejecting duplicate column names.
    pub fn new(columns: Vec<Column>) -> StrataResult<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(StrataError::invalid_argument(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column at `index`.
    pub fn column(&self, index: usize) -> StrataResult<&Column> {
        self.columns
            .get(index)
            .ok_or(StrataError::ColumnOutOfRange {
                index,
                width: self.columns.len(),
            })
    }

    /// Returns the position of the named column.
    pub fn index_of_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the position of the named column, or `ColumnNotFound`.
    pub fn require_column(&self, name: &str) -> StrataResult<usize> {
        self.index_of_column(name)
            .ok_or_else(|| StrataError::ColumnNotFound {
                column: name.to_string(),
                row_type: self.to_string(),
            })
    }

    /// Builds the row type made of the given columns, in the given order.
    pub fn project(&self, indices: &[usize]) -> StrataResult<Self> {
        let columns = indices
            .iter()
            .map(|&i| self.column(i).cloned())
            .collect::<StrataResult<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Returns true if rows of `other` can be copied into rows of this type.
    ///
    /// Compatibility is positional: equal width and equal column types.
    pub fn is_compatible(&self, other: &RowType) -> bool {
        self.width() == other.width()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.data_type == b.data_type)
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("row { ")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} : {}", column.name, column.data_type)?;
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::ErrorCode;

    fn people() -> RowType {
        RowType::new(vec![
            Column::new("id", ScalarType::Int32),
            Column::new("name", ScalarType::String),
            Column::new("born", ScalarType::DateTime),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let row_type = people();
        assert_eq!(row_type.width(), 3);
        assert_eq!(row_type.index_of_column("born"), Some(2));
        assert_eq!(row_type.index_of_column("missing"), None);
        assert_eq!(
            row_type.require_column("missing").unwrap_err().code(),
            ErrorCode::ColumnNotFound
        );
        assert_eq!(
            row_type.column(9).unwrap_err().code(),
            ErrorCode::ColumnOutOfRange
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = RowType::new(vec![
            Column::new("a", ScalarType::Int32),
            Column::new("a", ScalarType::String),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_project_and_compatibility() {
        let row_type = people();
        let key = row_type.project(&[2, 0]).unwrap();
        assert_eq!(key.width(), 2);
        assert_eq!(key.columns()[0].name, "born");
        assert!(!key.is_compatible(&row_type));
        assert!(row_type.is_compatible(&people()));
    }

    #[test]
    fn test_display() {
        let row_type = people().project(&[0, 1]).unwrap();
        assert_eq!(row_type.to_string(), "row { id : Int32, name : String }");
    }
}
