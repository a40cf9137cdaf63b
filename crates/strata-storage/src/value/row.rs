//! Rows.
//!
//! A row holds one slot per column of its row type. Whether a column has a
//! value is tracked separately from nilness: a column may have no value, a
//! nil value, or content.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use strata_common::{StrataError, StrataResult, StreamId};

use super::native::NativeValue;
use super::physical;
use super::{Scalar, StreamManager, Value};
use crate::schema::RowType;

/// A row of values.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use strata_storage::schema::{Column, RowType, ScalarType};
/// use strata_storage::value::Row;
///
/// let row_type = Arc::new(RowType::new(vec![
///     Column::new("id", ScalarType::Int32),
///     Column::new("name", ScalarType::String),
/// ]).unwrap());
///
/// let row = Row::from_values(row_type, vec![1i32.into(), "Alice".into()]).unwrap();
/// assert_eq!(row.value_by_name("name").unwrap().as_string().unwrap(), "Alice");
/// assert_eq!(row.to_string(), "(1, Alice)");
/// ```
pub struct Row {
    row_type: Arc<RowType>,
    values: Vec<Scalar>,
    present: Vec<bool>,
    /// Columns written since `begin_modified_context`.
    modified: Option<Vec<bool>>,
    owned: bool,
    disposed: bool,
}

impl Row {
    /// Creates a row in which no column has a value.
    pub fn new(row_type: Arc<RowType>) -> Self {
        let values = row_type
            .columns()
            .iter()
            .map(|c| Scalar::nil(c.data_type))
            .collect();
        let present = vec![false; row_type.width()];
        Self {
            row_type,
            values,
            present,
            modified: None,
            owned: true,
            disposed: false,
        }
    }

    /// Creates a row in which every column has a value.
    ///
    /// Native values of a different type are coerced to the column type.
    pub fn from_values(row_type: Arc<RowType>, values: Vec<Scalar>) -> StrataResult<Self> {
        if values.len() != row_type.width() {
            return Err(StrataError::IncompatibleRowTypes {
                expected: row_type.width(),
                actual: values.len(),
            });
        }
        let values = values
            .into_iter()
            .zip(row_type.columns())
            .map(|(value, column)| conform(value, column.data_type))
            .collect::<StrataResult<Vec<_>>>()?;
        let present = vec![true; values.len()];
        Ok(Self {
            row_type,
            values,
            present,
            modified: None,
            owned: true,
            disposed: false,
        })
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The row type.
    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Returns true once the row has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_live(&self) -> StrataResult<()> {
        if self.disposed {
            Err(StrataError::ValueDisposed)
        } else {
            Ok(())
        }
    }

    fn check_index(&self, index: usize) -> StrataResult<()> {
        self.check_live()?;
        if index < self.values.len() {
            Ok(())
        } else {
            Err(StrataError::ColumnOutOfRange {
                index,
                width: self.values.len(),
            })
        }
    }

    fn check_writable(&self, index: usize) -> StrataResult<()> {
        self.check_index(index)?;
        if self.owned {
            Ok(())
        } else {
            Err(StrataError::invalid_argument(
                "cannot write through a borrowed row",
            ))
        }
    }

    fn column_name(&self, index: usize) -> String {
        self.row_type
            .columns()
            .get(index)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| index.to_string())
    }

    fn mark_modified(&mut self, index: usize) {
        if let Some(modified) = self.modified.as_mut() {
            modified[index] = true;
        }
    }

    // =========================================================================
    // Column Access
    // =========================================================================

    /// Returns the value of a column.
    pub fn value(&self, index: usize) -> StrataResult<&Scalar> {
        self.check_index(index)?;
        if !self.present[index] {
            return Err(StrataError::NoValue {
                column: self.column_name(index),
            });
        }
        Ok(&self.values[index])
    }

    /// Returns the value of a column by name.
    pub fn value_by_name(&self, name: &str) -> StrataResult<&Scalar> {
        self.value(self.row_type.require_column(name)?)
    }

    /// Returns true if the column has a value. Out-of-range columns have none.
    pub fn has_value(&self, index: usize) -> bool {
        !self.disposed && self.present.get(index).copied().unwrap_or(false)
    }

    /// Assigns a column, taking ownership of `value`.
    ///
    /// The previous value is disposed.
    pub fn set_value(
        &mut self,
        streams: &dyn StreamManager,
        index: usize,
        value: Scalar,
    ) -> StrataResult<()> {
        self.check_writable(index)?;
        let value = conform(value, self.row_type.columns()[index].data_type)?;
        let mut previous = std::mem::replace(&mut self.values[index], value);
        previous.dispose(streams);
        self.present[index] = true;
        self.mark_modified(index);
        Ok(())
    }

    /// Assigns a column by name.
    pub fn set_value_by_name(
        &mut self,
        streams: &dyn StreamManager,
        name: &str,
        value: Scalar,
    ) -> StrataResult<()> {
        let index = self.row_type.require_column(name)?;
        self.set_value(streams, index, value)
    }

    /// Assigns native content to a column, coercing it to the column type.
    pub fn set_native(
        &mut self,
        streams: &dyn StreamManager,
        index: usize,
        value: NativeValue,
    ) -> StrataResult<()> {
        self.set_value(streams, index, Scalar::new(value))
    }

    /// Returns the column to "no value", releasing what it held.
    pub fn clear_value(&mut self, streams: &dyn StreamManager, index: usize) -> StrataResult<()> {
        self.check_writable(index)?;
        let data_type = self.row_type.columns()[index].data_type;
        let mut previous = std::mem::replace(&mut self.values[index], Scalar::nil(data_type));
        previous.dispose(streams);
        self.present[index] = false;
        self.mark_modified(index);
        Ok(())
    }

    /// Clears every column.
    pub fn clear_values(&mut self, streams: &dyn StreamManager) -> StrataResult<()> {
        for index in 0..self.values.len() {
            self.clear_value(streams, index)?;
        }
        Ok(())
    }

    /// Returns true if any column holds a nil value.
    pub fn has_nils(&self) -> bool {
        self.values
            .iter()
            .zip(&self.present)
            .any(|(value, present)| *present && value.is_nil())
    }

    /// Returns true if any column has no value.
    pub fn has_any_no_values(&self) -> bool {
        self.present.iter().any(|present| !present)
    }

    /// Name of the first column without a value.
    pub fn first_missing_column(&self) -> Option<String> {
        self.present
            .iter()
            .position(|present| !present)
            .map(|index| self.column_name(index))
    }

    /// Returns true if the column's content lives in a stream.
    pub fn has_non_native_value(&self, index: usize) -> bool {
        self.has_value(index) && !self.values[index].is_native()
    }

    /// The stream behind a non-native column value.
    pub fn non_native_stream_id(&self, index: usize) -> Option<StreamId> {
        if self.has_value(index) {
            self.values[index].stream_id()
        } else {
            None
        }
    }

    // =========================================================================
    // Modified Context
    // =========================================================================

    /// Starts tracking which columns are written.
    pub fn begin_modified_context(&mut self) -> StrataResult<()> {
        if self.modified.is_some() {
            return Err(StrataError::ModifiedContextActive);
        }
        self.modified = Some(vec![false; self.values.len()]);
        Ok(())
    }

    /// Stops tracking and returns, per column, whether it was written.
    pub fn end_modified_context(&mut self) -> StrataResult<Vec<bool>> {
        self.modified.take().ok_or(StrataError::ModifiedContextInactive)
    }

    /// Returns true if the column was written in the active context.
    pub fn is_modified(&self, index: usize) -> bool {
        self.modified
            .as_ref()
            .and_then(|m| m.get(index).copied())
            .unwrap_or(false)
    }

    // =========================================================================
    // Copying
    // =========================================================================

    /// Copies every column into `target`, which must have a compatible type.
    ///
    /// Columns without a value here are cleared in the target.
    pub fn copy_to(&self, streams: &dyn StreamManager, target: &mut Row) -> StrataResult<()> {
        self.check_live()?;
        if !self.row_type.is_compatible(&target.row_type) {
            return Err(StrataError::IncompatibleRowTypes {
                expected: target.width(),
                actual: self.width(),
            });
        }
        for index in 0..self.values.len() {
            if self.present[index] {
                target.set_value(streams, index, self.values[index].copy(streams)?)?;
            } else {
                target.clear_value(streams, index)?;
            }
        }
        Ok(())
    }

    /// Builds an owned row of `row_type` from the given columns of this row.
    pub fn project(
        &self,
        streams: &dyn StreamManager,
        row_type: Arc<RowType>,
        columns: &[usize],
    ) -> StrataResult<Row> {
        self.project_with(row_type, columns, |value| value.copy(streams))
    }

    /// Builds a read-only view of the given columns of this row.
    ///
    /// The view shares content with this row and must not outlive it.
    pub fn project_borrowed(&self, row_type: Arc<RowType>, columns: &[usize]) -> StrataResult<Row> {
        let mut view = self.project_with(row_type, columns, |value| Ok(Scalar::borrow_from(value)))?;
        view.owned = false;
        Ok(view)
    }

    fn project_with(
        &self,
        row_type: Arc<RowType>,
        columns: &[usize],
        mut take: impl FnMut(&Scalar) -> StrataResult<Scalar>,
    ) -> StrataResult<Row> {
        self.check_live()?;
        if columns.len() != row_type.width() {
            return Err(StrataError::IncompatibleRowTypes {
                expected: row_type.width(),
                actual: columns.len(),
            });
        }
        let mut projected = Row::new(row_type);
        for (target, &source) in columns.iter().enumerate() {
            self.check_index(source)?;
            if self.present[source] {
                let value = take(&self.values[source])?;
                if value.data_type() != projected.values[target].data_type() {
                    return Err(StrataError::IncompatibleRowTypes {
                        expected: projected.width(),
                        actual: self.width(),
                    });
                }
                projected.values[target] = value;
                projected.present[target] = true;
            }
        }
        Ok(projected)
    }
}

/// Makes a scalar fit a column type, coercing native content.
fn conform(value: Scalar, data_type: crate::schema::ScalarType) -> StrataResult<Scalar> {
    if value.data_type() == data_type {
        return Ok(value);
    }
    match value.native() {
        Ok(native) if value.is_owned() => Scalar::from_native(data_type, native.clone()),
        Err(StrataError::NilValue { .. }) if value.is_owned() => Ok(Scalar::nil(data_type)),
        _ => Err(StrataError::RepresentationMismatch {
            requested: data_type.name().into(),
            data_type: value.data_type().name().into(),
        }),
    }
}

impl Value for Row {
    fn is_native(&self) -> bool {
        self.values
            .iter()
            .zip(&self.present)
            .all(|(value, present)| !present || value.is_native())
    }

    fn is_nil(&self) -> bool {
        !self.present.iter().any(|p| *p)
    }

    fn values_owned(&self) -> bool {
        self.owned
    }

    fn as_physical(&self, streams: &dyn StreamManager) -> StrataResult<Bytes> {
        self.check_live()?;
        let columns = self
            .values
            .iter()
            .zip(&self.present)
            .map(|(value, present)| {
                if *present {
                    value.as_physical(streams).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<StrataResult<Vec<_>>>()?;
        physical::encode_row(&columns)
    }

    fn set_physical(&mut self, streams: &dyn StreamManager, image: &[u8]) -> StrataResult<()> {
        self.check_live()?;
        if !self.owned {
            return Err(StrataError::invalid_argument(
                "cannot write through a borrowed row",
            ));
        }
        let columns = physical::decode_row(image, self.width())?;

        let mut decoded = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            decoded.push(match column {
                Some(image) => {
                    let mut value = Scalar::nil(self.row_type.columns()[index].data_type);
                    value.set_physical(streams, image)?;
                    Some(value)
                }
                None => None,
            });
        }
        for (index, value) in decoded.into_iter().enumerate() {
            match value {
                Some(value) => self.set_value(streams, index, value)?,
                None => self.clear_value(streams, index)?,
            }
        }
        Ok(())
    }

    fn copy(&self, streams: &dyn StreamManager) -> StrataResult<Self> {
        self.check_live()?;
        let mut copy = Row::new(Arc::clone(&self.row_type));
        for (index, value) in self.values.iter().enumerate() {
            if self.present[index] {
                copy.values[index] = value.copy(streams)?;
                copy.present[index] = true;
            }
        }
        Ok(copy)
    }

    fn dispose(&mut self, streams: &dyn StreamManager) {
        if self.disposed {
            return;
        }
        for value in &mut self.values {
            value.dispose(streams);
        }
        self.modified = None;
        self.disposed = true;
    }
}

impl PartialEq for Row {
    /// Column-wise storage equality, including which columns have values.
    fn eq(&self, other: &Self) -> bool {
        self.present == other.present
            && self
                .values
                .iter()
                .zip(&other.values)
                .zip(&self.present)
                .all(|((a, b), present)| !present || a == b)
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("row_type", &self.row_type.to_string())
            .field("values", &self.to_string())
            .field("owned", &self.owned)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disposed {
            return f.write_str("<disposed>");
        }
        f.write_str("(")?;
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if self.present[index] {
                write!(f, "{value}")?;
            } else {
                f.write_str("<no value>")?;
            }
        }
        f.write_str(")")
    }
}
