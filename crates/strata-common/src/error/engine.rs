//! Engine error types.
//!
//! Every failure surfaced by the engine carries a stable numeric code, a
//! severity, and the parameters it was raised with, so callers can react
//! to the condition rather than parse a message.

use std::fmt;
use thiserror::Error;

use crate::types::StreamId;

/// Error codes for categorizing errors.
///
/// These codes are stable across versions. The high byte is the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0002,
    /// Invalid configuration.
    InvalidConfig = 0x0003,
    /// I/O error.
    Io = 0x0004,

    // Value errors (0x0100 - 0x01FF)
    /// The value was disposed and can no longer be read.
    ValueDisposed = 0x0100,
    /// A column was read before a value was assigned to it.
    NoValue = 0x0101,
    /// A representation was requested that the value's type does not expose.
    RepresentationMismatch = 0x0102,
    /// A representation could not be converted to the canonical encoding.
    ConversionFailed = 0x0103,
    /// A physical image could not be decoded.
    InvalidPhysical = 0x0104,
    /// A stream referenced by a non-native value does not exist.
    StreamNotFound = 0x0105,
    /// Typed content was read from a nil value.
    NilValue = 0x0106,

    // Row errors (0x0200 - 0x02FF)
    /// Column name did not resolve.
    ColumnNotFound = 0x0200,
    /// Column ordinal outside the row width.
    ColumnOutOfRange = 0x0201,
    /// Source and target rows have different arity.
    IncompatibleRowTypes = 0x0202,
    /// A modified context is already active on the row.
    ModifiedContextActive = 0x0203,
    /// No modified context is active on the row.
    ModifiedContextInactive = 0x0204,

    // Index errors (0x0300 - 0x03FF)
    /// Insert or update would produce a duplicate key.
    IndexKeyCollision = 0x0300,
    /// Key not present in the index.
    KeyNotFound = 0x0301,
    /// The index has been dropped.
    IndexDropped = 0x0302,
    /// A non-clustered index disagrees with the clustered index.
    IndexConsistencyFault = 0x0303,

    // Cursor errors (0x0400 - 0x04FF)
    /// Cursor operation invoked while the cursor is closed.
    ScanInactive = 0x0400,
    /// Positional read invoked while on a boundary sentinel.
    NoActiveRow = 0x0401,
    /// A key or bookmark did not resolve through the clustered index.
    ClusteredLookupFailure = 0x0402,
    /// Operation not in the cursor's capability set.
    CapabilityViolation = 0x0403,
    /// Optimistic refresh gave up after its retry bound.
    OptimisticRefreshExhausted = 0x0404,
    /// A row with unset columns was used where a full row is required.
    IncompleteRow = 0x0405,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Value",
            0x02 => "Row",
            0x03 => "Index",
            0x04 => "Cursor",
            _ => "Unknown",
        }
    }

    /// Looks up a code by its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        Some(match code {
            0x0001 => Self::Internal,
            0x0002 => Self::InvalidArgument,
            0x0003 => Self::InvalidConfig,
            0x0004 => Self::Io,
            0x0100 => Self::ValueDisposed,
            0x0101 => Self::NoValue,
            0x0102 => Self::RepresentationMismatch,
            0x0103 => Self::ConversionFailed,
            0x0104 => Self::InvalidPhysical,
            0x0105 => Self::StreamNotFound,
            0x0106 => Self::NilValue,
            0x0200 => Self::ColumnNotFound,
            0x0201 => Self::ColumnOutOfRange,
            0x0202 => Self::IncompatibleRowTypes,
            0x0203 => Self::ModifiedContextActive,
            0x0204 => Self::ModifiedContextInactive,
            0x0300 => Self::IndexKeyCollision,
            0x0301 => Self::KeyNotFound,
            0x0302 => Self::IndexDropped,
            0x0303 => Self::IndexConsistencyFault,
            0x0400 => Self::ScanInactive,
            0x0401 => Self::NoActiveRow,
            0x0402 => Self::ClusteredLookupFailure,
            0x0403 => Self::CapabilityViolation,
            0x0404 => Self::OptimisticRefreshExhausted,
            0x0405 => Self::IncompleteRow,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// How bad an error is, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// The caller asked for something invalid; correctable by the user.
    User = 0,
    /// The calling application misused the API.
    Application = 1,
    /// The engine detected an internal inconsistency.
    System = 2,
    /// The environment (streams, files) failed underneath the engine.
    Environment = 3,
}

impl Severity {
    /// Decodes a severity from its stored byte.
    #[must_use]
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::User),
            1 => Some(Self::Application),
            2 => Some(Self::System),
            3 => Some(Self::Environment),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Application => "application",
            Self::System => "system",
            Self::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// The main error type for strata.
///
/// # Example
///
/// ```rust
/// use strata_common::error::{ErrorCode, Severity, StrataError};
///
/// let err = StrataError::IndexKeyCollision {
///     index: "Users_PK".into(),
///     key: "(1)".into(),
/// };
/// assert_eq!(err.code(), ErrorCode::IndexKeyCollision);
/// assert_eq!(err.severity(), Severity::User);
/// assert_eq!(err.params(), vec!["Users_PK".to_string(), "(1)".to_string()]);
/// ```
#[derive(Debug, Error)]
pub enum StrataError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    // ==========================================================================
    // Value Errors
    // ==========================================================================
    /// The value has been disposed.
    #[error("value has been disposed")]
    ValueDisposed,

    /// A column was read before it was given a value.
    #[error("column '{column}' has no value")]
    NoValue {
        /// The unset column.
        column: String,
    },

    /// The requested representation is not exposed by the value's type.
    #[error("representation {requested} is not available for type {data_type}")]
    RepresentationMismatch {
        /// The representation that was asked for.
        requested: String,
        /// The value's scalar type.
        data_type: String,
    },

    /// Conversion between representations failed.
    #[error("cannot convert '{value}' to {target}")]
    ConversionFailed {
        /// Rendering of the offending input.
        value: String,
        /// The target representation.
        target: String,
    },

    /// A physical image could not be decoded.
    #[error("invalid physical image: {reason}")]
    InvalidPhysical {
        /// What was wrong with the image.
        reason: String,
    },

    /// Stream does not exist.
    #[error("stream {stream_id} not found")]
    StreamNotFound {
        /// The missing stream.
        stream_id: StreamId,
    },

    /// Typed content was read from a nil value.
    #[error("{data_type} value is nil")]
    NilValue {
        /// The value's scalar type.
        data_type: String,
    },

    // ==========================================================================
    // Row Errors
    // ==========================================================================
    /// Column name did not resolve.
    #[error("column '{column}' not found in row type {row_type}")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// Rendering of the row type searched.
        row_type: String,
    },

    /// Column ordinal outside the row.
    #[error("column index {index} out of range for row of width {width}")]
    ColumnOutOfRange {
        /// The requested ordinal.
        index: usize,
        /// The row width.
        width: usize,
    },

    /// Rows have incompatible arity.
    #[error("incompatible row types: expected {expected} columns, got {actual}")]
    IncompatibleRowTypes {
        /// Columns in the target row.
        expected: usize,
        /// Columns in the source row.
        actual: usize,
    },

    /// Modified context begun twice.
    #[error("a modified context is already active on this row")]
    ModifiedContextActive,

    /// Modified context ended without a begin.
    #[error("no modified context is active on this row")]
    ModifiedContextInactive,

    // ==========================================================================
    // Index Errors
    // ==========================================================================
    /// Duplicate key in an index.
    #[error("duplicate key {key} in index '{index}'")]
    IndexKeyCollision {
        /// The index that rejected the key.
        index: String,
        /// Rendering of the key.
        key: String,
    },

    /// Key not present.
    #[error("key {key} not found in index '{index}'")]
    KeyNotFound {
        /// The index searched.
        index: String,
        /// Rendering of the key.
        key: String,
    },

    /// The index has been dropped.
    #[error("index '{index}' has been dropped")]
    IndexDropped {
        /// The dropped index.
        index: String,
    },

    /// Non-clustered index lost an entry the clustered index implies.
    #[error("index '{index}' is inconsistent with the clustered index at key {key}; table is corrupted")]
    IndexConsistencyFault {
        /// The inconsistent index.
        index: String,
        /// Rendering of the missing key.
        key: String,
    },

    // ==========================================================================
    // Cursor Errors
    // ==========================================================================
    /// Cursor is closed.
    #[error("cursor is not active")]
    ScanInactive,

    /// Cursor is on a boundary sentinel.
    #[error("cursor has no active row")]
    NoActiveRow,

    /// Row could not be located through the clustered index.
    #[error("row {key} could not be located in the clustered index of '{table}'")]
    ClusteredLookupFailure {
        /// The table searched.
        table: String,
        /// Rendering of the clustered key.
        key: String,
    },

    /// Operation outside the cursor's capabilities.
    #[error("cursor does not support {capability}")]
    CapabilityViolation {
        /// The missing capability.
        capability: String,
    },

    /// Optimistic refresh gave up.
    #[error("optimistic refresh gave up after {attempts} attempts")]
    OptimisticRefreshExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// A partial row was used where a full row is required.
    #[error("row is missing a value for column '{column}'")]
    IncompleteRow {
        /// The first unset column.
        column: String,
    },

    // ==========================================================================
    // Nesting
    // ==========================================================================
    /// An error with added context; code and severity are the cause's.
    #[error("{message}")]
    Context {
        /// What the engine was doing.
        message: String,
        /// The underlying error.
        #[source]
        source: Box<StrataError>,
    },
}

impl StrataError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::Io { .. } => ErrorCode::Io,
            Self::ValueDisposed => ErrorCode::ValueDisposed,
            Self::NoValue { .. } => ErrorCode::NoValue,
            Self::RepresentationMismatch { .. } => ErrorCode::RepresentationMismatch,
            Self::ConversionFailed { .. } => ErrorCode::ConversionFailed,
            Self::InvalidPhysical { .. } => ErrorCode::InvalidPhysical,
            Self::StreamNotFound { .. } => ErrorCode::StreamNotFound,
            Self::NilValue { .. } => ErrorCode::NilValue,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::ColumnOutOfRange { .. } => ErrorCode::ColumnOutOfRange,
            Self::IncompatibleRowTypes { .. } => ErrorCode::IncompatibleRowTypes,
            Self::ModifiedContextActive => ErrorCode::ModifiedContextActive,
            Self::ModifiedContextInactive => ErrorCode::ModifiedContextInactive,
            Self::IndexKeyCollision { .. } => ErrorCode::IndexKeyCollision,
            Self::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            Self::IndexDropped { .. } => ErrorCode::IndexDropped,
            Self::IndexConsistencyFault { .. } => ErrorCode::IndexConsistencyFault,
            Self::ScanInactive => ErrorCode::ScanInactive,
            Self::NoActiveRow => ErrorCode::NoActiveRow,
            Self::ClusteredLookupFailure { .. } => ErrorCode::ClusteredLookupFailure,
            Self::CapabilityViolation { .. } => ErrorCode::CapabilityViolation,
            Self::OptimisticRefreshExhausted { .. } => ErrorCode::OptimisticRefreshExhausted,
            Self::IncompleteRow { .. } => ErrorCode::IncompleteRow,
            Self::Context { source, .. } => source.code(),
        }
    }

    /// Returns the severity of this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Internal { .. } | Self::IndexConsistencyFault { .. } => Severity::System,
            Self::Io { .. } | Self::StreamNotFound { .. } => Severity::Environment,
            Self::InvalidArgument { .. }
            | Self::InvalidConfig { .. }
            | Self::ValueDisposed
            | Self::ColumnOutOfRange { .. }
            | Self::ModifiedContextActive
            | Self::ModifiedContextInactive
            | Self::IndexDropped { .. }
            | Self::ScanInactive
            | Self::NoActiveRow
            | Self::CapabilityViolation { .. }
            | Self::IncompatibleRowTypes { .. } => Severity::Application,
            Self::NoValue { .. }
            | Self::NilValue { .. }
            | Self::RepresentationMismatch { .. }
            | Self::ConversionFailed { .. }
            | Self::InvalidPhysical { .. }
            | Self::ColumnNotFound { .. }
            | Self::IndexKeyCollision { .. }
            | Self::KeyNotFound { .. }
            | Self::ClusteredLookupFailure { .. }
            | Self::OptimisticRefreshExhausted { .. }
            | Self::IncompleteRow { .. } => Severity::User,
            Self::Context { source, .. } => source.severity(),
        }
    }

    /// Returns the parameters the error was raised with, in declaration order.
    #[must_use]
    pub fn params(&self) -> Vec<String> {
        match self {
            Self::Internal { message }
            | Self::InvalidArgument { message }
            | Self::InvalidConfig { message } => vec![message.clone()],
            Self::Io { source } => vec![source.to_string()],
            Self::ValueDisposed
            | Self::ModifiedContextActive
            | Self::ModifiedContextInactive
            | Self::ScanInactive
            | Self::NoActiveRow => Vec::new(),
            Self::NoValue { column } | Self::IncompleteRow { column } => vec![column.clone()],
            Self::RepresentationMismatch {
                requested,
                data_type,
            } => vec![requested.clone(), data_type.clone()],
            Self::ConversionFailed { value, target } => vec![value.clone(), target.clone()],
            Self::InvalidPhysical { reason } => vec![reason.clone()],
            Self::NilValue { data_type } => vec![data_type.clone()],
            Self::StreamNotFound { stream_id } => vec![stream_id.to_string()],
            Self::ColumnNotFound { column, row_type } => vec![column.clone(), row_type.clone()],
            Self::ColumnOutOfRange { index, width } => vec![index.to_string(), width.to_string()],
            Self::IncompatibleRowTypes { expected, actual } => {
                vec![expected.to_string(), actual.to_string()]
            }
            Self::IndexKeyCollision { index, key }
            | Self::KeyNotFound { index, key }
            | Self::IndexConsistencyFault { index, key } => vec![index.clone(), key.clone()],
            Self::IndexDropped { index } => vec![index.clone()],
            Self::ClusteredLookupFailure { table, key } => vec![table.clone(), key.clone()],
            Self::CapabilityViolation { capability } => vec![capability.clone()],
            Self::OptimisticRefreshExhausted { attempts } => vec![attempts.to_string()],
            Self::Context { message, .. } => vec![message.clone()],
        }
    }

    /// Returns the nested cause, if this error wraps another engine error.
    #[must_use]
    pub fn cause(&self) -> Option<&StrataError> {
        match self {
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns the innermost engine error.
    #[must_use]
    pub fn root_cause(&self) -> &StrataError {
        let mut current = self;
        while let Some(inner) = current.cause() {
            current = inner;
        }
        current
    }

    /// Returns true if the error leaves the table unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.code() == ErrorCode::IndexConsistencyFault
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid physical image error.
    #[must_use]
    pub fn invalid_physical(reason: impl Into<String>) -> Self {
        Self::InvalidPhysical {
            reason: reason.into(),
        }
    }

    /// Creates a capability violation for the named capability.
    #[must_use]
    pub fn capability(capability: impl Into<String>) -> Self {
        Self::CapabilityViolation {
            capability: capability.into(),
        }
    }

    /// Wraps this error with a description of what the engine was doing.
    #[must_use]
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = StrataError::KeyNotFound {
            index: "Orders_PK".into(),
            key: "(7)".into(),
        };
        assert_eq!(err.code(), ErrorCode::KeyNotFound);
        assert_eq!(err.code().category(), "Index");
        assert_eq!(err.code().as_u16(), 0x0301);
    }

    #[test]
    fn test_error_code_roundtrip() {
        for code in [
            ErrorCode::Internal,
            ErrorCode::StreamNotFound,
            ErrorCode::ModifiedContextInactive,
            ErrorCode::IndexConsistencyFault,
            ErrorCode::IncompleteRow,
        ] {
            assert_eq!(ErrorCode::from_u16(code.as_u16()), Some(code));
        }
        assert_eq!(ErrorCode::from_u16(0xFFFF), None);
    }

    #[test]
    fn test_error_display() {
        let err = StrataError::ColumnOutOfRange { index: 5, width: 3 };
        assert_eq!(
            err.to_string(),
            "column index 5 out of range for row of width 3"
        );
        assert_eq!(StrataError::NoActiveRow.to_string(), "cursor has no active row");
    }

    #[test]
    fn test_severity() {
        let fault = StrataError::IndexConsistencyFault {
            index: "Orders_ByCustomer".into(),
            key: "(3, 9)".into(),
        };
        assert_eq!(fault.severity(), Severity::System);
        assert!(fault.is_fatal());

        assert_eq!(StrataError::ScanInactive.severity(), Severity::Application);
        assert!(!StrataError::ScanInactive.is_fatal());
    }

    #[test]
    fn test_context_preserves_code() {
        let err = StrataError::capability("Updatable").context("updating through cursor");
        assert_eq!(err.code(), ErrorCode::CapabilityViolation);
        assert_eq!(err.severity(), Severity::Application);
        assert_eq!(err.to_string(), "updating through cursor");
        assert!(matches!(
            err.root_cause(),
            StrataError::CapabilityViolation { .. }
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_params() {
        let err = StrataError::ClusteredLookupFailure {
            table: "Orders".into(),
            key: "(1)".into(),
        };
        assert_eq!(err.params(), vec!["Orders".to_string(), "(1)".to_string()]);
        assert!(StrataError::NoActiveRow.params().is_empty());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StrataError = io_err.into();
        assert_eq!(err.code(), ErrorCode::Io);
        assert_eq!(err.severity(), Severity::Environment);
    }
}
