//! Scalar type descriptors.

use std::fmt;

/// The canonical type of a scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ScalarType {
    /// True or false.
    Boolean = 1,
    /// Unsigned 8-bit integer.
    Byte = 2,
    /// Signed 16-bit integer.
    Int16 = 3,
    /// Signed 32-bit integer.
    Int32 = 4,
    /// Signed 64-bit integer.
    Int64 = 5,
    /// Fixed-point decimal.
    Decimal = 6,
    /// Elapsed time with nanosecond resolution.
    TimeSpan = 7,
    /// UTC timestamp with nanosecond resolution.
    DateTime = 8,
    /// 128-bit globally unique identifier.
    Guid = 9,
    /// UTF-8 text.
    String = 10,
    /// Opaque bytes.
    Binary = 11,
    /// A captured engine error.
    Error = 12,
}

impl ScalarType {
    /// Every scalar type, in tag order.
    pub const ALL: [ScalarType; 12] = [
        Self::Boolean,
        Self::Byte,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Decimal,
        Self::TimeSpan,
        Self::DateTime,
        Self::Guid,
        Self::String,
        Self::Binary,
        Self::Error,
    ];

    /// Returns the type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Decimal => "Decimal",
            Self::TimeSpan => "TimeSpan",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::String => "String",
            Self::Binary => "Binary",
            Self::Error => "Error",
        }
    }

    /// Returns the physical type tag.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Converts a physical type tag back to a type.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.tag() == tag)
    }

    /// Returns true if values of this type may live in a stream.
    pub fn supports_streams(self) -> bool {
        matches!(self, Self::String | Self::Binary)
    }

    /// Returns true for the integer family.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::Int16 | Self::Int32 | Self::Int64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
