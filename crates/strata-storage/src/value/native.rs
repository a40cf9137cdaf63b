//! Native values and representation conversions.
//!
//! A [`NativeValue`] holds the content of a scalar in its canonical type.
//! Representations other than the canonical one are produced by
//! [`NativeValue::coerce`], which is used in both directions: reading a
//! representation coerces the stored value to it, and writing one coerces
//! the supplied value back to the scalar's canonical type.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use strata_common::{Severity, StrataError, StrataResult};

use crate::schema::ScalarType;

// =============================================================================
// Decimal
// =============================================================================

/// A fixed-point decimal: `mantissa * 10^-scale`.
///
/// Equality and ordering are numeric, so `1.0` equals `1.00`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    /// Largest supported scale.
    pub const MAX_SCALE: u8 = 28;

    /// Zero.
    pub const ZERO: Self = Self {
        mantissa: 0,
        scale: 0,
    };

    /// Creates a decimal from a mantissa and scale.
    pub fn new(mantissa: i128, scale: u8) -> StrataResult<Self> {
        if scale > Self::MAX_SCALE {
            return Err(StrataError::ConversionFailed {
                value: format!("{mantissa}e-{scale}"),
                target: "Decimal".into(),
            });
        }
        Ok(Self { mantissa, scale })
    }

    /// Creates an integral decimal.
    pub fn from_i64(value: i64) -> Self {
        Self {
            mantissa: i128::from(value),
            scale: 0,
        }
    }

    /// The unscaled value.
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Digits after the decimal point.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Returns the integral value, if there is no fractional part.
    pub fn to_i64(&self) -> Option<i64> {
        let divisor = 10i128.checked_pow(u32::from(self.scale))?;
        if self.mantissa % divisor != 0 {
            return None;
        }
        i64::try_from(self.mantissa / divisor).ok()
    }

    fn rescaled(&self, scale: u8) -> Option<i128> {
        let factor = 10i128.checked_pow(u32::from(scale.checked_sub(self.scale)?))?;
        self.mantissa.checked_mul(factor)
    }

    fn approximate(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(i32::from(self.scale))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            // Only reachable near the i128 limits.
            _ => self.approximate().total_cmp(&other.approximate()),
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = usize::from(self.scale);
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let sign = if self.mantissa < 0 { "-" } else { "" };
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl FromStr for Decimal {
    type Err = StrataError;

    fn from_str(s: &str) -> StrataResult<Self> {
        let failed = || StrataError::ConversionFailed {
            value: s.to_string(),
            target: "Decimal".into(),
        };
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(failed());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(failed());
        }
        let scale = u8::try_from(frac_part.len()).map_err(|_| failed())?;
        let digits = format!("{int_part}{frac_part}");
        let magnitude: i128 = digits.parse().map_err(|_| failed())?;
        let mantissa = if negative { -magnitude } else { magnitude };
        Self::new(mantissa, scale).map_err(|_| failed())
    }
}

// =============================================================================
// Guid
// =============================================================================

/// A 128-bit globally unique identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Guid([u8; 16]);

impl Guid {
    /// The all-zero identifier.
    pub const NIL: Self = Self([0; 16]);

    /// Creates a guid from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates a guid from a slice of exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> StrataResult<Self> {
        let array: [u8; 16] = bytes.try_into().map_err(|_| StrataError::ConversionFailed {
            value: hex::encode(bytes),
            target: "Guid".into(),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16])
        )
    }
}

impl FromStr for Guid {
    type Err = StrataError;

    fn from_str(s: &str) -> StrataResult<Self> {
        let compact: String = s
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .chars()
            .filter(|c| *c != '-')
            .collect();
        let bytes = hex::decode(&compact).map_err(|_| StrataError::ConversionFailed {
            value: s.to_string(),
            target: "Guid".into(),
        })?;
        Self::from_slice(&bytes)
    }
}

// =============================================================================
// Error Record
// =============================================================================

/// A captured engine error, stored as a value of type `Error`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorRecord {
    /// Numeric error code.
    pub code: u16,
    /// Severity byte.
    pub severity: u8,
    /// Rendered message.
    pub message: String,
}

impl ErrorRecord {
    /// Creates a record.
    pub fn new(code: u16, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: severity as u8,
            message: message.into(),
        }
    }

    /// Decoded severity, if the stored byte is known.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_u8(self.severity)
    }
}

impl From<&StrataError> for ErrorRecord {
    fn from(err: &StrataError) -> Self {
        Self::new(err.code().as_u16(), err.severity(), err.to_string())
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// =============================================================================
// Time Span Text Form
// =============================================================================

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_DAY: u64 = 86_400 * MICROS_PER_SECOND;

/// Builds a UTC timestamp from microseconds since the Unix epoch.
pub(crate) fn datetime_from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    DateTime::from_timestamp(micros.div_euclid(1_000_000), nanos)
}

/// Total microseconds of a span.
pub(crate) fn timespan_micros(span: &TimeDelta) -> StrataResult<i64> {
    span.num_microseconds()
        .ok_or_else(|| StrataError::ConversionFailed {
            value: format!("{span}"),
            target: "Int64".into(),
        })
}

/// Formats a span as `[-][d.]hh:mm:ss.ffffff`.
fn format_timespan(span: &TimeDelta) -> String {
    let micros = span.num_microseconds().unwrap_or(i64::MAX);
    let sign = if micros < 0 { "-" } else { "" };
    let total = micros.unsigned_abs();
    let days = total / MICROS_PER_DAY;
    let rest = total % MICROS_PER_DAY;
    let hours = rest / (3_600 * MICROS_PER_SECOND);
    let minutes = rest / (60 * MICROS_PER_SECOND) % 60;
    let seconds = rest / MICROS_PER_SECOND % 60;
    let fraction = rest % MICROS_PER_SECOND;
    if days > 0 {
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}.{fraction:06}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{fraction:06}")
    }
}

fn parse_timespan(s: &str) -> StrataResult<TimeDelta> {
    let failed = || StrataError::ConversionFailed {
        value: s.to_string(),
        target: "TimeSpan".into(),
    };
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (clock, fraction) = match body.rsplit_once('.') {
        Some((clock, fraction)) if !fraction.contains(':') => (clock, fraction),
        _ => (body, ""),
    };
    let mut fields = clock.split(':');
    let (Some(first), Some(minutes), Some(seconds), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(failed());
    };
    let (days, hours) = match first.split_once('.') {
        Some((days, hours)) => (days, hours),
        None => ("0", first),
    };
    let number = |text: &str| text.parse::<u64>().map_err(|_| failed());
    let (days, hours, minutes, seconds) =
        (number(days)?, number(hours)?, number(minutes)?, number(seconds)?);
    if minutes >= 60 || seconds >= 60 || fraction.len() > 6 {
        return Err(failed());
    }
    let fraction = if fraction.is_empty() {
        0
    } else {
        number(fraction)? * 10u64.pow(6 - fraction.len() as u32)
    };
    let total = days
        .checked_mul(MICROS_PER_DAY)
        .and_then(|t| t.checked_add(hours.checked_mul(3_600 * MICROS_PER_SECOND)?))
        .and_then(|t| t.checked_add((minutes * 60 + seconds) * MICROS_PER_SECOND + fraction))
        .and_then(|t| i64::try_from(t).ok())
        .ok_or_else(failed)?;
    Ok(TimeDelta::microseconds(if negative { -total } else { total }))
}

// =============================================================================
// Native Value
// =============================================================================

/// A value in its canonical type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NativeValue {
    /// Boolean content.
    Boolean(bool),
    /// Byte content.
    Byte(u8),
    /// Int16 content.
    Int16(i16),
    /// Int32 content.
    Int32(i32),
    /// Int64 content.
    Int64(i64),
    /// Decimal content.
    Decimal(Decimal),
    /// TimeSpan content.
    TimeSpan(TimeDelta),
    /// DateTime content.
    DateTime(DateTime<Utc>),
    /// Guid content.
    Guid(Guid),
    /// String content.
    String(String),
    /// Binary content.
    Binary(Bytes),
    /// Error content.
    Error(ErrorRecord),
}

impl NativeValue {
    /// The scalar type this content belongs to.
    pub fn data_type(&self) -> ScalarType {
        match self {
            Self::Boolean(_) => ScalarType::Boolean,
            Self::Byte(_) => ScalarType::Byte,
            Self::Int16(_) => ScalarType::Int16,
            Self::Int32(_) => ScalarType::Int32,
            Self::Int64(_) => ScalarType::Int64,
            Self::Decimal(_) => ScalarType::Decimal,
            Self::TimeSpan(_) => ScalarType::TimeSpan,
            Self::DateTime(_) => ScalarType::DateTime,
            Self::Guid(_) => ScalarType::Guid,
            Self::String(_) => ScalarType::String,
            Self::Binary(_) => ScalarType::Binary,
            Self::Error(_) => ScalarType::Error,
        }
    }

    /// Total order used by indexes. Values of different types order by type.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// Returns true if `from` content can be coerced to `to`.
    pub fn convertible(from: ScalarType, to: ScalarType) -> bool {
        use ScalarType as T;
        if from == to || to == T::String || from == T::String {
            return true;
        }
        match (from, to) {
            (a, b) if a.is_integer() && (b.is_integer() || b == T::Decimal) => true,
            (T::Decimal, b) if b.is_integer() => true,
            (T::TimeSpan | T::DateTime, T::Int64) | (T::Int64, T::TimeSpan | T::DateTime) => true,
            (T::Guid, T::Binary) | (T::Binary, T::Guid) => true,
            _ => false,
        }
    }

    /// Converts this content into content of type `to`.
    ///
    /// Narrowing conversions are checked and fail with `ConversionFailed`;
    /// type pairs with no conversion fail with `RepresentationMismatch`.
    pub fn coerce(self, to: ScalarType) -> StrataResult<Self> {
        let from = self.data_type();
        if from == to {
            return Ok(self);
        }
        if !Self::convertible(from, to) {
            return Err(StrataError::RepresentationMismatch {
                requested: to.name().into(),
                data_type: from.name().into(),
            });
        }
        let failed = |value: &NativeValue| StrataError::ConversionFailed {
            value: value.to_string(),
            target: to.name().into(),
        };
        match (&self, to) {
            (Self::Binary(bytes), ScalarType::String) => std::str::from_utf8(bytes)
                .map(|s| Self::String(s.to_string()))
                .map_err(|_| failed(&self)),
            (Self::Error(record), ScalarType::String) => Ok(Self::String(record.message.clone())),
            (_, ScalarType::String) => Ok(Self::String(self.to_string())),
            (Self::String(text), _) => Self::parse(to, text),
            _ => {
                if let Some(wide) = self.as_i128() {
                    return Self::from_i128(wide, to).ok_or_else(|| failed(&self));
                }
                match (&self, to) {
                    (Self::Decimal(d), _) => d
                        .to_i64()
                        .and_then(|v| Self::from_i128(i128::from(v), to))
                        .ok_or_else(|| failed(&self)),
                    (Self::TimeSpan(span), ScalarType::Int64) => {
                        Ok(Self::Int64(timespan_micros(span)?))
                    }
                    (Self::DateTime(at), ScalarType::Int64) => Ok(Self::Int64(at.timestamp_micros())),
                    (Self::Guid(guid), ScalarType::Binary) => {
                        Ok(Self::Binary(Bytes::copy_from_slice(guid.as_bytes())))
                    }
                    (Self::Binary(bytes), ScalarType::Guid) => Ok(Self::Guid(Guid::from_slice(bytes)?)),
                    _ => Err(failed(&self)),
                }
            }
        }
    }

    /// Parses text into content of type `to`.
    pub fn parse(to: ScalarType, text: &str) -> StrataResult<Self> {
        let failed = || StrataError::ConversionFailed {
            value: text.to_string(),
            target: to.name().into(),
        };
        let trimmed = text.trim();
        Ok(match to {
            ScalarType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => return Err(failed()),
            },
            ScalarType::Byte => Self::Byte(trimmed.parse().map_err(|_| failed())?),
            ScalarType::Int16 => Self::Int16(trimmed.parse().map_err(|_| failed())?),
            ScalarType::Int32 => Self::Int32(trimmed.parse().map_err(|_| failed())?),
            ScalarType::Int64 => Self::Int64(trimmed.parse().map_err(|_| failed())?),
            ScalarType::Decimal => Self::Decimal(trimmed.parse()?),
            ScalarType::TimeSpan => Self::TimeSpan(parse_timespan(trimmed)?),
            ScalarType::DateTime => Self::DateTime(
                DateTime::parse_from_rfc3339(trimmed)
                    .map_err(|_| failed())?
                    .with_timezone(&Utc),
            ),
            ScalarType::Guid => Self::Guid(trimmed.parse()?),
            ScalarType::String => Self::String(text.to_string()),
            ScalarType::Binary => Self::Binary(Bytes::copy_from_slice(text.as_bytes())),
            ScalarType::Error => Self::Error(ErrorRecord::new(
                strata_common::ErrorCode::Internal.as_u16(),
                Severity::User,
                text,
            )),
        })
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Byte(v) => Some(i128::from(*v)),
            Self::Int16(v) => Some(i128::from(*v)),
            Self::Int32(v) => Some(i128::from(*v)),
            Self::Int64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    fn from_i128(value: i128, to: ScalarType) -> Option<Self> {
        match to {
            ScalarType::Byte => u8::try_from(value).ok().map(Self::Byte),
            ScalarType::Int16 => i16::try_from(value).ok().map(Self::Int16),
            ScalarType::Int32 => i32::try_from(value).ok().map(Self::Int32),
            ScalarType::Int64 => i64::try_from(value).ok().map(Self::Int64),
            ScalarType::Decimal => i64::try_from(value).ok().map(|v| Self::Decimal(Decimal::from_i64(v))),
            ScalarType::TimeSpan => i64::try_from(value)
                .ok()
                .map(|v| Self::TimeSpan(TimeDelta::microseconds(v))),
            ScalarType::DateTime => i64::try_from(value)
                .ok()
                .and_then(datetime_from_micros)
                .map(Self::DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::TimeSpan(v) => f.write_str(&format_timespan(v)),
            Self::DateTime(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::Micros, true)),
            Self::Guid(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Binary(v) => f.write_str(&hex::encode(v)),
            Self::Error(v) => write!(f, "{v}"),
        }
    }
}

// =============================================================================
// Representations
// =============================================================================

/// A named way of reading or writing a scalar's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Content coerced to another scalar type.
    Typed(ScalarType),
    /// Binary content as base64 text.
    Base64,
    /// Human-readable rendering, read only.
    Display,
}

impl Representation {
    /// Representations exposed by a scalar of the given type.
    pub fn supported_by(data_type: ScalarType) -> Vec<Representation> {
        let mut representations: Vec<Representation> = ScalarType::ALL
            .iter()
            .copied()
            .filter(|to| NativeValue::convertible(data_type, *to))
            .map(Representation::Typed)
            .collect();
        if data_type == ScalarType::Binary {
            representations.push(Representation::Base64);
        }
        representations.push(Representation::Display);
        representations
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(t) => write!(f, "{t}"),
            Self::Base64 => f.write_str("Base64"),
            Self::Display => f.write_str("Display"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::ErrorCode;

    #[test]
    fn test_decimal_text() {
        let d: Decimal = "-12.340".parse().unwrap();
        assert_eq!(d.mantissa(), -12340);
        assert_eq!(d.scale(), 3);
        assert_eq!(d.to_string(), "-12.340");
        assert_eq!(Decimal::new(5, 3).unwrap().to_string(), "0.005");
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_numeric_equality() {
        let a: Decimal = "1.0".parse().unwrap();
        let b: Decimal = "1.00".parse().unwrap();
        let c: Decimal = "0.99".parse().unwrap();
        assert_eq!(a, b);
        assert!(c < a);
        assert_eq!(a.to_i64(), Some(1));
        assert_eq!(c.to_i64(), None);
    }

    #[test]
    fn test_guid_text() {
        let text = "00112233-4455-6677-8899-aabbccddeeff";
        let guid: Guid = text.parse().unwrap();
        assert_eq!(guid.to_string(), text);
        assert_eq!(guid.as_bytes()[15], 0xff);
        assert_eq!("{00112233445566778899aabbccddeeff}".parse::<Guid>().unwrap(), guid);
        assert!("0011".parse::<Guid>().is_err());
    }

    #[test]
    fn test_timespan_text() {
        let span = TimeDelta::microseconds(90_061_000_250);
        let text = format_timespan(&span);
        assert_eq!(text, "1.01:01:01.000250");
        assert_eq!(parse_timespan(&text).unwrap(), span);
        assert_eq!(parse_timespan("-00:00:01.5").unwrap(), TimeDelta::microseconds(-1_500_000));
        assert!(parse_timespan("00:61:00").is_err());
    }

    #[test]
    fn test_integer_coercion() {
        let wide = NativeValue::Int64(300);
        assert_eq!(wide.clone().coerce(ScalarType::Int16).unwrap(), NativeValue::Int16(300));
        let err = wide.coerce(ScalarType::Byte).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConversionFailed);

        let d = NativeValue::Int32(7).coerce(ScalarType::Decimal).unwrap();
        assert_eq!(d, NativeValue::Decimal(Decimal::from_i64(7)));
        assert_eq!(d.coerce(ScalarType::Byte).unwrap(), NativeValue::Byte(7));
    }

    #[test]
    fn test_string_coercion() {
        let v = NativeValue::parse(ScalarType::Int32, " 42 ").unwrap();
        assert_eq!(v, NativeValue::Int32(42));
        assert_eq!(
            v.coerce(ScalarType::String).unwrap(),
            NativeValue::String("42".into())
        );
        assert!(NativeValue::parse(ScalarType::Boolean, "TRUE").is_ok());
        assert_eq!(
            NativeValue::parse(ScalarType::Int32, "forty").unwrap_err().code(),
            ErrorCode::ConversionFailed
        );
    }

    #[test]
    fn test_datetime_micros() {
        let at = datetime_from_micros(1_700_000_000_123_456).unwrap();
        let micros = NativeValue::DateTime(at).coerce(ScalarType::Int64).unwrap();
        assert_eq!(micros, NativeValue::Int64(1_700_000_000_123_456));
        assert_eq!(micros.coerce(ScalarType::DateTime).unwrap(), NativeValue::DateTime(at));

        let text = NativeValue::DateTime(at).to_string();
        assert_eq!(NativeValue::parse(ScalarType::DateTime, &text).unwrap(), NativeValue::DateTime(at));
    }

    #[test]
    fn test_mismatch() {
        let err = NativeValue::Boolean(true).coerce(ScalarType::Int32).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RepresentationMismatch);
        assert!(!NativeValue::convertible(ScalarType::Guid, ScalarType::Decimal));
    }

    #[test]
    fn test_supported_representations() {
        let binary = Representation::supported_by(ScalarType::Binary);
        assert!(binary.contains(&Representation::Base64));
        assert!(binary.contains(&Representation::Typed(ScalarType::Guid)));
        let boolean = Representation::supported_by(ScalarType::Boolean);
        assert_eq!(
            boolean,
            vec![
                Representation::Typed(ScalarType::Boolean),
                Representation::Typed(ScalarType::String),
                Representation::Display
            ]
        );
    }
}
