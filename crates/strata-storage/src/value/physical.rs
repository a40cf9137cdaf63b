//! Physical encoding of scalars and rows.
//!
//! Scalar layout:
//! - marker: u8 (`PHYSICAL_SCALAR_MARKER`)
//! - type tag: u8
//! - present: u8 (0 = nil, 1 = content follows)
//! - content, little-endian, type dependent
//!
//! `TimeSpan` content is whole seconds (i64) then signed subsecond nanoseconds
//! (i32, same sign as the seconds). `DateTime` content is seconds since the
//! Unix epoch (i64) then subsecond nanoseconds (u32).
//!
//! Row layout:
//! - marker: u8 (`PHYSICAL_ROW_MARKER`)
//! - width: u32
//! - presence bitmap: ceil(width / 8) bytes, bit i set when column i has a value
//! - for each present column: length u32, then the scalar image
//!
//! Stream-backed content is encoded exactly like native content, so an image
//! never refers to a stream.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, TimeDelta};
use strata_common::constants::{PHYSICAL_ROW_MARKER, PHYSICAL_SCALAR_MARKER};
use strata_common::{StrataError, StrataResult};

use super::native::{Decimal, ErrorRecord, Guid, NativeValue};
use crate::schema::ScalarType;

fn need(buf: &impl Buf, len: usize, what: &str) -> StrataResult<()> {
    if buf.remaining() < len {
        return Err(StrataError::invalid_physical(format!(
            "truncated {what}: need {len} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}

fn length(len: usize) -> StrataResult<u32> {
    u32::try_from(len).map_err(|_| StrataError::invalid_physical(format!("length {len} exceeds u32")))
}

// =============================================================================
// Scalars
// =============================================================================

/// Encodes a scalar image.
pub(crate) fn encode_scalar(data_type: ScalarType, value: Option<&NativeValue>) -> StrataResult<Bytes> {
    let mut buf = BytesMut::with_capacity(16);
    buf.put_u8(PHYSICAL_SCALAR_MARKER);
    buf.put_u8(data_type.tag());
    match value {
        None => buf.put_u8(0),
        Some(value) => {
            if value.data_type() != data_type {
                return Err(StrataError::internal(format!(
                    "{} content in a {data_type} value",
                    value.data_type()
                )));
            }
            buf.put_u8(1);
            encode_content(value, &mut buf)?;
        }
    }
    Ok(buf.freeze())
}

fn encode_content(value: &NativeValue, buf: &mut BytesMut) -> StrataResult<()> {
    match value {
        NativeValue::Boolean(v) => buf.put_u8(u8::from(*v)),
        NativeValue::Byte(v) => buf.put_u8(*v),
        NativeValue::Int16(v) => buf.put_i16_le(*v),
        NativeValue::Int32(v) => buf.put_i32_le(*v),
        NativeValue::Int64(v) => buf.put_i64_le(*v),
        NativeValue::Decimal(v) => {
            buf.put_i128_le(v.mantissa());
            buf.put_u8(v.scale());
        }
        NativeValue::TimeSpan(v) => {
            buf.put_i64_le(v.num_seconds());
            buf.put_i32_le(v.subsec_nanos());
        }
        NativeValue::DateTime(v) => {
            buf.put_i64_le(v.timestamp());
            buf.put_u32_le(v.timestamp_subsec_nanos());
        }
        NativeValue::Guid(v) => buf.put_slice(v.as_bytes()),
        NativeValue::String(v) => {
            buf.put_u32_le(length(v.len())?);
            buf.put_slice(v.as_bytes());
        }
        NativeValue::Binary(v) => {
            buf.put_u32_le(length(v.len())?);
            buf.put_slice(v);
        }
        NativeValue::Error(v) => {
            buf.put_u16_le(v.code);
            buf.put_u8(v.severity);
            buf.put_u32_le(length(v.message.len())?);
            buf.put_slice(v.message.as_bytes());
        }
    }
    Ok(())
}

/// Decodes a scalar image into its type and content.
pub(crate) fn decode_scalar(image: &[u8]) -> StrataResult<(ScalarType, Option<NativeValue>)> {
    let mut buf = image;
    need(&buf, 3, "scalar header")?;
    let marker = buf.get_u8();
    if marker != PHYSICAL_SCALAR_MARKER {
        return Err(StrataError::invalid_physical(format!(
            "expected scalar marker 0x{PHYSICAL_SCALAR_MARKER:02X}, got 0x{marker:02X}"
        )));
    }
    let tag = buf.get_u8();
    let data_type = ScalarType::from_tag(tag)
        .ok_or_else(|| StrataError::invalid_physical(format!("unknown type tag {tag}")))?;
    let value = match buf.get_u8() {
        0 => None,
        1 => Some(decode_content(data_type, &mut buf)?),
        other => {
            return Err(StrataError::invalid_physical(format!(
                "invalid presence byte {other}"
            )))
        }
    };
    if buf.has_remaining() {
        return Err(StrataError::invalid_physical(format!(
            "{} trailing bytes after scalar",
            buf.remaining()
        )));
    }
    Ok((data_type, value))
}

fn decode_text(buf: &mut &[u8], what: &str) -> StrataResult<String> {
    need(&*buf, 4, what)?;
    let len = buf.get_u32_le() as usize;
    need(&*buf, len, what)?;
    let text = std::str::from_utf8(&buf[..len])
        .map_err(|_| StrataError::invalid_physical(format!("{what} is not UTF-8")))?
        .to_string();
    buf.advance(len);
    Ok(text)
}

fn decode_content(data_type: ScalarType, buf: &mut &[u8]) -> StrataResult<NativeValue> {
    let what = data_type.name();
    Ok(match data_type {
        ScalarType::Boolean => {
            need(&*buf, 1, what)?;
            match buf.get_u8() {
                0 => NativeValue::Boolean(false),
                1 => NativeValue::Boolean(true),
                other => {
                    return Err(StrataError::invalid_physical(format!(
                        "invalid boolean byte {other}"
                    )))
                }
            }
        }
        ScalarType::Byte => {
            need(&*buf, 1, what)?;
            NativeValue::Byte(buf.get_u8())
        }
        ScalarType::Int16 => {
            need(&*buf, 2, what)?;
            NativeValue::Int16(buf.get_i16_le())
        }
        ScalarType::Int32 => {
            need(&*buf, 4, what)?;
            NativeValue::Int32(buf.get_i32_le())
        }
        ScalarType::Int64 => {
            need(&*buf, 8, what)?;
            NativeValue::Int64(buf.get_i64_le())
        }
        ScalarType::Decimal => {
            need(&*buf, 17, what)?;
            let mantissa = buf.get_i128_le();
            let scale = buf.get_u8();
            NativeValue::Decimal(
                Decimal::new(mantissa, scale)
                    .map_err(|_| StrataError::invalid_physical(format!("decimal scale {scale}")))?,
            )
        }
        ScalarType::TimeSpan => {
            need(&*buf, 12, what)?;
            let secs = buf.get_i64_le();
            let nanos = buf.get_i32_le();
            NativeValue::TimeSpan(timespan_from_parts(secs, nanos).ok_or_else(|| {
                StrataError::invalid_physical(format!("time span {secs}s {nanos}ns out of range"))
            })?)
        }
        ScalarType::DateTime => {
            need(&*buf, 12, what)?;
            let secs = buf.get_i64_le();
            let nanos = buf.get_u32_le();
            NativeValue::DateTime(DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
                StrataError::invalid_physical(format!("timestamp {secs}s {nanos}ns out of range"))
            })?)
        }
        ScalarType::Guid => {
            need(&*buf, 16, what)?;
            let guid = Guid::from_slice(&buf[..16])?;
            buf.advance(16);
            NativeValue::Guid(guid)
        }
        ScalarType::String => NativeValue::String(decode_text(buf, what)?),
        ScalarType::Binary => {
            need(&*buf, 4, what)?;
            let len = buf.get_u32_le() as usize;
            need(&*buf, len, what)?;
            let bytes = Bytes::copy_from_slice(&buf[..len]);
            buf.advance(len);
            NativeValue::Binary(bytes)
        }
        ScalarType::Error => {
            need(&*buf, 3, what)?;
            let code = buf.get_u16_le();
            let severity = buf.get_u8();
            let message = decode_text(buf, what)?;
            NativeValue::Error(ErrorRecord {
                code,
                severity,
                message,
            })
        }
    })
}

fn timespan_from_parts(secs: i64, nanos: i32) -> Option<TimeDelta> {
    const NANOS_PER_SECOND: i128 = 1_000_000_000;
    if nanos.unsigned_abs() >= 1_000_000_000 {
        return None;
    }
    let total = i128::from(secs) * NANOS_PER_SECOND + i128::from(nanos);
    let whole = i64::try_from(total.div_euclid(NANOS_PER_SECOND)).ok()?;
    let fraction = u32::try_from(total.rem_euclid(NANOS_PER_SECOND)).ok()?;
    TimeDelta::new(whole, fraction)
}

// =============================================================================
// Rows
// =============================================================================

/// Encodes a row image from per-column scalar images.
pub(crate) fn encode_row(columns: &[Option<Bytes>]) -> StrataResult<Bytes> {
    let width = columns.len();
    let mut buf = BytesMut::with_capacity(5 + width.div_ceil(8) + width * 8);
    buf.put_u8(PHYSICAL_ROW_MARKER);
    buf.put_u32_le(length(width)?);

    let mut bitmap = vec![0u8; width.div_ceil(8)];
    for (i, column) in columns.iter().enumerate() {
        if column.is_some() {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    buf.put_slice(&bitmap);

    for image in columns.iter().flatten() {
        buf.put_u32_le(length(image.len())?);
        buf.put_slice(image);
    }
    Ok(buf.freeze())
}

/// Splits a row image into per-column scalar images.
pub(crate) fn decode_row(image: &[u8], expected_width: usize) -> StrataResult<Vec<Option<&[u8]>>> {
    let mut buf = image;
    need(&buf, 5, "row header")?;
    let marker = buf.get_u8();
    if marker != PHYSICAL_ROW_MARKER {
        return Err(StrataError::invalid_physical(format!(
            "expected row marker 0x{PHYSICAL_ROW_MARKER:02X}, got 0x{marker:02X}"
        )));
    }
    let width = buf.get_u32_le() as usize;
    if width != expected_width {
        return Err(StrataError::IncompatibleRowTypes {
            expected: expected_width,
            actual: width,
        });
    }
    let bitmap_len = width.div_ceil(8);
    need(&buf, bitmap_len, "presence bitmap")?;
    let bitmap = &buf[..bitmap_len];
    let present: Vec<bool> = (0..width).map(|i| bitmap[i / 8] & (1 << (i % 8)) != 0).collect();
    buf.advance(bitmap_len);

    let mut columns = Vec::with_capacity(width);
    for present in present {
        if !present {
            columns.push(None);
            continue;
        }
        need(&buf, 4, "column length")?;
        let len = buf.get_u32_le() as usize;
        need(&buf, len, "column image")?;
        let (column, rest) = buf.split_at(len);
        columns.push(Some(column));
        buf = rest;
    }
    if buf.has_remaining() {
        return Err(StrataError::invalid_physical(format!(
            "{} trailing bytes after row",
            buf.remaining()
        )));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_common::ErrorCode;

    use crate::value::native::datetime_from_micros;

    #[test]
    fn test_scalar_layout() {
        let image = encode_scalar(ScalarType::Int32, Some(&NativeValue::Int32(1))).unwrap();
        assert_eq!(image.as_ref(), &[PHYSICAL_SCALAR_MARKER, 4, 1, 1, 0, 0, 0]);

        let nil = encode_scalar(ScalarType::Int32, None).unwrap();
        assert_eq!(decode_scalar(&nil).unwrap(), (ScalarType::Int32, None));
    }

    #[test]
    fn test_every_type_decodes() {
        let values = vec![
            NativeValue::Boolean(true),
            NativeValue::Byte(9),
            NativeValue::Int16(-3),
            NativeValue::Int64(1 << 40),
            NativeValue::Decimal("-3.25".parse().unwrap()),
            NativeValue::TimeSpan(TimeDelta::microseconds(-77)),
            NativeValue::DateTime(datetime_from_micros(1_600_000_000_000_001).unwrap()),
            NativeValue::Guid(Guid::from_bytes([7; 16])),
            NativeValue::String("héllo".into()),
            NativeValue::Binary(Bytes::from_static(&[0, 255])),
            NativeValue::Error(ErrorRecord::new(0x0401, strata_common::Severity::User, "x")),
        ];
        for value in values {
            let image = encode_scalar(value.data_type(), Some(&value)).unwrap();
            let (data_type, decoded) = decode_scalar(&image).unwrap();
            assert_eq!(data_type, value.data_type());
            assert_eq!(decoded, Some(value));
        }
    }

    #[test]
    fn test_time_keeps_nanoseconds() {
        let span = TimeDelta::new(-5, 123_456_789).unwrap();
        let image = encode_scalar(ScalarType::TimeSpan, Some(&NativeValue::TimeSpan(span))).unwrap();
        assert_eq!(image.len(), 3 + 12);
        assert_eq!(decode_scalar(&image).unwrap().1, Some(NativeValue::TimeSpan(span)));

        let at = DateTime::from_timestamp(1_700_000_000, 999_999_999).unwrap();
        let image = encode_scalar(ScalarType::DateTime, Some(&NativeValue::DateTime(at))).unwrap();
        assert_eq!(decode_scalar(&image).unwrap().1, Some(NativeValue::DateTime(at)));
    }

    #[test]
    fn test_time_span_rejects_bad_fraction() {
        let mut image = BytesMut::new();
        image.put_u8(PHYSICAL_SCALAR_MARKER);
        image.put_u8(ScalarType::TimeSpan.tag());
        image.put_u8(1);
        image.put_i64_le(1);
        image.put_i32_le(1_000_000_000);
        assert_eq!(
            decode_scalar(&image).unwrap_err().code(),
            ErrorCode::InvalidPhysical
        );
    }

    proptest! {
        #[test]
        fn prop_time_round_trips_exactly(
            secs in -1_000_000_000_000i64..1_000_000_000_000i64,
            nanos in 0u32..1_000_000_000u32,
        ) {
            let span = TimeDelta::new(secs, nanos).unwrap();
            let image = encode_scalar(ScalarType::TimeSpan, Some(&NativeValue::TimeSpan(span))).unwrap();
            prop_assert_eq!(decode_scalar(&image).unwrap().1, Some(NativeValue::TimeSpan(span)));

            let at = DateTime::from_timestamp(secs % 200_000_000_000, nanos).unwrap();
            let image = encode_scalar(ScalarType::DateTime, Some(&NativeValue::DateTime(at))).unwrap();
            prop_assert_eq!(decode_scalar(&image).unwrap().1, Some(NativeValue::DateTime(at)));
        }
    }

    #[test]
    fn test_corrupt_scalar_images() {
        let image = encode_scalar(ScalarType::Int64, Some(&NativeValue::Int64(5))).unwrap();
        assert_eq!(
            decode_scalar(&image[..image.len() - 1]).unwrap_err().code(),
            ErrorCode::InvalidPhysical
        );
        assert!(decode_scalar(&[0x00, 4, 0]).is_err());
        assert!(decode_scalar(&[PHYSICAL_SCALAR_MARKER, 99, 0]).is_err());
        assert!(decode_scalar(&[PHYSICAL_SCALAR_MARKER, 4, 0, 1]).is_err());
    }

    #[test]
    fn test_row_layout() {
        let a = encode_scalar(ScalarType::Byte, Some(&NativeValue::Byte(1))).unwrap();
        let image = encode_row(&[Some(a.clone()), None, Some(a.clone())]).unwrap();
        let columns = decode_row(&image, 3).unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0], Some(a.as_ref()));
        assert_eq!(columns[1], None);
        assert_eq!(columns[2], Some(a.as_ref()));

        assert_eq!(
            decode_row(&image, 2).unwrap_err().code(),
            ErrorCode::IncompatibleRowTypes
        );
    }
}
