//! Scalar values.
//!
//! A scalar is either nil, native (content held inline), or non-native
//! (content held in a stream). Typed representations read and write native
//! content; stream-backed content is read through [`Scalar::materialize`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use strata_common::{StrataError, StrataResult, StreamId};

use super::native::{Decimal, ErrorRecord, Guid, NativeValue, Representation};
use super::physical;
use super::{StreamManager, Value};
use crate::schema::ScalarType;

/// Where a scalar's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Storage {
    Nil,
    Native(NativeValue),
    Stream(StreamId),
}

/// A single typed value.
///
/// # Example
///
/// ```rust
/// use strata_storage::value::Scalar;
/// use strata_storage::schema::ScalarType;
///
/// let mut count = Scalar::from(41i64);
/// count.set_as_string("42").unwrap();
/// assert_eq!(count.as_int64().unwrap(), 42);
/// assert_eq!(count.data_type(), ScalarType::Int64);
/// ```
pub struct Scalar {
    data_type: ScalarType,
    storage: Storage,
    /// Whether this scalar is responsible for releasing its stream.
    owned: bool,
    disposed: bool,
    /// Rendered form, recomputed after every write.
    display: OnceLock<String>,
}

impl Scalar {
    fn with_storage(data_type: ScalarType, storage: Storage, owned: bool) -> Self {
        Self {
            data_type,
            storage,
            owned,
            disposed: false,
            display: OnceLock::new(),
        }
    }

    /// A nil value of the given type.
    pub fn nil(data_type: ScalarType) -> Self {
        Self::with_storage(data_type, Storage::Nil, true)
    }

    /// A native value in its own canonical type.
    pub fn new(value: NativeValue) -> Self {
        Self::with_storage(value.data_type(), Storage::Native(value), true)
    }

    /// A native value coerced to `data_type`.
    pub fn from_native(data_type: ScalarType, value: NativeValue) -> StrataResult<Self> {
        Ok(Self::new(value.coerce(data_type)?))
    }

    /// A non-native value whose content is written to a new stream.
    pub fn new_stream(
        streams: &dyn StreamManager,
        data_type: ScalarType,
        content: Bytes,
    ) -> StrataResult<Self> {
        if !data_type.supports_streams() {
            return Err(StrataError::invalid_argument(format!(
                "{data_type} values cannot be stored in a stream"
            )));
        }
        if data_type == ScalarType::String && std::str::from_utf8(&content).is_err() {
            return Err(StrataError::ConversionFailed {
                value: hex::encode(&content),
                target: data_type.name().into(),
            });
        }
        let id = streams.allocate(content);
        Ok(Self::with_storage(data_type, Storage::Stream(id), true))
    }

    /// Adopts an existing stream. The scalar releases it on dispose.
    pub fn from_stream(data_type: ScalarType, id: StreamId) -> Self {
        Self::with_storage(data_type, Storage::Stream(id), true)
    }

    /// A read-only view sharing `source`'s content.
    ///
    /// The view never releases storage; it must not outlive the source.
    pub fn borrow_from(source: &Scalar) -> Self {
        let mut view = Self::with_storage(source.data_type, source.storage.clone(), false);
        view.disposed = source.disposed;
        view
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The canonical type.
    #[inline]
    pub fn data_type(&self) -> ScalarType {
        self.data_type
    }

    /// Returns true if this scalar releases its storage on dispose.
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Returns true once the scalar has been disposed.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The backing stream of a non-native value.
    pub fn stream_id(&self) -> Option<StreamId> {
        match self.storage {
            Storage::Stream(id) => Some(id),
            _ => None,
        }
    }

    /// Representations this scalar's type exposes.
    pub fn supported_representations(&self) -> Vec<Representation> {
        Representation::supported_by(self.data_type)
    }

    fn check_live(&self) -> StrataResult<()> {
        if self.disposed {
            Err(StrataError::ValueDisposed)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Borrows native content.
    pub fn native(&self) -> StrataResult<&NativeValue> {
        self.check_live()?;
        match &self.storage {
            Storage::Native(value) => Ok(value),
            Storage::Nil => Err(StrataError::NilValue {
                data_type: self.data_type.name().into(),
            }),
            Storage::Stream(_) => Err(StrataError::RepresentationMismatch {
                requested: "native content".into(),
                data_type: format!("{} (stream)", self.data_type),
            }),
        }
    }

    /// Returns the content, reading it from the stream if non-native.
    ///
    /// Nil yields `None`.
    pub fn materialize(&self, streams: &dyn StreamManager) -> StrataResult<Option<NativeValue>> {
        self.check_live()?;
        match &self.storage {
            Storage::Nil => Ok(None),
            Storage::Native(value) => Ok(Some(value.clone())),
            Storage::Stream(id) => {
                let content = streams.read(*id)?;
                let value = match self.data_type {
                    ScalarType::String => NativeValue::String(
                        String::from_utf8(content.to_vec())
                            .map_err(|_| StrataError::invalid_physical("stream is not UTF-8"))?,
                    ),
                    _ => NativeValue::Binary(content),
                };
                Ok(Some(value))
            }
        }
    }

    /// Reads the content coerced to another type.
    pub fn get(&self, representation: ScalarType) -> StrataResult<NativeValue> {
        self.native()?.clone().coerce(representation)
    }

    /// Boolean representation.
    pub fn as_boolean(&self) -> StrataResult<bool> {
        match self.get(ScalarType::Boolean)? {
            NativeValue::Boolean(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Boolean)),
        }
    }

    /// Byte representation.
    pub fn as_byte(&self) -> StrataResult<u8> {
        match self.get(ScalarType::Byte)? {
            NativeValue::Byte(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Byte)),
        }
    }

    /// Int16 representation.
    pub fn as_int16(&self) -> StrataResult<i16> {
        match self.get(ScalarType::Int16)? {
            NativeValue::Int16(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Int16)),
        }
    }

    /// Int32 representation.
    pub fn as_int32(&self) -> StrataResult<i32> {
        match self.get(ScalarType::Int32)? {
            NativeValue::Int32(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Int32)),
        }
    }

    /// Int64 representation.
    pub fn as_int64(&self) -> StrataResult<i64> {
        match self.get(ScalarType::Int64)? {
            NativeValue::Int64(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Int64)),
        }
    }

    /// Decimal representation.
    pub fn as_decimal(&self) -> StrataResult<Decimal> {
        match self.get(ScalarType::Decimal)? {
            NativeValue::Decimal(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Decimal)),
        }
    }

    /// TimeSpan representation.
    pub fn as_timespan(&self) -> StrataResult<TimeDelta> {
        match self.get(ScalarType::TimeSpan)? {
            NativeValue::TimeSpan(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::TimeSpan)),
        }
    }

    /// DateTime representation.
    pub fn as_datetime(&self) -> StrataResult<DateTime<Utc>> {
        match self.get(ScalarType::DateTime)? {
            NativeValue::DateTime(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::DateTime)),
        }
    }

    /// Guid representation.
    pub fn as_guid(&self) -> StrataResult<Guid> {
        match self.get(ScalarType::Guid)? {
            NativeValue::Guid(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Guid)),
        }
    }

    /// String representation.
    pub fn as_string(&self) -> StrataResult<String> {
        match self.get(ScalarType::String)? {
            NativeValue::String(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::String)),
        }
    }

    /// Byte array representation.
    pub fn as_bytes(&self) -> StrataResult<Bytes> {
        match self.get(ScalarType::Binary)? {
            NativeValue::Binary(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Binary)),
        }
    }

    /// Base64 representation of binary content.
    pub fn as_base64(&self) -> StrataResult<String> {
        self.require_base64()?;
        Ok(BASE64.encode(self.as_bytes()?))
    }

    /// Error representation.
    pub fn as_error(&self) -> StrataResult<ErrorRecord> {
        match self.get(ScalarType::Error)? {
            NativeValue::Error(v) => Ok(v),
            other => Err(unexpected(other, ScalarType::Error)),
        }
    }

    /// Human-readable rendering. Computed once per write.
    pub fn as_display_string(&self) -> StrataResult<String> {
        self.check_live()?;
        Ok(self
            .display
            .get_or_init(|| match &self.storage {
                Storage::Nil => "nil".to_string(),
                Storage::Native(value) => value.to_string(),
                Storage::Stream(id) => format!("<stream {id}>"),
            })
            .clone())
    }

    /// Compares by content. Nil orders before every other value.
    pub fn compare(&self, other: &Scalar, streams: &dyn StreamManager) -> StrataResult<Ordering> {
        self.check_live()?;
        other.check_live()?;
        if let (Storage::Native(a), Storage::Native(b)) = (&self.storage, &other.storage) {
            return Ok(a.compare(b));
        }
        Ok(match (self.materialize(streams)?, other.materialize(streams)?) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.compare(&b),
        })
    }

    // =========================================================================
    // Writing
    // =========================================================================

    fn check_owned(&self) -> StrataResult<()> {
        self.check_live()?;
        if self.owned {
            Ok(())
        } else {
            Err(StrataError::invalid_argument(
                "cannot write through a borrowed value",
            ))
        }
    }

    fn check_writable(&self) -> StrataResult<()> {
        self.check_owned()?;
        if let Storage::Stream(id) = self.storage {
            return Err(StrataError::invalid_argument(format!(
                "value is backed by stream {id}; use replace or write_stream"
            )));
        }
        Ok(())
    }

    fn store(&mut self, storage: Storage) {
        self.storage = storage;
        self.display = OnceLock::new();
    }

    /// Writes content, coercing it to the canonical type.
    pub fn set_native(&mut self, value: NativeValue) -> StrataResult<()> {
        self.check_writable()?;
        let value = value.coerce(self.data_type)?;
        self.store(Storage::Native(value));
        Ok(())
    }

    /// Makes the value nil.
    pub fn set_nil(&mut self) -> StrataResult<()> {
        self.check_writable()?;
        self.store(Storage::Nil);
        Ok(())
    }

    /// Writes content, releasing a stream this scalar owns first.
    pub fn replace(&mut self, streams: &dyn StreamManager, value: NativeValue) -> StrataResult<()> {
        self.check_owned()?;
        let value = value.coerce(self.data_type)?;
        self.release_stream(streams)?;
        self.store(Storage::Native(value));
        Ok(())
    }

    /// Overwrites the content of an owned stream.
    pub fn write_stream(&mut self, streams: &dyn StreamManager, content: Bytes) -> StrataResult<()> {
        self.check_live()?;
        match self.storage {
            Storage::Stream(id) if self.owned => {
                streams.write(id, content)?;
                self.display = OnceLock::new();
                Ok(())
            }
            _ => Err(StrataError::invalid_argument(
                "write_stream requires an owned stream-backed value",
            )),
        }
    }

    /// Writes the Boolean representation.
    pub fn set_as_boolean(&mut self, value: bool) -> StrataResult<()> {
        self.set_native(NativeValue::Boolean(value))
    }

    /// Writes the Byte representation.
    pub fn set_as_byte(&mut self, value: u8) -> StrataResult<()> {
        self.set_native(NativeValue::Byte(value))
    }

    /// Writes the Int16 representation.
    pub fn set_as_int16(&mut self, value: i16) -> StrataResult<()> {
        self.set_native(NativeValue::Int16(value))
    }

    /// Writes the Int32 representation.
    pub fn set_as_int32(&mut self, value: i32) -> StrataResult<()> {
        self.set_native(NativeValue::Int32(value))
    }

    /// Writes the Int64 representation.
    pub fn set_as_int64(&mut self, value: i64) -> StrataResult<()> {
        self.set_native(NativeValue::Int64(value))
    }

    /// Writes the Decimal representation.
    pub fn set_as_decimal(&mut self, value: Decimal) -> StrataResult<()> {
        self.set_native(NativeValue::Decimal(value))
    }

    /// Writes the TimeSpan representation.
    pub fn set_as_timespan(&mut self, value: TimeDelta) -> StrataResult<()> {
        self.set_native(NativeValue::TimeSpan(value))
    }

    /// Writes the DateTime representation.
    pub fn set_as_datetime(&mut self, value: DateTime<Utc>) -> StrataResult<()> {
        self.set_native(NativeValue::DateTime(value))
    }

    /// Writes the Guid representation.
    pub fn set_as_guid(&mut self, value: Guid) -> StrataResult<()> {
        self.set_native(NativeValue::Guid(value))
    }

    /// Writes the String representation, parsing it for non-string types.
    pub fn set_as_string(&mut self, value: &str) -> StrataResult<()> {
        self.set_native(NativeValue::String(value.to_string()))
    }

    /// Writes the byte array representation.
    pub fn set_as_bytes(&mut self, value: Bytes) -> StrataResult<()> {
        self.set_native(NativeValue::Binary(value))
    }

    /// Writes binary content from base64 text.
    pub fn set_as_base64(&mut self, value: &str) -> StrataResult<()> {
        self.require_base64()?;
        let decoded = BASE64
            .decode(value.trim())
            .map_err(|_| StrataError::ConversionFailed {
                value: value.to_string(),
                target: "Base64".into(),
            })?;
        self.set_native(NativeValue::Binary(Bytes::from(decoded)))
    }

    /// Writes the Error representation.
    pub fn set_as_error(&mut self, value: ErrorRecord) -> StrataResult<()> {
        self.set_native(NativeValue::Error(value))
    }

    fn require_base64(&self) -> StrataResult<()> {
        if self.data_type == ScalarType::Binary {
            Ok(())
        } else {
            Err(StrataError::RepresentationMismatch {
                requested: Representation::Base64.to_string(),
                data_type: self.data_type.name().into(),
            })
        }
    }

    fn release_stream(&mut self, streams: &dyn StreamManager) -> StrataResult<()> {
        if let Storage::Stream(id) = self.storage {
            if self.owned {
                streams.deallocate(id)?;
            }
            self.store(Storage::Nil);
        }
        Ok(())
    }
}

fn unexpected(value: NativeValue, target: ScalarType) -> StrataError {
    StrataError::internal(format!(
        "coercion to {target} produced a {} value",
        value.data_type()
    ))
}

impl Value for Scalar {
    fn is_native(&self) -> bool {
        !matches!(self.storage, Storage::Stream(_))
    }

    fn is_nil(&self) -> bool {
        matches!(self.storage, Storage::Nil)
    }

    fn values_owned(&self) -> bool {
        self.owned
    }

    fn as_physical(&self, streams: &dyn StreamManager) -> StrataResult<Bytes> {
        physical::encode_scalar(self.data_type, self.materialize(streams)?.as_ref())
    }

    fn set_physical(&mut self, streams: &dyn StreamManager, image: &[u8]) -> StrataResult<()> {
        self.check_owned()?;
        let (data_type, value) = physical::decode_scalar(image)?;
        if data_type != self.data_type {
            return Err(StrataError::invalid_physical(format!(
                "image holds a {data_type} value, expected {}",
                self.data_type
            )));
        }
        self.release_stream(streams)?;
        self.store(value.map_or(Storage::Nil, Storage::Native));
        Ok(())
    }

    fn copy(&self, streams: &dyn StreamManager) -> StrataResult<Self> {
        self.check_live()?;
        let storage = match &self.storage {
            Storage::Stream(id) => Storage::Stream(streams.clone_stream(*id)?),
            other => other.clone(),
        };
        Ok(Self::with_storage(self.data_type, storage, true))
    }

    fn dispose(&mut self, streams: &dyn StreamManager) {
        if self.disposed {
            return;
        }
        if let Err(e) = self.release_stream(streams) {
            tracing::warn!(error = %e, "failed to release stream of disposed value");
        }
        self.store(Storage::Nil);
        self.disposed = true;
    }
}

impl PartialEq for Scalar {
    /// Storage equality: native content, or the same stream.
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type && self.storage == other.storage
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Scalar");
        s.field("data_type", &self.data_type);
        match &self.storage {
            Storage::Nil => s.field("nil", &true),
            Storage::Native(value) => s.field("value", value),
            Storage::Stream(id) => s.field("stream", id),
        };
        if !self.owned {
            s.field("borrowed", &true);
        }
        if self.disposed {
            s.field("disposed", &true);
        }
        s.finish()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_display_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<disposed>"),
        }
    }
}

macro_rules! impl_from_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Self::new(NativeValue::$variant(value.into()))
                }
            }
        )*
    };
}

impl_from_native! {
    bool => Boolean,
    u8 => Byte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    Decimal => Decimal,
    TimeDelta => TimeSpan,
    DateTime<Utc> => DateTime,
    Guid => Guid,
    String => String,
    &str => String,
    Bytes => Binary,
    ErrorRecord => Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MemoryStreamManager;
    use strata_common::ErrorCode;

    #[test]
    fn test_typed_representations() {
        let mut v = Scalar::nil(ScalarType::Int32);
        assert!(v.is_nil());
        assert_eq!(v.as_int32().unwrap_err().code(), ErrorCode::NilValue);

        v.set_as_int64(12).unwrap();
        assert_eq!(v.as_int32().unwrap(), 12);
        assert_eq!(v.as_byte().unwrap(), 12);
        assert_eq!(v.as_string().unwrap(), "12");
        assert_eq!(v.as_decimal().unwrap(), Decimal::from_i64(12));

        let err = v.set_as_int64(i64::MAX).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConversionFailed);
        assert_eq!(v.as_int32().unwrap(), 12);

        let err = v.as_guid().unwrap_err();
        assert_eq!(err.code(), ErrorCode::RepresentationMismatch);
    }

    #[test]
    fn test_display_cache_invalidated_on_write() {
        let mut v = Scalar::from("alpha");
        assert_eq!(v.as_display_string().unwrap(), "alpha");
        v.set_as_string("beta").unwrap();
        assert_eq!(v.as_display_string().unwrap(), "beta");
        assert_eq!(v.to_string(), "beta");
    }

    #[test]
    fn test_base64() {
        let mut v = Scalar::nil(ScalarType::Binary);
        v.set_as_base64("aGVsbG8=").unwrap();
        assert_eq!(v.as_bytes().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(v.as_base64().unwrap(), "aGVsbG8=");
        assert_eq!(v.as_string().unwrap(), "hello");

        let text = Scalar::from("x");
        assert_eq!(
            text.as_base64().unwrap_err().code(),
            ErrorCode::RepresentationMismatch
        );
        assert!(v.set_as_base64("***").is_err());
    }

    #[test]
    fn test_stream_backed_value() {
        let streams = MemoryStreamManager::new();
        let mut v =
            Scalar::new_stream(&streams, ScalarType::String, Bytes::from_static(b"long text"))
                .unwrap();
        assert!(!v.is_native());
        assert!(v.stream_id().is_some());
        assert!(v.native().is_err());
        assert_eq!(
            v.materialize(&streams).unwrap(),
            Some(NativeValue::String("long text".into()))
        );
        assert!(v.set_as_string("short").is_err());

        v.replace(&streams, NativeValue::String("short".into())).unwrap();
        assert!(v.is_native());
        assert_eq!(streams.stream_count(), 0);

        assert!(Scalar::new_stream(&streams, ScalarType::Int32, Bytes::new()).is_err());
    }

    #[test]
    fn test_copy_and_dispose_release_streams() {
        let streams = MemoryStreamManager::new();
        let original =
            Scalar::new_stream(&streams, ScalarType::Binary, Bytes::from_static(b"\x01\x02"))
                .unwrap();
        let mut copy = original.copy(&streams).unwrap();
        assert_ne!(copy.stream_id(), original.stream_id());
        assert_eq!(streams.stream_count(), 2);
        assert_eq!(
            copy.compare(&original, &streams).unwrap(),
            Ordering::Equal
        );

        copy.dispose(&streams);
        assert!(copy.is_disposed());
        assert_eq!(streams.stream_count(), 1);
        assert_eq!(copy.as_bytes().unwrap_err().code(), ErrorCode::ValueDisposed);
    }

    #[test]
    fn test_borrowed_view_does_not_release() {
        let streams = MemoryStreamManager::new();
        let mut owner =
            Scalar::new_stream(&streams, ScalarType::String, Bytes::from_static(b"shared"))
                .unwrap();
        let mut view = Scalar::borrow_from(&owner);
        assert!(!view.is_owned());
        assert_eq!(view, owner);
        assert!(view.replace(&streams, NativeValue::String("x".into())).is_err());
        view.dispose(&streams);
        assert_eq!(streams.stream_count(), 1);

        let mut native_view = Scalar::borrow_from(&Scalar::from(5i32));
        assert!(native_view.set_as_int32(6).is_err());

        owner.dispose(&streams);
        assert_eq!(streams.stream_count(), 0);
    }

    #[test]
    fn test_compare_orders_nil_first() {
        let streams = MemoryStreamManager::new();
        let nil = Scalar::nil(ScalarType::Int32);
        let one = Scalar::from(1i32);
        let two = Scalar::from(2i32);
        assert_eq!(nil.compare(&one, &streams).unwrap(), Ordering::Less);
        assert_eq!(two.compare(&one, &streams).unwrap(), Ordering::Greater);
        assert_eq!(nil.compare(&Scalar::nil(ScalarType::Int32), &streams).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_physical_roundtrip_of_stream_value() {
        let streams = MemoryStreamManager::new();
        let streamed =
            Scalar::new_stream(&streams, ScalarType::String, Bytes::from_static(b"abc")).unwrap();
        let native = Scalar::from("abc");
        assert_eq!(
            streamed.as_physical(&streams).unwrap(),
            native.as_physical(&streams).unwrap()
        );

        let mut target = Scalar::nil(ScalarType::String);
        target
            .set_physical(&streams, &streamed.as_physical(&streams).unwrap())
            .unwrap();
        assert_eq!(target, native);

        let mut wrong = Scalar::nil(ScalarType::Int32);
        assert_eq!(
            wrong
                .set_physical(&streams, &native.as_physical(&streams).unwrap())
                .unwrap_err()
                .code(),
            ErrorCode::InvalidPhysical
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_time_values_survive_physical_roundtrip(
            secs in -100_000_000_000i64..100_000_000_000i64,
            nanos in 0u32..1_000_000_000u32,
        ) {
            let streams = MemoryStreamManager::new();

            let span = Scalar::from(TimeDelta::new(secs, nanos).unwrap());
            let mut target = Scalar::nil(ScalarType::TimeSpan);
            target.set_physical(&streams, &span.as_physical(&streams).unwrap()).unwrap();
            proptest::prop_assert_eq!(&target, &span);

            let at = Scalar::from(DateTime::from_timestamp(secs, nanos).unwrap());
            let mut target = Scalar::nil(ScalarType::DateTime);
            target.set_physical(&streams, &at.as_physical(&streams).unwrap()).unwrap();
            proptest::prop_assert_eq!(&target, &at);
        }
    }
}
