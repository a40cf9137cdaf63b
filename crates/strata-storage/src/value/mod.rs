//! Values: scalars, rows, and their physical encoding.
//!
//! Both [`Scalar`] and [`Row`] implement [`Value`], the common protocol
//! indexes rely on to copy, dispose, and serialize what they store.

mod manager;
mod native;
mod physical;
mod row;
mod scalar;

use bytes::Bytes;
use strata_common::StrataResult;

pub use manager::{DefaultValueManager, MemoryStreamManager, StreamManager, ValueManager};
pub use native::{Decimal, ErrorRecord, Guid, NativeValue, Representation};
pub use row::Row;
pub use scalar::Scalar;

/// The protocol shared by scalars and rows.
pub trait Value {
    /// Returns true if no content lives in a stream.
    fn is_native(&self) -> bool;

    /// Returns true if the value holds no data.
    fn is_nil(&self) -> bool;

    /// Returns true if disposing this value releases its storage.
    fn values_owned(&self) -> bool;

    /// Encodes the value. Stream-backed content is encoded inline.
    fn as_physical(&self, streams: &dyn StreamManager) -> StrataResult<Bytes>;

    /// Replaces the content with a decoded image.
    fn set_physical(&mut self, streams: &dyn StreamManager, image: &[u8]) -> StrataResult<()>;

    /// Creates an owned copy, duplicating any streams.
    fn copy(&self, streams: &dyn StreamManager) -> StrataResult<Self>
    where
        Self: Sized;

    /// Releases owned storage. Further reads fail with `ValueDisposed`.
    fn dispose(&mut self, streams: &dyn StreamManager);
}
