//! Stream and value managers.
//!
//! Non-native values keep their content in a stream owned by a
//! [`StreamManager`]. The [`ValueManager`] is threaded through every index
//! and table operation; indexes use it to take their own copies of rows on
//! insert and to release them on delete.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use strata_common::{StrataError, StrataResult, StreamId};

use super::{Row, Scalar, Value};

/// Storage for values that do not live inline.
pub trait StreamManager: Send + Sync + fmt::Debug {
    /// Creates a stream holding `data`.
    fn allocate(&self, data: Bytes) -> StreamId;

    /// Reads a stream's content.
    fn read(&self, id: StreamId) -> StrataResult<Bytes>;

    /// Replaces a stream's content.
    fn write(&self, id: StreamId, data: Bytes) -> StrataResult<()>;

    /// Creates a new stream with the same content as `id`.
    fn clone_stream(&self, id: StreamId) -> StrataResult<StreamId>;

    /// Releases a stream.
    fn deallocate(&self, id: StreamId) -> StrataResult<()>;

    /// Number of live streams.
    fn stream_count(&self) -> usize;
}

/// An in-memory stream manager.
#[derive(Debug)]
pub struct MemoryStreamManager {
    /// Next stream ID to allocate.
    next_id: AtomicU64,
    /// Stream content by ID.
    streams: RwLock<HashMap<StreamId, Bytes>>,
}

impl MemoryStreamManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(StreamId::FIRST.as_u64()),
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Total bytes held across all streams.
    pub fn total_bytes(&self) -> usize {
        self.streams.read().values().map(Bytes::len).sum()
    }
}

impl Default for MemoryStreamManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamManager for MemoryStreamManager {
    fn allocate(&self, data: Bytes) -> StreamId {
        let id = StreamId::new(self.next_id.fetch_add(1, AtomicOrdering::SeqCst));
        tracing::trace!(stream = %id, len = data.len(), "allocated stream");
        self.streams.write().insert(id, data);
        id
    }

    fn read(&self, id: StreamId) -> StrataResult<Bytes> {
        self.streams
            .read()
            .get(&id)
            .cloned()
            .ok_or(StrataError::StreamNotFound { stream_id: id })
    }

    fn write(&self, id: StreamId, data: Bytes) -> StrataResult<()> {
        match self.streams.write().get_mut(&id) {
            Some(content) => {
                *content = data;
                Ok(())
            }
            None => Err(StrataError::StreamNotFound { stream_id: id }),
        }
    }

    fn clone_stream(&self, id: StreamId) -> StrataResult<StreamId> {
        let data = self.read(id)?;
        Ok(self.allocate(data))
    }

    fn deallocate(&self, id: StreamId) -> StrataResult<()> {
        match self.streams.write().remove(&id) {
            Some(_) => {
                tracing::trace!(stream = %id, "deallocated stream");
                Ok(())
            }
            None => Err(StrataError::StreamNotFound { stream_id: id }),
        }
    }

    fn stream_count(&self) -> usize {
        self.streams.read().len()
    }
}

/// Copies, disposes, and compares values on behalf of indexes and tables.
pub trait ValueManager: Send + Sync + fmt::Debug {
    /// The stream subsystem behind non-native values.
    fn streams(&self) -> &dyn StreamManager;

    /// Takes an owned copy of a row.
    fn copy_row(&self, row: &Row) -> StrataResult<Row> {
        row.copy(self.streams())
    }

    /// Releases a row and any streams it owns.
    fn dispose_row(&self, row: &mut Row) {
        row.dispose(self.streams());
    }

    /// Compares two scalars by content.
    fn compare_scalars(&self, a: &Scalar, b: &Scalar) -> StrataResult<Ordering> {
        a.compare(b, self.streams())
    }
}

/// Value manager over a shared stream manager.
#[derive(Debug, Clone)]
pub struct DefaultValueManager {
    streams: Arc<dyn StreamManager>,
}

impl DefaultValueManager {
    /// Creates a manager with its own in-memory stream storage.
    pub fn new() -> Self {
        Self::with_streams(Arc::new(MemoryStreamManager::new()))
    }

    /// Creates a manager over existing stream storage.
    pub fn with_streams(streams: Arc<dyn StreamManager>) -> Self {
        Self { streams }
    }
}

impl Default for DefaultValueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueManager for DefaultValueManager {
    fn streams(&self) -> &dyn StreamManager {
        self.streams.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::ErrorCode;

    #[test]
    fn test_stream_lifecycle() {
        let streams = MemoryStreamManager::new();
        let id = streams.allocate(Bytes::from_static(b"hello"));
        assert_eq!(id, StreamId::FIRST);
        assert_eq!(streams.read(id).unwrap(), Bytes::from_static(b"hello"));

        streams.write(id, Bytes::from_static(b"bye")).unwrap();
        assert_eq!(streams.total_bytes(), 3);

        let copy = streams.clone_stream(id).unwrap();
        assert_ne!(copy, id);
        assert_eq!(streams.stream_count(), 2);

        streams.deallocate(id).unwrap();
        assert_eq!(
            streams.read(id).unwrap_err().code(),
            ErrorCode::StreamNotFound
        );
        assert_eq!(streams.read(copy).unwrap(), Bytes::from_static(b"bye"));
        assert!(streams.deallocate(id).is_err());
    }

    #[test]
    fn test_shared_streams() {
        let streams: Arc<dyn StreamManager> = Arc::new(MemoryStreamManager::new());
        let a = DefaultValueManager::with_streams(Arc::clone(&streams));
        let b = a.clone();
        let id = a.streams().allocate(Bytes::from_static(b"x"));
        assert!(b.streams().read(id).is_ok());
        assert_eq!(streams.stream_count(), 1);
    }
}
