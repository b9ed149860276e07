//! Message types emitted by codec readers.

use bytes::Bytes;
use indexmap::IndexMap;

/// An opaque byte payload with an associated metadata bag.
///
/// Payloads are owned by the part; readers never hand out slices of their
/// internal scan buffers, so a part captured from one `next` call stays
/// byte-identical across later reads and ack activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    /// Payload bytes.
    pub payload: Bytes,
    /// String metadata attached by the codec (e.g. archive entry names).
    pub metadata: IndexMap<String, String>,
}

impl Part {
    /// Create a part from owned payload bytes.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            metadata: IndexMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Payload bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}

/// An ordered, non-empty sequence of parts.
///
/// Single-part codecs always yield length-1 messages; multipart codecs
/// yield one part per grouped record.
pub type Message = Vec<Part>;
