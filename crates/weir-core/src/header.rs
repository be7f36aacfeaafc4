//! Event headers and the wire-level header names used by the chunking
//! protocol.

/// Correlation id grouping all chunks of one original event.
pub const SPLIT_ID: &str = "Split-ID";

/// 1-based index of a chunk within its split.
pub const CHUNK_ID: &str = "Chunk-ID";

/// Declared total chunk count for a correlation id.
pub const CHUNK_TOTAL: &str = "Chunk-Total";

/// `<algorithm>:<value>` checksum of one chunk's integrity bytes.
pub const CHUNK_CHECKSUM: &str = "Chunk-Checksum";

/// `<algorithm>:<value>` hash of one chunk's integrity bytes.
pub const CHUNK_HASH: &str = "Chunk-Hash";

/// `<algorithm>:<value>` checksum of the full recombined value.
pub const ORIGINAL_CHECKSUM: &str = "Original-Checksum";

/// `<algorithm>:<value>` hash of the full recombined value.
pub const ORIGINAL_HASH: &str = "Original-Hash";

/// Appended when an event is diverted to a dead-letter sink.
pub const DEAD_LETTER_REASON: &str = "Dead-Letter-Reason";

/// The headers that mark an event as a chunk of a larger event.
pub const CHUNK_HEADERS: [&str; 7] = [
    SPLIT_ID,
    CHUNK_ID,
    CHUNK_TOTAL,
    CHUNK_CHECKSUM,
    CHUNK_HASH,
    ORIGINAL_CHECKSUM,
    ORIGINAL_HASH,
];

/// True if `key` names one of the chunking protocol headers.
///
/// Header names are case-sensitive on the wire.
pub fn is_chunk_header(key: &str) -> bool {
    CHUNK_HEADERS.contains(&key)
}

/// A single event header: a string key and a raw byte value.
///
/// Header keys are not unique. An event may carry several headers with the
/// same key to express multiple values; their order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    key: String,
    value: Vec<u8>,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw byte projection of the value.
    pub fn value_bytes(&self) -> &[u8] {
        &self.value
    }

    /// The string projection of the value, when it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}
