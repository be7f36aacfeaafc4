//! Value-type specific recombination logic.

use std::borrow::Cow;

use weir_core::Result;

/// Combines chunk payloads back into one value and exposes the byte sequence
/// integrity digests are computed over.
///
/// A splitter is specific to a value type, not to a source: the same
/// implementation serves every correlation id flowing through a combining
/// source.
pub trait Splitter: Send {
    type Value;

    /// Reassemble the original value from its chunks, in wire order.
    fn combine(&self, chunks: Vec<Self::Value>) -> Result<Self::Value>;

    /// The bytes a digest of `value` is computed over.
    fn integrity_bytes<'a>(&self, value: &'a Self::Value) -> Cow<'a, [u8]>;
}

/// Splitter for raw byte payloads: chunks concatenate back together.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSplitter;

impl Splitter for BytesSplitter {
    type Value = Vec<u8>;

    fn combine(&self, chunks: Vec<Vec<u8>>) -> Result<Vec<u8>> {
        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut combined = Vec::with_capacity(total);
        for chunk in chunks {
            combined.extend_from_slice(&chunk);
        }
        Ok(combined)
    }

    fn integrity_bytes<'a>(&self, value: &'a Vec<u8>) -> Cow<'a, [u8]> {
        Cow::Borrowed(value)
    }
}

/// Splitter for string payloads: chunks concatenate back together.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSplitter;

impl Splitter for StringSplitter {
    type Value = String;

    fn combine(&self, chunks: Vec<String>) -> Result<String> {
        let total: usize = chunks.iter().map(String::len).sum();
        let mut combined = String::with_capacity(total);
        for chunk in chunks {
            combined.push_str(&chunk);
        }
        Ok(combined)
    }

    fn integrity_bytes<'a>(&self, value: &'a String) -> Cow<'a, [u8]> {
        Cow::Borrowed(value.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_splitter_concatenates_in_order() {
        let combined = BytesSplitter
            .combine(vec![b"ab".to_vec(), b"cd".to_vec(), b"e".to_vec()])
            .unwrap();
        assert_eq!(combined, b"abcde");
    }

    #[test]
    fn test_string_splitter_concatenates_in_order() {
        let combined = StringSplitter
            .combine(vec!["he".to_string(), "llo".to_string()])
            .unwrap();
        assert_eq!(combined, "hello");
    }

    #[test]
    fn test_integrity_bytes_borrow_the_value() {
        let value = b"payload".to_vec();
        assert_eq!(BytesSplitter.integrity_bytes(&value).as_ref(), b"payload");

        let text = "payload".to_string();
        assert_eq!(StringSplitter.integrity_bytes(&text).as_ref(), b"payload");
    }
}
