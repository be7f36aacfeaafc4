//! The immutable key/value event model.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::header::Header;

/// Opaque acknowledgement token minted by an `EventSource`.
///
/// A source attaches a token to each event it yields; callers hand batches of
/// tokens back through `EventSource::processed` once the corresponding events
/// are fully handled. Because the token is type-erased it survives any
/// key/value transformation applied downstream, so acknowledgement routing
/// keeps working after an event's type signature has changed.
#[derive(Clone)]
pub struct AckToken(Arc<dyn Any + Send + Sync>);

impl AckToken {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    /// Recover the source-specific payload. Returns `None` for tokens minted
    /// by a different source implementation.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for AckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AckToken(..)")
    }
}

/// A single key/value event with an ordered, multi-valued header list.
///
/// Events are immutable: the `with_*` operations consume the event and return
/// a new one sharing the unaffected fields, preserving any acknowledgement
/// token across key/value replacements.
#[derive(Debug, Clone)]
pub struct Event<K, V> {
    key: K,
    value: V,
    headers: Vec<Header>,
    ack: Option<AckToken>,
}

impl<K, V> Event<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            headers: Vec::new(),
            ack: None,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The first header with the given key, in append order.
    pub fn header(&self, key: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.key() == key)
    }

    /// The most recently appended header with the given key.
    pub fn last_header(&self, key: &str) -> Option<&Header> {
        self.headers.iter().rev().find(|h| h.key() == key)
    }

    pub fn has_header(&self, key: &str) -> bool {
        self.header(key).is_some()
    }

    pub fn ack_token(&self) -> Option<&AckToken> {
        self.ack.as_ref()
    }

    /// Replace the key, keeping value, headers and acknowledgement token.
    pub fn with_key<K2>(self, key: K2) -> Event<K2, V> {
        Event {
            key,
            value: self.value,
            headers: self.headers,
            ack: self.ack,
        }
    }

    /// Replace the value, keeping key, headers and acknowledgement token.
    pub fn with_value<V2>(self, value: V2) -> Event<K, V2> {
        Event {
            key: self.key,
            value,
            headers: self.headers,
            ack: self.ack,
        }
    }

    /// Replace the full header list.
    pub fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }

    /// Append one header, after any existing headers with the same key.
    pub fn push_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Attach an acknowledgement token. Sources call this on every event they
    /// yield; application code normally has no reason to.
    pub fn with_ack(mut self, token: AckToken) -> Self {
        self.ack = Some(token);
        self
    }

    /// Decompose the event for reassembly-style processing.
    pub fn into_parts(self) -> (K, V, Vec<Header>, Option<AckToken>) {
        (self.key, self.value, self.headers, self.ack)
    }
}
