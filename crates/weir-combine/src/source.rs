//! The chunk-combining event source decorator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use weir_core::header::{self, is_chunk_header};
use weir_core::{
    observe, AckToken, CombinerConfig, Event, EventSource, Header, Interrupt, Result, Sink,
    WeirError,
};

use crate::collector::CombiningCollector;
use crate::digest::{digest_for, ChunkDigest, ChunkInfo, Crc32, DigestClaim, Sha256};
use crate::splitter::Splitter;

/// Declared chunk totals above this are rejected as protocol errors rather
/// than sized into a slot array.
const MAX_DECLARED_CHUNKS: u64 = 65_536;

type DeadLetter<K, V> = Box<dyn Sink<Item = Event<K, V>> + Send>;

/// Fully parsed and per-chunk-verified metadata for one chunk event.
struct ChunkMeta {
    split_id: String,
    /// 0-based slot index (wire `Chunk-ID` is 1-based).
    index: usize,
    total: usize,
    checksum: ChunkInfo,
    hash: ChunkInfo,
}

/// An [`EventSource`] decorator that presents a stream of chunked sub-events
/// as whole, verified events.
///
/// Events without chunk headers pass through untouched. Chunks are verified
/// against their declared checksum and hash, accumulated per correlation id,
/// and recombined through the configured [`Splitter`] once every declared
/// slot is filled; the recombined value is verified against the declared
/// original digests and returned with all chunk headers stripped. Malformed
/// or failed-verification chunks are diverted to the dead-letter sink with a
/// `Dead-Letter-Reason` header, or raised as a protocol error when no sink is
/// configured.
///
/// Incomplete correlation ids hold their collectors until `close`; there is
/// no eviction. A replayed source must resend all chunks.
pub struct CombiningEventSource<S>
where
    S: EventSource,
    S::Key: 'static,
    S::Value: 'static,
{
    inner: S,
    splitter: Box<dyn Splitter<Value = S::Value> + Send>,
    checksum: Box<dyn ChunkDigest>,
    hash: Box<dyn ChunkDigest>,
    dead_letter: Option<DeadLetter<S::Key, S::Value>>,
    collectors: HashMap<String, CombiningCollector<S::Value>>,
}

impl<S> CombiningEventSource<S>
where
    S: EventSource,
    S::Key: 'static,
    S::Value: 'static,
{
    /// Start building a combining source over `inner`. Digests default to
    /// CRC32 checksums and SHA-256 hashes.
    pub fn builder(
        inner: S,
        splitter: impl Splitter<Value = S::Value> + Send + 'static,
    ) -> CombiningSourceBuilder<S> {
        CombiningSourceBuilder {
            inner,
            splitter: Box::new(splitter),
            checksum: Box::new(Crc32),
            hash: Box::new(Sha256),
            dead_letter: None,
        }
    }

    /// Number of correlation ids with partially accumulated chunks.
    pub fn pending_correlations(&self) -> usize {
        self.collectors.len()
    }

    fn parse_chunk(&self, event: &Event<S::Key, S::Value>) -> std::result::Result<ChunkMeta, String> {
        let split_id = match last_header_str(event, header::SPLIT_ID) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            Some(_) => return Err("blank Split-ID header on chunk event".to_string()),
            None => return Err("missing Split-ID header on chunk event".to_string()),
        };

        let id = parse_count(event, header::CHUNK_ID)?;
        let total = parse_count(event, header::CHUNK_TOTAL)?;
        if total == 0 {
            return Err("Chunk-Total must be at least 1".to_string());
        }
        if total > MAX_DECLARED_CHUNKS {
            return Err(format!(
                "Chunk-Total {} exceeds supported maximum {}",
                total, MAX_DECLARED_CHUNKS
            ));
        }
        if id == 0 || id > total {
            return Err(format!(
                "Chunk-ID {} out of range for Chunk-Total {}",
                id, total
            ));
        }

        let checksum = ChunkInfo {
            chunk: parse_claim(event, header::CHUNK_CHECKSUM, self.checksum.algorithm())?,
            original: parse_claim(event, header::ORIGINAL_CHECKSUM, self.checksum.algorithm())?,
        };
        let hash = ChunkInfo {
            chunk: parse_claim(event, header::CHUNK_HASH, self.hash.algorithm())?,
            original: parse_claim(event, header::ORIGINAL_HASH, self.hash.algorithm())?,
        };

        let bytes = self.splitter.integrity_bytes(event.value());
        let computed_checksum = self.checksum.digest(&bytes);
        if !checksum.chunk.matches(&computed_checksum) {
            return Err(format!(
                "Chunk-Checksum mismatch: declared {}, computed {}",
                checksum.chunk.value, computed_checksum
            ));
        }
        let computed_hash = self.hash.digest(&bytes);
        if !hash.chunk.matches(&computed_hash) {
            return Err(format!(
                "Chunk-Hash mismatch: declared {}, computed {}",
                hash.chunk.value, computed_hash
            ));
        }

        Ok(ChunkMeta {
            split_id,
            index: (id - 1) as usize,
            total: total as usize,
            checksum,
            hash,
        })
    }

    /// Absorb one chunk event. Returns the recombined event when this chunk
    /// completed its correlation id, `Ok(None)` when the chunk was stored or
    /// dead-lettered, and an error only when a protocol fault cannot be
    /// diverted.
    fn absorb(
        &mut self,
        event: Event<S::Key, S::Value>,
    ) -> Result<Option<Event<S::Key, S::Value>>> {
        let meta = match self.parse_chunk(&event) {
            Ok(meta) => meta,
            Err(reason) => {
                self.divert(event, reason)?;
                return Ok(None);
            }
        };

        if let Some(existing) = self.collectors.get(&meta.split_id) {
            if existing.total() != meta.total {
                let reason = format!(
                    "Chunk-Total {} diverges from previously declared {} for Split-ID {}",
                    meta.total,
                    existing.total(),
                    meta.split_id
                );
                self.divert(event, reason)?;
                return Ok(None);
            }
        }

        let (key, value, headers, ack) = event.into_parts();
        let collector = self
            .collectors
            .entry(meta.split_id.clone())
            .or_insert_with(|| CombiningCollector::new(meta.split_id.clone(), meta.total));
        collector.insert(meta.index, value);

        if !collector.is_complete() {
            observe::set_pending_correlations(self.collectors.len());
            return Ok(None);
        }

        let chunks = self
            .collectors
            .remove(&meta.split_id)
            .and_then(CombiningCollector::into_values)
            .ok_or_else(|| {
                WeirError::Protocol(format!(
                    "collector for Split-ID {} lost before recombination",
                    meta.split_id
                ))
            })?;
        observe::set_pending_correlations(self.collectors.len());

        let combined = self.splitter.combine(chunks)?;

        let (computed_checksum, computed_hash) = {
            let bytes = self.splitter.integrity_bytes(&combined);
            (self.checksum.digest(&bytes), self.hash.digest(&bytes))
        };
        if !meta.checksum.original.matches(&computed_checksum) {
            let reason = format!(
                "Original-Checksum mismatch after recombination: declared {}, computed {}",
                meta.checksum.original.value, computed_checksum
            );
            self.divert(rebuild(key, combined, headers, ack), reason)?;
            return Ok(None);
        }
        if !meta.hash.original.matches(&computed_hash) {
            let reason = format!(
                "Original-Hash mismatch after recombination: declared {}, computed {}",
                meta.hash.original.value, computed_hash
            );
            self.divert(rebuild(key, combined, headers, ack), reason)?;
            return Ok(None);
        }

        let headers: Vec<Header> = headers
            .into_iter()
            .filter(|h| !is_chunk_header(h.key()))
            .collect();
        observe::record_recombined();
        tracing::debug!(split_id = %meta.split_id, chunks = meta.total, "recombined split event");
        Ok(Some(rebuild(key, combined, headers, ack)))
    }

    /// Route a bad event to the dead-letter sink, or raise when none is
    /// configured. No chunk error is ever silently swallowed.
    fn divert(&mut self, event: Event<S::Key, S::Value>, reason: String) -> Result<()> {
        observe::record_dead_letter();
        match self.dead_letter.as_mut() {
            Some(sink) => {
                tracing::warn!(reason = %reason, "diverting bad chunk event to dead-letter sink");
                sink.accept(event.push_header(Header::new(header::DEAD_LETTER_REASON, reason)))
            }
            None => Err(WeirError::Protocol(reason)),
        }
    }
}

impl<S> EventSource for CombiningEventSource<S>
where
    S: EventSource,
    S::Key: 'static,
    S::Value: 'static,
{
    type Key = S::Key;
    type Value = S::Value;

    /// Always false: an immediately-available chunk may be absorbed without
    /// yielding an event, so the decorator can never promise a non-null poll.
    fn available_immediately(&self) -> bool {
        false
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<Event<S::Key, S::Value>>> {
        // One wall-clock deadline for the whole call; internal retries only
        // ever shrink the budget.
        let deadline = Instant::now() + timeout;
        let mut budget = timeout;
        loop {
            let Some(event) = self.inner.poll(budget)? else {
                return Ok(None);
            };
            if !event.headers().iter().any(|h| is_chunk_header(h.key())) {
                return Ok(Some(event));
            }
            if let Some(combined) = self.absorb(event)? {
                return Ok(Some(combined));
            }
            budget = deadline.saturating_duration_since(Instant::now());
            if budget.is_zero() {
                return Ok(None);
            }
        }
    }

    fn remaining(&self) -> Option<u64> {
        self.inner.remaining()
    }

    fn processed(&mut self, batch: Vec<AckToken>) -> Result<()> {
        self.inner.processed(batch)
    }

    fn interrupt_handle(&self) -> Arc<dyn Interrupt> {
        self.inner.interrupt_handle()
    }

    fn close(&mut self) {
        // Partial reassembly state is discarded; a replayed source must
        // resend all chunks.
        self.collectors.clear();
        observe::set_pending_correlations(0);
        self.inner.close();
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Builder for [`CombiningEventSource`].
pub struct CombiningSourceBuilder<S>
where
    S: EventSource,
    S::Key: 'static,
    S::Value: 'static,
{
    inner: S,
    splitter: Box<dyn Splitter<Value = S::Value> + Send>,
    checksum: Box<dyn ChunkDigest>,
    hash: Box<dyn ChunkDigest>,
    dead_letter: Option<DeadLetter<S::Key, S::Value>>,
}

impl<S> CombiningSourceBuilder<S>
where
    S: EventSource,
    S::Key: 'static,
    S::Value: 'static,
{
    pub fn with_checksum(mut self, digest: impl ChunkDigest + 'static) -> Self {
        self.checksum = Box::new(digest);
        self
    }

    pub fn with_hash(mut self, digest: impl ChunkDigest + 'static) -> Self {
        self.hash = Box::new(digest);
        self
    }

    /// Resolve both digests from a [`CombinerConfig`]'s algorithm
    /// identifiers.
    pub fn with_config(mut self, config: &CombinerConfig) -> Result<Self> {
        self.checksum = digest_for(&config.checksum_algorithm).ok_or_else(|| {
            WeirError::Config(format!(
                "unknown checksum algorithm: {}",
                config.checksum_algorithm
            ))
        })?;
        self.hash = digest_for(&config.hash_algorithm).ok_or_else(|| {
            WeirError::Config(format!("unknown hash algorithm: {}", config.hash_algorithm))
        })?;
        Ok(self)
    }

    /// Divert malformed or failed-verification chunks to `sink` instead of
    /// raising them as protocol errors.
    pub fn with_dead_letter(
        mut self,
        sink: impl Sink<Item = Event<S::Key, S::Value>> + Send + 'static,
    ) -> Self {
        self.dead_letter = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> CombiningEventSource<S> {
        CombiningEventSource {
            inner: self.inner,
            splitter: self.splitter,
            checksum: self.checksum,
            hash: self.hash,
            dead_letter: self.dead_letter,
            collectors: HashMap::new(),
        }
    }
}

fn rebuild<K, V>(key: K, value: V, headers: Vec<Header>, ack: Option<AckToken>) -> Event<K, V> {
    let event = Event::new(key, value).with_headers(headers);
    match ack {
        Some(token) => event.with_ack(token),
        None => event,
    }
}

fn last_header_str<'a, K, V>(event: &'a Event<K, V>, name: &str) -> Option<&'a str> {
    event.last_header(name).and_then(|h| h.value_str())
}

fn parse_count<K, V>(event: &Event<K, V>, name: &str) -> std::result::Result<u64, String> {
    let raw = last_header_str(event, name).ok_or_else(|| format!("missing {} header", name))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| format!("malformed {} header: {}", name, raw))
}

fn parse_claim<K, V>(
    event: &Event<K, V>,
    name: &str,
    expected_algorithm: &str,
) -> std::result::Result<DigestClaim, String> {
    let raw = last_header_str(event, name).ok_or_else(|| format!("missing {} header", name))?;
    let claim =
        DigestClaim::parse(raw).ok_or_else(|| format!("malformed {} header: {}", name, raw))?;
    if claim.algorithm != expected_algorithm {
        return Err(format!(
            "{} algorithm {} does not match configured {}",
            name, claim.algorithm, expected_algorithm
        ));
    }
    Ok(claim)
}
