//! End-to-end tests for chunk reassembly over an in-memory source.

use std::thread;
use std::time::{Duration, Instant};

use weir_combine::{BytesSplitter, ChunkDigest, CombiningEventSource, Crc32, Sha256};
use weir_core::{header, CombinerConfig, Event, EventSource, Header, WeirError};
use weir_memory::{DeadLetterLog, InMemoryEventSource};

type ByteEvent = Event<String, Vec<u8>>;

fn claim(digest: &dyn ChunkDigest, bytes: &[u8]) -> String {
    format!("{}:{}", digest.algorithm(), digest.digest(bytes))
}

/// Split `payload` into `total` pieces and wrap each in a fully tagged chunk
/// event, the way a size-limited producer would.
fn chunk_events(split_id: &str, payload: &[u8], total: usize) -> Vec<ByteEvent> {
    let piece_len = payload.len().div_ceil(total);
    payload
        .chunks(piece_len)
        .enumerate()
        .map(|(i, piece)| {
            Event::new(split_id.to_string(), piece.to_vec())
                .push_header(Header::new(header::SPLIT_ID, split_id))
                .push_header(Header::new(header::CHUNK_ID, (i + 1).to_string()))
                .push_header(Header::new(header::CHUNK_TOTAL, total.to_string()))
                .push_header(Header::new(header::CHUNK_CHECKSUM, claim(&Crc32, piece)))
                .push_header(Header::new(header::CHUNK_HASH, claim(&Sha256, piece)))
                .push_header(Header::new(
                    header::ORIGINAL_CHECKSUM,
                    claim(&Crc32, payload),
                ))
                .push_header(Header::new(header::ORIGINAL_HASH, claim(&Sha256, payload)))
        })
        .collect()
}

fn combining_over(
    events: Vec<ByteEvent>,
) -> CombiningEventSource<InMemoryEventSource<String, Vec<u8>>> {
    CombiningEventSource::builder(InMemoryEventSource::preloaded(events), BytesSplitter).build()
}

fn replace_header(event: ByteEvent, name: &str, value: &str) -> ByteEvent {
    let (key, payload, headers, _ack) = event.into_parts();
    let headers = headers
        .into_iter()
        .map(|h| {
            if h.key() == name {
                Header::new(name, value)
            } else {
                h
            }
        })
        .collect();
    Event::new(key, payload).with_headers(headers)
}

#[test]
fn test_events_without_chunk_headers_pass_through() {
    let event = Event::new("plain".to_string(), b"payload".to_vec())
        .push_header(Header::new("Content-Type", "text/plain"));
    let mut source = combining_over(vec![event]);

    let polled = source.poll(Duration::from_millis(50)).unwrap().unwrap();
    assert_eq!(polled.value(), &b"payload".to_vec());
    assert!(polled.has_header("Content-Type"));
}

#[test]
fn test_reassembles_chunks_in_order() {
    let payload = b"the quick brown fox jumps over the lazy dog".to_vec();
    let mut source = combining_over(chunk_events("split-1", &payload, 3));

    let event = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(event.value(), &payload);
    for name in header::CHUNK_HEADERS {
        assert!(!event.has_header(name), "{} should be stripped", name);
    }
    assert_eq!(source.pending_correlations(), 0);
    assert!(source.poll(Duration::from_millis(10)).unwrap().is_none());
}

#[test]
fn test_reassembles_chunks_out_of_order() {
    let payload = b"out of order delivery must still recombine cleanly".to_vec();
    let mut chunks = chunk_events("split-1", &payload, 4);
    chunks.reverse();
    let mut source = combining_over(chunks);

    let event = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(event.value(), &payload);
}

#[test]
fn test_single_chunk_split_recombines() {
    let payload = b"small".to_vec();
    let mut source = combining_over(chunk_events("split-1", &payload, 1));

    let event = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(event.value(), &payload);
    assert!(!event.has_header(header::SPLIT_ID));
}

#[test]
fn test_interleaved_correlation_ids() {
    let first = b"payload for the first split".to_vec();
    let second = b"payload for the second split".to_vec();
    let [a1, a2]: [ByteEvent; 2] = chunk_events("split-a", &first, 2).try_into().unwrap();
    let [b1, b2]: [ByteEvent; 2] = chunk_events("split-b", &second, 2).try_into().unwrap();
    let mut source = combining_over(vec![a1, b1, b2, a2]);

    let completed_b = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(completed_b.value(), &second);
    let completed_a = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(completed_a.value(), &first);
    assert_eq!(source.pending_correlations(), 0);
}

#[test]
fn test_duplicate_chunk_redelivery_is_tolerated() {
    let payload = b"duplicates overwrite, they never fork".to_vec();
    let [c1, c2]: [ByteEvent; 2] = chunk_events("split-1", &payload, 2).try_into().unwrap();
    let mut source = combining_over(vec![c1.clone(), c1, c2]);

    let event = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(event.value(), &payload);
    // Exactly one recombined event comes out.
    assert!(source.poll(Duration::from_millis(10)).unwrap().is_none());
}

#[test]
fn test_tampered_chunk_checksum_is_dead_lettered() {
    let payload = b"tampering must never reach the output".to_vec();
    let mut chunks = chunk_events("split-1", &payload, 2);
    let tampered = replace_header(
        chunks.remove(0),
        header::CHUNK_CHECKSUM,
        "crc32:deadbeef",
    );
    chunks.insert(0, tampered);

    let dead_letters = DeadLetterLog::new();
    let dlq = dead_letters.handle();
    let mut source =
        CombiningEventSource::builder(InMemoryEventSource::preloaded(chunks), BytesSplitter)
            .with_dead_letter(dead_letters)
            .build();

    // The surviving chunk alone can never complete the split.
    assert!(source.poll(Duration::from_millis(50)).unwrap().is_none());

    let entries = dlq.entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].reason.is_empty());
    assert!(entries[0].reason.contains("Chunk-Checksum"));
    assert!(entries[0].event.has_header(header::DEAD_LETTER_REASON));
    assert_eq!(source.pending_correlations(), 1);
}

#[test]
fn test_tampered_chunk_hash_raises_without_dead_letter_sink() {
    let payload = b"no sink means the fault surfaces".to_vec();
    let mut chunks = chunk_events("split-1", &payload, 2);
    let tampered = replace_header(
        chunks.remove(1),
        header::CHUNK_HASH,
        &format!("sha256:{}", "0".repeat(64)),
    );
    chunks.push(tampered);
    let mut source = combining_over(chunks);

    let result = source.poll(Duration::from_secs(1));
    assert!(matches!(result, Err(WeirError::Protocol(_))));
}

#[test]
fn test_blank_split_id_is_a_protocol_error() {
    let payload = b"correlation id is required".to_vec();
    let chunks: Vec<ByteEvent> = chunk_events("ignored", &payload, 1)
        .into_iter()
        .map(|c| replace_header(c, header::SPLIT_ID, "  "))
        .collect();

    let dead_letters = DeadLetterLog::new();
    let dlq = dead_letters.handle();
    let mut source =
        CombiningEventSource::builder(InMemoryEventSource::preloaded(chunks), BytesSplitter)
            .with_dead_letter(dead_letters)
            .build();

    assert!(source.poll(Duration::from_millis(50)).unwrap().is_none());
    assert!(dlq.entries()[0].reason.contains("Split-ID"));
}

#[test]
fn test_non_numeric_chunk_id_is_a_protocol_error() {
    let payload = b"chunk ids are unprefixed integers".to_vec();
    let chunks: Vec<ByteEvent> = chunk_events("split-1", &payload, 1)
        .into_iter()
        .map(|c| replace_header(c, header::CHUNK_ID, "one"))
        .collect();
    let mut source = combining_over(chunks);

    let result = source.poll(Duration::from_secs(1));
    match result {
        Err(WeirError::Protocol(reason)) => assert!(reason.contains("Chunk-ID")),
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_chunk_total_divergence_is_a_protocol_error() {
    let payload = b"totals must stay stable per correlation id".to_vec();
    let mut chunks = chunk_events("split-1", &payload, 3);
    let diverged = replace_header(chunks.remove(1), header::CHUNK_TOTAL, "4");

    let dead_letters = DeadLetterLog::new();
    let dlq = dead_letters.handle();
    let mut source = CombiningEventSource::builder(
        InMemoryEventSource::preloaded(vec![chunks.remove(0), diverged]),
        BytesSplitter,
    )
    .with_dead_letter(dead_letters)
    .build();

    assert!(source.poll(Duration::from_millis(50)).unwrap().is_none());
    let entries = dlq.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].reason.contains("diverges"));
}

#[test]
fn test_unexpected_digest_algorithm_is_a_protocol_error() {
    let payload = b"algorithm identifiers must match configuration".to_vec();
    let chunks: Vec<ByteEvent> = chunk_events("split-1", &payload, 1)
        .into_iter()
        .map(|c| replace_header(c, header::CHUNK_CHECKSUM, "md5:abcdef"))
        .collect();

    let dead_letters = DeadLetterLog::new();
    let dlq = dead_letters.handle();
    let mut source =
        CombiningEventSource::builder(InMemoryEventSource::preloaded(chunks), BytesSplitter)
            .with_dead_letter(dead_letters)
            .build();

    assert!(source.poll(Duration::from_millis(50)).unwrap().is_none());
    assert!(dlq.entries()[0].reason.contains("md5"));
}

#[test]
fn test_tampered_original_checksum_dead_letters_recombined_value() {
    let payload = b"the whole recombined value is verified too".to_vec();
    let chunks: Vec<ByteEvent> = chunk_events("split-1", &payload, 2)
        .into_iter()
        .map(|c| replace_header(c, header::ORIGINAL_CHECKSUM, "crc32:deadbeef"))
        .collect();

    let dead_letters = DeadLetterLog::new();
    let dlq = dead_letters.handle();
    let mut source =
        CombiningEventSource::builder(InMemoryEventSource::preloaded(chunks), BytesSplitter)
            .with_dead_letter(dead_letters)
            .build();

    assert!(source.poll(Duration::from_millis(50)).unwrap().is_none());
    let entries = dlq.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].reason.contains("Original-Checksum"));
    // The diverted event carries the recombined value for diagnosis.
    assert_eq!(entries[0].event.value(), &payload);
    assert_eq!(source.pending_correlations(), 0);
}

#[test]
fn test_poll_never_blocks_past_its_timeout() {
    let payload = b"half now, half too late".to_vec();
    let [c1, c2]: [ByteEvent; 2] = chunk_events("split-1", &payload, 2).try_into().unwrap();

    let raw: InMemoryEventSource<String, Vec<u8>> = InMemoryEventSource::new();
    let handle = raw.handle();
    handle.push(c1).unwrap();
    let mut source = CombiningEventSource::builder(raw, BytesSplitter).build();

    let timeout = Duration::from_millis(100);
    let producer = thread::spawn(move || {
        thread::sleep(timeout + timeout / 2);
        handle.push(c2).unwrap();
    });

    let start = Instant::now();
    let polled = source.poll(timeout).unwrap();
    let elapsed = start.elapsed();
    assert!(polled.is_none());
    assert!(elapsed >= timeout);
    assert!(
        elapsed < timeout * 3,
        "poll overran its deadline: {:?}",
        elapsed
    );

    producer.join().unwrap();
    let event = source.poll(Duration::from_secs(2)).unwrap().unwrap();
    assert_eq!(event.value(), &payload);
}

#[test]
fn test_recombined_event_keeps_non_chunk_headers_and_token() {
    let payload = b"application headers survive recombination".to_vec();
    let mut chunks = chunk_events("split-1", &payload, 2);
    let last = chunks
        .pop()
        .unwrap()
        .push_header(Header::new("Content-Type", "application/n-quads"));
    chunks.push(last);
    let mut source = combining_over(chunks);

    let event = source.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(
        event.header("Content-Type").and_then(|h| h.value_str()),
        Some("application/n-quads")
    );
    // The in-memory source stamps every event, and the completing chunk's
    // token must survive onto the recombined event.
    assert!(event.ack_token().is_some());
}

#[test]
fn test_builder_rejects_unknown_configured_algorithm() {
    let raw: InMemoryEventSource<String, Vec<u8>> = InMemoryEventSource::new();
    let config = CombinerConfig::new().with_checksum_algorithm("md5");
    let result = CombiningEventSource::builder(raw, BytesSplitter).with_config(&config);
    assert!(matches!(result, Err(WeirError::Config(_))));
}
