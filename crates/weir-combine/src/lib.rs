//! # Weir Combine
//!
//! Chunk reassembly for the Weir event-stream engine.
//!
//! Events whose values exceeded a transport size limit arrive as chunks, each
//! tagged with a correlation id (`Split-ID`), its 1-based position
//! (`Chunk-ID` of `Chunk-Total`) and four integrity digests. The
//! [`CombiningEventSource`] decorator hides all of that from its callers:
//!
//! - events without chunk headers pass straight through
//! - chunks are verified, accumulated per correlation id and recombined via a
//!   [`Splitter`] once complete, with dual integrity verification of both the
//!   individual chunk and the recombined value
//! - malformed or failed-verification chunks go to a dead-letter sink with a
//!   `Dead-Letter-Reason` header, or raise a protocol error when none is
//!   configured
//!
//! ## Example
//!
//! ```rust,no_run
//! use weir_combine::{BytesSplitter, CombiningEventSource};
//! use weir_core::EventSource;
//! use weir_memory::{DeadLetterLog, InMemoryEventSource};
//! use std::time::Duration;
//!
//! # fn main() -> weir_core::Result<()> {
//! let raw: InMemoryEventSource<String, Vec<u8>> = InMemoryEventSource::new();
//! let dead_letters = DeadLetterLog::new();
//! let mut source = CombiningEventSource::builder(raw, BytesSplitter)
//!     .with_dead_letter(dead_letters)
//!     .build();
//!
//! // Callers never see a chunk header.
//! while let Some(event) = source.poll(Duration::from_secs(1))? {
//!     println!("whole event: {} bytes", event.value().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod digest;
pub mod source;
pub mod splitter;

pub use collector::CombiningCollector;
pub use digest::{digest_for, ChunkDigest, ChunkInfo, Crc32, DigestClaim, Sha256};
pub use source::{CombiningEventSource, CombiningSourceBuilder};
pub use splitter::{BytesSplitter, Splitter, StringSplitter};
