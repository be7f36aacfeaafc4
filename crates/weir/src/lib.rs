//! # Weir: an event-stream processing engine
//!
//! Applications pull key/value events through a uniform [`EventSource`]
//! abstraction, optionally reassemble events that were split into
//! size-limited chunks, and push results to one or more [`Sink`]s, all under
//! a supervising control loop that governs throughput, stalls, limits and
//! cancellation:
//!
//! ```text
//! EventSource → (CombiningEventSource, optional) → ProjectorDriver → transformation → Sink
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use weir::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let source: InMemoryEventSource<String, Vec<u8>> = InMemoryEventSource::new();
//! let producer = source.handle();
//!
//! let sink = MemorySink::new();
//! let results = sink.handle();
//!
//! let driver = ProjectorDriverBuilder::new(
//!     source,
//!     project_fn(|event: Event<String, Vec<u8>>, sink: &mut dyn Sink<Item = Vec<u8>>| {
//!         sink.accept(event.value().clone())
//!     }),
//! )
//! .destination(sink)
//! .poll_timeout(Duration::from_secs(1))
//! .limit(10_000)
//! .build()?;
//!
//! // Cancellation is the only cross-thread operation.
//! let cancel = driver.cancel_handle();
//! let report = driver.run()?;
//! println!("projected {} events", report.events_projected);
//! # let _ = (producer, results, cancel);
//! # Ok(())
//! # }
//! ```
//!
//! Sources backed by a durable partitioned log implement the same contracts;
//! wrap any source in a
//! [`CombiningEventSource`] to make chunked transport invisible to the
//! transformation.

pub mod prelude;
pub mod worker;

// Re-export core types
pub use weir_core::{
    header, observe, AckToken, CombinerConfig, DriverConfig, Event, EventSource, Header,
    Interrupt, NoopInterrupt, Result, Sink, WeirError,
};

// Re-export chunk reassembly
pub use weir_combine::{
    digest_for, BytesSplitter, ChunkDigest, ChunkInfo, CombiningCollector, CombiningEventSource,
    CombiningSourceBuilder, Crc32, DigestClaim, Sha256, Splitter, StringSplitter,
};

// Re-export the driver
pub use weir_projector::{
    project_fn, CancelHandle, DriverError, DriverReport, FnProjector, Projector, ProjectorDriver,
    ProjectorDriverBuilder, StopReason, ThroughputTracker,
};

// Re-export in-memory endpoints
pub use weir_memory::{
    DeadLetterEntry, DeadLetterLog, DeadLetterLogHandle, InMemoryEventSource, MemoryAck,
    MemorySink, MemorySinkHandle, MemorySourceHandle,
};

pub use worker::spawn_driver;
