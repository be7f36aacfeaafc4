//! In-memory event source and sink implementations
//!
//! Provides concrete endpoints for wiring up a Weir pipeline without a
//! durable log behind it:
//! - `InMemoryEventSource`: a queue-backed source with a cloneable producer
//!   handle, bounded-wait polling and cooperative interruption
//! - `MemorySink`: collects accepted items behind a cloneable handle
//! - `DeadLetterLog`: a dead-letter sink that records each diverted event
//!   with its reason and a capture timestamp
//!
//! These back the engine's test-suite and small single-process deployments;
//! durable transports implement the same `weir-core` contracts.

mod sink;
mod source;

pub use sink::{DeadLetterEntry, DeadLetterLog, DeadLetterLogHandle, MemorySink, MemorySinkHandle};
pub use source::{InMemoryEventSource, MemoryAck, MemorySourceHandle};
