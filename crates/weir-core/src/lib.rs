//! Weir Core: Event model and contracts for the Weir event-stream engine
//!
//! This crate defines the abstractions the engine is built from:
//! - `Event`/`Header`: immutable key/value events with ordered,
//!   multi-valued headers
//! - `EventSource`: pull-based iteration over a (typically durable,
//!   partitioned) event log, with bounded-wait polling, acknowledgement and
//!   cooperative interruption
//! - `Sink`: push-based consumer of produced items
//!
//! Key properties:
//! - Single-consumer sources: only the `Interrupt` handle crosses threads
//! - `poll` returns `Ok(None)` for "no data yet"; exhaustion is a separate
//!   query; errors mean faults
//! - Acknowledgement tokens are type-erased so they survive key/value
//!   transformations downstream

pub mod config;
pub mod error;
pub mod event;
pub mod header;
pub mod observe;
pub mod traits;

pub use config::{CombinerConfig, DriverConfig};
pub use error::{Result, WeirError};
pub use event::{AckToken, Event};
pub use header::Header;
pub use traits::{EventSource, Interrupt, NoopInterrupt, Sink};
