//! Projector: the supervised event processing loop
//!
//! Turns an `EventSource`, a transformation and a `Sink` into a long-running
//! task on a dedicated worker.
//!
//! Key features:
//! - Bounded-wait polling with stall tracking and an optional stall budget
//! - Event limits for bounded runs
//! - Throughput measurement and periodic reporting
//! - Batched at-least-once acknowledgement of processed events
//! - Cooperative cancellation from any thread via [`CancelHandle`]

pub mod driver;
pub mod projector;
pub mod throughput;

pub use driver::{CancelHandle, DriverError, DriverReport, ProjectorDriver, ProjectorDriverBuilder, StopReason};
pub use projector::{project_fn, FnProjector, Projector};
pub use throughput::ThroughputTracker;
