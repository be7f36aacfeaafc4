//! The pull-based event source contract.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::event::{AckToken, Event};

/// Cross-thread handle for unblocking a pending [`EventSource::poll`].
///
/// Obtained via [`EventSource::interrupt_handle`] before the source is handed
/// to its single consumer thread. Interruption is cooperative and best-effort:
/// the source is not required to wake synchronously, only promptly.
pub trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

/// Interrupt handle for sources whose `poll` never blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInterrupt;

impl Interrupt for NoopInterrupt {
    fn interrupt(&self) {}
}

/// A pull-based iterator over an event log.
///
/// Threading contract: `poll`, `processed` and `close` are called from one
/// consumer thread only. The [`Interrupt`] handle returned by
/// [`interrupt_handle`](EventSource::interrupt_handle) is the only part of a
/// source that may be driven from a second thread, for supervised shutdown.
pub trait EventSource {
    type Key;
    type Value;

    /// True only when the very next `poll` is guaranteed to return an event
    /// without blocking. Lying here is a contract violation a supervising
    /// driver treats as fatal.
    fn available_immediately(&self) -> bool;

    /// True only when no further events will ever arrive (a bounded source
    /// that has been fully drained) or the source is closed. Unbounded
    /// sources return false until closed.
    fn is_exhausted(&self) -> bool;

    /// Block up to `timeout` awaiting the next event.
    ///
    /// `Ok(None)` means "no data yet", never "permanent end"; callers check
    /// [`is_exhausted`](EventSource::is_exhausted) for that. Errors are
    /// reserved for unrecoverable source faults and for interruption
    /// ([`WeirError::Interrupted`](crate::WeirError::Interrupted)).
    fn poll(&mut self, timeout: Duration) -> Result<Option<Event<Self::Key, Self::Value>>>;

    /// Best-effort count of events not yet delivered. May change concurrently
    /// with reads; `None` means unknown (typical for unbounded sources).
    fn remaining(&self) -> Option<u64>;

    /// Acknowledge a batch of events as fully handled.
    ///
    /// Semantics are implementation-defined (e.g. an offset commit). Tokens
    /// are type-erased, so the batch may contain tokens from events whose
    /// key/value types were transformed after polling; tokens minted by other
    /// sources must be ignored, not rejected.
    fn processed(&mut self, batch: Vec<AckToken>) -> Result<()>;

    /// A handle that can unblock a pending `poll` from another thread.
    fn interrupt_handle(&self) -> Arc<dyn Interrupt>;

    /// Terminal. All further reads fail or report exhaustion.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}
