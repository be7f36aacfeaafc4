//! Queue-backed event source with a cloneable producer handle.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use weir_core::{AckToken, Event, EventSource, Interrupt, Result, WeirError};

/// Acknowledgement payload minted by [`InMemoryEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAck {
    pub offset: u64,
}

struct State<K, V> {
    queue: VecDeque<Event<K, V>>,
    next_offset: u64,
    acked_through: Option<u64>,
    finished: bool,
    closed: bool,
    interrupted: bool,
}

struct Shared<K, V> {
    state: Mutex<State<K, V>>,
    available: Condvar,
}

/// An in-memory, single-consumer event source.
///
/// Producers push events through a [`MemorySourceHandle`] from any thread;
/// the consumer polls with a bounded wait. Each delivered event carries a
/// [`MemoryAck`] token; acknowledging a batch advances the high-water mark
/// visible through [`MemorySourceHandle::acked_through`].
pub struct InMemoryEventSource<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> InMemoryEventSource<K, V> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    next_offset: 0,
                    acked_through: None,
                    finished: false,
                    closed: false,
                    interrupted: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    /// A bounded source pre-loaded with `events`: it drains them in order and
    /// then reports exhaustion.
    pub fn preloaded(events: impl IntoIterator<Item = Event<K, V>>) -> Self {
        let source = Self::new();
        {
            let handle = source.handle();
            for event in events {
                // The queue cannot be closed yet, push never fails here.
                let _ = handle.push(event);
            }
            handle.finish();
        }
        source
    }

    /// A cloneable producer-side handle.
    pub fn handle(&self) -> MemorySourceHandle<K, V> {
        MemorySourceHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State<K, V>>> {
        self.shared
            .state
            .lock()
            .map_err(|_| WeirError::Source("event queue lock poisoned".to_string()))
    }
}

impl<K, V> Default for InMemoryEventSource<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EventSource for InMemoryEventSource<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    type Key = K;
    type Value = V;

    fn available_immediately(&self) -> bool {
        self.shared
            .state
            .lock()
            .map(|s| !s.closed && !s.interrupted && !s.queue.is_empty())
            .unwrap_or(false)
    }

    fn is_exhausted(&self) -> bool {
        self.shared
            .state
            .lock()
            .map(|s| s.closed || (s.finished && s.queue.is_empty()))
            .unwrap_or(true)
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<Event<K, V>>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock()?;
        loop {
            if state.closed {
                return Err(WeirError::Closed);
            }
            if state.interrupted {
                state.interrupted = false;
                return Err(WeirError::Interrupted);
            }
            if let Some(event) = state.queue.pop_front() {
                return Ok(Some(event));
            }
            if state.finished {
                return Ok(None);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let (guard, _timed_out) = self
                .shared
                .available
                .wait_timeout(state, deadline - now)
                .map_err(|_| WeirError::Source("event queue lock poisoned".to_string()))?;
            state = guard;
        }
    }

    fn remaining(&self) -> Option<u64> {
        self.shared
            .state
            .lock()
            .map(|s| s.queue.len() as u64)
            .ok()
    }

    fn processed(&mut self, batch: Vec<AckToken>) -> Result<()> {
        let mut state = self.lock()?;
        for token in batch {
            // Tokens from other sources are ignored, per the contract.
            if let Some(ack) = token.downcast_ref::<MemoryAck>() {
                let through = state.acked_through.map_or(ack.offset, |o| o.max(ack.offset));
                state.acked_through = Some(through);
            }
        }
        Ok(())
    }

    fn interrupt_handle(&self) -> Arc<dyn Interrupt> {
        Arc::new(MemoryInterrupt {
            shared: Arc::clone(&self.shared),
        })
    }

    fn close(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.closed = true;
            state.queue.clear();
        }
        self.shared.available.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.shared.state.lock().map(|s| s.closed).unwrap_or(true)
    }
}

/// Producer-side handle for an [`InMemoryEventSource`].
pub struct MemorySourceHandle<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for MemorySourceHandle<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> MemorySourceHandle<K, V> {
    /// Enqueue one event, stamping it with the next offset's token.
    pub fn push(&self, event: Event<K, V>) -> Result<()> {
        let mut state = self
            .shared
            .state
            .lock()
            .map_err(|_| WeirError::Source("event queue lock poisoned".to_string()))?;
        if state.closed {
            return Err(WeirError::Closed);
        }
        if state.finished {
            return Err(WeirError::Source(
                "cannot push to a finished source".to_string(),
            ));
        }
        let offset = state.next_offset;
        state.next_offset += 1;
        state
            .queue
            .push_back(event.with_ack(AckToken::new(MemoryAck { offset })));
        drop(state);
        self.shared.available.notify_all();
        Ok(())
    }

    /// Declare the source bounded: once the queue drains, it is exhausted.
    pub fn finish(&self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.finished = true;
        }
        self.shared.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().map(|s| s.queue.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest acknowledged offset, if any batch has been acknowledged.
    pub fn acked_through(&self) -> Option<u64> {
        self.shared
            .state
            .lock()
            .ok()
            .and_then(|s| s.acked_through)
    }
}

struct MemoryInterrupt<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Interrupt for MemoryInterrupt<K, V>
where
    K: Send,
    V: Send,
{
    fn interrupt(&self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.interrupted = true;
        }
        self.shared.available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_poll_returns_pushed_event() {
        let mut source = InMemoryEventSource::new();
        let handle = source.handle();
        handle.push(Event::new("k", 1)).unwrap();

        assert!(source.available_immediately());
        let event = source.poll(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(event.value(), &1);
        assert!(event.ack_token().is_some());
    }

    #[test]
    fn test_poll_times_out_on_empty_queue() {
        let mut source: InMemoryEventSource<&str, i32> = InMemoryEventSource::new();
        let start = Instant::now();
        let polled = source.poll(Duration::from_millis(20)).unwrap();
        assert!(polled.is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_poll_wakes_on_concurrent_push() {
        let mut source = InMemoryEventSource::new();
        let handle = source.handle();

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.push(Event::new("k", 42)).unwrap();
        });

        let event = source.poll(Duration::from_secs(2)).unwrap();
        assert_eq!(event.unwrap().value(), &42);
        producer.join().unwrap();
    }

    #[test]
    fn test_preloaded_source_is_exhausted_after_drain() {
        let mut source =
            InMemoryEventSource::preloaded(vec![Event::new("a", 1), Event::new("b", 2)]);
        assert!(!source.is_exhausted());
        assert_eq!(source.remaining(), Some(2));

        source.poll(Duration::from_millis(5)).unwrap().unwrap();
        source.poll(Duration::from_millis(5)).unwrap().unwrap();
        assert!(source.is_exhausted());
        assert!(source.poll(Duration::from_millis(5)).unwrap().is_none());
    }

    #[test]
    fn test_interrupt_unblocks_pending_poll() {
        let mut source: InMemoryEventSource<&str, i32> = InMemoryEventSource::new();
        let interrupt = source.interrupt_handle();

        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            interrupt.interrupt();
        });

        let start = Instant::now();
        let result = source.poll(Duration::from_secs(5));
        assert!(matches!(result, Err(WeirError::Interrupted)));
        assert!(start.elapsed() < Duration::from_secs(2));
        waker.join().unwrap();
    }

    #[test]
    fn test_processed_advances_high_water_mark() {
        let mut source = InMemoryEventSource::new();
        let handle = source.handle();
        handle.push(Event::new("k", 1)).unwrap();
        handle.push(Event::new("k", 2)).unwrap();

        let first = source.poll(Duration::from_millis(5)).unwrap().unwrap();
        let second = source.poll(Duration::from_millis(5)).unwrap().unwrap();
        assert_eq!(handle.acked_through(), None);

        let batch = vec![
            first.ack_token().cloned().unwrap(),
            second.ack_token().cloned().unwrap(),
        ];
        source.processed(batch).unwrap();
        assert_eq!(handle.acked_through(), Some(1));
    }

    #[test]
    fn test_close_is_terminal() {
        let mut source = InMemoryEventSource::new();
        let handle = source.handle();
        handle.push(Event::new("k", 1)).unwrap();

        source.close();
        assert!(source.is_closed());
        assert!(source.is_exhausted());
        assert!(matches!(
            source.poll(Duration::from_millis(5)),
            Err(WeirError::Closed)
        ));
        assert!(handle.push(Event::new("k", 2)).is_err());
    }
}
