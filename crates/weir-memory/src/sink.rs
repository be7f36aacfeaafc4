//! Collecting sinks: a plain item collector and a dead-letter log.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use weir_core::{header, Event, Result, Sink, WeirError};

struct SinkState<T> {
    items: Vec<T>,
    closed: bool,
}

/// A sink that collects accepted items in memory.
///
/// The sink itself moves into the pipeline; a [`MemorySinkHandle`] keeps the
/// collected items reachable afterwards.
pub struct MemorySink<T> {
    state: Arc<Mutex<SinkState<T>>>,
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                items: Vec::new(),
                closed: false,
            })),
        }
    }

    pub fn handle(&self) -> MemorySinkHandle<T> {
        MemorySinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sink for MemorySink<T> {
    type Item = T;

    fn accept(&mut self, item: T) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| WeirError::Sink("sink lock poisoned".to_string()))?;
        if state.closed {
            return Err(WeirError::Sink("sink is closed".to_string()));
        }
        state.items.push(item);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| WeirError::Sink("sink lock poisoned".to_string()))?;
        state.closed = true;
        Ok(())
    }
}

/// Read-side handle for a [`MemorySink`].
pub struct MemorySinkHandle<T> {
    state: Arc<Mutex<SinkState<T>>>,
}

impl<T> Clone for MemorySinkHandle<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> MemorySinkHandle<T> {
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(false)
    }

    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.state.lock().map(|s| s.items.clone()).unwrap_or_default()
    }
}

/// One captured dead-letter record.
#[derive(Debug, Clone)]
pub struct DeadLetterEntry<K, V> {
    pub event: Event<K, V>,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// A dead-letter sink that records each diverted event together with its
/// `Dead-Letter-Reason` header and a capture timestamp.
pub struct DeadLetterLog<K, V> {
    state: Arc<Mutex<Vec<DeadLetterEntry<K, V>>>>,
}

impl<K, V> DeadLetterLog<K, V> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn handle(&self) -> DeadLetterLogHandle<K, V> {
        DeadLetterLogHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> Default for DeadLetterLog<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Sink for DeadLetterLog<K, V> {
    type Item = Event<K, V>;

    fn accept(&mut self, event: Event<K, V>) -> Result<()> {
        let reason = event
            .last_header(header::DEAD_LETTER_REASON)
            .and_then(|h| h.value_str())
            .unwrap_or_default()
            .to_string();
        let mut entries = self
            .state
            .lock()
            .map_err(|_| WeirError::Sink("dead-letter lock poisoned".to_string()))?;
        entries.push(DeadLetterEntry {
            event,
            reason,
            failed_at: Utc::now(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Read-side handle for a [`DeadLetterLog`].
pub struct DeadLetterLogHandle<K, V> {
    state: Arc<Mutex<Vec<DeadLetterEntry<K, V>>>>,
}

impl<K, V> Clone for DeadLetterLogHandle<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> DeadLetterLogHandle<K, V> {
    pub fn len(&self) -> usize {
        self.state.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<DeadLetterEntry<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        self.state.lock().map(|e| e.clone()).unwrap_or_default()
    }
}
