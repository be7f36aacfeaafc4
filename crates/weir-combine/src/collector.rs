//! Per-correlation-id chunk accumulation.

/// Accumulates the chunk slots for one correlation id.
///
/// Slot `i` (0-based) holds wire chunk `i + 1` (1-based). The collector is
/// created lazily on the first chunk for an unseen correlation id and removed
/// from the combining source's map the instant it completes. It is owned
/// exclusively by one combining source and never shared.
#[derive(Debug)]
pub struct CombiningCollector<V> {
    split_id: String,
    slots: Vec<Option<V>>,
    filled: usize,
}

impl<V> CombiningCollector<V> {
    pub fn new(split_id: impl Into<String>, total: usize) -> Self {
        let mut slots = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        Self {
            split_id: split_id.into(),
            slots,
            filled: 0,
        }
    }

    pub fn split_id(&self) -> &str {
        &self.split_id
    }

    /// The declared chunk total this collector was sized to.
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Store a chunk in its 0-based slot. Duplicate delivery overwrites the
    /// slot and is logged, never rejected.
    pub fn insert(&mut self, index: usize, value: V) {
        if self.slots[index].replace(value).is_some() {
            tracing::warn!(
                split_id = %self.split_id,
                chunk = index + 1,
                "duplicate chunk delivery, overwriting existing slot"
            );
        } else {
            self.filled += 1;
        }
    }

    /// Complete means every slot is filled.
    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// The chunk values in wire order, or `None` while any slot is empty.
    pub fn into_values(self) -> Option<Vec<V>> {
        self.slots.into_iter().collect()
    }
}
