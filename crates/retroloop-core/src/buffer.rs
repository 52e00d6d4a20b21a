//! Rolling, time-bounded history of performed notes.

use std::collections::VecDeque;

use crate::record::NoteRecord;

/// Default number of records the buffer can hold before it evicts by count.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Retrospective note history.
///
/// After every insertion `back().onset - front().onset <= max_span_seconds`
/// holds whenever two or more records remain. Eviction happens at the front
/// only and never removes the sole remaining record. The deque is allocated
/// once; when it is full the oldest record is dropped before the new one is
/// appended.
#[derive(Debug, Clone)]
pub struct RetrospectiveBuffer {
    events: VecDeque<NoteRecord>,
    max_span_seconds: f64,
    capacity: usize,
}

impl RetrospectiveBuffer {
    pub fn new(max_span_seconds: f64) -> Self {
        Self::with_capacity(max_span_seconds, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(max_span_seconds: f64, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            max_span_seconds,
            capacity,
        }
    }

    /// Append a record, then evict from the front until the span fits.
    pub fn add_event(&mut self, event: NoteRecord) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.prune();
    }

    fn prune(&mut self) {
        while self.events.len() >= 2 && self.span() > self.max_span_seconds {
            self.events.pop_front();
        }
    }

    /// `back().onset - front().onset`, or 0 with fewer than two records.
    pub fn span(&self) -> f64 {
        match (self.events.front(), self.events.back()) {
            (Some(front), Some(back)) if self.events.len() >= 2 => back.onset() - front.onset(),
            _ => 0.0,
        }
    }

    /// Copy of the buffer, ordered by onset, shifted so the earliest onset is 0.
    pub fn normalized_events(&self) -> Vec<NoteRecord> {
        let mut out = Vec::with_capacity(self.events.len());
        self.normalized_into(&mut out);
        out
    }

    /// Allocation-free variant of [`normalized_events`](Self::normalized_events)
    /// when `out` already has room for [`len`](Self::len) records.
    ///
    /// Records arrive in note-off order, so overlapping notes can sit slightly
    /// out of onset order. They are reordered with a stable insertion sort,
    /// which is linear for nearly sorted input.
    pub fn normalized_into(&self, out: &mut Vec<NoteRecord>) {
        out.clear();
        out.extend(self.events.iter().copied());
        insertion_sort_by_onset(out);

        if let Some(first) = out.first().map(NoteRecord::onset) {
            for event in out.iter_mut() {
                *event = event.with_onset(event.onset() - first);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteRecord> + '_ {
        self.events.iter()
    }

    pub fn front(&self) -> Option<&NoteRecord> {
        self.events.front()
    }

    pub fn back(&self) -> Option<&NoteRecord> {
        self.events.back()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_span_seconds(&self) -> f64 {
        self.max_span_seconds
    }
}

fn insertion_sort_by_onset(events: &mut [NoteRecord]) {
    for i in 1..events.len() {
        let mut j = i;
        while j > 0 && events[j - 1].onset() > events[j].onset() {
            events.swap(j - 1, j);
            j -= 1;
        }
    }
}
