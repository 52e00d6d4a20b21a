//! Bounded stack of captured loops for undo.

use crate::record::NoteRecord;

/// Ring of the most recent captures, newest last.
///
/// Every slot is allocated up front with room for `max_events` records, so
/// pushing a loop of at most that length copies into existing storage. When
/// full, a push overwrites the oldest capture.
#[derive(Debug, Clone)]
pub struct CaptureHistory {
    slots: Vec<Vec<NoteRecord>>,
    /// Index of the oldest capture.
    head: usize,
    len: usize,
}

impl CaptureHistory {
    pub fn new(depth: usize, max_events: usize) -> Self {
        let depth = depth.max(1);
        Self {
            slots: (0..depth).map(|_| Vec::with_capacity(max_events)).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn index(&self, logical: usize) -> usize {
        (self.head + logical) % self.slots.len()
    }

    pub fn push(&mut self, captured: &[NoteRecord]) {
        let slot = if self.len == self.slots.len() {
            let oldest = self.head;
            self.head = (self.head + 1) % self.slots.len();
            oldest
        } else {
            self.len += 1;
            self.index(self.len - 1)
        };
        let dst = &mut self.slots[slot];
        dst.clear();
        dst.extend_from_slice(captured);
    }

    /// Most recent capture.
    pub fn latest(&self) -> Option<&[NoteRecord]> {
        if self.len == 0 {
            return None;
        }
        Some(&self.slots[self.index(self.len - 1)])
    }

    /// Drop the most recent capture. Returns false if there was none.
    pub fn pop(&mut self) -> bool {
        if self.len == 0 {
            return false;
        }
        self.len -= 1;
        let slot = self.index(self.len);
        self.slots[slot].clear();
        true
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.head = 0;
        self.len = 0;
    }

    /// Captures from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &[NoteRecord]> + '_ {
        (0..self.len).map(move |i| self.slots[self.index(i)].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pitch: u8) -> Vec<NoteRecord> {
        vec![NoteRecord::new(0.0, pitch, 100, 0.1, 0)]
    }

    fn pitches(history: &CaptureHistory) -> Vec<u8> {
        history.iter().map(|c| c[0].pitch()).collect()
    }

    #[test]
    fn test_push_and_latest() {
        let mut history = CaptureHistory::new(3, 4);
        assert!(history.latest().is_none());
        history.push(&single(60));
        history.push(&single(62));
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap()[0].pitch(), 62);
    }

    #[test]
    fn test_pop_restores_previous() {
        let mut history = CaptureHistory::new(3, 4);
        history.push(&single(60));
        history.push(&single(62));
        assert!(history.pop());
        assert_eq!(history.latest().unwrap()[0].pitch(), 60);
        assert!(history.pop());
        assert!(history.is_empty());
        assert!(!history.pop());
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut history = CaptureHistory::new(2, 4);
        history.push(&single(60));
        history.push(&single(62));
        history.push(&single(64));
        assert_eq!(history.len(), 2);
        assert_eq!(pitches(&history), vec![62, 64]);

        history.pop();
        history.push(&single(65));
        history.push(&single(67));
        assert_eq!(pitches(&history), vec![65, 67]);
    }

    #[test]
    fn test_empty_capture_is_kept() {
        let mut history = CaptureHistory::new(2, 4);
        history.push(&[]);
        assert_eq!(history.len(), 1);
        assert!(history.latest().unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = CaptureHistory::new(2, 4);
        history.push(&single(60));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.depth(), 2);
    }
}
