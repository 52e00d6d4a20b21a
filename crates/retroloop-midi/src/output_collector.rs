//! Lock-free hand-off of generated MIDI from the audio thread.
//!
//! The looper writes into a [`MidiOutputProducer`] during `process()`; the host
//! side (or a test) drains the paired [`MidiOutputConsumer`].

use crate::event::MidiEvent;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

/// Default capacity for the MIDI output ring buffer
const DEFAULT_CAPACITY: usize = 256;

/// Producer half, owned by the audio thread.
pub struct MidiOutputProducer {
    producer: HeapProd<MidiEvent>,
}

impl MidiOutputProducer {
    /// Returns false if the buffer is full.
    #[inline]
    pub fn push(&mut self, event: MidiEvent) -> bool {
        self.producer.try_push(event).is_ok()
    }

    /// Push as many events as fit, returning how many were written.
    #[inline]
    pub fn push_slice(&mut self, events: &[MidiEvent]) -> usize {
        self.producer.push_slice(events)
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// Consumer half, owned by whoever forwards MIDI to the host.
pub struct MidiOutputConsumer {
    consumer: HeapCons<MidiEvent>,
}

impl MidiOutputConsumer {
    #[inline]
    pub fn pop(&mut self) -> Option<MidiEvent> {
        self.consumer.try_pop()
    }

    /// Drain all pending events into a vector
    pub fn drain_all(&mut self) -> Vec<MidiEvent> {
        let mut events = Vec::with_capacity(self.consumer.occupied_len());
        self.drain_into(&mut events);
        events
    }

    /// Drain pending events into an existing buffer, returning the count.
    pub fn drain_into(&mut self, out: &mut Vec<MidiEvent>) -> usize {
        let mut count = 0;
        while let Some(event) = self.consumer.try_pop() {
            out.push(event);
            count += 1;
        }
        count
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }
}

/// Create a new MIDI output channel
pub fn midi_output_channel() -> (MidiOutputProducer, MidiOutputConsumer) {
    midi_output_channel_with_capacity(DEFAULT_CAPACITY)
}

/// Create a new MIDI output channel with specified capacity
pub fn midi_output_channel_with_capacity(
    capacity: usize,
) -> (MidiOutputProducer, MidiOutputConsumer) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (
        MidiOutputProducer { producer },
        MidiOutputConsumer { consumer },
    )
}
