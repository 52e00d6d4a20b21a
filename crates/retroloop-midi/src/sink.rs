//! Destinations for MIDI generated on the audio thread.

use smallvec::{Array, SmallVec};

use crate::event::MidiEvent;
use crate::output_collector::MidiOutputProducer;

/// Something that accepts MIDI events emitted at an in-block frame offset.
///
/// Implementations called from the audio thread must not block. Growable
/// sinks (`Vec`, `SmallVec`) should be pre-reserved by the caller.
pub trait MidiSink {
    /// Emit one event. `event.frame_offset` is relative to the current block.
    fn emit(&mut self, event: MidiEvent);
}

impl MidiSink for Vec<MidiEvent> {
    #[inline]
    fn emit(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

impl<A: Array<Item = MidiEvent>> MidiSink for SmallVec<A> {
    #[inline]
    fn emit(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

impl MidiSink for MidiOutputProducer {
    /// Drops the event if the ring buffer is full.
    #[inline]
    fn emit(&mut self, event: MidiEvent) {
        if !self.push(event) {
            tracing::trace!(?event, "MIDI output ring full, event dropped");
        }
    }
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    #[inline]
    fn emit(&mut self, event: MidiEvent) {
        (**self).emit(event);
    }
}
