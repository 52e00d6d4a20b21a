//! Pairs host note-ons with their note-offs to produce [`NoteRecord`]s.

use retroloop_midi::MidiEvent;

use crate::model::MIN_INTERVAL_SECS;
use crate::record::NoteRecord;

const CHANNELS: usize = 16;
const PITCHES: usize = 128;

/// A note-on still waiting for its note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNote {
    /// Absolute host frame of the note-on.
    pub frame: u64,
    pub velocity: u8,
}

/// Fixed 16 x 128 table of held notes, keyed by (channel, pitch).
///
/// A repeated note-on for a held key replaces the earlier one. Note-offs with
/// no matching note-on are dropped.
#[derive(Debug, Clone)]
pub struct NoteTracker {
    slots: Box<[Option<PendingNote>]>,
    held: usize,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self {
            slots: vec![None; CHANNELS * PITCHES].into_boxed_slice(),
            held: 0,
        }
    }

    #[inline]
    fn slot(channel: u8, pitch: u8) -> usize {
        (channel as usize & 0x0F) * PITCHES + (pitch as usize & 0x7F)
    }

    pub fn note_on(&mut self, frame: u64, channel: u8, pitch: u8, velocity: u8) {
        let slot = &mut self.slots[Self::slot(channel, pitch)];
        if slot.is_none() {
            self.held += 1;
        }
        *slot = Some(PendingNote { frame, velocity });
    }

    /// Remove and return the held note for this key, if any.
    pub fn note_off(&mut self, channel: u8, pitch: u8) -> Option<PendingNote> {
        let pending = self.slots[Self::slot(channel, pitch)].take();
        if pending.is_some() {
            self.held -= 1;
        }
        pending
    }

    pub fn pending(&self, channel: u8, pitch: u8) -> Option<PendingNote> {
        self.slots[Self::slot(channel, pitch)]
    }

    /// Number of notes currently held.
    pub fn held(&self) -> usize {
        self.held
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.held = 0;
    }

    /// Feed one host event received at `frame`.
    ///
    /// Returns the completed note when `event` closes a held note. Onset is
    /// the note-on frame in seconds; duration is floored at 1 ms. Anything
    /// other than a note message is ignored.
    pub fn ingest(
        &mut self,
        event: &MidiEvent,
        frame: u64,
        sample_rate: f64,
    ) -> Option<NoteRecord> {
        let pitch = event.note()?;
        let channel = event.channel_num();

        if event.is_note_on() {
            self.note_on(frame, channel, pitch, event.velocity().unwrap_or(0));
            return None;
        }
        if !event.is_note_off() {
            return None;
        }

        let on = self.note_off(channel, pitch)?;
        let held_frames = frame.saturating_sub(on.frame);
        let duration = (held_frames as f64 / sample_rate).max(MIN_INTERVAL_SECS);
        Some(NoteRecord::new(
            on.frame as f64 / sample_rate,
            pitch,
            on.velocity,
            duration,
            channel,
        ))
    }
}

impl Default for NoteTracker {
    fn default() -> Self {
        Self::new()
    }
}
