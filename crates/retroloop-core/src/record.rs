//! The note value recorded from performance and produced by generation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One performed (or generated) note.
///
/// `onset` is loop-relative seconds once captured; absolute seconds since
/// activation while it sits in the retrospective buffer. Records are plain
/// values: ordering is by onset and simultaneous onsets are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    onset: f64,
    pitch: u8,
    velocity: u8,
    duration: f64,
    channel: u8,
}

impl NoteRecord {
    /// Pitch and velocity are masked to 7 bits, channel to 4 bits. A negative
    /// or NaN duration becomes 0.
    pub fn new(onset: f64, pitch: u8, velocity: u8, duration: f64, channel: u8) -> Self {
        Self {
            onset,
            pitch: pitch & 0x7F,
            velocity: velocity & 0x7F,
            duration: duration.max(0.0),
            channel: channel & 0x0F,
        }
    }

    #[inline]
    pub fn onset(&self) -> f64 {
        self.onset
    }

    #[inline]
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    #[inline]
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Time at which the note stops sounding.
    #[inline]
    pub fn end(&self) -> f64 {
        self.onset + self.duration
    }

    /// Copy of this record moved to a new onset.
    #[inline]
    pub fn with_onset(self, onset: f64) -> Self {
        Self { onset, ..self }
    }
}

impl fmt::Display for NoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event(t={:.3}, n={}, v={}, d={:.3}, ch={})",
            self.onset, self.pitch, self.velocity, self.duration, self.channel
        )
    }
}
