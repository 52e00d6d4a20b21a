//! Sample-accurate mapping of a variation onto host processing blocks.
//!
//! The scheduler owns the absolute frame counter and the placement of the
//! current variation on that timeline. A note at loop-relative `onset` sounds
//! at `start_frame + round(onset * sample_rate)` and is released
//! `round(duration * sample_rate)` frames later. An event is emitted in the
//! block whose half-open window `[frame_counter, frame_counter + nframes)`
//! contains its frame.

use retroloop_midi::{MidiEvent, MidiSink};

use crate::record::NoteRecord;

/// Playback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing {
        /// Absolute frame aligned with the variation's time zero.
        start_frame: u64,
        /// Frames until the variation's last note ends.
        total_frames: u64,
    },
}

/// A note-off left over from a variation that is no longer playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledNoteOff {
    pub frame: u64,
    /// Frame of the note-on this release belongs to.
    pub on_frame: u64,
    pub channel: u8,
    pub pitch: u8,
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    sample_rate: f64,
    frame_counter: u64,
    state: PlaybackState,
    note_offs: Vec<ScheduledNoteOff>,
}

impl FrameScheduler {
    /// `capacity` bounds the carried-over note-off queue.
    pub fn new(sample_rate: f64, capacity: usize) -> Self {
        Self {
            sample_rate,
            frame_counter: 0,
            state: PlaybackState::Idle,
            note_offs: Vec::with_capacity(capacity),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Switch to a new sample rate between blocks.
    ///
    /// Notes of `playing` that have sounded but are not yet released are
    /// queued at the old rate, every queued release is rescaled so it still
    /// falls the same time from now, and `playing` restarts at the current
    /// frame under the new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f64, playing: &[NoteRecord]) {
        let now = self.frame_counter;
        self.carry_note_offs(playing, now);

        let ratio = sample_rate / self.sample_rate;
        for off in &mut self.note_offs {
            let remaining = off.frame.saturating_sub(now) as f64 * ratio;
            off.frame = now + remaining.round() as u64;
        }

        self.sample_rate = sample_rate;
        if self.is_playing() {
            self.start(playing);
        }
    }

    /// Absolute frame at the start of the current block.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// True when the playing variation was placed at the current block start.
    pub fn started_this_block(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Playing { start_frame, .. } if start_frame == self.frame_counter
        )
    }

    /// Note-offs waiting to be emitted in a later block.
    pub fn scheduled_note_offs(&self) -> &[ScheduledNoteOff] {
        &self.note_offs
    }

    #[inline]
    pub fn secs_to_frames(&self, secs: f64) -> u64 {
        (secs * self.sample_rate).round() as u64
    }

    /// Length of a variation in frames: up to the end of its last note, or
    /// the first note's duration if that rounds to zero.
    pub fn variation_frames(&self, variation: &[NoteRecord]) -> u64 {
        let (Some(first), Some(last)) = (variation.first(), variation.last()) else {
            return 0;
        };
        match self.secs_to_frames(last.end()) {
            0 => self.secs_to_frames(first.duration()),
            frames => frames,
        }
    }

    /// Place `variation` at the current block start. An empty variation
    /// returns the scheduler to idle.
    pub fn start(&mut self, variation: &[NoteRecord]) {
        self.state = if variation.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Playing {
                start_frame: self.frame_counter,
                total_frames: self.variation_frames(variation),
            }
        };
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
    }

    /// Emit the note-ons and note-offs of `variation` falling in this block.
    /// Returns the number of events emitted.
    pub fn emit(
        &self,
        variation: &[NoteRecord],
        nframes: usize,
        sink: &mut impl MidiSink,
    ) -> usize {
        let PlaybackState::Playing { start_frame, .. } = self.state else {
            return 0;
        };
        let block_start = self.frame_counter;
        let block_end = block_start + nframes as u64;
        let in_block = |frame: u64| (block_start..block_end).contains(&frame);

        let mut emitted = 0;
        for note in variation {
            let on = start_frame + self.secs_to_frames(note.onset());
            let off = on + self.secs_to_frames(note.duration());

            if in_block(on) {
                sink.emit(MidiEvent::note_on(
                    (on - block_start) as usize,
                    note.channel(),
                    note.pitch(),
                    note.velocity(),
                ));
                emitted += 1;
            }
            if in_block(off) {
                sink.emit(MidiEvent::note_off(
                    (off - block_start) as usize,
                    note.channel(),
                    note.pitch(),
                    0,
                ));
                emitted += 1;
            }
        }
        emitted
    }

    /// True when this block reaches the end of the playing variation.
    pub fn rollover_due(&self, nframes: usize) -> bool {
        match self.state {
            PlaybackState::Playing {
                start_frame,
                total_frames,
            } => {
                total_frames > 0
                    && self.frame_counter + nframes as u64 >= start_frame + total_frames
            }
            PlaybackState::Idle => false,
        }
    }

    /// Queue the note-offs of `variation` that are still owed at `boundary`:
    /// notes whose note-on frame is before `boundary` and whose note-off frame
    /// is at or after it. Call before the variation is replaced or stopped.
    pub fn carry_note_offs(&mut self, variation: &[NoteRecord], boundary: u64) {
        let PlaybackState::Playing { start_frame, .. } = self.state else {
            return;
        };
        for note in variation {
            let on = start_frame + self.secs_to_frames(note.onset());
            let off = on + self.secs_to_frames(note.duration());
            if on >= boundary || off < boundary {
                continue;
            }
            if self.note_offs.len() == self.note_offs.capacity() {
                tracing::warn!(pitch = note.pitch(), "note-off queue full, dropping release");
                continue;
            }
            self.note_offs.push(ScheduledNoteOff {
                frame: off,
                on_frame: on,
                channel: note.channel(),
                pitch: note.pitch(),
            });
        }
    }

    /// Emit queued note-offs falling in this block and forget them.
    ///
    /// `events` holds what the block has produced so far. A queued release
    /// whose key is struck again there before the release is due is moved up
    /// to that note-on, so the new note is not cut short by the old release.
    pub fn emit_note_offs(&mut self, nframes: usize, events: &mut Vec<MidiEvent>) -> usize {
        let block_start = self.frame_counter;
        let block_end = block_start + nframes as u64;
        let produced = events.len();
        let mut emitted = 0;

        let mut i = 0;
        while i < self.note_offs.len() {
            let off = self.note_offs[i];
            let restrike = events[..produced]
                .iter()
                .filter(|e| {
                    e.is_note_on() && e.channel_num() == off.channel && e.note() == Some(off.pitch)
                })
                .map(|e| block_start + e.frame_offset as u64)
                .filter(|&frame| frame > off.on_frame && frame < off.frame)
                .min();

            let frame = match restrike {
                Some(frame) => frame,
                None if off.frame < block_end => off.frame,
                None => {
                    i += 1;
                    continue;
                }
            };
            self.note_offs.swap_remove(i);
            if frame >= block_start {
                events.push(MidiEvent::note_off(
                    (frame - block_start) as usize,
                    off.channel,
                    off.pitch,
                    0,
                ));
                emitted += 1;
            }
        }
        emitted
    }

    /// Move to the next block.
    #[inline]
    pub fn advance(&mut self, nframes: usize) {
        self.frame_counter += nframes as u64;
    }

    /// Back to frame zero, idle, nothing queued.
    pub fn reset(&mut self) {
        self.frame_counter = 0;
        self.state = PlaybackState::Idle;
        self.note_offs.clear();
    }
}
