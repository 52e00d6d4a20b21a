//! Test helpers and fixtures for retroloop integration tests.
//!
//! Hosts are simulated by manual block cycles: raw note bytes go in at exact
//! frame offsets, generated MIDI comes out through the lock-free channel.

#![allow(dead_code)]

use retroloop::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard block size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Create a seeded test looper at [`TEST_SAMPLE_RATE`].
pub fn test_looper(seed: u64) -> Looper {
    Looper::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .seed(seed)
        .build()
        .expect("Failed to create test looper")
}

/// Raw host note-on.
pub fn raw_note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> RawMidiEvent {
    RawMidiEvent::new(frame_offset, [0x90 | channel, note, velocity], 3)
}

/// Raw host note-off. Some hosts send note-on with velocity 0 instead.
pub fn raw_note_off(
    frame_offset: usize,
    channel: u8,
    note: u8,
    running_status: bool,
) -> RawMidiEvent {
    if running_status {
        RawMidiEvent::new(frame_offset, [0x90 | channel, note, 0], 3)
    } else {
        RawMidiEvent::new(frame_offset, [0x80 | channel, note, 0x40], 3)
    }
}

/// Play `(beat, note)` pairs as quarter notes at 120 BPM, half a beat long,
/// one block at a time. Whatever the looper emits meanwhile goes to `sink`.
pub fn play_quarters(looper: &mut Looper, notes: &[(u32, u8)], sink: &mut impl MidiSink) {
    let beat = (TEST_SAMPLE_RATE * 0.5) as u64;
    let base = looper.frame_counter();
    let mut timeline: Vec<(u64, RawMidiEvent)> = Vec::new();
    for &(at, note) in notes {
        let on = base + at as u64 * beat;
        timeline.push((on, raw_note_on(0, 0, note, 100)));
        timeline.push((on + beat / 2, raw_note_off(0, 0, note, false)));
    }
    timeline.sort_by_key(|(frame, _)| *frame);

    let end = timeline.last().map_or(base, |(frame, _)| frame + 1);
    while looper.frame_counter() < end {
        let start = looper.frame_counter();
        let stop = start + TEST_BUFFER_SIZE as u64;
        let block: Vec<RawMidiEvent> = timeline
            .iter()
            .filter(|(frame, _)| (start..stop).contains(frame))
            .map(|(frame, raw)| RawMidiEvent {
                frame_offset: (frame - start) as usize,
                ..*raw
            })
            .collect();
        looper.process(TEST_BUFFER_SIZE, &block, sink);
    }
}

/// Run `blocks` silent blocks.
pub fn idle_blocks(looper: &mut Looper, blocks: usize, sink: &mut impl MidiSink) {
    for _ in 0..blocks {
        looper.process(TEST_BUFFER_SIZE, &[], sink);
    }
}
