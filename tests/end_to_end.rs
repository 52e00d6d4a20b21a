//! End-to-end tests through raw host bytes and the lock-free output channel.
//!
//! Run with:
//! ```bash
//! cargo test -p retroloop --test end_to_end
//! ```

mod helpers;

use std::sync::Arc;
use std::thread;

use approx::assert_relative_eq;
use helpers::*;
use retroloop::prelude::*;
use retroloop::{midi_output_channel_with_capacity, NoteRecord, RetrospectiveBuffer};
use tracing_subscriber::filter::LevelFilter;

#[test]
fn test_capture_from_raw_bytes() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::TRACE)
        .try_init();

    let mut looper = test_looper(1);
    let (mut producer, mut consumer) = midi_output_channel_with_capacity(4096);

    play_quarters(&mut looper, &[(0, 60), (1, 64), (2, 67), (3, 64)], &mut producer);
    assert!(!consumer.has_pending());
    assert_eq!(looper.buffer().len(), 4);

    looper.controls().capture();
    idle_blocks(&mut looper, 1, &mut producer);
    assert!(looper.is_playing());

    let first = consumer.pop().expect("capture block should emit a note-on");
    assert!(first.is_note_on());
    assert_eq!(first.note(), Some(60));
    assert_eq!(first.velocity(), Some(100));
    assert_eq!(first.frame_offset, 0);
}

#[test]
fn test_running_status_note_off_is_recorded() {
    let mut looper = test_looper(2);
    let mut out = Vec::new();
    looper.process(
        TEST_BUFFER_SIZE,
        &[raw_note_on(0, 3, 50, 80), raw_note_off(480, 3, 50, true)],
        &mut out,
    );

    let recorded: Vec<NoteRecord> = looper.buffer().iter().copied().collect();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].channel(), 3);
    assert_eq!(recorded[0].velocity(), 80);
    assert_relative_eq!(recorded[0].duration(), 480.0 / TEST_SAMPLE_RATE);
}

#[test]
fn test_unmatched_and_malformed_input_is_ignored() {
    let mut looper = test_looper(3);
    let mut out = Vec::new();
    looper.process(
        TEST_BUFFER_SIZE,
        &[
            raw_note_off(0, 0, 61, false),
            RawMidiEvent::new(1, [0xF8, 0, 0], 1),
            RawMidiEvent::new(2, [0xB0, 7, 100], 3),
            RawMidiEvent::new(3, [0x00, 0, 0], 0),
        ],
        &mut out,
    );
    assert!(looper.buffer().is_empty());
    assert_eq!(looper.held_notes(), 0);
    assert!(out.is_empty());
}

#[test]
fn test_generated_output_round_trips_to_raw() {
    let mut looper = test_looper(4);
    let mut out = Vec::new();
    play_quarters(&mut looper, &[(0, 48), (1, 55), (2, 52)], &mut out);
    looper.controls().capture();
    idle_blocks(&mut looper, 200, &mut out);

    assert!(!out.is_empty());
    for event in &out {
        let raw: RawMidiEvent = (*event).into();
        assert_eq!(raw.to_midi_event().ok(), Some(*event));
        assert!([48, 52, 55].contains(&raw.data[1]));
    }
}

#[test]
fn test_controls_from_ui_thread() {
    let mut looper = test_looper(5);
    let (mut producer, mut consumer) = midi_output_channel_with_capacity(4096);
    play_quarters(&mut looper, &[(0, 60), (1, 62), (2, 64)], &mut producer);

    let controls: Arc<LooperControls> = looper.controls();
    thread::spawn(move || controls.capture())
        .join()
        .expect("UI thread panicked");

    idle_blocks(&mut looper, 100, &mut producer);
    let mut drained = Vec::new();
    assert!(consumer.drain_into(&mut drained) > 0);
    assert!(drained.iter().any(MidiEvent::is_note_on));
}

#[test]
fn test_umbrella_error_wraps_subsystems() {
    fn build(sample_rate: f64) -> retroloop::Result<Looper> {
        Ok(Looper::builder().sample_rate(sample_rate).build()?)
    }
    fn parse(bytes: [u8; 3]) -> retroloop::Result<MidiEvent> {
        Ok(RawMidiEvent::new(0, bytes, 3).to_midi_event()?)
    }

    assert!(matches!(build(100.0), Err(Error::Core(_))));
    assert!(build(44100.0).is_ok());
    assert!(matches!(parse([0xF8, 0, 0]), Err(Error::Midi(_))));
    assert!(parse([0x90, 60, 1]).is_ok());
}

#[test]
fn test_config_round_trips_through_builder() {
    let config = LooperConfig {
        sample_rate: 96000.0,
        max_span_seconds: 4.0,
        max_loop_events: 64,
        history_depth: 3,
    };
    let looper = Looper::builder()
        .config(config.clone())
        .build()
        .expect("Failed to create looper from config");
    assert_eq!(looper.config(), &config);

    let buffer: &RetrospectiveBuffer = looper.buffer();
    assert_eq!(buffer.capacity(), 64);
    assert_eq!(buffer.max_span_seconds(), 4.0);
}
