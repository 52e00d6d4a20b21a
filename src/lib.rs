//! # Retroloop - Live-looping MIDI generator
//!
//! Listens to what was just played, learns its pitch, rhythm and duration
//! transitions on demand, and keeps playing fresh variations of it in
//! sample-accurate sync with the host's block clock.
//!
//! ## Architecture
//!
//! Retroloop is an umbrella crate that coordinates:
//! - **retroloop-core** - Retrospective buffer, Markov models, variation
//!   generator, per-block scheduler
//! - **retroloop-midi** - RT-safe MIDI events, sinks, lock-free output channel
//!
//! ## Quick Start
//!
//! ```ignore
//! use retroloop::prelude::*;
//!
//! let mut looper = Looper::builder().sample_rate(48000.0).build()?;
//! let controls = looper.controls();
//! let (mut producer, mut consumer) = midi_output_channel();
//!
//! // Audio thread, once per block
//! looper.process(nframes, &host_events, &mut producer);
//!
//! // UI thread
//! controls.capture();
//! let generated = consumer.drain_all();
//! ```

/// Re-export of retroloop-core for direct access
pub use retroloop_core as core;

/// Re-export of retroloop-midi for direct access
pub use retroloop_midi as midi;

pub use retroloop_core::{
    // Lifecycle
    Looper,
    LooperBuilder,
    LooperConfig,
    LooperControls,
    PlaybackState,

    // Building blocks
    ModelBank,
    NoteRecord,
    RetrospectiveBuffer,
    VariationGenerator,
};

pub use retroloop_midi::{
    midi_output_channel, midi_output_channel_with_capacity, MidiEvent, MidiOutputConsumer,
    MidiOutputProducer, MidiSink, RawMidiEvent,
};

mod error;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        midi_output_channel, Error, Looper, LooperBuilder, LooperConfig, LooperControls,
        MidiEvent, MidiSink, PlaybackState, RawMidiEvent, Result,
    };
}
