//! MIDI types and output plumbing for the retroloop looper.
//!
//! - **Events**: [`MidiEvent`] (parsed, sample-accurate) and [`RawMidiEvent`]
//!   (host byte form)
//! - **Sinks**: [`MidiSink`], the capability to emit MIDI at an in-block offset
//! - **Output collection**: lock-free SPSC channel for MIDI produced on the
//!   audio thread
//!
//! # Example
//!
//! ```ignore
//! use retroloop_midi::{midi_output_channel, MidiEvent, MidiSink};
//!
//! let (mut producer, mut consumer) = midi_output_channel();
//! producer.emit(MidiEvent::note_on(0, 0, 60, 100));
//! let events = consumer.drain_all();
//! ```

pub mod error;
pub use error::{Error, Result};

pub use event::{MidiEvent, RawMidiEvent};
pub use output_collector::{
    midi_output_channel, midi_output_channel_with_capacity, MidiOutputConsumer,
    MidiOutputProducer,
};
pub use sink::MidiSink;

// Re-export essential upstream types (users shouldn't need to import midi-msg directly)
pub use midi_msg::{Channel, ChannelVoiceMsg};

pub(crate) mod event;
pub mod output_collector;
pub(crate) mod sink;
