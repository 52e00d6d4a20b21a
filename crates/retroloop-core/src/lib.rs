//! Live-looping MIDI generator core.
//!
//! Records performed notes into a time-bounded buffer, learns first-order
//! pitch/rhythm/duration transitions from a captured loop, and plays back
//! freshly generated variations in sample-accurate alignment with the host
//! block clock, regenerating each time a variation ends.
//!
//! # Primary API
//!
//! - [`Looper`] / [`LooperBuilder`]: per-block driver and lifecycle
//! - [`LooperControls`]: capture/undo triggers, safe to fire from any thread
//! - [`RetrospectiveBuffer`], [`ModelBank`], [`VariationGenerator`]: the
//!   building blocks, usable on their own
//!
//! # Example
//!
//! ```ignore
//! use retroloop_core::Looper;
//!
//! let mut looper = Looper::builder().sample_rate(48000.0).seed(7).build()?;
//! let controls = looper.controls();
//! looper.activate();
//!
//! let mut out = Vec::new();
//! looper.process(512, &host_events, &mut out);
//! controls.capture();
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::LooperConfig;

mod lockfree;
pub use lockfree::{AtomicFlag, LooperControls};

mod record;
pub use record::NoteRecord;

mod buffer;
pub use buffer::{RetrospectiveBuffer, DEFAULT_BUFFER_CAPACITY};

mod model;
pub use model::{Groups, Millis, ModelBank, Successors, TransitionTable, MIN_INTERVAL_SECS};

mod generator;
pub use generator::{VariationGenerator, DEFAULT_INTERVAL_SECS};

mod ingest;
pub use ingest::{NoteTracker, PendingNote};

mod scheduler;
pub use scheduler::{FrameScheduler, PlaybackState, ScheduledNoteOff};

mod history;
pub use history::CaptureHistory;

mod looper;
pub use looper::{Looper, LooperBuilder};

pub use retroloop_midi as midi;
