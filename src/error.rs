//! Centralized error type for the retroloop umbrella crate.
//!
//! Wraps the subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] retroloop_core::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] retroloop_midi::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
