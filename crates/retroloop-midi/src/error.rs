//! Error types for the MIDI subsystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI parse error: {0:?}")]
    Parse(midi_msg::ParseError),

    #[error("Expected a channel voice message")]
    NotChannelVoice,

    #[error("Empty MIDI message")]
    Empty,
}

pub type Result<T> = std::result::Result<T, Error>;
