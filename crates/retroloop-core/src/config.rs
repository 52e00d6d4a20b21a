//! Looper configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub(crate) const MIN_SAMPLE_RATE: f64 = 8000.0;
pub(crate) const MAX_SAMPLE_RATE: f64 = 384000.0;

/// Configuration for a [`Looper`](crate::Looper) instance.
///
/// `max_loop_events` is the fixed capacity every audio-thread container is
/// sized from: the retrospective buffer, the captured loop, the variation,
/// the model arenas and each history slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    pub sample_rate: f64,
    /// Time window of the retrospective buffer in seconds.
    pub max_span_seconds: f64,
    pub max_loop_events: usize,
    /// Captured loops kept for undo.
    pub history_depth: usize,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            max_span_seconds: 10.0,
            max_loop_events: 1024,
            history_depth: 10,
        }
    }
}

impl LooperConfig {
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate)?;
        if !self.max_span_seconds.is_finite() || self.max_span_seconds <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_span_seconds {} must be positive and finite",
                self.max_span_seconds
            )));
        }
        if self.max_loop_events < 2 {
            return Err(Error::InvalidConfig(format!(
                "max_loop_events {} must be at least 2",
                self.max_loop_events
            )));
        }
        if self.history_depth == 0 {
            return Err(Error::InvalidConfig(
                "history_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
        return Err(Error::InvalidSampleRate(sample_rate));
    }
    Ok(())
}
