//! Per-block looper driver.
//!
//! [`Looper`] owns every piece of looper state and is driven from the audio
//! thread, one call to [`process`](Looper::process) per host block. The only
//! thing shared with other threads is the [`LooperControls`] handle.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::Rng;
use retroloop_midi::{MidiEvent, MidiSink, RawMidiEvent};

use crate::buffer::RetrospectiveBuffer;
use crate::config::{validate_sample_rate, LooperConfig};
use crate::generator::VariationGenerator;
use crate::history::CaptureHistory;
use crate::ingest::NoteTracker;
use crate::lockfree::LooperControls;
use crate::model::ModelBank;
use crate::record::NoteRecord;
use crate::scheduler::{FrameScheduler, PlaybackState};
use crate::Result;

/// Live looper: records, captures, models and replays variations.
///
/// # Example
///
/// ```ignore
/// use retroloop_core::Looper;
///
/// let mut looper = Looper::builder().sample_rate(48000.0).build()?;
/// let controls = looper.controls();
///
/// // Audio thread
/// let mut out = Vec::new();
/// looper.process(512, &host_events, &mut out);
///
/// // Any thread
/// controls.capture();
/// ```
#[derive(Debug)]
pub struct Looper<R = SmallRng> {
    config: LooperConfig,
    controls: Arc<LooperControls>,
    buffer: RetrospectiveBuffer,
    models: ModelBank,
    generator: VariationGenerator<R>,
    tracker: NoteTracker,
    scheduler: FrameScheduler,
    history: CaptureHistory,
    captured: Vec<NoteRecord>,
    variation: Vec<NoteRecord>,
    /// Events emitted in the current block, sorted before hand-off.
    block_out: Vec<MidiEvent>,
}

impl Looper<SmallRng> {
    pub fn builder() -> LooperBuilder {
        LooperBuilder::default()
    }

    /// Looper with an entropy-seeded generator.
    pub fn new(config: LooperConfig) -> Result<Self> {
        Self::with_generator(config, VariationGenerator::new())
    }
}

impl<R: Rng> Looper<R> {
    pub fn with_generator(config: LooperConfig, generator: VariationGenerator<R>) -> Result<Self> {
        config.validate()?;
        let events = config.max_loop_events;
        tracing::debug!(
            sample_rate = config.sample_rate,
            max_span_seconds = config.max_span_seconds,
            max_loop_events = events,
            "Looper created"
        );
        Ok(Self {
            controls: Arc::new(LooperControls::new()),
            buffer: RetrospectiveBuffer::with_capacity(config.max_span_seconds, events),
            models: ModelBank::with_capacity(events),
            generator,
            tracker: NoteTracker::new(),
            scheduler: FrameScheduler::new(config.sample_rate, events),
            history: CaptureHistory::new(config.history_depth, events),
            captured: Vec::with_capacity(events),
            variation: Vec::with_capacity(events),
            // Worst case per block: note-on and note-off for the outgoing and
            // the incoming variation, plus carried note-offs.
            block_out: Vec::with_capacity(events * 6),
            config,
        })
    }

    /// Handle for firing capture/undo from any thread.
    pub fn controls(&self) -> Arc<LooperControls> {
        Arc::clone(&self.controls)
    }

    pub fn config(&self) -> &LooperConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.scheduler.sample_rate()
    }

    /// Reset all state: buffer, models, captured loop, variation, history,
    /// held notes, queued note-offs and the frame counter.
    pub fn activate(&mut self) {
        self.buffer.clear();
        self.models.clear();
        self.tracker.clear();
        self.scheduler.reset();
        self.history.clear();
        self.captured.clear();
        self.variation.clear();
        self.block_out.clear();
        self.controls.reset();
        tracing::debug!(sample_rate = self.sample_rate(), "Looper activated");
    }

    pub fn deactivate(&mut self) {
        tracing::debug!(
            frame = self.scheduler.frame_counter(),
            "Looper deactivated"
        );
    }

    /// Host sample-rate change. A playing variation restarts from the current
    /// frame under the new rate; notes already sounding are released after the
    /// same remaining time. Recorded onsets are not rescaled.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        self.config.sample_rate = sample_rate;
        self.scheduler.set_sample_rate(sample_rate, &self.variation);
        tracing::debug!(sample_rate, "Sample rate changed");
        Ok(())
    }

    /// Process one host block of raw MIDI. Malformed events are ignored.
    pub fn process(&mut self, nframes: usize, input: &[RawMidiEvent], sink: &mut impl MidiSink) {
        for raw in input {
            if let Ok(event) = raw.to_midi_event() {
                self.ingest(&event);
            }
        }
        self.run_block(nframes, sink);
    }

    /// Like [`process`](Self::process) with pre-parsed input.
    pub fn process_events(
        &mut self,
        nframes: usize,
        input: &[MidiEvent],
        sink: &mut impl MidiSink,
    ) {
        for event in input {
            self.ingest(event);
        }
        self.run_block(nframes, sink);
    }

    fn ingest(&mut self, event: &MidiEvent) {
        let frame = self.scheduler.frame_counter() + event.frame_offset as u64;
        if let Some(record) = self
            .tracker
            .ingest(event, frame, self.scheduler.sample_rate())
        {
            self.buffer.add_event(record);
        }
    }

    fn run_block(&mut self, nframes: usize, sink: &mut impl MidiSink) {
        if self.controls.take_undo() {
            self.undo();
        }
        if self.controls.take_capture() {
            self.capture();
        }

        self.block_out.clear();

        if self.scheduler.is_playing() {
            self.scheduler
                .emit(&self.variation, nframes, &mut self.block_out);

            // A variation placed this block plays out before it may roll over.
            if !self.scheduler.started_this_block() && self.scheduler.rollover_due(nframes) {
                let block_end = self.scheduler.frame_counter() + nframes as u64;
                self.scheduler.carry_note_offs(&self.variation, block_end);
                self.regenerate();
                tracing::trace!(
                    start_frame = self.scheduler.frame_counter(),
                    events = self.variation.len(),
                    "Variation rollover"
                );
                self.scheduler
                    .emit(&self.variation, nframes, &mut self.block_out);
            }
        }
        self.scheduler.emit_note_offs(nframes, &mut self.block_out);

        sort_by_offset(&mut self.block_out);
        for event in self.block_out.drain(..) {
            sink.emit(event);
        }
        self.scheduler.advance(nframes);
    }

    /// Snapshot the buffer, rebuild models and start a new variation.
    fn capture(&mut self) {
        let now = self.scheduler.frame_counter();
        self.scheduler.carry_note_offs(&self.variation, now);
        self.buffer.normalized_into(&mut self.captured);

        if self.captured.is_empty() {
            tracing::warn!("Capture found no recorded notes");
            self.models.clear();
            self.variation.clear();
            self.scheduler.stop();
            return;
        }

        self.history.push(&self.captured);
        tracing::debug!(
            events = self.captured.len(),
            history = self.history.len(),
            "Loop captured"
        );
        self.activate_captured();
    }

    /// Discard the latest capture and fall back to the one before it.
    fn undo(&mut self) {
        let now = self.scheduler.frame_counter();
        self.scheduler.carry_note_offs(&self.variation, now);
        self.history.pop();

        match self.history.latest() {
            Some(previous) => {
                self.captured.clear();
                self.captured.extend_from_slice(previous);
                tracing::debug!(
                    events = self.captured.len(),
                    history = self.history.len(),
                    "Undo: previous capture restored"
                );
                self.activate_captured();
            }
            None => {
                self.history.clear();
                self.models.clear();
                self.captured.clear();
                self.variation.clear();
                self.scheduler.stop();
                tracing::debug!("Undo: history empty, idle");
            }
        }
    }

    fn activate_captured(&mut self) {
        self.models.build(&self.captured);
        tracing::trace!(
            pitch = self.models.pitch().len(),
            rhythm = self.models.rhythm().len(),
            duration = self.models.duration().len(),
            "Models built"
        );
        self.regenerate();
        if self.variation.is_empty() {
            tracing::warn!("Generated variation is empty, idle");
        }
    }

    /// New variation from the current captured loop, starting at this block.
    fn regenerate(&mut self) {
        self.generator.generate_into(
            &self.models,
            &self.captured,
            self.captured.len(),
            &mut self.variation,
        );
        self.scheduler.start(&self.variation);
    }

    /// Notes currently held in the retrospective buffer.
    pub fn buffer(&self) -> &RetrospectiveBuffer {
        &self.buffer
    }

    /// Captured loop the current variation was generated from.
    pub fn captured(&self) -> &[NoteRecord] {
        &self.captured
    }

    pub fn variation(&self) -> &[NoteRecord] {
        &self.variation
    }

    pub fn models(&self) -> &ModelBank {
        &self.models
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Absolute frame at the start of the next block.
    pub fn frame_counter(&self) -> u64 {
        self.scheduler.frame_counter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Notes received whose note-off has not arrived yet.
    pub fn held_notes(&self) -> usize {
        self.tracker.held()
    }
}

/// Stable insertion sort on frame offset, note-offs ahead of note-ons at the
/// same offset. Blocks carry few events and are mostly in order already.
fn sort_by_offset(events: &mut [MidiEvent]) {
    let key = |e: &MidiEvent| (e.frame_offset, e.is_note_on());
    for i in 1..events.len() {
        let mut j = i;
        while j > 0 && key(&events[j - 1]) > key(&events[j]) {
            events.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Builder for [`Looper`].
#[derive(Debug, Clone, Default)]
pub struct LooperBuilder {
    config: LooperConfig,
    seed: Option<u64>,
}

impl LooperBuilder {
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn max_span_seconds(mut self, seconds: f64) -> Self {
        self.config.max_span_seconds = seconds;
        self
    }

    pub fn max_loop_events(mut self, events: usize) -> Self {
        self.config.max_loop_events = events;
        self
    }

    pub fn history_depth(mut self, depth: usize) -> Self {
        self.config.history_depth = depth;
        self
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: LooperConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the variation generator for reproducible output.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Looper> {
        let generator = match self.seed {
            Some(seed) => VariationGenerator::seeded(seed),
            None => VariationGenerator::new(),
        };
        Looper::with_generator(self.config, generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const SR: f64 = 8000.0;

    fn looper() -> Looper {
        Looper::builder().sample_rate(SR).seed(1).build().unwrap()
    }

    fn play(looper: &mut Looper, notes: &[(f64, u8, f64)]) {
        // (onset, pitch, duration) in seconds, fed as one long block each.
        let mut input = Vec::new();
        for &(onset, pitch, duration) in notes {
            let on = (onset * SR) as usize;
            let off = ((onset + duration) * SR) as usize;
            input.push(MidiEvent::note_on(on, 0, pitch, 100));
            input.push(MidiEvent::note_off(off, 0, pitch, 0));
        }
        input.sort_by_key(|e| e.frame_offset);
        let span = input.last().map_or(0, |e| e.frame_offset + 1);
        let mut out = Vec::new();
        looper.process_events(span, &input, &mut out);
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let err = Looper::builder().sample_rate(0.0).build().unwrap_err();
        assert_eq!(err, Error::InvalidSampleRate(0.0));
        assert!(Looper::builder().history_depth(0).build().is_err());
    }

    #[test]
    fn test_ingest_fills_buffer() {
        let mut looper = looper();
        play(&mut looper, &[(0.0, 60, 0.25), (0.5, 62, 0.25)]);
        assert_eq!(looper.buffer().len(), 2);
        assert_eq!(looper.held_notes(), 0);
        assert!(!looper.is_playing());
    }

    #[test]
    fn test_capture_starts_playback() {
        let mut looper = looper();
        play(&mut looper, &[(0.0, 60, 0.25), (0.5, 62, 0.25), (1.0, 64, 0.25)]);
        let start = looper.frame_counter();

        looper.controls().capture();
        let mut out = Vec::new();
        looper.process(256, &[], &mut out);

        assert_eq!(looper.captured().len(), 3);
        assert_eq!(looper.variation().len(), 3);
        assert_eq!(looper.history_len(), 1);
        match looper.state() {
            PlaybackState::Playing { start_frame, .. } => assert_eq!(start_frame, start),
            PlaybackState::Idle => panic!("expected playback"),
        }
        // First variation note sounds at the capture block's first frame.
        assert!(out[0].is_note_on());
        assert_eq!(out[0].frame_offset, 0);
    }

    #[test]
    fn test_empty_capture_stays_idle() {
        let mut looper = looper();
        looper.controls().capture();
        let mut out = Vec::new();
        looper.process(256, &[], &mut out);
        assert!(!looper.is_playing());
        assert!(out.is_empty());
        assert_eq!(looper.history_len(), 0);
    }

    #[test]
    fn test_activate_resets() {
        let mut looper = looper();
        play(&mut looper, &[(0.0, 60, 0.25), (0.5, 62, 0.25)]);
        looper.controls().capture();
        looper.process(64, &[], &mut Vec::new());
        looper.controls().capture();

        looper.activate();
        assert_eq!(looper.frame_counter(), 0);
        assert!(looper.buffer().is_empty());
        assert!(looper.models().is_empty());
        assert!(looper.variation().is_empty());
        assert_eq!(looper.history_len(), 0);
        assert!(!looper.controls().capture_pending());
        assert_eq!(looper.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_set_sample_rate() {
        let mut looper = looper();
        assert!(looper.set_sample_rate(48000.0).is_ok());
        assert_eq!(looper.sample_rate(), 48000.0);
        assert_eq!(looper.config().sample_rate, 48000.0);
        assert!(looper.set_sample_rate(1.0).is_err());
        assert_eq!(looper.sample_rate(), 48000.0);
    }

    #[test]
    fn test_malformed_raw_input_is_ignored() {
        let mut looper = looper();
        let input = [
            RawMidiEvent::default(),
            RawMidiEvent::new(0, [0x12, 0x34, 0x56], 3),
            RawMidiEvent::new(1, [0x90, 60, 100], 3),
        ];
        looper.process(64, &input, &mut Vec::new());
        assert_eq!(looper.held_notes(), 1);
    }

    #[test]
    fn test_sort_by_offset_is_stable() {
        let mut events = vec![
            MidiEvent::note_on(5, 0, 60, 100),
            MidiEvent::note_off(2, 0, 61, 0),
            MidiEvent::note_on(2, 0, 62, 100),
        ];
        sort_by_offset(&mut events);
        let notes: Vec<_> = events.iter().filter_map(|e| e.note()).collect();
        assert_eq!(notes, vec![61, 62, 60]);
    }

    #[test]
    fn test_sort_puts_note_off_before_note_on_at_same_offset() {
        let mut events = vec![
            MidiEvent::note_on(3, 0, 60, 100),
            MidiEvent::note_off(3, 0, 60, 0),
        ];
        sort_by_offset(&mut events);
        assert!(events[0].is_note_off());
        assert!(events[1].is_note_on());
    }
}
