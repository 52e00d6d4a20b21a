//! Stochastic walk over a [`ModelBank`] producing new note sequences.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::model::{Millis, ModelBank, MIN_INTERVAL_SECS};
use crate::record::NoteRecord;

/// Interval used when neither the model nor the seed loop offers one.
pub const DEFAULT_INTERVAL_SECS: f64 = 0.5;

/// Generates variations of a seed loop.
///
/// Each step draws, in this order, a pitch, an inter-onset interval and a
/// duration from the models, falling back to the seed loop (indexed
/// cyclically) when the current state has no recorded successor. Velocity
/// and channel are always carried from the seed. Output is a pure function of
/// the models, the seed and the random draws consumed.
#[derive(Debug, Clone)]
pub struct VariationGenerator<R = SmallRng> {
    rng: R,
}

impl VariationGenerator<SmallRng> {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for VariationGenerator<SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> VariationGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate `count` notes from `seed`. Empty when `seed` is empty or
    /// `count` is zero.
    pub fn generate(
        &mut self,
        models: &ModelBank,
        seed: &[NoteRecord],
        count: usize,
    ) -> Vec<NoteRecord> {
        let mut out = Vec::with_capacity(count);
        self.generate_into(models, seed, count, &mut out);
        out
    }

    /// Like [`generate`](Self::generate), writing into `out` (cleared first).
    /// Does not allocate when `out` has room for `count` records.
    pub fn generate_into(
        &mut self,
        models: &ModelBank,
        seed: &[NoteRecord],
        count: usize,
        out: &mut Vec<NoteRecord>,
    ) {
        out.clear();
        let Some(first) = seed.first() else {
            return;
        };
        if count == 0 {
            return;
        }

        let mut prev = first.with_onset(0.0);
        out.push(prev);
        let mut playhead = 0.0;

        for i in 1..count {
            let source = seed[i % seed.len()];

            let pitch = models
                .pitch()
                .sample(prev.pitch(), &mut self.rng)
                .unwrap_or(source.pitch());

            let prev_ioi = previous_interval(out, seed);
            let ioi = models
                .rhythm()
                .sample(prev_ioi, &mut self.rng)
                .map(Millis::as_secs)
                .or_else(|| seed_interval(seed, i))
                .unwrap_or(DEFAULT_INTERVAL_SECS)
                .max(MIN_INTERVAL_SECS);

            let duration = models
                .duration()
                .sample(Millis::from_secs(prev.duration()), &mut self.rng)
                .map_or(source.duration(), Millis::as_secs)
                .max(MIN_INTERVAL_SECS);

            playhead += ioi;
            let note = NoteRecord::new(
                playhead,
                pitch,
                source.velocity(),
                duration,
                source.channel(),
            );
            out.push(note);
            prev = note;
        }
    }
}

/// Rhythm state: the last generated interval, else the seed's first interval,
/// else the default. Always floored and quantized.
fn previous_interval(generated: &[NoteRecord], seed: &[NoteRecord]) -> Millis {
    match (generated, seed) {
        ([.., a, b], _) => Millis::between(a, b),
        (_, [a, b, ..]) => Millis::between(a, b),
        _ => Millis::from_secs_floored(DEFAULT_INTERVAL_SECS),
    }
}

/// The seed's own interval leading into position `i`, if positive.
fn seed_interval(seed: &[NoteRecord], i: usize) -> Option<f64> {
    if i == 0 || i >= seed.len() {
        return None;
    }
    let ioi = seed[i].onset() - seed[i - 1].onset();
    (ioi > 0.0).then_some(ioi)
}
