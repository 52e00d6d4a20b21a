//! First-order Markov transition tables learned from a captured loop.
//!
//! Three independent tables are kept: pitch to pitch, inter-onset interval to
//! the following inter-onset interval, and duration to duration. Timing keys
//! are quantized to whole milliseconds. Successors are stored with duplicates,
//! so uniform sampling over a key's successors reproduces the observed
//! transition frequencies without explicit weights.

use core::fmt;

use rand::Rng;

use crate::record::NoteRecord;

/// Smallest interval or duration the generator will ever produce, in seconds.
pub const MIN_INTERVAL_SECS: f64 = 0.001;

/// Time quantized to whole milliseconds (seconds rounded to 3 decimals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millis(u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    #[inline]
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Round seconds to the nearest millisecond. Negative and NaN become 0.
    #[inline]
    pub fn from_secs(secs: f64) -> Self {
        Self((secs * 1000.0).round() as u32)
    }

    /// Like [`from_secs`](Self::from_secs) after flooring at 1 ms.
    #[inline]
    pub fn from_secs_floored(secs: f64) -> Self {
        Self::from_secs(secs.max(MIN_INTERVAL_SECS))
    }

    /// Floored inter-onset interval between two records.
    #[inline]
    pub fn between(earlier: &NoteRecord, later: &NoteRecord) -> Self {
        Self::from_secs_floored(later.onset() - earlier.onset())
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.as_secs())
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge<K> {
    from: K,
    order: u32,
    to: K,
}

/// Multiset transition table stored as a flat edge arena.
///
/// Edges are appended during a build and then sorted by `(from, insertion
/// order)`, so every key's successors form one contiguous run in the order
/// they were observed. Lookups are a binary search.
#[derive(Debug, Clone)]
pub struct TransitionTable<K> {
    edges: Vec<Edge<K>>,
}

impl<K: Copy + Ord> TransitionTable<K> {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Total number of stored transitions (duplicates included).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of distinct source keys.
    pub fn key_count(&self) -> usize {
        self.groups().count()
    }

    pub fn contains_key(&self, from: K) -> bool {
        !self.successors(from).is_empty()
    }

    /// Successors of `from` in observation order. Empty if the key is unknown.
    pub fn successors(&self, from: K) -> Successors<'_, K> {
        let start = self.edges.partition_point(|e| e.from < from);
        let len = self.edges[start..].partition_point(|e| e.from == from);
        Successors {
            edges: &self.edges[start..start + len],
        }
    }

    /// Draw one successor of `from` uniformly. Consumes a random draw only
    /// when the key has successors.
    pub fn sample<R: Rng>(&self, from: K, rng: &mut R) -> Option<K> {
        let successors = self.successors(from);
        if successors.is_empty() {
            return None;
        }
        successors.get(rng.gen_range(0..successors.len()))
    }

    /// `(key, successors)` runs in ascending key order.
    pub fn groups(&self) -> Groups<'_, K> {
        Groups { rest: &self.edges }
    }

    fn push(&mut self, from: K, to: K) {
        let order = self.edges.len() as u32;
        self.edges.push(Edge { from, order, to });
    }

    fn seal(&mut self) {
        self.edges.sort_unstable_by_key(|e| (e.from, e.order));
    }
}

impl<K: Copy + Ord> Default for TransitionTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// View over one key's successors.
#[derive(Debug, Clone, Copy)]
pub struct Successors<'a, K> {
    edges: &'a [Edge<K>],
}

impl<'a, K: Copy> Successors<'a, K> {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<K> {
        self.edges.get(index).map(|e| e.to)
    }

    pub fn iter(self) -> impl Iterator<Item = K> + 'a {
        self.edges.iter().map(|e| e.to)
    }

    pub fn to_vec(&self) -> Vec<K> {
        self.iter().collect()
    }
}

/// Iterator over the key runs of a sealed [`TransitionTable`].
pub struct Groups<'a, K> {
    rest: &'a [Edge<K>],
}

impl<'a, K: Copy + Ord> Iterator for Groups<'a, K> {
    type Item = (K, Successors<'a, K>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.rest.first()?.from;
        let len = self.rest.partition_point(|e| e.from == key);
        let (run, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some((key, Successors { edges: run }))
    }
}

/// Pitch, rhythm and duration models built from one captured loop.
#[derive(Debug, Clone, Default)]
pub struct ModelBank {
    pitch: TransitionTable<u8>,
    rhythm: TransitionTable<Millis>,
    duration: TransitionTable<Millis>,
}

impl ModelBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size every table for loops of up to `max_events` records.
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            pitch: TransitionTable::with_capacity(max_events),
            rhythm: TransitionTable::with_capacity(max_events),
            duration: TransitionTable::with_capacity(max_events + 1),
        }
    }

    pub fn clear(&mut self) {
        self.pitch.clear();
        self.rhythm.clear();
        self.duration.clear();
    }

    /// Replace all three tables with the transitions of `captured`.
    ///
    /// Loops shorter than two records leave every table empty. For the last
    /// pair the rhythm successor wraps to the loop's first interval, and the
    /// last record's duration is guaranteed a successor (the first record's
    /// duration) so generation never dead-ends at the loop boundary.
    pub fn build(&mut self, captured: &[NoteRecord]) {
        self.clear();
        if captured.len() < 2 {
            return;
        }

        let first_ioi = Millis::between(&captured[0], &captured[1]);
        for (i, pair) in captured.windows(2).enumerate() {
            let (cur, next) = (&pair[0], &pair[1]);

            self.pitch.push(cur.pitch(), next.pitch());

            let following = captured
                .get(i + 2)
                .map_or(first_ioi, |after| Millis::between(next, after));
            self.rhythm.push(Millis::between(cur, next), following);

            self.duration.push(
                Millis::from_secs(cur.duration()),
                Millis::from_secs(next.duration()),
            );
        }

        self.pitch.seal();
        self.rhythm.seal();
        self.duration.seal();

        let last_key = Millis::from_secs(captured[captured.len() - 1].duration());
        if !self.duration.contains_key(last_key) {
            self.duration
                .push(last_key, Millis::from_secs(captured[0].duration()));
            self.duration.seal();
        }
    }

    pub fn pitch(&self) -> &TransitionTable<u8> {
        &self.pitch
    }

    pub fn rhythm(&self) -> &TransitionTable<Millis> {
        &self.rhythm
    }

    pub fn duration(&self) -> &TransitionTable<Millis> {
        &self.duration
    }

    /// True when no model is available (never built, or built from < 2 notes).
    pub fn is_empty(&self) -> bool {
        self.pitch.is_empty() && self.rhythm.is_empty() && self.duration.is_empty()
    }
}

impl fmt::Display for ModelBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Pitch Model ---")?;
        for (key, successors) in self.pitch.groups() {
            write!(f, "  Note {key} -> {{ ")?;
            for next in successors.iter() {
                write!(f, "{next} ")?;
            }
            writeln!(f, "}}")?;
        }
        writeln!(f, "--- Rhythm (IOI) Model (seconds) ---")?;
        for (key, successors) in self.rhythm.groups() {
            write!(f, "  IOI {key}s -> {{ ")?;
            for next in successors.iter() {
                write!(f, "{next}s ")?;
            }
            writeln!(f, "}}")?;
        }
        writeln!(f, "--- Duration Model (seconds) ---")?;
        for (key, successors) in self.duration.groups() {
            write!(f, "  Dur {key}s -> {{ ")?;
            for next in successors.iter() {
                write!(f, "{next}s ")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
