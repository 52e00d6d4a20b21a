//! Lock-free trigger flags shared between a control thread and the audio thread.

use std::sync::atomic::{AtomicBool, Ordering};

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::AcqRel)
    }

    /// Test-and-clear. Returns true exactly once per `set(true)`.
    #[inline]
    pub fn take(&self) -> bool {
        self.swap(false)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// User/host commands for a looper, writable from any thread.
///
/// The audio thread reads each flag exactly once per block via `take()`, so a
/// command fired between two blocks is observed once and only once.
#[derive(Debug, Default)]
pub struct LooperControls {
    capture: AtomicFlag,
    undo: AtomicFlag,
}

impl LooperControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a capture of the retrospective buffer at the next block.
    #[inline]
    pub fn capture(&self) {
        self.capture.set(true);
    }

    /// Request that the latest capture be discarded at the next block.
    #[inline]
    pub fn undo(&self) {
        self.undo.set(true);
    }

    #[inline]
    pub fn capture_pending(&self) -> bool {
        self.capture.get()
    }

    #[inline]
    pub(crate) fn take_capture(&self) -> bool {
        self.capture.take()
    }

    #[inline]
    pub(crate) fn take_undo(&self) -> bool {
        self.undo.take()
    }

    pub(crate) fn reset(&self) {
        self.capture.set(false);
        self.undo.set(false);
    }
}
