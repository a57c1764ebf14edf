//! Shared wake flag crossing the pipeline/application task boundary.
//!
//! A single boolean with last-write-wins semantics: the pipeline sets it on a
//! qualifying detection, any consumer may read and reset it. Detections that
//! land while the flag is still set are coalesced, not counted — consumers
//! needing to enumerate wake events must poll faster than the set/reset cycle.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cloneable handle to the process-wide wake flag.
///
/// The flag carries no composite invariant, so a single atomic is enough —
/// no lock is involved on either side of the task boundary.
#[derive(Debug, Clone, Default)]
pub struct WakeSignal(Arc<AtomicBool>);

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current flag value. No side effect; safe from any concurrent context.
    pub fn is_waked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag. Idempotent.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Set the flag. Called by the pipeline on a qualifying detection.
    /// Idempotent while already set.
    pub fn mark_waked(&self) {
        self.0.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_cleared() {
        let signal = WakeSignal::new();
        assert!(!signal.is_waked());
    }

    #[test]
    fn mark_then_reset_round_trip() {
        let signal = WakeSignal::new();
        signal.mark_waked();
        assert!(signal.is_waked());
        signal.reset();
        assert!(!signal.is_waked());
    }

    #[test]
    fn repeated_marks_coalesce() {
        let signal = WakeSignal::new();
        signal.mark_waked();
        signal.mark_waked();
        assert!(signal.is_waked());
        // One reset clears everything — there is no queue behind the flag.
        signal.reset();
        assert!(!signal.is_waked());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let signal = WakeSignal::new();
        let reader = signal.clone();
        signal.mark_waked();
        assert!(reader.is_waked());
        reader.reset();
        assert!(!signal.is_waked());
    }
}
