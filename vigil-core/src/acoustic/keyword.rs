//! Keyword detector stage for the staged engine shape.
//!
//! The `KeywordDetector` trait mirrors the classic model interface: create
//! from model data, keep private state across frames, return a positive
//! keyword index on a match. `BurstDetector` is the built-in stand-in used
//! when no trained model backend is compiled in.

use crate::buffering::frame::PcmFrame;
use crate::error::Result;

/// Contract for keyword classification backends.
///
/// Implementors are stateful — detection windows span many frames — and the
/// state belongs to one detector instance created once and reused.
pub trait KeywordDetector: Send + 'static {
    /// Classify one conditioned frame.
    ///
    /// Returns `0` for no match, or the matched keyword index (`> 0`).
    ///
    /// # Errors
    /// A fatal backend failure; the pipeline terminates on it.
    fn detect(&mut self, frame: &PcmFrame) -> Result<i32>;
}

/// Energy-burst detector: `burst_frames` consecutive frames above the RMS
/// threshold count as a match with keyword index 1.
///
/// Not a trained model — a development stand-in that exercises the staged
/// shape end-to-end with real audio levels.
#[derive(Debug, Clone)]
pub struct BurstDetector {
    /// RMS amplitude (in i16 units) above which a frame counts toward a burst.
    threshold: f32,
    /// Consecutive loud frames required for a match.
    burst_frames: u32,
    streak: u32,
}

impl BurstDetector {
    pub fn new(threshold: f32, burst_frames: u32) -> Self {
        Self {
            threshold,
            burst_frames: burst_frames.max(1),
            streak: 0,
        }
    }

    fn rms(samples: &[i16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / samples.len() as f64).sqrt() as f32
    }
}

impl Default for BurstDetector {
    fn default() -> Self {
        // ~8 loud frames of 10 ms ≈ an 80 ms sustained burst.
        Self::new(2000.0, 8)
    }
}

impl KeywordDetector for BurstDetector {
    fn detect(&mut self, frame: &PcmFrame) -> Result<i32> {
        if Self::rms(&frame.samples) >= self.threshold {
            self.streak += 1;
            if self.streak >= self.burst_frames {
                self.streak = 0;
                return Ok(1);
            }
        } else {
            self.streak = 0;
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(amplitude: i16, len: usize) -> PcmFrame {
        PcmFrame::new(vec![amplitude; len], 16_000)
    }

    #[test]
    fn quiet_frames_never_match() {
        let mut det = BurstDetector::new(2000.0, 3);
        for _ in 0..20 {
            assert_eq!(det.detect(&frame(100, 160)).unwrap(), 0);
        }
    }

    #[test]
    fn sustained_burst_matches_once() {
        let mut det = BurstDetector::new(2000.0, 3);
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 0);
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 0);
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 1);
        // Streak restarts after a match.
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 0);
    }

    #[test]
    fn silence_resets_the_streak() {
        let mut det = BurstDetector::new(2000.0, 3);
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 0);
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 0);
        assert_eq!(det.detect(&frame(0, 160)).unwrap(), 0);
        assert_eq!(det.detect(&frame(8000, 160)).unwrap(), 0);
    }
}
