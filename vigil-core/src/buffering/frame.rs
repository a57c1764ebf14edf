//! Typed audio frame passed between the front-end and keyword detector stages.

/// A contiguous block of mono 16-bit PCM samples at a known sample rate.
///
/// Allocated on the non-RT pipeline thread only; the capture callback never
/// touches this type.
#[derive(Debug, Clone)]
pub struct PcmFrame {
    /// Mono signed 16-bit samples.
    pub samples: Vec<i16>,
    /// Sample rate in Hz (16000 for every engine in this workspace).
    pub sample_rate: u32,
}

impl PcmFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }
}
