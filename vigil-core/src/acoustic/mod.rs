//! Acoustic engine abstraction.
//!
//! `AcousticEngine` is the capability contract the pipeline is written
//! against: negotiate a chunk size, feed exact-sized frames, drain results.
//! Two mutually exclusive engine generations implement it:
//!
//! - the *staged* shape (`StagedEngine`): a signal-conditioning front-end
//!   composed with a separately-owned keyword detector;
//! - the *combined* shape (`RustpotterEngine`, feature `rustpotter`): one
//!   instance built from an [`EngineBlueprint`](crate::registry::EngineBlueprint)
//!   that folds detection status into its fetch results.
//!
//! Builds pick one shape; the pipeline never branches on which is in use.

pub mod conditioner;
pub mod keyword;
pub mod staged;
pub mod stub;

#[cfg(feature = "rustpotter")]
pub mod spotter;

#[cfg(feature = "rustpotter")]
pub use spotter::RustpotterEngine;

use crate::error::Result;

/// A single qualifying detection drained from the engine.
///
/// Valid only for the fetch call that produced it; the pipeline copies what
/// it needs into a `WakeEvent` and never retains the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Index of the matched model, in registry order.
    pub model_index: usize,
    /// Index of the matched keyword as reported by the detector.
    pub keyword_index: usize,
    /// Confidence in [0.0, 1.0] when the backend reports one.
    pub score: Option<f32>,
}

/// One drained engine output.
///
/// The front-end may emit output at a slower cadence than the input feed
/// rate, and may have several results queued; the pipeline drains with a
/// `fetch()` loop until `Empty` before feeding the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Nothing pending — stop draining.
    Empty,
    /// A conditioned frame was consumed without a keyword match.
    Quiet,
    /// A keyword matched.
    Wake(Detection),
}

/// Contract for acoustic processing backends.
///
/// Construction is backend-specific (`from_blueprint`, `new`, ...); teardown
/// is `Drop`. The engine is exclusively owned by the pipeline task for its
/// whole lifetime.
pub trait AcousticEngine: Send + 'static {
    /// Required input chunk size in samples, fixed at initialization.
    /// Every `feed()` call must pass exactly this many samples.
    fn chunk_size(&self) -> usize;

    /// Accept one engine-sized frame of mono 16 kHz PCM.
    ///
    /// # Errors
    /// A fatal processing failure; the pipeline terminates on it.
    fn feed(&mut self, frame: &[i16]) -> Result<()>;

    /// Drain one pending result. Call in a loop until `Ok(FetchOutcome::Empty)`.
    ///
    /// # Errors
    /// A fatal processing failure; the pipeline terminates on it.
    fn fetch(&mut self) -> Result<FetchOutcome>;
}
