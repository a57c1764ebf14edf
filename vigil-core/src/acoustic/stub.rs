//! `StubEngine` — placeholder backend with no real model.
//!
//! Lets the full capture → pipeline → wake-signal path run end-to-end in
//! builds without the `rustpotter` feature and in tests. Never detects
//! unless configured with a deterministic wake interval.

use tracing::debug;

use super::{AcousticEngine, Detection, FetchOutcome};
use crate::error::{Result, VigilError};
use crate::registry::EngineBlueprint;

/// Combined-shape stand-in: one fetchable result per fed frame.
pub struct StubEngine {
    chunk_size: usize,
    /// Wake on every nth fed frame; `None` never wakes.
    wake_every: Option<u64>,
    frames_fed: u64,
    pending: Option<Option<Detection>>,
}

impl StubEngine {
    /// `chunk_size` in samples; 1600 (100 ms at 16 kHz) is a sensible default.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            wake_every: None,
            frames_fed: 0,
            pending: None,
        }
    }

    /// Deterministically wake on every `n`th frame (for demos and tests).
    pub fn with_wake_every(mut self, n: u64) -> Self {
        self.wake_every = Some(n.max(1));
        self
    }

    /// Combined-shape constructor: consumes the blueprint whether or not
    /// construction succeeds, mirroring the real backend's contract.
    pub fn from_blueprint(blueprint: EngineBlueprint) -> Result<Self> {
        if blueprint.models.is_empty() {
            return Err(VigilError::Engine("blueprint carries no models".into()));
        }
        debug!(models = blueprint.models.len(), "stub engine built from blueprint");
        Ok(Self::new(1_600))
    }
}

impl AcousticEngine for StubEngine {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn feed(&mut self, frame: &[i16]) -> Result<()> {
        debug_assert_eq!(frame.len(), self.chunk_size);
        self.frames_fed += 1;
        let wake = self
            .wake_every
            .map(|n| self.frames_fed % n == 0)
            .unwrap_or(false);
        self.pending = Some(wake.then(|| Detection {
            model_index: 0,
            keyword_index: 1,
            score: Some(1.0),
        }));
        Ok(())
    }

    fn fetch(&mut self) -> Result<FetchOutcome> {
        Ok(match self.pending.take() {
            None => FetchOutcome::Empty,
            Some(None) => FetchOutcome::Quiet,
            Some(Some(detection)) => FetchOutcome::Wake(detection),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AudioFormat, EngineKind, ModelEntry, OperatingMode};

    fn blueprint(models: Vec<ModelEntry>) -> EngineBlueprint {
        EngineBlueprint {
            format: AudioFormat::default(),
            models,
            kind: EngineKind::SpeechRecognition,
            mode: OperatingMode::LowCost,
        }
    }

    #[test]
    fn never_wakes_by_default() {
        let mut engine = StubEngine::new(4);
        for _ in 0..50 {
            engine.feed(&[0i16; 4]).unwrap();
            assert_eq!(engine.fetch().unwrap(), FetchOutcome::Quiet);
            assert_eq!(engine.fetch().unwrap(), FetchOutcome::Empty);
        }
    }

    #[test]
    fn wakes_on_the_configured_interval() {
        let mut engine = StubEngine::new(4).with_wake_every(3);
        let mut wakes = 0;
        for _ in 0..9 {
            engine.feed(&[0i16; 4]).unwrap();
            loop {
                match engine.fetch().unwrap() {
                    FetchOutcome::Empty => break,
                    FetchOutcome::Quiet => {}
                    FetchOutcome::Wake(d) => {
                        assert_eq!(d.keyword_index, 1);
                        wakes += 1;
                    }
                }
            }
        }
        assert_eq!(wakes, 3);
    }

    #[test]
    fn blueprint_is_consumed_on_success_and_on_failure() {
        let ok = blueprint(vec![ModelEntry {
            name: "hey".into(),
            path: "hey.rpw".into(),
        }]);
        // Moved in and dropped inside the constructor on success...
        assert!(StubEngine::from_blueprint(ok).is_ok());

        // ...and equally on the failure path. Exactly-once release is the
        // move itself; a second release does not compile.
        let empty = blueprint(vec![]);
        assert!(StubEngine::from_blueprint(empty).is_err());
    }
}
