//! Staged engine shape: front-end and detector as separate stages.
//!
//! Composes any [`FrontEnd`] with any [`KeywordDetector`] behind the
//! [`AcousticEngine`] capability contract, so the pipeline cannot tell the
//! staged generation from the combined one.

use tracing::debug;

use super::conditioner::FrontEnd;
use super::keyword::KeywordDetector;
use super::{AcousticEngine, Detection, FetchOutcome};
use crate::error::Result;

/// A front-end plus a separately-owned detector, presented as one engine.
pub struct StagedEngine<F: FrontEnd, D: KeywordDetector> {
    chunk_size: usize,
    front_end: F,
    detector: D,
}

impl<F: FrontEnd, D: KeywordDetector> StagedEngine<F, D> {
    /// `chunk_size` is the input grain in samples this engine advertises;
    /// the classic static configuration uses 160 (10 ms at 16 kHz).
    pub fn new(chunk_size: usize, front_end: F, detector: D) -> Self {
        Self {
            chunk_size,
            front_end,
            detector,
        }
    }
}

impl<F: FrontEnd, D: KeywordDetector> AcousticEngine for StagedEngine<F, D> {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn feed(&mut self, frame: &[i16]) -> Result<()> {
        self.front_end.provide(frame)
    }

    fn fetch(&mut self) -> Result<FetchOutcome> {
        let Some(conditioned) = self.front_end.fetch() else {
            return Ok(FetchOutcome::Empty);
        };

        let matched = self.detector.detect(&conditioned)?;
        if matched > 0 {
            debug!(keyword_index = matched, "staged detector matched");
            return Ok(FetchOutcome::Wake(Detection {
                model_index: 0,
                keyword_index: matched as usize,
                score: None,
            }));
        }
        Ok(FetchOutcome::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffering::frame::PcmFrame;
    use crate::error::VigilError;

    /// Front-end that emits one conditioned frame per `interval` inputs,
    /// modelling the slower output cadence of a buffering suppressor.
    struct DecimatingFrontEnd {
        interval: usize,
        fed: usize,
        queue: std::collections::VecDeque<PcmFrame>,
    }

    impl FrontEnd for DecimatingFrontEnd {
        fn provide(&mut self, frame: &[i16]) -> Result<()> {
            self.fed += 1;
            if self.fed % self.interval == 0 {
                self.queue.push_back(PcmFrame::new(frame.to_vec(), 16_000));
            }
            Ok(())
        }

        fn fetch(&mut self) -> Option<PcmFrame> {
            self.queue.pop_front()
        }
    }

    struct IndexDetector {
        answers: Vec<i32>,
        calls: usize,
    }

    impl KeywordDetector for IndexDetector {
        fn detect(&mut self, _frame: &PcmFrame) -> Result<i32> {
            let answer = self.answers.get(self.calls).copied().unwrap_or(0);
            self.calls += 1;
            Ok(answer)
        }
    }

    struct FailingDetector;

    impl KeywordDetector for FailingDetector {
        fn detect(&mut self, _frame: &PcmFrame) -> Result<i32> {
            Err(VigilError::Engine("detector state corrupted".into()))
        }
    }

    #[test]
    fn slower_output_cadence_drains_to_empty() {
        let fe = DecimatingFrontEnd {
            interval: 3,
            fed: 0,
            queue: Default::default(),
        };
        let det = IndexDetector {
            answers: vec![0],
            calls: 0,
        };
        let mut engine = StagedEngine::new(160, fe, det);

        engine.feed(&[0i16; 160]).unwrap();
        assert_eq!(engine.fetch().unwrap(), FetchOutcome::Empty);
        engine.feed(&[0i16; 160]).unwrap();
        assert_eq!(engine.fetch().unwrap(), FetchOutcome::Empty);
        engine.feed(&[0i16; 160]).unwrap();
        assert_eq!(engine.fetch().unwrap(), FetchOutcome::Quiet);
        assert_eq!(engine.fetch().unwrap(), FetchOutcome::Empty);
    }

    #[test]
    fn positive_detector_value_becomes_a_wake() {
        let fe = DecimatingFrontEnd {
            interval: 1,
            fed: 0,
            queue: Default::default(),
        };
        let det = IndexDetector {
            answers: vec![0, 2],
            calls: 0,
        };
        let mut engine = StagedEngine::new(160, fe, det);

        engine.feed(&[0i16; 160]).unwrap();
        assert_eq!(engine.fetch().unwrap(), FetchOutcome::Quiet);
        engine.feed(&[0i16; 160]).unwrap();
        match engine.fetch().unwrap() {
            FetchOutcome::Wake(d) => {
                assert_eq!(d.keyword_index, 2);
                assert_eq!(d.model_index, 0);
            }
            other => panic!("expected wake, got {other:?}"),
        }
    }

    #[test]
    fn detector_failure_propagates_as_fatal() {
        let fe = DecimatingFrontEnd {
            interval: 1,
            fed: 0,
            queue: Default::default(),
        };
        let mut engine = StagedEngine::new(160, fe, FailingDetector);
        engine.feed(&[0i16; 160]).unwrap();
        assert!(engine.fetch().is_err());
    }
}
