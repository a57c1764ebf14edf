//! Combined engine shape backed by rustpotter.
//!
//! One instance covers conditioning (rustpotter's band-pass/gain filters)
//! and keyword scoring; detection status is folded into `fetch()` results.
//! Built from an [`EngineBlueprint`] which is consumed on construction.

use rustpotter::{Rustpotter, RustpotterConfig, SampleFormat};
use tracing::{debug, info};

use super::{AcousticEngine, Detection, FetchOutcome};
use crate::error::{Result, VigilError};
use crate::registry::{EngineBlueprint, OperatingMode};

/// Keyword-spotting engine built from the model registry.
pub struct RustpotterEngine {
    detector: Rustpotter,
    /// Model names in registry order; maps a detection back to its index.
    names: Vec<String>,
    chunk_size: usize,
    /// Scratch for the i16 → f32 conversion rustpotter expects.
    convert_buf: Vec<f32>,
    /// One queued result per fed frame.
    pending: Option<Option<Detection>>,
}

impl RustpotterEngine {
    /// Build the engine from a blueprint, consuming it.
    ///
    /// The blueprint is dropped here on every path — after the instance
    /// exists, and equally when construction fails.
    ///
    /// # Errors
    /// `VigilError::Engine` when rustpotter rejects the configuration or a
    /// model file fails to load.
    pub fn from_blueprint(blueprint: EngineBlueprint) -> Result<Self> {
        let mut config = RustpotterConfig::default();
        config.fmt.sample_rate = blueprint.format.sample_rate_hz as usize;
        config.fmt.channels = blueprint.format.channels;
        config.fmt.sample_format = SampleFormat::F32;
        config.detector.threshold = match blueprint.mode {
            OperatingMode::LowCost => 0.5,
            OperatingMode::HighAccuracy => 0.4,
        };

        let mut detector = Rustpotter::new(&config)
            .map_err(|e| VigilError::Engine(format!("rustpotter init: {e}")))?;

        let mut names = Vec::with_capacity(blueprint.models.len());
        for entry in &blueprint.models {
            let path = entry.path.to_string_lossy();
            detector
                .add_wakeword_from_file(&entry.name, &path)
                .map_err(|e| {
                    VigilError::Engine(format!("loading model '{}': {e}", entry.name))
                })?;
            names.push(entry.name.clone());
        }

        let chunk_size = detector.get_samples_per_frame();
        info!(
            models = names.len(),
            chunk_size,
            sample_rate = blueprint.format.sample_rate_hz,
            "rustpotter engine ready"
        );

        Ok(Self {
            detector,
            names,
            chunk_size,
            convert_buf: vec![0f32; chunk_size],
            pending: None,
        })
    }
}

impl AcousticEngine for RustpotterEngine {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn feed(&mut self, frame: &[i16]) -> Result<()> {
        if frame.len() != self.chunk_size {
            return Err(VigilError::Engine(format!(
                "fed {} samples, engine requires {}",
                frame.len(),
                self.chunk_size
            )));
        }

        self.convert_buf.clear();
        self.convert_buf
            .extend(frame.iter().map(|&s| s as f32 / 32768.0));

        let detection = self.detector.process_f32(&self.convert_buf).map(|d| {
            let model_index = self
                .names
                .iter()
                .position(|n| *n == d.name)
                .unwrap_or_default();
            debug!(name = %d.name, score = d.score, "rustpotter matched");
            Detection {
                model_index,
                keyword_index: model_index,
                score: Some(d.score),
            }
        });
        self.pending = Some(detection);
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
