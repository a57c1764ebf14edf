//! Model registry and engine blueprint for the combined engine shape.
//!
//! The registry lives in an externally-owned, read-only directory of model
//! files. It is loaded once at startup; a missing or empty registry is a
//! fatal configuration error because no detection is possible without it.
//!
//! An [`EngineBlueprint`] is built from the registry plus the requested
//! operating mode, then *consumed by value* when the engine is constructed.
//! Move semantics make the release unconditional and exactly-once on both
//! the success and the failure path — there is no manual free to forget.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, VigilError};

/// File extension of keyword model files recognised by the registry.
const MODEL_EXTENSION: &str = "rpw";

/// One named model in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    /// Model name — the file stem.
    pub name: String,
    pub path: PathBuf,
}

/// Ordered, enumerable list of named keyword models.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelEntry>,
}

impl ModelRegistry {
    /// Enumerate model files under `dir`, ordered by name.
    ///
    /// # Errors
    /// `VigilError::EmptyRegistry` when the directory is absent or holds no
    /// model files. Callers must treat this as fatal before any capture
    /// configuration happens.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                return Err(VigilError::EmptyRegistry {
                    path: dir.to_path_buf(),
                })
            }
        };

        let mut models = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_model = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION))
                .unwrap_or(false);
            if !is_model {
                continue;
            }
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            models.push(ModelEntry { name, path });
        }
        models.sort_by(|a, b| a.name.cmp(&b.name));

        if models.is_empty() {
            return Err(VigilError::EmptyRegistry {
                path: dir.to_path_buf(),
            });
        }

        info!(dir = %dir.display(), count = models.len(), "model registry loaded");
        Ok(Self { models })
    }

    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Input format the engine is built for. The capture side must deliver
/// exactly this; a mismatch is fatal at startup, never resampled away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

/// What the combined engine instance is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    SpeechRecognition,
}

/// Operating mode trade-off requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Lower CPU budget, slightly stricter detection threshold.
    LowCost,
    /// Full-quality scoring.
    HighAccuracy,
}

/// Everything a combined-shape engine needs to construct itself.
///
/// Built from the registry, handed to the engine constructor *by value*,
/// and dropped there once the instance exists (or failed to).
#[derive(Debug, Clone)]
pub struct EngineBlueprint {
    pub format: AudioFormat,
    pub models: Vec<ModelEntry>,
    pub kind: EngineKind,
    pub mode: OperatingMode,
}

impl EngineBlueprint {
    pub fn from_registry(registry: &ModelRegistry, format: AudioFormat, mode: OperatingMode) -> Self {
        Self {
            format,
            models: registry.models().to_vec(),
            kind: EngineKind::SpeechRecognition,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_model(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"model-bytes").unwrap();
    }

    #[test]
    fn missing_directory_is_an_empty_registry() {
        let err = ModelRegistry::load("/definitely/not/a/real/registry").unwrap_err();
        assert!(matches!(err, VigilError::EmptyRegistry { .. }));
    }

    #[test]
    fn directory_without_models_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "notes.txt");
        let err = ModelRegistry::load(dir.path()).unwrap_err();
        assert!(matches!(err, VigilError::EmptyRegistry { .. }));
    }

    #[test]
    fn models_are_ordered_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "zeta.rpw");
        write_model(dir.path(), "alpha.rpw");
        write_model(dir.path(), "milo.RPW");

        let registry = ModelRegistry::load(dir.path()).unwrap();
        let names: Vec<&str> = registry.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "milo", "zeta"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn blueprint_copies_registry_order() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "b.rpw");
        write_model(dir.path(), "a.rpw");

        let registry = ModelRegistry::load(dir.path()).unwrap();
        let blueprint = EngineBlueprint::from_registry(
            &registry,
            AudioFormat::default(),
            OperatingMode::LowCost,
        );
        assert_eq!(blueprint.models.len(), 2);
        assert_eq!(blueprint.models[0].name, "a");
        assert_eq!(blueprint.kind, EngineKind::SpeechRecognition);
        assert_eq!(blueprint.format.sample_rate_hz, 16_000);
    }
}
