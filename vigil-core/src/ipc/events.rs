//! Events broadcast by the wake service.
//!
//! | Event | Channel |
//! |-------|---------|
//! | `WakeEvent` | `WakeService::subscribe_wake` |
//! | `PipelineStatusEvent` | `WakeService::subscribe_status` |
//!
//! The `WakeSignal` flag remains the canonical wake indicator; `WakeEvent`
//! exists for diagnostics (which model/keyword fired) and is lossy for slow
//! subscribers by design.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wake events
// ---------------------------------------------------------------------------

/// Emitted once per qualifying detection, before the cooldown begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WakeEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Index of the model that matched, in registry order.
    pub model_index: usize,
    /// Index of the matched keyword as reported by the detector.
    pub keyword_index: usize,
    /// Detector confidence in [0.0, 1.0], if the backend reports one.
    pub score: Option<f32>,
}

// ---------------------------------------------------------------------------
// Pipeline status events
// ---------------------------------------------------------------------------

/// Emitted when the pipeline changes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatusEvent {
    pub status: PipelineStatus,
    /// Optional human-readable detail (e.g. the fatal error message).
    pub detail: Option<String>,
}

/// Current state of the wake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    /// Service created but `start()` not yet called.
    Idle,
    /// Actively capturing audio and spotting keywords.
    Listening,
    /// Capture stopped by request; the service may be restarted.
    Stopped,
    /// The engine reported a fatal failure — restart is the host's decision.
    Faulted,
}
