//! # vigil-core
//!
//! Reusable wake-word streaming engine SDK.
//!
//! ## Architecture
//!
//! ```text
//! Microphone → AudioCapture → SPSC RingBuffer → Pipeline(spawn_blocking)
//!                                                    │
//!                                             FrameAssembler
//!                                          (capture grain → engine grain)
//!                                                    │
//!                                         AcousticEngine feed/fetch
//!                                                    │
//!                               WakeSignal + broadcast::Sender<WakeEvent>
//! ```
//!
//! The audio callback is zero-alloc. All heap work happens in the pipeline
//! thread, which owns the engine exclusively and enforces the post-detection
//! cooldown before the next capture read.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod acoustic;
pub mod audio;
pub mod buffering;
pub mod error;
pub mod ipc;
pub mod registry;
pub mod service;
pub mod signal;

// Convenience re-exports for downstream crates
pub use acoustic::{AcousticEngine, Detection, FetchOutcome};
pub use error::VigilError;
pub use ipc::events::{PipelineStatus, PipelineStatusEvent, WakeEvent};
pub use registry::{AudioFormat, EngineBlueprint, ModelRegistry, OperatingMode};
pub use service::{WakeConfig, WakeService};
pub use signal::WakeSignal;

#[cfg(feature = "rustpotter")]
pub use acoustic::RustpotterEngine;
