//! Blocking wake-word pipeline loop.
//!
//! ## Pipeline stages (per iteration)
//!
//! ```text
//! 1. Drain ring buffer → scratch buffer (capture grain)
//! 2. FrameAssembler re-chunks to the engine grain (exact frames only)
//! 3. feed() one engine frame
//! 4. fetch() in a loop until Empty (front-end output cadence ≤ input cadence)
//! 5. On Wake: mark the WakeSignal, broadcast a WakeEvent, sleep the cooldown
//! 6. On engine error: publish Faulted and terminate — restart is host policy
//! ```
//!
//! This entire loop runs in `spawn_blocking`, keeping the Tokio async
//! executor free for the host's own work.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc, OnceLock,
};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    acoustic::{AcousticEngine, FetchOutcome},
    buffering::{assembler::FrameAssembler, AudioConsumer, Consumer},
    ipc::events::{PipelineStatus, PipelineStatusEvent, WakeEvent},
    signal::WakeSignal,
    VigilError,
};

use super::WakeConfig;

pub struct PipelineDiagnostics {
    pub samples_in: AtomicUsize,
    pub frames_fed: AtomicUsize,
    pub fetches: AtomicUsize,
    pub detections: AtomicUsize,
    pub engine_errors: AtomicUsize,
}

impl Default for PipelineDiagnostics {
    fn default() -> Self {
        Self {
            samples_in: AtomicUsize::new(0),
            frames_fed: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            detections: AtomicUsize::new(0),
            engine_errors: AtomicUsize::new(0),
        }
    }
}

impl PipelineDiagnostics {
    pub fn reset(&self) {
        self.samples_in.store(0, Ordering::Relaxed);
        self.frames_fed.store(0, Ordering::Relaxed);
        self.fetches.store(0, Ordering::Relaxed);
        self.detections.store(0, Ordering::Relaxed);
        self.engine_errors.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            samples_in: self.samples_in.load(Ordering::Relaxed),
            frames_fed: self.frames_fed.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            engine_errors: self.engine_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub samples_in: usize,
    pub frames_fed: usize,
    pub fetches: usize,
    pub detections: usize,
    pub engine_errors: usize,
}

/// All context the pipeline needs, passed as one struct so the closure stays tidy.
pub struct PipelineContext {
    pub config: WakeConfig,
    /// Exclusively owned for the task's lifetime; dropped when `run` returns.
    pub engine: Box<dyn AcousticEngine>,
    pub consumer: AudioConsumer,
    pub running: Arc<AtomicBool>,
    pub signal: WakeSignal,
    pub wake_tx: broadcast::Sender<WakeEvent>,
    pub status_tx: broadcast::Sender<PipelineStatusEvent>,
    pub status: Arc<Mutex<PipelineStatus>>,
    pub seq: Arc<AtomicU64>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

/// Samples drained from the ring buffer per iteration (capture grain).
/// 960 samples = 60 ms at 16 kHz; the assembler re-chunks to the engine grain.
const DRAIN_CHUNK: usize = 960;

/// Minimum sleep when the ring is empty (avoids busy-wait burning a core).
const DEFAULT_SLEEP_EMPTY_MS: u64 = 5;

/// Run the blocking pipeline until `ctx.running` becomes false or the engine
/// reports a fatal failure.
pub fn run(mut ctx: PipelineContext) {
    info!("wake pipeline started");

    // Negotiate the engine grain once; everything below reuses these buffers.
    let chunk_size = ctx.engine.chunk_size();
    if chunk_size == 0 || chunk_size > crate::buffering::RING_CAPACITY {
        fault(&mut ctx, &VigilError::InvalidChunkSize(chunk_size));
        return;
    }

    let mut scratch = vec![0i16; DRAIN_CHUNK];
    let mut engine_frame = vec![0i16; chunk_size];
    let mut assembler = FrameAssembler::new(chunk_size);

    debug!(chunk_size, "engine input grain negotiated");

    'capture: loop {
        // ── 0. Check stop token ───────────────────────────────────────────
        if !ctx.running.load(Ordering::Relaxed) {
            break;
        }

        // ── 1. Drain ring buffer ──────────────────────────────────────────
        let n = ctx.consumer.pop_slice(&mut scratch);

        if n == 0 {
            // Nothing captured yet — yield to avoid burning 100 % CPU
            std::thread::sleep(Duration::from_millis(empty_sleep_ms()));
            continue;
        }

        ctx.diagnostics.samples_in.fetch_add(n, Ordering::Relaxed);

        // ── 2. Re-chunk to the engine grain ───────────────────────────────
        // Short reads stay buffered here; only exact frames go downstream.
        assembler.push(&scratch[..n]);

        while assembler.take_frame(&mut engine_frame) {
            // ── 3. Feed one engine frame ──────────────────────────────────
            if let Err(e) = ctx.engine.feed(&engine_frame) {
                fault(&mut ctx, &e);
                return;
            }
            ctx.diagnostics.frames_fed.fetch_add(1, Ordering::Relaxed);

            // ── 4. Drain all pending results before the next feed ─────────
            loop {
                match ctx.engine.fetch() {
                    Ok(FetchOutcome::Empty) => break,
                    Ok(FetchOutcome::Quiet) => {
                        ctx.diagnostics.fetches.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(FetchOutcome::Wake(detection)) => {
                        ctx.diagnostics.fetches.fetch_add(1, Ordering::Relaxed);
                        ctx.diagnostics.detections.fetch_add(1, Ordering::Relaxed);

                        // ── 5. Signal, broadcast, then cool down ──────────
                        ctx.signal.mark_waked();
                        let seq = ctx.seq.fetch_add(1, Ordering::Relaxed);
                        let event = WakeEvent {
                            seq,
                            model_index: detection.model_index,
                            keyword_index: detection.keyword_index,
                            score: detection.score,
                        };
                        let emitted = ctx.wake_tx.send(event).is_ok();
                        info!(
                            seq,
                            model_index = detection.model_index,
                            keyword_index = detection.keyword_index,
                            score = ?detection.score,
                            emitted,
                            "wake word detected"
                        );

                        // The cooldown fully precedes the next capture read,
                        // so one sustained utterance registers once.
                        std::thread::sleep(ctx.config.cooldown);
                        if !ctx.running.load(Ordering::Relaxed) {
                            break 'capture;
                        }
                    }
                    Err(e) => {
                        fault(&mut ctx, &e);
                        return;
                    }
                }
            }
        }
    }

    let snap = ctx.diagnostics.snapshot();
    info!(
        samples_in = snap.samples_in,
        frames_fed = snap.frames_fed,
        fetches = snap.fetches,
        detections = snap.detections,
        "wake pipeline stopped"
    );
}

fn empty_sleep_ms() -> u64 {
    static EMPTY_SLEEP_MS: OnceLock<u64> = OnceLock::new();
    *EMPTY_SLEEP_MS.get_or_init(|| {
        std::env::var("VIGIL_PIPELINE_EMPTY_SLEEP_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|v| v.clamp(1, 20))
            .unwrap_or(DEFAULT_SLEEP_EMPTY_MS)
    })
}

/// Fatal boundary: the pipeline silently ceasing to spot keywords would be
/// invisible, so the death is logged and published before resources drop.
fn fault(ctx: &mut PipelineContext, e: &VigilError) {
    ctx.diagnostics.engine_errors.fetch_add(1, Ordering::Relaxed);
    error!(error = %e, "wake pipeline terminated by engine failure");
    *ctx.status.lock() = PipelineStatus::Faulted;
    let sent = ctx
        .status_tx
        .send(PipelineStatusEvent {
            status: PipelineStatus::Faulted,
            detail: Some(e.to_string()),
        })
        .is_ok();
    if !sent {
        warn!("no status subscriber observed the pipeline fault");
    }
    ctx.running.store(false, Ordering::SeqCst);
}
