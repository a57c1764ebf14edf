//! `WakeService` — top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! WakeService::new()
//!     └─► start(engine)  → capture open, pipeline spawned, status = Listening
//!         └─► stop()     → running=false, stream dropped, status = Stopped
//! ```
//!
//! `start()`/`stop()` are idempotent: calling them in the wrong state returns
//! an error rather than panicking. A `Faulted` pipeline is never restarted
//! from inside the core — that policy belongs to the host.
//!
//! ## Threading
//!
//! `cpal::Stream` is `!Send` on Windows/macOS (COM / CoreAudio thread
//! affinity). `AudioCapture` is therefore created *inside* the
//! `spawn_blocking` closure so it never crosses a thread boundary. A sync
//! oneshot channel propagates any open-device errors back to the `start()`
//! caller. The acoustic engine is moved into the same closure and owned by
//! the pipeline task until it exits.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    acoustic::AcousticEngine,
    audio::AudioCapture,
    buffering::create_audio_ring,
    error::{Result, VigilError},
    ipc::events::{PipelineStatus, PipelineStatusEvent, WakeEvent},
    signal::WakeSignal,
};

/// Broadcast channel capacity: wake events are rare, status changes rarer.
const BROADCAST_CAP: usize = 64;

/// Configuration for `WakeService`.
#[derive(Debug, Clone)]
pub struct WakeConfig {
    /// Fixed delay after a detection before capture resumes. One sustained
    /// utterance registers at most one wake. Default: 400 ms.
    pub cooldown: Duration,
    /// Preferred capture device name; `None` selects the system default.
    pub preferred_input_device: Option<String>,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(400),
            preferred_input_device: None,
        }
    }
}

/// The top-level service handle.
///
/// `WakeService` is `Send + Sync` — all fields use interior mutability.
/// Wrap in `Arc<WakeService>` to share between the host's polling loop and
/// event-forwarding tasks.
pub struct WakeService {
    config: WakeConfig,
    /// Stop token of the current run; a fresh `Arc` is issued per `start()`.
    /// An old pipeline only ever observes its own token, so a later start
    /// cannot re-arm a thread still winding down (e.g. mid-cooldown).
    run_token: Mutex<Arc<AtomicBool>>,
    /// Canonical status (written atomically via Mutex, read from the host).
    status: Arc<Mutex<PipelineStatus>>,
    /// Debounced wake flag shared with consumers.
    signal: WakeSignal,
    /// Broadcast sender for wake events.
    wake_tx: broadcast::Sender<WakeEvent>,
    /// Broadcast sender for status events.
    status_tx: broadcast::Sender<PipelineStatusEvent>,
    /// Monotonically increasing wake sequence counter.
    seq: Arc<AtomicU64>,
    /// Shared pipeline diagnostics counters.
    diagnostics: Arc<pipeline::PipelineDiagnostics>,
}

impl WakeService {
    /// Create a new service. Does not start capturing — call `start()`.
    pub fn new(config: WakeConfig) -> Self {
        let (wake_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);

        Self {
            config,
            run_token: Mutex::new(Arc::new(AtomicBool::new(false))),
            status: Arc::new(Mutex::new(PipelineStatus::Idle)),
            signal: WakeSignal::new(),
            wake_tx,
            status_tx,
            seq: Arc::new(AtomicU64::new(0)),
            diagnostics: Arc::new(pipeline::PipelineDiagnostics::default()),
        }
    }

    /// Start audio capture and the wake pipeline with the given engine.
    ///
    /// The engine is moved into the pipeline task, which owns it exclusively
    /// until the task exits; restarting requires constructing a new engine.
    /// Blocks until the audio device is confirmed open (or fails), then
    /// returns; the pipeline continues in a background blocking thread.
    ///
    /// # Errors
    /// - `VigilError::AlreadyRunning` if already started.
    /// - `VigilError::NoDefaultInputDevice` / `VigilError::FormatMismatch` /
    ///   `VigilError::AudioStream` on device errors.
    pub fn start(&self, engine: Box<dyn AcousticEngine>) -> Result<()> {
        let running = self.acquire_run_token()?;

        self.diagnostics.reset();

        let (producer, consumer) = create_audio_ring();

        // Clone all Arc-wrapped state before moving into the closure.
        let config = self.config.clone();
        let run_flag = Arc::clone(&running);
        let signal = self.signal.clone();
        let wake_tx = self.wake_tx.clone();
        let status_tx = self.status_tx.clone();
        let status = Arc::clone(&self.status);
        let seq = Arc::clone(&self.seq);
        let diagnostics = Arc::clone(&self.diagnostics);

        // Sync oneshot: pipeline thread signals open success/failure to start().
        let (open_tx, open_rx) = std::sync::mpsc::channel::<Result<u32>>();

        tokio::task::spawn_blocking(move || {
            // ── Open audio device (on THIS thread — cpal::Stream is !Send) ──
            let capture = match AudioCapture::open_with_preference(
                producer,
                Arc::clone(&running),
                config.preferred_input_device.as_deref(),
            ) {
                Ok(c) => {
                    let _ = open_tx.send(Ok(c.sample_rate));
                    c
                }
                Err(e) => {
                    let _ = open_tx.send(Err(e));
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };

            // ── Run pipeline ────────────────────────────────────────────────
            pipeline::run(pipeline::PipelineContext {
                config,
                engine,
                consumer,
                running: Arc::clone(&running),
                signal,
                wake_tx,
                status_tx,
                status,
                seq,
                diagnostics,
            });

            running.store(false, Ordering::SeqCst);

            // Stream drops here, releasing the audio device on this thread.
            drop(capture);
        });

        // Block start() until device open is confirmed.
        match open_rx.recv() {
            Ok(Ok(rate)) => {
                self.set_status(PipelineStatus::Listening, None);
                info!(sample_rate = rate, "wake service started — listening");
                Ok(())
            }
            Ok(Err(e)) => {
                run_flag.store(false, Ordering::SeqCst);
                self.set_status(PipelineStatus::Faulted, Some(e.to_string()));
                Err(e)
            }
            Err(_) => {
                // Channel closed before a message was sent — spawn_blocking panicked?
                run_flag.store(false, Ordering::SeqCst);
                self.set_status(
                    PipelineStatus::Faulted,
                    Some("pipeline failed to start".into()),
                );
                Err(VigilError::Other(anyhow::anyhow!(
                    "pipeline task died unexpectedly"
                )))
            }
        }
    }

    /// Stop audio capture and the pipeline.
    ///
    /// # Errors
    /// - `VigilError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        {
            let token = self.run_token.lock();
            if !token.load(Ordering::SeqCst) {
                return Err(VigilError::NotRunning);
            }
            token.store(false, Ordering::SeqCst);
        }
        self.set_status(PipelineStatus::Stopped, None);
        info!("wake service stop requested");
        Ok(())
    }

    /// Shared wake flag for the application consumer: poll `is_waked()`,
    /// call `reset()` after handling.
    pub fn wake_signal(&self) -> WakeSignal {
        self.signal.clone()
    }

    /// Current pipeline status (snapshot).
    pub fn status(&self) -> PipelineStatus {
        *self.status.lock()
    }

    /// Subscribe to wake events (diagnostic metadata per detection).
    pub fn subscribe_wake(&self) -> broadcast::Receiver<WakeEvent> {
        self.wake_tx.subscribe()
    }

    /// Subscribe to pipeline status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<PipelineStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of pipeline counters for observability.
    pub fn diagnostics_snapshot(&self) -> pipeline::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Swap in a fresh raised stop token, failing if the current one is
    /// still raised. The previous run keeps its own (now lowered or
    /// lowering) token, which nothing can raise again.
    fn acquire_run_token(&self) -> Result<Arc<AtomicBool>> {
        let mut slot = self.run_token.lock();
        if slot.load(Ordering::SeqCst) {
            return Err(VigilError::AlreadyRunning);
        }
        let token = Arc::new(AtomicBool::new(true));
        *slot = Arc::clone(&token);
        Ok(token)
    }

    fn set_status(&self, new_status: PipelineStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(PipelineStatusEvent {
            status: new_status,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_without_start_is_an_error() {
        let service = WakeService::new(WakeConfig::default());
        assert!(matches!(service.stop(), Err(VigilError::NotRunning)));
        assert_eq!(service.status(), PipelineStatus::Idle);
    }

    #[test]
    fn restart_issues_a_fresh_stop_token() {
        let service = WakeService::new(WakeConfig::default());

        let first = service.acquire_run_token().unwrap();
        assert!(first.load(Ordering::SeqCst));
        assert!(matches!(
            service.acquire_run_token(),
            Err(VigilError::AlreadyRunning)
        ));

        service.stop().unwrap();
        assert!(!first.load(Ordering::SeqCst), "stop lowers the live token");

        // A rapid restart gets a distinct token; the previous run's token
        // stays lowered, so a pipeline still draining its cooldown can only
        // ever observe the stop it was given.
        let second = service.acquire_run_token().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!first.load(Ordering::SeqCst));
        assert!(second.load(Ordering::SeqCst));
    }
}
