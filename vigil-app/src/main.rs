//! Vigil host: starts the wake service and polls the wake flag.
//!
//! The host owns restart policy. When the pipeline faults, this binary logs
//! the death and exits non-zero; a supervisor (systemd, launchd, ...) decides
//! whether to bring it back.
//!
//! Configuration is environment-driven:
//! - `VIGIL_MODELS_DIR`    model registry directory (default: `models`)
//! - `VIGIL_COOLDOWN_MS`   post-detection cooldown (default: 400)
//! - `VIGIL_INPUT_DEVICE`  preferred capture device name
//! - `VIGIL_LIST_DEVICES`  set to `1` to print input devices and exit

use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vigil_core::acoustic::AcousticEngine;
use vigil_core::ipc::events::PipelineStatus;
use vigil_core::{WakeConfig, WakeService};

/// Coarse consumer-side poll interval; well under the wake/reset cycle.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn build_engine(models_dir: &str) -> anyhow::Result<Box<dyn AcousticEngine>> {
    #[cfg(feature = "rustpotter")]
    {
        use vigil_core::{AudioFormat, EngineBlueprint, ModelRegistry, OperatingMode, RustpotterEngine};

        // Fail fast on a missing/empty registry — no detection is possible,
        // and this must happen before any capture configuration.
        let registry = ModelRegistry::load(models_dir)
            .context("wake-word model registry unavailable")?;
        let blueprint = EngineBlueprint::from_registry(
            &registry,
            AudioFormat::default(),
            OperatingMode::LowCost,
        );
        let engine = RustpotterEngine::from_blueprint(blueprint)
            .context("failed to build keyword engine")?;
        Ok(Box::new(engine))
    }
    #[cfg(not(feature = "rustpotter"))]
    {
        use vigil_core::acoustic::{
            conditioner::DcBlockFrontEnd, keyword::BurstDetector, staged::StagedEngine,
        };

        let _ = models_dir;
        warn!("built without the 'rustpotter' feature — using the burst detector stand-in");
        Ok(Box::new(StagedEngine::new(
            160,
            DcBlockFrontEnd::default(),
            BurstDetector::default(),
        )))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if std::env::var("VIGIL_LIST_DEVICES").as_deref() == Ok("1") {
        for dev in vigil_core::audio::device::list_input_devices() {
            println!(
                "{}{}{}",
                dev.name,
                if dev.is_default { "  [default]" } else { "" },
                if dev.supports_required_rate {
                    ""
                } else {
                    "  [no 16 kHz support]"
                }
            );
        }
        return Ok(());
    }

    let models_dir =
        std::env::var("VIGIL_MODELS_DIR").unwrap_or_else(|_| "models".to_string());
    let cooldown_ms = std::env::var("VIGIL_COOLDOWN_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(400);

    let config = WakeConfig {
        cooldown: Duration::from_millis(cooldown_ms),
        preferred_input_device: std::env::var("VIGIL_INPUT_DEVICE").ok(),
    };

    let engine = build_engine(&models_dir)?;
    let service = WakeService::new(config);
    let signal = service.wake_signal();
    let mut status_rx = service.subscribe_status();
    let mut wake_rx = service.subscribe_wake();

    service.start(engine).context("wake service failed to start")?;

    // Forward per-detection diagnostics while the polling loop below owns
    // the actual wake handling.
    tokio::spawn(async move {
        while let Ok(ev) = wake_rx.recv().await {
            info!(
                seq = ev.seq,
                model_index = ev.model_index,
                keyword_index = ev.keyword_index,
                score = ?ev.score,
                "detection"
            );
        }
    });

    let mut poll = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            status = status_rx.recv() => {
                if let Ok(ev) = status {
                    if ev.status == PipelineStatus::Faulted {
                        error!(detail = ?ev.detail, "wake pipeline died — exiting for supervisor restart");
                        anyhow::bail!("wake pipeline faulted");
                    }
                }
            }
            _ = poll.tick() => {
                if signal.is_waked() {
                    info!("wake word captured — handing off to the speech flow");
                    signal.reset();
                    // Downstream speech-to-text integration hooks in here.
                }
            }
        }
    }

    if let Err(e) = service.stop() {
        warn!(error = %e, "service was not running at shutdown");
    }
    Ok(())
}
