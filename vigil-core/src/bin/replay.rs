//! Offline replay: run a WAV file through an acoustic engine and report
//! every detection with its audio offset. Useful for tuning models and
//! cooldown settings without a microphone.
//!
//! The WAV must already match the capture contract (16 kHz, mono, 16-bit);
//! anything else is rejected, mirroring the live format policy.

fn main() {
    if let Err(e) = run() {
        eprintln!("replay failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    use std::path::PathBuf;
    use std::time::Duration;

    use vigil_core::acoustic::{AcousticEngine, FetchOutcome};
    use vigil_core::buffering::assembler::FrameAssembler;

    #[derive(Debug)]
    struct Args {
        wav: PathBuf,
        models_dir: PathBuf,
        cooldown: Duration,
    }

    fn parse_args() -> Result<Args, String> {
        let mut wav: Option<PathBuf> = None;
        let mut models_dir = PathBuf::from("models");
        let mut cooldown_ms: u64 = 400;

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--wav" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --wav".into());
                    };
                    wav = Some(PathBuf::from(v));
                }
                "--models" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --models".into());
                    };
                    models_dir = PathBuf::from(v);
                }
                "--cooldown-ms" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --cooldown-ms".into());
                    };
                    cooldown_ms = v
                        .parse::<u64>()
                        .map_err(|_| "invalid value for --cooldown-ms".to_string())?;
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: cargo run -p vigil-core --bin replay -- \\
  --wav <file.wav> [--models <dir>] [--cooldown-ms <n>]"
                    );
                    std::process::exit(0);
                }
                other => {
                    return Err(format!("unknown argument: {other}"));
                }
            }
        }

        let wav = wav.ok_or_else(|| "--wav is required".to_string())?;
        Ok(Args {
            wav,
            models_dir,
            cooldown: Duration::from_millis(cooldown_ms),
        })
    }

    fn build_engine(models_dir: &std::path::Path) -> Result<Box<dyn AcousticEngine>, String> {
        #[cfg(feature = "rustpotter")]
        {
            use vigil_core::{AudioFormat, EngineBlueprint, ModelRegistry, OperatingMode};
            let registry =
                ModelRegistry::load(models_dir).map_err(|e| format!("registry: {e}"))?;
            let blueprint = EngineBlueprint::from_registry(
                &registry,
                AudioFormat::default(),
                OperatingMode::LowCost,
            );
            let engine = vigil_core::RustpotterEngine::from_blueprint(blueprint)
                .map_err(|e| format!("engine: {e}"))?;
            Ok(Box::new(engine))
        }
        #[cfg(not(feature = "rustpotter"))]
        {
            use vigil_core::acoustic::{
                conditioner::DcBlockFrontEnd, keyword::BurstDetector, staged::StagedEngine,
            };
            let _ = models_dir;
            eprintln!("note: built without the 'rustpotter' feature — using the burst detector");
            Ok(Box::new(StagedEngine::new(
                160,
                DcBlockFrontEnd::default(),
                BurstDetector::default(),
            )))
        }
    }

    let args = parse_args()?;

    let mut reader =
        hound::WavReader::open(&args.wav).map_err(|e| format!("open {:?}: {e}", args.wav))?;
    let spec = reader.spec();
    if spec.sample_rate != 16_000
        || spec.channels != 1
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        return Err(format!(
            "unsupported wav format ({} Hz, {} ch, {} bit): need 16000 Hz mono 16-bit PCM",
            spec.sample_rate, spec.channels, spec.bits_per_sample
        ));
    }

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .map_err(|e| format!("decode: {e}"))?;

    let mut engine = build_engine(&args.models_dir)?;
    let chunk_size = engine.chunk_size();
    if chunk_size == 0 {
        return Err("engine negotiated a zero chunk size".into());
    }

    let cooldown_samples = (args.cooldown.as_millis() as usize * 16_000) / 1000;
    let mut assembler = FrameAssembler::new(chunk_size);
    let mut frame = vec![0i16; chunk_size];
    let mut offset = 0usize;
    let mut wakes = 0usize;
    let mut last_wake_offset: Option<usize> = None;

    assembler.push(&samples);
    while assembler.take_frame(&mut frame) {
        engine.feed(&frame).map_err(|e| format!("feed: {e}"))?;
        offset += chunk_size;

        loop {
            match engine.fetch().map_err(|e| format!("fetch: {e}"))? {
                FetchOutcome::Empty => break,
                FetchOutcome::Quiet => {}
                FetchOutcome::Wake(d) => {
                    let coalesced = last_wake_offset
                        .map(|prev| offset - prev < cooldown_samples)
                        .unwrap_or(false);
                    let secs = offset as f64 / 16_000.0;
                    if coalesced {
                        println!("  {secs:8.3}s  wake (coalesced by cooldown)");
                    } else {
                        wakes += 1;
                        println!(
                            "  {secs:8.3}s  wake  model={} keyword={} score={:?}",
                            d.model_index, d.keyword_index, d.score
                        );
                    }
                    last_wake_offset = Some(offset);
                }
            }
        }
    }

    let total_secs = samples.len() as f64 / 16_000.0;
    println!(
        "{}: {total_secs:.2}s of audio, {wakes} wake(s), {} samples short of a final frame",
        args.wav.display(),
        assembler.pending_len()
    );
    Ok(())
}
