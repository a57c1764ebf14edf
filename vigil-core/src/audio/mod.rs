//! Audio capture via cpal backend.
//!
//! # Design constraints
//!
//! The cpal input callback runs on an OS audio thread at elevated priority.
//! It **must not**:
//! - Allocate heap memory
//! - Block on a mutex or condvar
//! - Perform I/O
//!
//! This module satisfies that contract by writing directly into an SPSC ring
//! buffer producer whose `push_slice` is lock-free and allocation-free.
//!
//! # Format contract
//!
//! The engines consume mono 16 kHz signed 16-bit PCM and nothing else. A
//! device that cannot deliver 16 kHz is a fatal configuration error
//! (`FormatMismatch`) — degraded audio fed to a keyword model would mean
//! silently never detecting, which is worse than failing at startup.
//!
//! # Threading note
//!
//! `cpal::Stream` is `!Send` on most platforms (COM on Windows, CoreAudio on
//! macOS). `AudioCapture` therefore must be created and dropped on the same
//! thread. The wake service accomplishes this by opening capture inside
//! `spawn_blocking`.

pub mod device;

#[cfg(feature = "audio-cpal")]
use cpal::{
    traits::{DeviceTrait, StreamTrait},
    SampleFormat, SampleRate, Stream, StreamConfig,
};

use crate::{
    buffering::{AudioProducer, Producer},
    error::{Result, VigilError},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
#[cfg(feature = "audio-cpal")]
use tracing::{error, info, warn};

/// The sample rate every engine in this workspace expects.
pub const REQUIRED_SAMPLE_RATE: u32 = 16_000;

/// Handle to an active audio capture stream.
///
/// **Not `Send`** — `cpal::Stream` is bound to its creation thread on
/// Windows/macOS. Create and drop this type on the same OS thread.
pub struct AudioCapture {
    /// Kept alive so the stream is not dropped prematurely.
    #[cfg(feature = "audio-cpal")]
    _stream: Stream,
    /// Shared flag — set to `false` to signal the callback to no-op.
    running: Arc<AtomicBool>,
    /// Capture sample rate; always `REQUIRED_SAMPLE_RATE` once open succeeds.
    pub sample_rate: u32,
}

impl AudioCapture {
    /// Open an input device by preferred name, otherwise fall back to the
    /// default input device and then the first available device, and bind it
    /// to exactly 16 kHz.
    #[cfg(feature = "audio-cpal")]
    pub fn open_with_preference(
        mut producer: AudioProducer,
        running: Arc<AtomicBool>,
        preferred_device_name: Option<&str>,
    ) -> Result<Self> {
        use cpal::traits::HostTrait;

        let host = cpal::default_host();
        let mut selected_device = None;

        if let Some(preferred_name) = preferred_device_name {
            match host.input_devices() {
                Ok(mut devices) => {
                    selected_device = devices.find(|device| {
                        device
                            .name()
                            .map(|name| name == preferred_name)
                            .unwrap_or(false)
                    });

                    if selected_device.is_none() {
                        warn!(
                            "preferred input device '{}' not found, falling back",
                            preferred_name
                        );
                    }
                }
                Err(e) => {
                    warn!("failed to list input devices while resolving preference: {e}");
                }
            }
        }

        let device = if let Some(device) = selected_device {
            device
        } else if let Some(default) = host.default_input_device() {
            default
        } else {
            let mut devices = host
                .input_devices()
                .map_err(|e| VigilError::AudioDevice(e.to_string()))?;
            let fallback = devices.next().ok_or(VigilError::NoDefaultInputDevice)?;
            warn!("no default input device, falling back to first available input");
            fallback
        };

        info!(
            device = device.name().unwrap_or_default().as_str(),
            "opening input device"
        );

        // Hard requirement: the device must honour 16 kHz. No resampling —
        // a rate mismatch is a configuration error, not something to paper over.
        let ranges: Vec<_> = device
            .supported_input_configs()
            .map_err(|e| VigilError::AudioDevice(e.to_string()))?
            .collect();

        let supported = ranges
            .iter()
            .filter(|r| {
                matches!(r.sample_format(), SampleFormat::F32 | SampleFormat::I16)
            })
            .find_map(|r| r.try_with_sample_rate(SampleRate(REQUIRED_SAMPLE_RATE)))
            .ok_or_else(|| {
                let offered = ranges
                    .iter()
                    .map(|r| {
                        format!(
                            "{:?} {}-{} Hz x{}",
                            r.sample_format(),
                            r.min_sample_rate().0,
                            r.max_sample_rate().0,
                            r.channels()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                VigilError::FormatMismatch {
                    required_hz: REQUIRED_SAMPLE_RATE,
                    offered,
                }
            })?;

        let channels = supported.channels();
        info!(
            sample_rate = REQUIRED_SAMPLE_RATE,
            channels,
            format = ?supported.sample_format(),
            "audio config selected"
        );

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(REQUIRED_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        // Pre-clone one Arc per sample format branch so each closure owns its flag.
        let running_f32 = Arc::clone(&running);
        let running_i16 = Arc::clone(&running);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let ch = channels as usize;
                let mut mix_buf: Vec<i16> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _info| {
                        if !running_f32.load(Ordering::Relaxed) {
                            return;
                        }
                        let frames = data.len() / ch;
                        mix_buf.resize(frames, 0);
                        for f in 0..frames {
                            let mut sum = 0f32;
                            let base = f * ch;
                            for c in 0..ch {
                                sum += data[base + c];
                            }
                            let mono = (sum / ch as f32).clamp(-1.0, 1.0);
                            mix_buf[f] = (mono * 32767.0) as i16;
                        }
                        let written = producer.push_slice(&mix_buf);
                        if written < mix_buf.len() {
                            warn!(
                                "ring buffer full: dropped {} f32 frames",
                                mix_buf.len() - written
                            );
                        }
                    },
                    |err| error!("audio stream error: {err}"),
                    None,
                )
            }

            SampleFormat::I16 => {
                let ch = channels as usize;
                let mut mix_buf: Vec<i16> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _info| {
                        if !running_i16.load(Ordering::Relaxed) {
                            return;
                        }
                        if ch == 1 {
                            let written = producer.push_slice(data);
                            if written < data.len() {
                                warn!(
                                    "ring buffer full: dropped {} i16 frames",
                                    data.len() - written
                                );
                            }
                            return;
                        }
                        let frames = data.len() / ch;
                        mix_buf.resize(frames, 0);
                        for f in 0..frames {
                            let mut sum = 0i32;
                            let base = f * ch;
                            for c in 0..ch {
                                sum += data[base + c] as i32;
                            }
                            mix_buf[f] = (sum / ch as i32) as i16;
                        }
                        let written = producer.push_slice(&mix_buf);
                        if written < mix_buf.len() {
                            warn!(
                                "ring buffer full: dropped {} i16 frames",
                                mix_buf.len() - written
                            );
                        }
                    },
                    |err| error!("audio stream error: {err}"),
                    None,
                )
            }

            fmt => {
                return Err(VigilError::AudioStream(format!(
                    "unsupported sample format: {fmt:?}"
                )))
            }
        }
        .map_err(|e| VigilError::AudioStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| VigilError::AudioStream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            running,
            sample_rate: REQUIRED_SAMPLE_RATE,
        })
    }

    /// Open the system default microphone at 16 kHz mono.
    ///
    /// Must be called from the thread that will also drop this value. In
    /// practice this means calling it inside `tokio::task::spawn_blocking`.
    ///
    /// # Errors
    /// `VigilError::NoDefaultInputDevice` when no microphone is available,
    /// `VigilError::FormatMismatch` when the device cannot deliver 16 kHz,
    /// or `VigilError::AudioStream` if cpal fails to build the stream.
    #[cfg(feature = "audio-cpal")]
    pub fn open_default(producer: AudioProducer, running: Arc<AtomicBool>) -> Result<Self> {
        Self::open_with_preference(producer, running, None)
    }

    /// Stop: signal the callback to no-op on its next invocation.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Stub when the `audio-cpal` feature is disabled.
#[cfg(not(feature = "audio-cpal"))]
impl AudioCapture {
    pub fn open_with_preference(
        _producer: AudioProducer,
        _running: Arc<AtomicBool>,
        _preferred_device_name: Option<&str>,
    ) -> Result<Self> {
        Err(VigilError::AudioStream(
            "compiled without audio-cpal feature".into(),
        ))
    }

    pub fn open_default(producer: AudioProducer, running: Arc<AtomicBool>) -> Result<Self> {
        Self::open_with_preference(producer, running, None)
    }
}
