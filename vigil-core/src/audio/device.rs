//! Audio device enumeration.

use serde::{Deserialize, Serialize};

/// Metadata about an audio input device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name reported by the OS.
    pub name: String,
    /// Whether this is the system default input device.
    pub is_default: bool,
    /// Whether the device can deliver the 16 kHz capture format.
    pub supports_required_rate: bool,
}

/// List all available audio input devices on the system.
///
/// Returns an empty `Vec` if cpal is not available or no devices exist.
#[cfg(feature = "audio-cpal")]
pub fn list_input_devices() -> Vec<DeviceInfo> {
    use cpal::traits::{DeviceTrait, HostTrait};
    use cpal::SampleRate;

    use super::REQUIRED_SAMPLE_RATE;

    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    match host.input_devices() {
        Ok(devices) => devices
            .enumerate()
            .map(|(idx, device)| {
                let name = device
                    .name()
                    .unwrap_or_else(|_| format!("Input Device {}", idx + 1));
                let supports_required_rate = device
                    .supported_input_configs()
                    .map(|mut ranges| {
                        ranges.any(|r| {
                            r.try_with_sample_rate(SampleRate(REQUIRED_SAMPLE_RATE))
                                .is_some()
                        })
                    })
                    .unwrap_or(false);
                DeviceInfo {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    supports_required_rate,
                    name,
                }
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Stub when the `audio-cpal` feature is disabled.
#[cfg(not(feature = "audio-cpal"))]
pub fn list_input_devices() -> Vec<DeviceInfo> {
    Vec::new()
}
