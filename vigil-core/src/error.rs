use thiserror::Error;

/// All errors produced by vigil-core.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("capture format mismatch: need {required_hz} Hz mono, device offers {offered}")]
    FormatMismatch { required_hz: u32, offered: String },

    #[error("model registry at {path} is missing or empty")]
    EmptyRegistry { path: std::path::PathBuf },

    #[error("engine negotiated an invalid input chunk size of {0} samples")]
    InvalidChunkSize(usize),

    #[error("acoustic engine failure: {0}")]
    Engine(String),

    #[error("service is already running")]
    AlreadyRunning,

    #[error("service is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VigilError>;
