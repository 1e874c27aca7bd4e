use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The host could not list HID devices.
    #[error("failed to enumerate HID devices: {0}")]
    Enumeration(#[source] hidapi::HidError),

    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: hidapi::HidError,
    },

    #[error("I/O error on {device}: {source}")]
    Io {
        device: String,
        #[source]
        source: hidapi::HidError,
    },

    #[error("short write on {device}: wrote {written} of {expected} bytes")]
    ShortWrite {
        device: String,
        written: usize,
        expected: usize,
    },

    #[error("no response from {device} within {timeout_ms} ms")]
    Timeout { device: String, timeout_ms: u64 },

    /// Shutdown was requested while an attempt was in flight.
    #[error("poll cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
