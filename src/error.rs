//! Crate error type.
//!
//! Only initialization and tooling paths return [`Error`]. Sampling never fails:
//! unreadable elements resolve to default values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while setting up the HID session or loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform HID session could not be established or refreshed.
    #[cfg(feature = "hid")]
    #[error("HID subsystem error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// No device matching criteria were configured; nothing could ever attach.
    #[error("no device matching criteria configured")]
    NoMatchCriteria,

    /// `Backend::open` was called twice.
    #[error("backend `{0}` is already open")]
    AlreadyOpen(&'static str),

    /// `Backend::pump` was called before `Backend::open`.
    #[error("backend `{0}` has not been opened")]
    NotOpen(&'static str),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to encode device report: {0}")]
    Json(#[from] serde_json::Error),

    /// The background event pump thread could not be started.
    #[error("failed to spawn event pump thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
