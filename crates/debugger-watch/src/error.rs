//! Watch layer errors.

#![allow(missing_docs)]

use std::path::PathBuf;

use debugger_protocol::DecodeError;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid watch config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid unprintable base {0} (expected 0, -1, 8 or 16)")]
    UnprintableBase(i32),
}

/// Settings store failures.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Rejected payloads for the separated view.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditValueError {
    #[error("image header needs more than 16 bytes, got {0}")]
    ShortImageHeader(usize),

    #[error("malformed image file descriptor '{0}'")]
    BadImageDescriptor(String),

    #[error("cannot read image file {path}: {message}")]
    ImageFile { path: String, message: String },

    #[error("image dimensions out of range: {width}x{height}, {nbytes} bytes, format {format}")]
    ImageOutOfRange {
        width: i32,
        height: i32,
        nbytes: i32,
        format: i32,
    },

    #[error("unknown edit format '{0}'")]
    UnknownFormat(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
