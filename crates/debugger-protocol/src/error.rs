//! Decoder errors.

#![allow(missing_docs)]

use thiserror::Error;

/// Failure to turn an encoded backend payload into a displayable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Encoding name or encoding/size pair has no decoder.
    #[error("unsupported encoding '{0}'")]
    UnsupportedEncoding(String),

    /// Payload contains characters outside `[0-9a-fA-F]` or has odd length.
    #[error("invalid hex payload")]
    InvalidHex,

    /// Payload is shorter than the encoding requires.
    #[error("payload too short (expected {expected} bytes, got {actual})")]
    TruncatedPayload { expected: usize, actual: usize },

    /// Date or time components out of range.
    #[error("invalid date/time payload '{0}'")]
    InvalidDateTime(String),

    /// IPv6 address payload could not be decoded.
    #[error("invalid IPv6 address payload '{0}'")]
    InvalidAddress(String),
}
