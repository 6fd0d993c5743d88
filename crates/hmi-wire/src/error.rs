//! Error types for the wire codec

use thiserror::Error;

/// Why an inbound message could not be decoded.
///
/// Always fatal to that one message and never to the receiver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Invalid field count: {0}")]
    InvalidCount(i32),

    #[error("Invalid string length: {0}")]
    InvalidLength(i32),

    #[error("String is not valid UTF-8")]
    InvalidUtf8,

    #[error("Duplicate field key: {0}")]
    DuplicateKey(String),

    #[error("{0} trailing bytes after last field")]
    TrailingBytes(usize),
}

impl DecodeError {
    /// Short label for metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Truncated { .. } => "truncated",
            Self::InvalidCount(_) => "invalid_count",
            Self::InvalidLength(_) => "invalid_length",
            Self::InvalidUtf8 => "invalid_utf8",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::TrailingBytes(_) => "trailing_bytes",
        }
    }
}

/// Why an envelope could not be encoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("String of {len} bytes does not fit an i32 length prefix")]
    FieldTooLong { len: usize },

    #[error("{count} fields do not fit an i32 field count")]
    TooManyFields { count: usize },
}
