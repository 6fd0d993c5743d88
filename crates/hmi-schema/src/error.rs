//! Error types for the schema registry

use thiserror::Error;

/// A rejected reload. The previous generation stays active.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReloadError {
    /// `line` is 1-based; 0 means the document as a whole.
    #[error("Rule parse failed at line {line}: {reason}")]
    ParseFailed { line: usize, reason: String },
}

impl ReloadError {
    pub(crate) fn at(line: usize, reason: impl Into<String>) -> Self {
        Self::ParseFailed {
            line,
            reason: reason.into(),
        }
    }
}
