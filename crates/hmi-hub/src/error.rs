//! Error types for the hub, its transport port and client sessions.

use hmi_schema::ReloadError;
use thiserror::Error;

use crate::session::SessionState;

/// Failure of the underlying process-boundary transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Peer disconnected")]
    Disconnected,

    #[error("Remote call failed: {0}")]
    Remote(String),
}

/// Errors from hub operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The i32 sequence id space of this hub instance is used up.
    #[error("Sequence ids exhausted; restart the hub")]
    SequenceExhausted,
}

/// Errors seen by a client calling the hub through a `HubConnection`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Reload(#[from] ReloadError),
}

/// Errors from subscriber session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Operation not allowed in state {0:?}")]
    InvalidState(SessionState),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Connection(ConnectionError::Transport(e))
    }
}
