//! # Push Callbacks
//!
//! The push side of the boundary: the hub calls `on_envelope` on every
//! registered handle for each accepted envelope.

use std::fmt;
use std::sync::Arc;

use hmi_types::Envelope;
use uuid::Uuid;

use crate::error::TransportError;

/// Receiver of pushed envelopes.
///
/// Returning `Err` tells the hub the session behind this callback is dead.
/// Implementations must not call back into `publish`/`inject` on the same
/// hub from inside `on_envelope`.
pub trait EnvelopeCallback: Send + Sync {
    fn on_envelope(&self, envelope: &Envelope) -> Result<(), TransportError>;
}

impl<F> EnvelopeCallback for F
where
    F: Fn(&Envelope) -> Result<(), TransportError> + Send + Sync,
{
    fn on_envelope(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self(envelope)
    }
}

/// Identity of one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A callback plus the identity the hub tracks it by.
///
/// Equality is by id only, so clones of one handle are the same subscriber.
#[derive(Clone)]
pub struct CallbackHandle {
    id: SubscriberId,
    callback: Arc<dyn EnvelopeCallback>,
}

impl CallbackHandle {
    /// Wrap `callback` under a fresh id.
    #[must_use]
    pub fn new(callback: Arc<dyn EnvelopeCallback>) -> Self {
        Self::with_id(SubscriberId::new(), callback)
    }

    #[must_use]
    pub fn with_id(id: SubscriberId, callback: Arc<dyn EnvelopeCallback>) -> Self {
        Self { id, callback }
    }

    /// Convenience for closures.
    #[must_use]
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&Envelope) -> Result<(), TransportError> + Send + Sync + 'static,
    {
        Self::new(Arc::new(callback))
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn deliver(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.callback.on_envelope(envelope)
    }
}

impl PartialEq for CallbackHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CallbackHandle {}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle").field("id", &self.id).finish()
    }
}
