//! # Hub Connection Port
//!
//! The client-side view of the process boundary. A session only talks to
//! the hub through this trait, so an IPC transport can replace the
//! in-process adapter without touching session logic.

use std::sync::Arc;

use hmi_types::{CandidateEnvelope, Envelope, TypeId};

use crate::error::ConnectionError;
use crate::hub::DistributionHub;
use crate::subscriber::{CallbackHandle, SubscriberId};

/// Calls a client may make on the hub.
pub trait HubConnection: Send + Sync {
    /// Register a push callback. Re-registering the same handle is a no-op.
    fn register(&self, handle: CallbackHandle) -> Result<(), ConnectionError>;

    /// Remove a push callback. Unknown ids are a no-op.
    fn unregister(&self, id: SubscriberId) -> Result<(), ConnectionError>;

    /// Pull the cached envelope for `type_id`.
    fn get_latest(&self, type_id: TypeId) -> Result<Option<Envelope>, ConnectionError>;

    /// Pull every cached envelope, ordered by type id.
    fn latest_snapshot(&self) -> Result<Vec<Envelope>, ConnectionError>;

    /// Inject a synthetic envelope; returns it as accepted.
    fn inject(&self, candidate: CandidateEnvelope) -> Result<Envelope, ConnectionError>;

    /// Ask the hub to swap its schema; returns the new generation number.
    fn reload_schema(&self, source: &str) -> Result<u64, ConnectionError>;
}

/// Same-process adapter over a shared hub.
#[derive(Clone)]
pub struct LocalConnection {
    hub: Arc<DistributionHub>,
}

impl LocalConnection {
    #[must_use]
    pub fn new(hub: Arc<DistributionHub>) -> Self {
        Self { hub }
    }

    #[must_use]
    pub fn hub(&self) -> &Arc<DistributionHub> {
        &self.hub
    }
}

impl HubConnection for LocalConnection {
    fn register(&self, handle: CallbackHandle) -> Result<(), ConnectionError> {
        self.hub.register(handle);
        Ok(())
    }

    fn unregister(&self, id: SubscriberId) -> Result<(), ConnectionError> {
        self.hub.unregister(&id);
        Ok(())
    }

    fn get_latest(&self, type_id: TypeId) -> Result<Option<Envelope>, ConnectionError> {
        Ok(self.hub.get_latest(type_id))
    }

    fn latest_snapshot(&self) -> Result<Vec<Envelope>, ConnectionError> {
        Ok(self.hub.latest_snapshot())
    }

    fn inject(&self, candidate: CandidateEnvelope) -> Result<Envelope, ConnectionError> {
        Ok(self.hub.inject(candidate)?)
    }

    fn reload_schema(&self, source: &str) -> Result<u64, ConnectionError> {
        Ok(self.hub.reload_schema(source)?)
    }
}
