//! # Subscriber Session
//!
//! Client-side lifecycle of one subscriber:
//!
//! ```text
//! Unregistered ──connect()──→ Registering ──register ok──→ Registered
//!       ↑                          │                           │
//!       └──── register failed ─────┘                           │
//!       └──────────────────── disconnect() / drop ─────────────┘
//! ```
//!
//! On reaching `Registered` the session pulls `get_latest` for each type id
//! it is interested in (the whole cache when it is interested in all), so its
//! view is filled before the next push.
//!
//! Sequence ids are only comparable within one registration: a hub restart
//! starts them over. The view is therefore emptied whenever `connect` begins
//! a new registration.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hmi_schema::{Resolution, SchemaView};
use hmi_types::{CandidateEnvelope, Envelope, TypeId};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::connection::HubConnection;
use crate::error::{SessionError, TransportError};
use crate::subscriber::{CallbackHandle, EnvelopeCallback, SubscriberId};

/// Registration state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unregistered,
    Registering,
    Registered,
}

/// State shared between the session and the callback the hub holds.
struct SessionShared {
    state: RwLock<SessionState>,
    /// Empty means every type id.
    interests: Vec<TypeId>,
    view: RwLock<BTreeMap<TypeId, Envelope>>,
    deliveries: AtomicU64,
}

impl SessionShared {
    fn is_interested(&self, type_id: TypeId) -> bool {
        self.interests.is_empty() || self.interests.contains(&type_id)
    }

    /// Keep `envelope` if it is newer than what the view holds for its type.
    fn apply(&self, envelope: &Envelope) -> bool {
        let mut view = self.view.write();
        match view.get(&envelope.type_id()) {
            Some(current) if current.sequence_id() >= envelope.sequence_id() => false,
            _ => {
                view.insert(envelope.type_id(), envelope.clone());
                true
            }
        }
    }
}

impl EnvelopeCallback for SessionShared {
    fn on_envelope(&self, envelope: &Envelope) -> Result<(), TransportError> {
        // A hub still pushing to us after a failed unregister gets told we
        // are gone, so it evicts the handle.
        if *self.state.read() == SessionState::Unregistered {
            return Err(TransportError::Disconnected);
        }

        if !self.is_interested(envelope.type_id()) {
            return Ok(());
        }

        if self.apply(envelope) {
            self.deliveries.fetch_add(1, Ordering::Relaxed);
        } else {
            debug!(
                type_id = envelope.type_id(),
                sequence_id = envelope.sequence_id(),
                "Ignoring stale push"
            );
        }
        Ok(())
    }
}

/// One client's registration with the hub plus its local view.
pub struct SubscriberSession {
    connection: Arc<dyn HubConnection>,
    schema: SchemaView,
    handle: CallbackHandle,
    shared: Arc<SessionShared>,
}

impl SubscriberSession {
    #[must_use]
    pub fn new(
        connection: Arc<dyn HubConnection>,
        schema: SchemaView,
        interests: Vec<TypeId>,
    ) -> Self {
        let shared = Arc::new(SessionShared {
            state: RwLock::new(SessionState::Unregistered),
            interests,
            view: RwLock::new(BTreeMap::new()),
            deliveries: AtomicU64::new(0),
        });
        let handle = CallbackHandle::new(Arc::clone(&shared) as Arc<dyn EnvelopeCallback>);

        Self {
            connection,
            schema,
            handle,
            shared,
        }
    }

    /// Register with the hub and pull the cached envelopes of interest.
    pub fn connect(&self) -> Result<(), SessionError> {
        {
            let mut state = self.shared.state.write();
            if *state != SessionState::Unregistered {
                return Err(SessionError::InvalidState(*state));
            }
            *state = SessionState::Registering;
            self.shared.view.write().clear();
        }

        if let Err(e) = self.connection.register(self.handle.clone()) {
            *self.shared.state.write() = SessionState::Unregistered;
            warn!(subscriber = %self.id(), error = %e, "Registration failed");
            return Err(e.into());
        }

        *self.shared.state.write() = SessionState::Registered;
        info!(
            subscriber = %self.id(),
            interests = ?self.shared.interests,
            "Session registered"
        );

        self.pull_latest();
        Ok(())
    }

    fn pull_latest(&self) {
        if self.shared.interests.is_empty() {
            match self.connection.latest_snapshot() {
                Ok(snapshot) => {
                    for envelope in &snapshot {
                        self.shared.apply(envelope);
                    }
                }
                Err(e) => warn!(subscriber = %self.id(), error = %e, "Initial pull failed"),
            }
            return;
        }

        for &type_id in &self.shared.interests {
            match self.connection.get_latest(type_id) {
                Ok(Some(envelope)) => {
                    self.shared.apply(&envelope);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(subscriber = %self.id(), type_id, error = %e, "Initial pull failed");
                }
            }
        }
    }

    /// Leave the hub. Transport failures are logged, never returned.
    pub fn disconnect(&self) {
        let previous = std::mem::replace(
            &mut *self.shared.state.write(),
            SessionState::Unregistered,
        );

        match self.connection.unregister(self.handle.id()) {
            Ok(()) => info!(subscriber = %self.id(), ?previous, "Session unregistered"),
            Err(e) => warn!(
                subscriber = %self.id(),
                error = %e,
                "Unregister failed; hub will evict on next delivery"
            ),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.shared.state.read()
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.handle.id()
    }

    /// Copy of the newest envelope held per type id.
    #[must_use]
    pub fn view(&self) -> BTreeMap<TypeId, Envelope> {
        self.shared.view.read().clone()
    }

    #[must_use]
    pub fn latest(&self, type_id: TypeId) -> Option<Envelope> {
        self.shared.view.read().get(&type_id).cloned()
    }

    /// Resolve a canonical field against the held envelope for `type_id`.
    #[must_use]
    pub fn resolve(&self, type_id: TypeId, canonical: &str) -> Resolution {
        self.shared
            .view
            .read()
            .get(&type_id)
            .map_or(Resolution::Unresolved, |envelope| {
                self.schema.resolve(type_id, envelope.fields(), canonical)
            })
    }

    /// Canonical name to display string for every field of the category.
    #[must_use]
    pub fn render(&self, type_id: TypeId) -> BTreeMap<String, String> {
        let view = self.shared.view.read();
        let Some(envelope) = view.get(&type_id) else {
            return BTreeMap::new();
        };
        self.schema
            .resolve_all(type_id, envelope.fields())
            .into_iter()
            .map(|(canonical, resolution)| (canonical, resolution.display().to_string()))
            .collect()
    }

    /// Pushes applied to the view since the session was created.
    #[must_use]
    pub fn deliveries(&self) -> u64 {
        self.shared.deliveries.load(Ordering::Relaxed)
    }

    pub fn inject(&self, candidate: CandidateEnvelope) -> Result<Envelope, SessionError> {
        Ok(self.connection.inject(candidate)?)
    }

    pub fn reload_schema(&self, source: &str) -> Result<u64, SessionError> {
        Ok(self.connection.reload_schema(source)?)
    }
}

impl Drop for SubscriberSession {
    fn drop(&mut self) {
        if self.state() != SessionState::Unregistered {
            self.disconnect();
        }
    }
}
