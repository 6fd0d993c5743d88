//! # Distribution Hub
//!
//! Middleware-side owner of the latest-value cache, the subscriber set and
//! the live schema generation.
//!
//! Two locks:
//! - `writer` is held for the whole of `publish`/`inject`/`reload_schema`,
//!   so two fan-outs never interleave and ids reach every subscriber in order.
//! - `state` guards `latest`, `subscribers` and the id counter and is never
//!   held while a callback runs. `register`/`unregister` only take `state`,
//!   so a callback may (un)register; the change applies to the next publish.
//!
//! Every registration carries its own token. Eviction after a fan-out
//! removes only the registration that failed, never a later one made under
//! the same subscriber id while the fan-out was running.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hmi_schema::{ReloadError, SchemaRegistry, SchemaView};
use hmi_telemetry::metrics::{
    HistogramTimer, DECODE_FAILURES, ENVELOPES_PUBLISHED, FANOUT_DURATION, SUBSCRIBERS_ACTIVE,
    SUBSCRIBERS_EVICTED,
};
use hmi_types::{CandidateEnvelope, Envelope, SequenceId, TypeId, FIRST_SEQUENCE_ID};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::HubError;
use crate::subscriber::{CallbackHandle, SubscriberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Publish,
    Inject,
}

impl Origin {
    fn label(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Inject => "inject",
        }
    }
}

/// One entry of the subscriber set.
#[derive(Clone)]
struct Registration {
    handle: CallbackHandle,
    token: u64,
}

struct HubState {
    latest: HashMap<TypeId, Envelope>,
    subscribers: Vec<Registration>,
    /// Wider than `SequenceId` so exhaustion is detectable after `i32::MAX`.
    next_sequence_id: i64,
    next_token: u64,
}

impl HubState {
    fn new() -> Self {
        Self {
            latest: HashMap::new(),
            subscribers: Vec::new(),
            next_sequence_id: i64::from(FIRST_SEQUENCE_ID),
            next_token: 0,
        }
    }

    fn position(&self, id: &SubscriberId) -> Option<usize> {
        self.subscribers.iter().position(|r| r.handle.id() == *id)
    }

    fn assign_sequence_id(&mut self) -> Result<SequenceId, HubError> {
        let id =
            SequenceId::try_from(self.next_sequence_id).map_err(|_| HubError::SequenceExhausted)?;
        self.next_sequence_id += 1;
        Ok(id)
    }
}

/// The single point of mutable shared state in the middleware.
pub struct DistributionHub {
    state: RwLock<HubState>,
    writer: Mutex<()>,
    schema: Arc<SchemaRegistry>,
    envelopes_published: AtomicU64,
}

impl DistributionHub {
    #[must_use]
    pub fn new(schema: SchemaRegistry) -> Self {
        Self {
            state: RwLock::new(HubState::new()),
            writer: Mutex::new(()),
            schema: Arc::new(schema),
            envelopes_published: AtomicU64::new(0),
        }
    }

    /// Hub serving the built-in rule set.
    pub fn with_default_schema() -> Result<Self, ReloadError> {
        SchemaRegistry::with_default_rules().map(Self::new)
    }

    /// Accept a produced envelope, cache it and push it to every subscriber.
    pub fn publish(&self, candidate: CandidateEnvelope) -> Result<Envelope, HubError> {
        self.accept(candidate, Origin::Publish)
    }

    /// Accept a synthetic envelope. Identical to `publish` downstream.
    pub fn inject(&self, candidate: CandidateEnvelope) -> Result<Envelope, HubError> {
        self.accept(candidate, Origin::Inject)
    }

    /// Decode and publish an inbound wire message.
    ///
    /// Undecodable messages are dropped and counted; the hub carries on.
    pub fn accept_encoded(&self, bytes: &[u8]) -> Option<Envelope> {
        let decoded = match hmi_wire::decode(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                DECODE_FAILURES.with_label_values(&[e.reason()]).inc();
                warn!(error = %e, len = bytes.len(), "Dropping undecodable inbound message");
                return None;
            }
        };

        match self.publish(CandidateEnvelope::from(decoded)) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                error!(error = %e, "Inbound message not accepted");
                None
            }
        }
    }

    fn accept(&self, candidate: CandidateEnvelope, origin: Origin) -> Result<Envelope, HubError> {
        let _writer = self.writer.lock();

        let (envelope, recipients) = {
            let mut state = self.state.write();
            let sequence_id = state.assign_sequence_id()?;
            let envelope = Envelope::accepted(candidate, sequence_id);
            state.latest.insert(envelope.type_id(), envelope.clone());
            (envelope, state.subscribers.clone())
        };

        self.envelopes_published.fetch_add(1, Ordering::Relaxed);
        ENVELOPES_PUBLISHED.with_label_values(&[origin.label()]).inc();
        debug!(
            origin = origin.label(),
            sequence_id = envelope.sequence_id(),
            type_id = envelope.type_id(),
            fields = %envelope.fields_summary(),
            receivers = recipients.len(),
            "Envelope accepted"
        );

        let dead = Self::fan_out(&envelope, &recipients);
        if !dead.is_empty() {
            self.evict(&dead);
        }

        Ok(envelope)
    }

    /// Deliver to every recipient; returns the tokens whose transport failed.
    fn fan_out(envelope: &Envelope, recipients: &[Registration]) -> Vec<u64> {
        let _timer = HistogramTimer::new(&FANOUT_DURATION);
        recipients
            .iter()
            .filter_map(|r| match r.handle.deliver(envelope) {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        subscriber = %r.handle.id(),
                        sequence_id = envelope.sequence_id(),
                        error = %e,
                        "Delivery failed, evicting subscriber"
                    );
                    Some(r.token)
                }
            })
            .collect()
    }

    fn evict(&self, dead: &[u64]) {
        let mut state = self.state.write();
        let before = state.subscribers.len();
        state.subscribers.retain(|r| !dead.contains(&r.token));
        let evicted = before - state.subscribers.len();

        SUBSCRIBERS_EVICTED.inc_by(evicted as u64);
        SUBSCRIBERS_ACTIVE.set(state.subscribers.len() as f64);
    }

    /// Cached envelope for `type_id`, if one was ever accepted.
    #[must_use]
    pub fn get_latest(&self, type_id: TypeId) -> Option<Envelope> {
        self.state.read().latest.get(&type_id).cloned()
    }

    /// Every cached envelope, ordered by type id.
    #[must_use]
    pub fn latest_snapshot(&self) -> Vec<Envelope> {
        let mut snapshot: Vec<Envelope> = self.state.read().latest.values().cloned().collect();
        snapshot.sort_by_key(Envelope::type_id);
        snapshot
    }

    /// Add a subscriber. Returns `false` if it was already registered.
    pub fn register(&self, handle: CallbackHandle) -> bool {
        let mut state = self.state.write();
        if state.position(&handle.id()).is_some() {
            debug!(subscriber = %handle.id(), "Subscriber already registered");
            return false;
        }

        let token = state.next_token;
        state.next_token += 1;
        info!(subscriber = %handle.id(), token, "Subscriber registered");
        state.subscribers.push(Registration { handle, token });
        SUBSCRIBERS_ACTIVE.set(state.subscribers.len() as f64);
        true
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unregister(&self, id: &SubscriberId) -> bool {
        let mut state = self.state.write();
        let Some(position) = state.position(id) else {
            debug!(subscriber = %id, "Unregister for unknown subscriber");
            return false;
        };

        state.subscribers.remove(position);
        SUBSCRIBERS_ACTIVE.set(state.subscribers.len() as f64);
        info!(subscriber = %id, "Subscriber unregistered");
        true
    }

    /// Replace the schema generation. Does not touch the cache or subscribers.
    pub fn reload_schema(&self, source: &str) -> Result<u64, ReloadError> {
        let _writer = self.writer.lock();
        self.schema.reload(source)
    }

    /// Read-only handle to the live schema, for sessions.
    #[must_use]
    pub fn schema(&self) -> SchemaView {
        SchemaView::new(Arc::clone(&self.schema))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.read().subscribers.len()
    }

    #[must_use]
    pub fn is_registered(&self, id: &SubscriberId) -> bool {
        self.state.read().position(id).is_some()
    }

    /// Total envelopes accepted since startup.
    #[must_use]
    pub fn envelopes_published(&self) -> u64 {
        self.envelopes_published.load(Ordering::Relaxed)
    }
}
