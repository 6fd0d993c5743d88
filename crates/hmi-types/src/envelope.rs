//! # Telemetry Envelope
//!
//! ## Lifecycle
//!
//! ```text
//! producer ── CandidateEnvelope ──→ hub.publish() ── Envelope (sequence_id) ──→ subscribers
//! ```
//!
//! `raw_payload` is a human-readable capture of the original bus bytes. It is
//! carried for diagnostics only and never parsed here.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{SequenceId, Timestamp, TypeId, DIAGNOSTIC_TYPE_ID, UNASSIGNED_SEQUENCE_ID};

/// Payload of the diagnostic envelope a client injects to exercise the path.
pub const DIAGNOSTIC_PAYLOAD: &str = "DUMMY:12:34:56:78:90:AB:CD:EF";

/// Signal carried by the diagnostic envelope.
pub const DIAGNOSTIC_FIELD: &str = "dummy_key";

/// An accepted telemetry message.
///
/// Fields are private so an accepted envelope cannot be edited in place;
/// a `BTreeMap` keeps keys unique and the encoding order deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    sequence_id: SequenceId,
    type_id: TypeId,
    raw_payload: String,
    timestamp: Timestamp,
    fields: BTreeMap<String, String>,
}

impl Envelope {
    /// Finalize a candidate with the sequence id the hub assigned to it.
    #[must_use]
    pub fn accepted(candidate: CandidateEnvelope, sequence_id: SequenceId) -> Self {
        Self {
            sequence_id,
            type_id: candidate.type_id,
            raw_payload: candidate.raw_payload,
            timestamp: candidate.timestamp,
            fields: candidate.fields,
        }
    }

    /// Rebuild an envelope from already-validated parts (used by the wire decoder).
    #[must_use]
    pub fn from_parts(
        sequence_id: SequenceId,
        type_id: TypeId,
        raw_payload: String,
        timestamp: Timestamp,
        fields: BTreeMap<String, String>,
    ) -> Self {
        Self {
            sequence_id,
            type_id,
            raw_payload,
            timestamp,
            fields,
        }
    }

    #[must_use]
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn raw_payload(&self) -> &str {
        &self.raw_payload
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Value of a single signal key, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Whether the hub has assigned this envelope a sequence id.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.sequence_id != UNASSIGNED_SEQUENCE_ID
    }

    /// `key=value` pairs joined for log lines.
    #[must_use]
    pub fn fields_summary(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A producer-side envelope that has not been accepted by the hub yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateEnvelope {
    pub type_id: TypeId,
    pub raw_payload: String,
    pub timestamp: Timestamp,
    pub fields: BTreeMap<String, String>,
}

impl CandidateEnvelope {
    /// Empty candidate for `type_id` with timestamp 0.
    #[must_use]
    pub fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            ..Self::default()
        }
    }

    /// Candidate stamped with the current wall-clock time.
    #[must_use]
    pub fn now(type_id: TypeId) -> Self {
        Self::new(type_id).with_timestamp(now_millis())
    }

    /// The synthetic envelope a client injects to test the distribution path.
    #[must_use]
    pub fn diagnostic() -> Self {
        Self::now(DIAGNOSTIC_TYPE_ID)
            .with_payload(DIAGNOSTIC_PAYLOAD)
            .with_field(DIAGNOSTIC_FIELD, "ACTIVE")
    }

    #[must_use]
    pub fn with_payload(mut self, raw_payload: impl Into<String>) -> Self {
        self.raw_payload = raw_payload.into();
        self
    }

    /// An absent payload is carried as the empty string.
    #[must_use]
    pub fn with_optional_payload(self, raw_payload: Option<String>) -> Self {
        self.with_payload(raw_payload.unwrap_or_default())
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Insert a signal. A repeated key replaces the earlier value.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_fields<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl From<Envelope> for CandidateEnvelope {
    /// Strip the hub identity, e.g. to re-publish a captured envelope.
    fn from(envelope: Envelope) -> Self {
        Self {
            type_id: envelope.type_id,
            raw_payload: envelope.raw_payload,
            timestamp: envelope.timestamp,
            fields: envelope.fields,
        }
    }
}

fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| Timestamp::try_from(d.as_millis()).unwrap_or(Timestamp::MAX))
        .unwrap_or_default()
}
