//! # HMI Types Crate
//!
//! The `Envelope` is the single structured unit that crosses the boundary
//! between the telemetry middleware and its HMI clients.
//!
//! ## Design Principles
//!
//! - **Immutable once accepted**: an `Envelope` only exposes read accessors.
//!   Schema resolution computes derived lookups, it never rewrites fields.
//! - **Hub-assigned identity**: producers build a `CandidateEnvelope`; only
//!   the distribution hub turns it into an `Envelope` with a sequence id.
//! - **Lookup by key**: `fields` is a map with unique keys. Consumers look
//!   signals up by name and never depend on iteration order.

pub mod envelope;

pub use envelope::{CandidateEnvelope, Envelope};

/// Numeric message category (historically a CAN arbitration id).
pub type TypeId = i32;

/// Hub-assigned, strictly increasing envelope id.
pub type SequenceId = i32;

/// Producer-side capture time in milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Sequence id carried by an envelope the hub has not accepted yet.
pub const UNASSIGNED_SEQUENCE_ID: SequenceId = 0;

/// First sequence id handed out by a freshly started hub.
pub const FIRST_SEQUENCE_ID: SequenceId = 1;

/// Type id used for synthetic envelopes injected from a client.
pub const DIAGNOSTIC_TYPE_ID: TypeId = 9999;

/// What a client displays for a signal that could not be resolved.
pub const UNRESOLVED_DISPLAY: &str = "N/A";
