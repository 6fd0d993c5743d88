//! # HMI Hub - Telemetry Distribution
//!
//! One middleware process holds the latest envelope per type id and pushes
//! every accepted envelope to the client processes registered with it.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐  publish()/inject()  ┌──────────────────┐  on_envelope()  ┌────────────────────┐
//! │  Producer /  │ ───────────────────→ │ DistributionHub  │ ──────────────→ │ SubscriberSession  │
//! │  client      │                      │ latest[type_id]  │                 │  view + SchemaView │
//! └──────────────┘                      └──────────────────┘ ←── get_latest ─└────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - The hub assigns `sequence_id`s; they strictly increase for the lifetime
//!   of one hub instance.
//! - `publish`, `inject` and `reload_schema` are serialized; fan-out walks a
//!   snapshot of the subscribers taken when the call started.
//! - A subscriber whose delivery fails at transport level is evicted; the
//!   rest still receive the envelope.
//! - Injected envelopes are indistinguishable from produced ones downstream.

pub mod connection;
pub mod error;
pub mod hub;
pub mod session;
pub mod subscriber;

// Re-export main types
pub use connection::{HubConnection, LocalConnection};
pub use error::{ConnectionError, HubError, SessionError, TransportError};
pub use hub::DistributionHub;
pub use session::{SessionState, SubscriberSession};
pub use subscriber::{CallbackHandle, EnvelopeCallback, SubscriberId};
