//! # HMI Middleware Runtime
//!
//! Hosts the distribution hub in the middleware process.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs + metrics)
//! 2. Build the hub with the built-in schema
//! 3. Apply `HMI_SCHEMA_FILE` if set (a rejected file leaves the defaults active)
//! 4. Register the local dashboard session and pull the cache
//! 5. Inject the diagnostic envelope
//! 6. Start the simulated producer and the view logger
//!
//! The producer stands in for the vehicle bus reader: every envelope it
//! emits crosses the wire codec before the hub accepts it.

pub mod config;
pub mod producer;
pub mod runtime;

pub use config::RuntimeConfig;
pub use producer::{FirmwareEra, SimulatedProducer};
pub use runtime::MiddlewareRuntime;
