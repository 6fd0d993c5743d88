//! # HMI Schema Registry
//!
//! Turns a raw `(type_id, fields)` pair into canonical signal values, so that
//! clients keep working while CAN ids and DBC signal names drift across
//! firmware revisions.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure logic, no locking
//!   - `rules`: parser for the line-based rule document
//!   - `Generation`: one immutable alias table
//!   - `Resolution`: a resolved value or the "N/A" sentinel
//!   - `defaults`: the rule set the middleware starts with
//!
//! - **Registry** (`registry`): the live generation pointer
//!   - `SchemaRegistry`: owns the pointer, the only place `reload` exists
//!   - `SchemaView`: read-only handle handed to client sessions
//!
//! ## Resolution
//!
//! ```text
//! type_id ──→ category ──→ alias list for canonical ──→ first key present in fields
//!   775 ───→ vehicle_flags ──→ [ARM_STATE_FLAG, Arm_state] ──→ "1"
//! ```
//!
//! Newer names are listed first and shadow older ones when a producer emits
//! both during a migration window. `resolve` is total: anything missing
//! degrades to `Resolution::Unresolved`.
//!
//! ## Reload
//!
//! A reload parses a complete new table and publishes it with one pointer
//! swap. A resolve that already holds the old generation finishes against
//! it; a failed parse leaves the old generation serving.

pub mod domain;
pub mod error;
pub mod registry;

pub use domain::{Category, Generation, Resolution, DEFAULT_RULES};
pub use error::ReloadError;
pub use registry::{SchemaRegistry, SchemaView};
