//! # HMI Wire Codec
//!
//! Deterministic byte encoding of an `Envelope` for crossing a process or
//! transport boundary. In-process delivery skips this crate entirely.
//!
//! ## Wire Format
//!
//! All integers are little-endian. A string is an `i32` byte length followed
//! by that many UTF-8 bytes; an absent payload is the empty string.
//!
//! ```text
//! ┌─────────────┬─────────┬─────────────┬───────────┬─────────────┬──────────────────────────┐
//! │ sequence_id │ type_id │ raw_payload │ timestamp │ field_count │ (key, value) × count     │
//! │ i32         │ i32     │ str         │ i64       │ i32         │ str, str                 │
//! └─────────────┴─────────┴─────────────┴───────────┴─────────────┴──────────────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! A message that does not decode completely is rejected as a whole. The
//! decoder never returns a shorter field map than the sender declared.

pub mod codec;
pub mod error;

pub use codec::{decode, encode, encode_into, encoded_len};
pub use error::{DecodeError, EncodeError};

/// Width of an `i32` on the wire.
pub const INT32_LEN: usize = 4;

/// Width of an `i64` on the wire.
pub const INT64_LEN: usize = 8;

/// Bytes of an encoded envelope with an empty payload and no fields.
pub const MIN_ENCODED_LEN: usize = INT32_LEN * 4 + INT64_LEN;
