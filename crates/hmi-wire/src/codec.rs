//! Envelope encode/decode.
//!
//! Field order is fixed: `sequence_id`, `type_id`, `raw_payload`,
//! `timestamp`, `field_count`, then the `(key, value)` pairs in the order
//! the sender holds them.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use hmi_types::Envelope;

use crate::error::{DecodeError, EncodeError};
use crate::{INT32_LEN, INT64_LEN, MIN_ENCODED_LEN};

/// Exact number of bytes `encode` produces for `envelope`.
#[must_use]
pub fn encoded_len(envelope: &Envelope) -> usize {
    let strings: usize = envelope
        .fields()
        .iter()
        .map(|(k, v)| 2 * INT32_LEN + k.len() + v.len())
        .sum();
    MIN_ENCODED_LEN + envelope.raw_payload().len() + strings
}

/// Encode an envelope into a fresh buffer.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::with_capacity(encoded_len(envelope));
    encode_into(envelope, &mut buffer)?;
    Ok(buffer)
}

/// Append the encoding of `envelope` to `buffer`.
///
/// On error `buffer` is left exactly as it was.
pub fn encode_into(envelope: &Envelope, buffer: &mut Vec<u8>) -> Result<(), EncodeError> {
    let start = buffer.len();
    let result = write_envelope(envelope, buffer);
    if result.is_err() {
        buffer.truncate(start);
    }
    result
}

fn write_envelope(envelope: &Envelope, buffer: &mut Vec<u8>) -> Result<(), EncodeError> {
    buffer.reserve(encoded_len(envelope));
    buffer.extend_from_slice(&envelope.sequence_id().to_le_bytes());
    buffer.extend_from_slice(&envelope.type_id().to_le_bytes());
    write_str(buffer, envelope.raw_payload())?;
    buffer.extend_from_slice(&envelope.timestamp().to_le_bytes());

    let count = envelope.fields().len();
    let count = i32::try_from(count).map_err(|_| EncodeError::TooManyFields { count })?;
    buffer.extend_from_slice(&count.to_le_bytes());

    for (key, value) in envelope.fields() {
        write_str(buffer, key)?;
        write_str(buffer, value)?;
    }
    Ok(())
}

fn write_str(buffer: &mut Vec<u8>, value: &str) -> Result<(), EncodeError> {
    let len = i32::try_from(value.len()).map_err(|_| EncodeError::FieldTooLong { len: value.len() })?;
    buffer.extend_from_slice(&len.to_le_bytes());
    buffer.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Decode exactly one envelope from `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let mut reader = Reader::new(bytes);

    let sequence_id = reader.read_i32()?;
    let type_id = reader.read_i32()?;
    let raw_payload = reader.read_string()?;
    let timestamp = reader.read_i64()?;

    let count = reader.read_i32()?;
    if count < 0 {
        return Err(DecodeError::InvalidCount(count));
    }

    // No capacity hint from `count`: it is untrusted input.
    let mut fields = BTreeMap::new();
    for _ in 0..count {
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        match fields.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(slot) => return Err(DecodeError::DuplicateKey(slot.key().clone())),
        }
    }

    if reader.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(reader.remaining()));
    }

    Ok(Envelope::from_parts(
        sequence_id,
        type_id,
        raw_payload,
        timestamp,
        fields,
    ))
}

/// Bounds-checked cursor over an inbound buffer.
struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(DecodeError::Truncated { needed, remaining });
        }
        let slice = &self.bytes[self.position..self.position + needed];
        self.position += needed;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let mut raw = [0u8; INT32_LEN];
        raw.copy_from_slice(self.take(INT32_LEN)?);
        Ok(i32::from_le_bytes(raw))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let mut raw = [0u8; INT64_LEN];
        raw.copy_from_slice(self.take(INT64_LEN)?);
        Ok(i64::from_le_bytes(raw))
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_i32()?;
        let len_usize = usize::try_from(len).map_err(|_| DecodeError::InvalidLength(len))?;
        let raw = self.take(len_usize)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}
