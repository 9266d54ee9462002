//! Write payload normalization.
//!
//! Hosts pass text, a single integer, a sequence of integers, or a raw byte
//! buffer. The shapes form a closed union and all of them normalize to one
//! byte sequence before anything reaches the hardware; a single out-of-range
//! integer fails the whole write with no bytes transmitted.

use crate::error::{SerialError, SerialResult};

/// The shapes a host may hand to `write`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePayload {
    /// Text, sent as its ASCII bytes.
    Text(String),
    /// A single byte value. Must be in `[0, 255]`.
    Byte(i64),
    /// A sequence of byte values, each validated like `Byte`.
    Bytes(Vec<i64>),
    /// A raw buffer, passed through untouched.
    Raw(Vec<u8>),
}

impl WritePayload {
    /// Normalize to the byte sequence handed to the hardware write path.
    pub fn encode(self) -> SerialResult<Vec<u8>> {
        match self {
            WritePayload::Text(s) => Ok(s.into_bytes()),
            WritePayload::Byte(value) => Ok(vec![checked_byte(value)?]),
            WritePayload::Bytes(values) => values.into_iter().map(checked_byte).collect(),
            WritePayload::Raw(bytes) => Ok(bytes),
        }
    }
}

fn checked_byte(value: i64) -> SerialResult<u8> {
    u8::try_from(value).map_err(|_| SerialError::InvalidByteValue(value))
}

impl From<&str> for WritePayload {
    fn from(s: &str) -> Self {
        WritePayload::Text(s.to_string())
    }
}

impl From<String> for WritePayload {
    fn from(s: String) -> Self {
        WritePayload::Text(s)
    }
}

impl From<i64> for WritePayload {
    fn from(value: i64) -> Self {
        WritePayload::Byte(value)
    }
}

impl From<Vec<i64>> for WritePayload {
    fn from(values: Vec<i64>) -> Self {
        WritePayload::Bytes(values)
    }
}

impl From<&[i64]> for WritePayload {
    fn from(values: &[i64]) -> Self {
        WritePayload::Bytes(values.to_vec())
    }
}

impl From<Vec<u8>> for WritePayload {
    fn from(bytes: Vec<u8>) -> Self {
        WritePayload::Raw(bytes)
    }
}

impl From<&[u8]> for WritePayload {
    fn from(bytes: &[u8]) -> Self {
        WritePayload::Raw(bytes.to_vec())
    }
}
