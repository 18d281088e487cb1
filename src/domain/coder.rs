//! The narrow encoding contract a test stream relies on, and the standard coders
//!
//! A test stream never decodes anything. It only needs to know, while a script
//! is being written, whether each element can be encoded by the coder the
//! pipeline will use, so that a type mismatch is reported against the script
//! rather than deep inside the pipeline.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use thiserror::Error;

use super::value::{ElementValue, ValueKind};

/// Errors raised while encoding an element
#[derive(Debug, Error)]
pub enum CoderError {
    #[error("coder {coder} cannot encode {kind} values")]
    Unsupported {
        coder: &'static str,
        kind: ValueKind,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Capability to validate and encode element values
pub trait Coder: fmt::Debug + Send + Sync {
    /// Stable name used in diagnostics
    fn name(&self) -> &'static str;

    fn encode(&self, value: &ElementValue) -> Result<Bytes, CoderError>;

    fn can_encode(&self, value: &ElementValue) -> bool {
        self.encode(value).is_ok()
    }
}

fn unsupported(coder: &'static str, value: &ElementValue) -> CoderError {
    CoderError::Unsupported {
        coder,
        kind: value.kind(),
    }
}

/// Signed integers as zig-zag LEB128 varints
#[derive(Debug, Clone, Copy, Default)]
pub struct VarIntCoder;

impl VarIntCoder {
    const NAME: &'static str = "VarIntCoder";
}

impl Coder for VarIntCoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &ElementValue) -> Result<Bytes, CoderError> {
        let n = match value {
            ElementValue::Int(n) => *n,
            other => return Err(unsupported(Self::NAME, other)),
        };
        let mut zigzag = ((n << 1) ^ (n >> 63)) as u64;
        let mut buf = BytesMut::with_capacity(10);
        loop {
            let byte = (zigzag & 0x7f) as u8;
            zigzag >>= 7;
            if zigzag == 0 {
                buf.put_u8(byte);
                break;
            }
            buf.put_u8(byte | 0x80);
        }
        Ok(buf.freeze())
    }

    fn can_encode(&self, value: &ElementValue) -> bool {
        matches!(value, ElementValue::Int(_))
    }
}

/// UTF-8 text
#[derive(Debug, Clone, Copy, Default)]
pub struct StringUtf8Coder;

impl StringUtf8Coder {
    const NAME: &'static str = "StringUtf8Coder";
}

impl Coder for StringUtf8Coder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &ElementValue) -> Result<Bytes, CoderError> {
        match value {
            ElementValue::Text(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            other => Err(unsupported(Self::NAME, other)),
        }
    }

    fn can_encode(&self, value: &ElementValue) -> bool {
        matches!(value, ElementValue::Text(_))
    }
}

/// Raw byte arrays, passed through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArrayCoder;

impl ByteArrayCoder {
    const NAME: &'static str = "ByteArrayCoder";
}

impl Coder for ByteArrayCoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &ElementValue) -> Result<Bytes, CoderError> {
        match value {
            ElementValue::Bytes(b) => Ok(b.clone()),
            other => Err(unsupported(Self::NAME, other)),
        }
    }

    fn can_encode(&self, value: &ElementValue) -> bool {
        matches!(value, ElementValue::Bytes(_))
    }
}

/// Booleans as a single byte
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCoder;

impl BooleanCoder {
    const NAME: &'static str = "BooleanCoder";
}

impl Coder for BooleanCoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &ElementValue) -> Result<Bytes, CoderError> {
        match value {
            ElementValue::Bool(b) => {
                let byte: &'static [u8] = if *b { &[1] } else { &[0] };
                Ok(Bytes::from_static(byte))
            }
            other => Err(unsupported(Self::NAME, other)),
        }
    }

    fn can_encode(&self, value: &ElementValue) -> bool {
        matches!(value, ElementValue::Bool(_))
    }
}

/// Any value, serialized as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCoder;

impl Coder for JsonCoder {
    fn name(&self) -> &'static str {
        "JsonCoder"
    }

    fn encode(&self, value: &ElementValue) -> Result<Bytes, CoderError> {
        Ok(Bytes::from(serde_json::to_vec(&value.to_json())?))
    }
}
