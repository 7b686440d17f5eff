//! Typed header values.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;

use super::error::CodecError;

/// Wire type tags.
pub(crate) mod tag {
    pub const BOOL_TRUE: u8 = 0;
    pub const BOOL_FALSE: u8 = 1;
    pub const BYTE: u8 = 2;
    pub const SHORT: u8 = 3;
    pub const INTEGER: u8 = 4;
    pub const LONG: u8 = 5;
    pub const BYTE_ARRAY: u8 = 6;
    pub const STRING: u8 = 7;
    pub const TIMESTAMP: u8 = 8;
    pub const UUID: u8 = 9;
}

/// A header value. The variant determines the wire type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    ByteArray(Bytes),
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Uuid(Uuid),
}

impl HeaderValue {
    pub fn type_tag(&self) -> u8 {
        match self {
            HeaderValue::Bool(true) => tag::BOOL_TRUE,
            HeaderValue::Bool(false) => tag::BOOL_FALSE,
            HeaderValue::Byte(_) => tag::BYTE,
            HeaderValue::Short(_) => tag::SHORT,
            HeaderValue::Integer(_) => tag::INTEGER,
            HeaderValue::Long(_) => tag::LONG,
            HeaderValue::ByteArray(_) => tag::BYTE_ARRAY,
            HeaderValue::String(_) => tag::STRING,
            HeaderValue::Timestamp(_) => tag::TIMESTAMP,
            HeaderValue::Uuid(_) => tag::UUID,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Bytes taken by the tag and the value.
    pub(crate) fn encoded_len(&self) -> usize {
        1 + match self {
            HeaderValue::Bool(_) => 0,
            HeaderValue::Byte(_) => 1,
            HeaderValue::Short(_) => 2,
            HeaderValue::Integer(_) => 4,
            HeaderValue::Long(_) | HeaderValue::Timestamp(_) => 8,
            HeaderValue::ByteArray(value) => 2 + value.len(),
            HeaderValue::String(value) => 2 + value.len(),
            HeaderValue::Uuid(_) => 16,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CodecError> {
        let len = match self {
            HeaderValue::ByteArray(value) => value.len(),
            HeaderValue::String(value) => value.len(),
            _ => return Ok(()),
        };
        if len > u16::MAX as usize {
            return Err(CodecError::InvalidHeader(format!(
                "value of {len} bytes exceeds {} bytes",
                u16::MAX
            )));
        }
        Ok(())
    }

    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        dst.put_u8(self.type_tag());
        match self {
            HeaderValue::Bool(_) => {}
            HeaderValue::Byte(value) => dst.put_i8(*value),
            HeaderValue::Short(value) => dst.put_i16(*value),
            HeaderValue::Integer(value) => dst.put_i32(*value),
            HeaderValue::Long(value) | HeaderValue::Timestamp(value) => dst.put_i64(*value),
            HeaderValue::ByteArray(value) => {
                dst.put_u16(value.len() as u16);
                dst.put_slice(value);
            }
            HeaderValue::String(value) => {
                dst.put_u16(value.len() as u16);
                dst.put_slice(value.as_bytes());
            }
            HeaderValue::Uuid(value) => dst.put_slice(value.as_bytes()),
        }
    }

    /// Read a tag and value from the front of `src`.
    pub(crate) fn read_from(src: &mut &[u8]) -> Result<Self, CodecError> {
        let type_tag = take_u8(src)?;
        let value = match type_tag {
            tag::BOOL_TRUE => HeaderValue::Bool(true),
            tag::BOOL_FALSE => HeaderValue::Bool(false),
            tag::BYTE => HeaderValue::Byte(take(src, 1)?.get_i8()),
            tag::SHORT => HeaderValue::Short(take(src, 2)?.get_i16()),
            tag::INTEGER => HeaderValue::Integer(take(src, 4)?.get_i32()),
            tag::LONG => HeaderValue::Long(take(src, 8)?.get_i64()),
            tag::BYTE_ARRAY => {
                let len = take(src, 2)?.get_u16() as usize;
                HeaderValue::ByteArray(Bytes::copy_from_slice(take(src, len)?))
            }
            tag::STRING => {
                let len = take(src, 2)?.get_u16() as usize;
                let raw = take(src, len)?;
                let value = std::str::from_utf8(raw)
                    .map_err(|e| CodecError::InvalidHeader(format!("string value: {e}")))?;
                HeaderValue::String(value.to_string())
            }
            tag::TIMESTAMP => HeaderValue::Timestamp(take(src, 8)?.get_i64()),
            tag::UUID => {
                let mut raw = [0u8; 16];
                raw.copy_from_slice(take(src, 16)?);
                HeaderValue::Uuid(Uuid::from_bytes(raw))
            }
            other => return Err(CodecError::UnknownHeaderType(other)),
        };
        Ok(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::String(value)
    }
}

pub(crate) fn take_u8(src: &mut &[u8]) -> Result<u8, CodecError> {
    Ok(take(src, 1)?[0])
}

/// Split `len` bytes off the front of `src`.
pub(crate) fn take<'a>(src: &mut &'a [u8], len: usize) -> Result<&'a [u8], CodecError> {
    if src.len() < len {
        return Err(CodecError::InvalidHeader(format!(
            "header block ends {} bytes early",
            len - src.len()
        )));
    }
    let (head, rest) = src.split_at(len);
    *src = rest;
    Ok(head)
}
