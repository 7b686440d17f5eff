//! Binary framing.
//!
//! ```text
//! total_length   u32  whole frame, this field included
//! headers_length u32
//! prelude_crc    u32  CRC32 of the 8 bytes above
//! headers        headers_length bytes
//! payload        total_length - headers_length - 16 bytes
//! message_crc    u32  CRC32 of every preceding byte
//! ```
//!
//! All integers are big-endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use super::error::CodecError;
use super::header::{HeaderValue, take, take_u8};
use super::message::{Header, WireMessage};

/// Bytes before the header block.
pub const PRELUDE_LEN: usize = 12;

/// Length of the trailing message CRC.
pub const MESSAGE_CRC_LEN: usize = 4;

/// A frame with no headers and no payload.
pub const MIN_FRAME_LEN: usize = PRELUDE_LEN + MESSAGE_CRC_LEN;

/// Default upper bound on a single frame.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    pub max_frame_size: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Stateless event-stream codec.
///
/// Implements [`Decoder`] and [`Encoder`] so it can sit under a `Framed` byte
/// stream; the read buffer belongs to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStreamCodec {
    limits: CodecLimits,
}

impl EventStreamCodec {
    pub fn new(limits: CodecLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> CodecLimits {
        self.limits
    }

    /// Encode one message into a complete frame.
    pub fn marshal(&self, message: &WireMessage) -> Result<Bytes, CodecError> {
        let mut headers_length = 0usize;
        for header in &message.headers {
            let name_len = header.name.len();
            if name_len == 0 || name_len > u8::MAX as usize {
                return Err(CodecError::InvalidHeader(format!(
                    "name must be 1-255 bytes, got {name_len}"
                )));
            }
            header.value.validate()?;
            headers_length += 1 + name_len + header.value.encoded_len();
        }

        let total_length = MIN_FRAME_LEN + headers_length + message.payload.len();
        if total_length > self.limits.max_frame_size || total_length > u32::MAX as usize {
            return Err(CodecError::FrameTooLarge {
                size: total_length,
                max: self.limits.max_frame_size,
            });
        }

        let mut frame = BytesMut::with_capacity(total_length);
        frame.put_u32(total_length as u32);
        frame.put_u32(headers_length as u32);
        let prelude_crc = crc32fast::hash(&frame[..8]);
        frame.put_u32(prelude_crc);

        for header in &message.headers {
            frame.put_u8(header.name.len() as u8);
            frame.put_slice(header.name.as_bytes());
            header.value.write_to(&mut frame);
        }
        frame.put_slice(&message.payload);

        let message_crc = crc32fast::hash(&frame);
        frame.put_u32(message_crc);

        Ok(frame.freeze())
    }

    /// Decode exactly one frame. `frame` must hold the whole frame and nothing else.
    pub fn unmarshal(&self, frame: &[u8]) -> Result<WireMessage, CodecError> {
        let (total_length, headers_length) = self.read_prelude(frame)?;

        if frame.len() < total_length {
            return Err(CodecError::Truncated {
                needed: total_length,
                available: frame.len(),
            });
        }
        if frame.len() > total_length {
            return Err(CodecError::LengthMismatch {
                declared: total_length,
                actual: frame.len(),
            });
        }

        let crc_offset = total_length - MESSAGE_CRC_LEN;
        let expected = (&frame[crc_offset..]).get_u32();
        let computed = crc32fast::hash(&frame[..crc_offset]);
        if expected != computed {
            return Err(CodecError::MessageChecksumMismatch { expected, computed });
        }

        let headers_end = PRELUDE_LEN + headers_length;
        let headers = decode_headers(&frame[PRELUDE_LEN..headers_end])?;
        let payload = Bytes::copy_from_slice(&frame[headers_end..crc_offset]);

        Ok(WireMessage { headers, payload })
    }

    /// Validate the 12-byte prelude and return `(total_length, headers_length)`.
    ///
    /// The prelude CRC is checked before either length is trusted.
    fn read_prelude(&self, frame: &[u8]) -> Result<(usize, usize), CodecError> {
        if frame.len() < PRELUDE_LEN {
            return Err(CodecError::Truncated {
                needed: PRELUDE_LEN,
                available: frame.len(),
            });
        }

        let mut prelude = &frame[..PRELUDE_LEN];
        let total_length = prelude.get_u32();
        let headers_length = prelude.get_u32();
        let expected = prelude.get_u32();
        let computed = crc32fast::hash(&frame[..8]);
        if expected != computed {
            return Err(CodecError::PreludeChecksumMismatch { expected, computed });
        }

        if (total_length as usize) < MIN_FRAME_LEN {
            return Err(CodecError::InvalidFrameLength(total_length));
        }
        if total_length as usize > self.limits.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: total_length as usize,
                max: self.limits.max_frame_size,
            });
        }
        if headers_length as usize > total_length as usize - MIN_FRAME_LEN {
            return Err(CodecError::HeadersOverrun {
                headers_length,
                total_length,
            });
        }

        Ok((total_length as usize, headers_length as usize))
    }
}

fn decode_headers(mut block: &[u8]) -> Result<Vec<Header>, CodecError> {
    let mut headers = Vec::new();
    while !block.is_empty() {
        let name_len = take_u8(&mut block)? as usize;
        if name_len == 0 {
            return Err(CodecError::InvalidHeader("empty header name".to_string()));
        }
        let name = std::str::from_utf8(take(&mut block, name_len)?)
            .map_err(|e| CodecError::InvalidHeader(format!("header name: {e}")))?
            .to_string();
        let value = HeaderValue::read_from(&mut block)?;
        headers.push(Header { name, value });
    }
    Ok(headers)
}

impl Decoder for EventStreamCodec {
    type Item = WireMessage;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < PRELUDE_LEN {
            return Ok(None);
        }

        let (total_length, _) = self.read_prelude(&src[..PRELUDE_LEN])?;
        if src.len() < total_length {
            src.reserve(total_length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total_length);
        let message = self.unmarshal(&frame)?;
        debug!(
            "Decoded event-stream frame: {} bytes, {} headers",
            total_length,
            message.headers.len()
        );
        Ok(Some(message))
    }
}

impl Encoder<WireMessage> for EventStreamCodec {
    type Error = CodecError;

    fn encode(&mut self, item: WireMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = self.marshal(&item)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

/// [`EventStreamCodec::marshal`] with default limits.
pub fn marshal(message: &WireMessage) -> Result<Bytes, CodecError> {
    EventStreamCodec::default().marshal(message)
}

/// [`EventStreamCodec::unmarshal`] with default limits.
pub fn unmarshal(frame: &[u8]) -> Result<WireMessage, CodecError> {
    EventStreamCodec::default().unmarshal(frame)
}
