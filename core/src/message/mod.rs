//! Length-prefixed message framing.
//!
//! A data model blob is a flat buffer of messages laid out back to back:
//!
//! - 01..05 Length (base-128 varint, low group first)
//! - vr Payload (one serialized [`command::FunctionCall`])
//!
//! The framer knows nothing about payload content.

use bytes::{Buf, BufMut, BytesMut};

use crate::{
    constants::{MAX_MESSAGE_LEN, MAX_PREFIX_LEN},
    error::FramingError,
};

use self::command::DecodedCommand;

pub mod command;

/// Boundaries of one message relative to the offset it was scanned at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub prefix_len: usize,
    /// Prefix and payload
    pub total_len: usize,
}

impl Frame {
    pub const fn payload_len(&self) -> usize {
        self.total_len - self.prefix_len
    }
}

/// Read the length prefix at the start of `data` and check that the whole
/// message it announces is present.
pub fn scan_length_prefixed(data: &[u8]) -> Result<Frame, FramingError> {
    let hdr_max = data.len().min(MAX_PREFIX_LEN);
    let mut buf = &data[..hdr_max];
    let mut length: u64 = 0;
    let mut shift = 0;
    let mut prefix_len = None;

    while buf.has_remaining() {
        let byte = buf.get_u8();
        length |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            prefix_len = Some(hdr_max - buf.remaining());
            break;
        }
    }

    let Some(prefix_len) = prefix_len else {
        return Err(FramingError::MalformedPrefix { scanned: hdr_max });
    };
    if length > MAX_MESSAGE_LEN {
        return Err(FramingError::LengthOverflow { length });
    }
    // Cannot overflow, length is below 2^31
    let total_len = prefix_len + length as usize;
    if total_len > data.len() {
        return Err(FramingError::Truncated {
            length,
            available: data.len() - prefix_len,
        });
    }

    Ok(Frame {
        prefix_len,
        total_len,
    })
}

/// One message carved out of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedMessage<'a> {
    /// Position of the length prefix in the whole buffer
    pub offset: usize,
    pub frame: Frame,
    pub payload: &'a [u8],
}

/// Iterates over the messages of a buffer. Stops after the first framing
/// error, since nothing past a bad prefix can be trusted.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Frames<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed by the messages yielded so far.
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<FramedMessage<'a>, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.offset..];
        match scan_length_prefixed(rest) {
            Ok(frame) => {
                let message = FramedMessage {
                    offset: self.offset,
                    frame,
                    payload: &rest[frame.prefix_len..frame.total_len],
                };
                self.offset += frame.total_len;
                Some(Ok(message))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl core::iter::FusedIterator for Frames<'_> {}

/// Builds a data model blob from commands, the inverse of [`Frames`].
#[derive(Debug, Default, Clone)]
pub struct StreamWriter {
    buf: BytesMut,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append one length-prefixed command.
    pub fn push(&mut self, command: &DecodedCommand) -> Result<&mut Self, prost::EncodeError> {
        command.encode_length_delimited(&mut self.buf)?;
        Ok(self)
    }

    /// Append bytes as-is, e.g. a payload that was framed elsewhere.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> BytesMut {
        self.buf
    }
}
