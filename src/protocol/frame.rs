//! Frame struct with typed accessors.
//!
//! Represents a complete frame with envelope and payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use pingwire::protocol::{Envelope, Frame};
//! use bytes::Bytes;
//!
//! let frame = Frame::new(Envelope::data(5), Bytes::from_static(b"hello"));
//! assert!(!frame.is_trailers());
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::envelope::{flags, Envelope, ENVELOPE_SIZE};

/// A complete frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded envelope.
    pub envelope: Envelope,
    /// Message or trailer bytes.
    pub payload: Bytes,
}

impl Frame {
    pub fn new(envelope: Envelope, payload: Bytes) -> Self {
        Self { envelope, payload }
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.envelope.flags
    }

    /// Check if this frame carries trailers.
    #[inline]
    pub fn is_trailers(&self) -> bool {
        flags::has_flag(self.envelope.flags, flags::TRAILERS)
    }

    /// Check if this frame carries a message.
    #[inline]
    pub fn is_data(&self) -> bool {
        !self.is_trailers()
    }
}

/// Build a complete frame as a single contiguous buffer.
///
/// # Panics
///
/// Panics if `payload` is longer than `u32::MAX` bytes.
///
/// # Example
///
/// ```
/// use pingwire::protocol::{build_frame, flags};
///
/// let bytes = build_frame(flags::NONE, b"hello");
/// assert_eq!(&bytes[..], &[0, 0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o']);
/// ```
pub fn build_frame(flags: u8, payload: &[u8]) -> Bytes {
    let length = u32::try_from(payload.len()).expect("frame payload exceeds u32::MAX");
    let mut buf = BytesMut::with_capacity(ENVELOPE_SIZE + payload.len());
    buf.put_slice(&Envelope::new(flags, length).encode());
    buf.put_slice(payload);
    buf.freeze()
}
