//! Frame envelope encoding and decoding.
//!
//! Every message on the HTTP body is prefixed by a 5-byte envelope:
//! ```text
//! ┌───────┬──────────────┐
//! │ Flags │ Length       │
//! │ 1 byte│ 4 bytes      │
//! │       │ uint32 BE    │
//! └───────┴──────────────┘
//! ```

use crate::error::DecodeError;

/// Envelope size in bytes (fixed, exactly 5).
pub const ENVELOPE_SIZE: usize = 5;

/// Default maximum message size (4 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 4 * 1024 * 1024;

/// Flag constants for the envelope.
pub mod flags {
    /// Uncompressed data frame.
    pub const NONE: u8 = 0;
    /// Payload is compressed with the negotiated encoding.
    pub const COMPRESSED: u8 = 0b0000_0001;
    /// Frame carries trailers instead of a message.
    pub const TRAILERS: u8 = 0b1000_0000;

    /// Reserved bits mask (bits 1-6).
    pub const RESERVED_MASK: u8 = 0b0111_1110;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Flags byte (see `flags` module).
    pub flags: u8,
    /// Length of the message bytes that follow.
    pub length: u32,
}

impl Envelope {
    pub fn new(flags: u8, length: u32) -> Self {
        Self { flags, length }
    }

    /// Envelope for an uncompressed data frame.
    pub fn data(length: u32) -> Self {
        Self::new(flags::NONE, length)
    }

    /// Envelope for a trailers frame.
    pub fn trailers(length: u32) -> Self {
        Self::new(flags::TRAILERS, length)
    }

    /// Encode envelope to bytes (Big Endian length).
    ///
    /// # Example
    ///
    /// ```
    /// use pingwire::protocol::Envelope;
    ///
    /// let bytes = Envelope::data(16).encode();
    /// assert_eq!(bytes, [0, 0, 0, 0, 16]);
    /// ```
    pub fn encode(&self) -> [u8; ENVELOPE_SIZE] {
        let mut buf = [0u8; ENVELOPE_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode envelope into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `ENVELOPE_SIZE` (5 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= ENVELOPE_SIZE);
        buf[0] = self.flags;
        buf[1..5].copy_from_slice(&self.length.to_be_bytes());
    }

    /// Decode envelope from bytes.
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < ENVELOPE_SIZE {
            return None;
        }
        Some(Self {
            flags: buf[0],
            length: u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
        })
    }

    /// Validate the envelope.
    ///
    /// Checks:
    /// - Reserved flag bits are 0
    /// - Message is not compressed (no encoding is ever negotiated)
    /// - Length doesn't exceed max
    pub fn validate(&self, max_message_size: u32) -> Result<(), DecodeError> {
        if self.flags & flags::RESERVED_MASK != 0 || self.is_compressed() {
            return Err(DecodeError::UnsupportedFlags(self.flags));
        }

        if self.length > max_message_size {
            return Err(DecodeError::MessageTooLarge {
                size: self.length,
                max: max_message_size,
            });
        }

        Ok(())
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        flags::has_flag(self.flags, flags::COMPRESSED)
    }

    #[inline]
    pub fn is_trailers(&self) -> bool {
        flags::has_flag(self.flags, flags::TRAILERS)
    }

    /// Total frame size (envelope + message).
    #[inline]
    pub fn frame_len(&self) -> usize {
        ENVELOPE_SIZE + self.length as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_big_endian_byte_order() {
        let bytes = Envelope::new(0x80, 0x01020304).encode();
        assert_eq!(bytes, [0x80, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_envelope_decode() {
        let envelope = Envelope::decode(&[0x00, 0x00, 0x00, 0x03, 0xE8]).unwrap();
        assert_eq!(envelope, Envelope::data(1000));
        assert_eq!(envelope.frame_len(), 1005);
        assert!(!envelope.is_trailers());
    }

    #[test]
    fn test_decode_too_short_buffer() {
        assert!(Envelope::decode(&[0u8; 4]).is_none());
    }

    #[test]
    fn test_validate_accepts_data_and_trailers() {
        assert!(Envelope::data(10).validate(DEFAULT_MAX_MESSAGE_SIZE).is_ok());
        assert!(Envelope::trailers(10).validate(DEFAULT_MAX_MESSAGE_SIZE).is_ok());
    }

    #[test]
    fn test_validate_rejects_compressed() {
        let envelope = Envelope::new(flags::COMPRESSED, 10);
        assert_eq!(
            envelope.validate(DEFAULT_MAX_MESSAGE_SIZE),
            Err(DecodeError::UnsupportedFlags(0x01))
        );
    }

    #[test]
    fn test_validate_reserved_bits_must_be_zero() {
        let envelope = Envelope::new(0b0000_0100, 0);
        assert!(envelope.validate(DEFAULT_MAX_MESSAGE_SIZE).is_err());
    }

    #[test]
    fn test_validate_message_too_large() {
        let err = Envelope::data(1_000).validate(100).unwrap_err();
        assert_eq!(err, DecodeError::MessageTooLarge { size: 1_000, max: 100 });
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
