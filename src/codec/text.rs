//! Text codec - the single-field echo message.
//!
//! The request and the response are both a message with one
//! length-delimited field, number 1, holding UTF-8 text:
//!
//! ```text
//! 0A <varint length> <payload>
//! ```
//!
//! Invalid UTF-8 in a payload is always reported as
//! [`DecodeError::InvalidText`]; raw bytes are never handed back.
//!
//! # Example
//!
//! ```
//! use pingwire::codec::TextCodec;
//!
//! let encoded = TextCodec::encode("hello");
//! assert_eq!(&encoded[..], b"\x0a\x05hello");
//! assert_eq!(TextCodec::decode(&encoded, false).unwrap(), "hello");
//!
//! let framed = TextCodec::encode_framed("hello");
//! assert_eq!(TextCodec::decode(&framed, true).unwrap(), "hello");
//! ```

use std::cmp::Ordering;

use bytes::Bytes;

use super::message::{tag, Field, Message, WireType};
use crate::error::DecodeError;
use crate::protocol::varint::decode_varint;
use crate::protocol::{build_frame, flags, Envelope, ENVELOPE_SIZE};

/// Field number carrying the text.
pub const TEXT_FIELD: u32 = 1;

/// Tag byte of the text field (`0x0A`).
pub const TEXT_TAG: u8 = tag(TEXT_FIELD, WireType::LengthDelimited) as u8;

/// Codec for the echo message.
pub struct TextCodec;

impl TextCodec {
    /// Encode `text` as tag + varint length + UTF-8 bytes.
    ///
    /// No envelope is added; see [`TextCodec::encode_framed`].
    pub fn encode(text: &str) -> Bytes {
        Message::new()
            .with_field(Field::length_delimited(
                TEXT_FIELD,
                Bytes::copy_from_slice(text.as_bytes()),
            ))
            .encode()
    }

    /// Encode `text` and prefix it with an uncompressed data envelope.
    pub fn encode_framed(text: &str) -> Bytes {
        build_frame(flags::NONE, &Self::encode(text))
    }

    /// Decode text from `bytes`, optionally preceded by a 5-byte envelope.
    ///
    /// An empty message decodes to the empty string.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Truncated`] if the envelope, length or payload is cut short
    /// - [`DecodeError::LengthMismatch`] if bytes remain after the declared length
    /// - [`DecodeError::UnsupportedFlags`] if the envelope is not an uncompressed data frame
    /// - [`DecodeError::UnsupportedTag`] if the first byte is not `0x0A`
    /// - [`DecodeError::InvalidText`] if the payload is not UTF-8
    pub fn decode(bytes: &[u8], has_envelope: bool) -> Result<String, DecodeError> {
        let message = if has_envelope {
            Self::strip_envelope(bytes)?
        } else {
            bytes
        };

        let payload = Self::decode_payload(message)?;
        std::str::from_utf8(payload)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidText)
    }

    /// Return the raw payload of the text field without UTF-8 validation.
    pub fn decode_payload(message: &[u8]) -> Result<&[u8], DecodeError> {
        let Some((&tag, rest)) = message.split_first() else {
            return Ok(&[]);
        };

        if tag != TEXT_TAG {
            return Err(DecodeError::UnsupportedTag(tag));
        }

        let (length, used) = decode_varint(rest)?;
        let rest = &rest[used..];
        let length = usize::try_from(length).map_err(|_| DecodeError::Truncated)?;

        match rest.len().cmp(&length) {
            Ordering::Less => Err(DecodeError::Truncated),
            Ordering::Greater => Err(DecodeError::LengthMismatch {
                declared: length,
                actual: rest.len(),
            }),
            Ordering::Equal => Ok(rest),
        }
    }

    fn strip_envelope(bytes: &[u8]) -> Result<&[u8], DecodeError> {
        let envelope = Envelope::decode(bytes).ok_or(DecodeError::Truncated)?;
        if envelope.flags != flags::NONE {
            return Err(DecodeError::UnsupportedFlags(envelope.flags));
        }

        let body = &bytes[ENVELOPE_SIZE..];

        match bytes.len().cmp(&envelope.frame_len()) {
            Ordering::Less => Err(DecodeError::Truncated),
            Ordering::Greater => Err(DecodeError::LengthMismatch {
                declared: envelope.length as usize,
                actual: body.len(),
            }),
            Ordering::Equal => Ok(body),
        }
    }
}
