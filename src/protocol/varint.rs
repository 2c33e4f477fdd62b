//! Base-128 variable-length integers.
//!
//! Each byte carries 7 payload bits, least significant group first.
//! The high bit is set on every byte except the last.
//!
//! ```text
//! 1    -> 01
//! 127  -> 7F
//! 128  -> 80 01
//! 1000 -> E8 07
//! ```

use bytes::BufMut;

use crate::error::DecodeError;

/// Longest encoding of a u64 (ceil(64 / 7)).
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Number of bytes `value` occupies on the wire.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Append the varint encoding of `value` to `buf`.
pub fn encode_varint<B: BufMut>(mut value: u64, buf: &mut B) {
    while value >= u64::from(CONTINUATION) {
        buf.put_u8((value as u8 & PAYLOAD_MASK) | CONTINUATION);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Decode a varint from the start of `buf`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// - [`DecodeError::Truncated`] if `buf` ends while the continuation bit is set
/// - [`DecodeError::MalformedVarint`] if the encoding exceeds 10 bytes or 64 bits
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut value: u64 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            // Tenth byte may only contribute the 64th bit.
            return Err(DecodeError::MalformedVarint);
        }

        value |= u64::from(byte & PAYLOAD_MASK) << (7 * i);

        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(DecodeError::Truncated)
}
