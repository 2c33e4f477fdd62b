//! Message data model: fields tagged with a number and a wire type.
//!
//! A field is written as a varint tag `(number << 3) | wire_type`,
//! followed by the field body. Length-delimited bodies carry a varint
//! length prefix.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::varint::{encode_varint, encoded_len};

/// How the bytes after a tag are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

/// Compute the tag of a field.
///
/// ```
/// use pingwire::codec::{tag, WireType};
///
/// assert_eq!(tag(1, WireType::LengthDelimited), 0x0A);
/// ```
#[inline]
pub const fn tag(number: u32, wire_type: WireType) -> u64 {
    ((number as u64) << 3) | wire_type as u64
}

/// A single field with its already-encoded body.
///
/// For `LengthDelimited` the body is the raw payload; the length prefix is
/// added on encode. For the other wire types the body is written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    number: u32,
    wire_type: WireType,
    payload: Bytes,
}

impl Field {
    pub fn new(number: u32, wire_type: WireType, payload: impl Into<Bytes>) -> Self {
        Self {
            number,
            wire_type,
            payload: payload.into(),
        }
    }

    /// Length-delimited field (strings, bytes, nested messages).
    pub fn length_delimited(number: u32, payload: impl Into<Bytes>) -> Self {
        Self::new(number, WireType::LengthDelimited, payload)
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn tag(&self) -> u64 {
        tag(self.number, self.wire_type)
    }

    /// Bytes this field occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let prefix = match self.wire_type {
            WireType::LengthDelimited => encoded_len(self.payload.len() as u64),
            _ => 0,
        };
        encoded_len(self.tag()) + prefix + self.payload.len()
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        encode_varint(self.tag(), buf);
        if self.wire_type == WireType::LengthDelimited {
            encode_varint(self.payload.len() as u64, buf);
        }
        buf.put_slice(&self.payload);
    }
}

/// Ordered sequence of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: Vec<Field>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        self.fields.iter().map(Field::encoded_len).sum()
    }

    /// Serialize all fields in order into one buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        for field in &self.fields {
            field.encode(&mut buf);
        }
        buf.freeze()
    }
}
