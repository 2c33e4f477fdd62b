//! Codec module - message serialization.
//!
//! - [`Message`] / [`Field`] / [`WireType`] - the field-based data model
//! - [`TextCodec`] - encode/decode of the single-field echo message
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects.
//! Every call is a pure transformation, safe to run from any task.
//!
//! # Example
//!
//! ```
//! use pingwire::codec::TextCodec;
//!
//! let long = "A".repeat(1000);
//! let encoded = TextCodec::encode(&long);
//! assert_eq!(&encoded[..3], &[0x0A, 0xE8, 0x07]);
//! assert_eq!(TextCodec::decode(&encoded, false).unwrap(), long);
//! ```

mod message;
mod text;

pub use message::{tag, Field, Message, WireType};
pub use text::{TextCodec, TEXT_FIELD, TEXT_TAG};
