//! Protocol module - varints, envelopes, framing, and trailers.
//!
//! This module implements the framing of the HTTP body:
//! - 5-byte envelope encoding/decoding
//! - Frame buffer for accumulating partial reads
//! - Trailer frames carrying the call status
//! - Varints used inside the message encoding

mod envelope;
mod frame;
mod frame_buffer;
mod trailers;
pub mod varint;

pub use envelope::{flags, Envelope, DEFAULT_MAX_MESSAGE_SIZE, ENVELOPE_SIZE};
pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use trailers::{
    encode_trailers, parse_trailers, GRPC_MESSAGE, GRPC_STATUS, MAX_STATUS_MESSAGE_LEN,
};
