//! Frame buffer for accumulating chunked HTTP body reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForEnvelope`: Need at least 5 bytes
//! - `WaitingForPayload`: Envelope parsed, need N more payload bytes
//!
//! # Example
//!
//! ```
//! use pingwire::protocol::{build_frame, flags, FrameBuffer};
//!
//! let bytes = build_frame(flags::NONE, b"\x0a\x02hi");
//! let mut buffer = FrameBuffer::new();
//!
//! // Body chunks arrive in arbitrary sizes
//! assert!(buffer.push(&bytes[..3]).unwrap().is_empty());
//! let frames = buffer.push(&bytes[3..]).unwrap();
//! assert_eq!(frames.len(), 1);
//! ```

use bytes::{Bytes, BytesMut};

use super::envelope::{Envelope, DEFAULT_MAX_MESSAGE_SIZE, ENVELOPE_SIZE};
use super::Frame;
use crate::error::DecodeError;

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for complete envelope (need 5 bytes).
    WaitingForEnvelope,
    /// Envelope parsed, waiting for payload bytes.
    WaitingForPayload { envelope: Envelope },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
    max_message_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 8KB, max message: 4MB.
    pub fn new() -> Self {
        Self::with_max_message(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a new frame buffer with custom max message size.
    pub fn with_max_message(max_message_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::WaitingForEnvelope,
            max_message_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns error if an envelope has unsupported flags or declares a
    /// message larger than the configured maximum.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>, DecodeError> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>, DecodeError> {
        match self.state {
            State::WaitingForEnvelope => {
                let Some(envelope) = Envelope::decode(&self.buffer) else {
                    return Ok(None);
                };

                envelope.validate(self.max_message_size)?;

                let _ = self.buffer.split_to(ENVELOPE_SIZE);

                if envelope.length == 0 {
                    return Ok(Some(Frame::new(envelope, Bytes::new())));
                }

                self.state = State::WaitingForPayload { envelope };
                self.try_extract_one()
            }

            State::WaitingForPayload { envelope } => {
                let remaining = envelope.length as usize;

                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(remaining).freeze();
                self.state = State::WaitingForEnvelope;

                Ok(Some(Frame::new(envelope, payload)))
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True when no frame is partially received.
    ///
    /// A body that ends while this is false was cut short.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::WaitingForEnvelope) && self.is_empty()
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForEnvelope => "WaitingForEnvelope",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
