//! Error types for pingwire.

use thiserror::Error;

use crate::status::Status;

/// Failure to turn wire bytes back into a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes than the envelope, tag, length or payload require.
    #[error("truncated frame")]
    Truncated,

    /// Declared length disagrees with the bytes actually present.
    #[error("length mismatch: declared {declared} bytes, found {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// First byte of the message is not field 1 / length-delimited.
    #[error("unsupported field/wire type (tag 0x{0:02x})")]
    UnsupportedTag(u8),

    /// Payload is not valid UTF-8.
    #[error("invalid text encoding")]
    InvalidText,

    /// Varint longer than 10 bytes or overflowing u64.
    #[error("malformed varint")]
    MalformedVarint,

    /// Envelope flags other than "uncompressed data".
    #[error("unsupported envelope flags 0x{0:02x}")]
    UnsupportedFlags(u8),

    /// Envelope declares a message above the configured limit.
    #[error("message size {size} exceeds maximum {max}")]
    MessageTooLarge { size: u32, max: u32 },
}

/// Failure on the way to or from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect failed.
    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// HTTP protocol or body error.
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request could not be built.
    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    /// Endpoint is not an `http://host:port` URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Server answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Response finished OK but carried no data frame.
    #[error("response carried no message frame")]
    MissingMessage,
}

/// Main error type for all pingwire operations.
#[derive(Debug, Error)]
pub enum PingwireError {
    /// I/O error on sockets or files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Server reported a non-OK status in the trailers.
    #[error("rpc failed: {0}")]
    Rpc(Status),

    /// Invalid configuration file or arguments.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using PingwireError.
pub type Result<T> = std::result::Result<T, PingwireError>;
