//! Trailer frame bodies.
//!
//! gRPC-web carries the call status in a final frame flagged `TRAILERS`,
//! whose payload is HTTP/1-style header lines:
//!
//! ```text
//! grpc-status:3\r\n
//! grpc-message:truncated frame\r\n
//! ```

use bytes::Bytes;

use super::envelope::flags;
use super::frame::build_frame;
use crate::status::{Code, Status};

pub const GRPC_STATUS: &str = "grpc-status";
pub const GRPC_MESSAGE: &str = "grpc-message";

/// Longest `grpc-message` value written, in bytes.
pub const MAX_STATUS_MESSAGE_LEN: usize = 1024;

/// Encode `status` as a complete trailers frame (envelope included).
pub fn encode_trailers(status: &Status) -> Bytes {
    let mut body = format!("{}:{}\r\n", GRPC_STATUS, status.code().as_u32());
    if !status.message().is_empty() {
        // Header values cannot span lines.
        let message = status.message().replace(['\r', '\n'], " ");
        body.push_str(&format!("{}:{}\r\n", GRPC_MESSAGE, clip(&message)));
    }
    build_frame(flags::TRAILERS, body.as_bytes())
}

/// Cut `message` to at most `MAX_STATUS_MESSAGE_LEN` bytes on a char boundary.
fn clip(message: &str) -> &str {
    let mut end = message.len().min(MAX_STATUS_MESSAGE_LEN);
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Parse a trailers frame payload into a status.
///
/// Header names are matched case-insensitively. Unknown headers are ignored.
/// A missing or unparseable `grpc-status` yields `Unknown`.
pub fn parse_trailers(payload: &[u8]) -> Status {
    let text = String::from_utf8_lossy(payload);
    let mut code = None;
    let mut message = String::new();

    for line in text.split("\r\n").filter(|l| !l.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if name.trim().eq_ignore_ascii_case(GRPC_STATUS) {
            code = value.parse::<u32>().ok().map(Code::from_u32);
        } else if name.trim().eq_ignore_ascii_case(GRPC_MESSAGE) {
            message = value.to_string();
        }
    }

    match code {
        Some(code) => Status::new(code, message),
        None => Status::new(Code::Unknown, "missing grpc-status trailer"),
    }
}
