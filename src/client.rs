//! Echo client over HTTP/1.1.
//!
//! Each call opens a connection, posts one framed request and reads the
//! response body frame by frame as chunks arrive.
//!
//! # Example
//!
//! ```no_run
//! use pingwire::client::EchoClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EchoClient::new("http://localhost:8080")?;
//!     let reply = client.ping("Hello, Server!").await?;
//!     assert_eq!(reply, "Hello, Server!");
//!     Ok(())
//! }
//! ```

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::header::{self, HeaderValue};
use hyper::body::Body;
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::codec::TextCodec;
use crate::error::{DecodeError, PingwireError, Result, TransportError};
use crate::protocol::{
    build_frame, flags, parse_trailers, Frame, FrameBuffer, DEFAULT_MAX_MESSAGE_SIZE,
};
use crate::server::GRPC_WEB_PROTO;
use crate::service::METHOD_PATH;

/// Default endpoint the client talks to.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// Client for the echo method.
#[derive(Debug, Clone)]
pub struct EchoClient {
    authority: String,
    path: String,
    max_message_size: u32,
}

impl EchoClient {
    /// Create a client for `endpoint` (`http://host[:port]`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] for anything that is not a
    /// plain `http` URL with a host.
    pub fn new(endpoint: &str) -> Result<Self> {
        let uri: Uri = endpoint
            .parse()
            .map_err(|_| TransportError::InvalidEndpoint(endpoint.to_string()))?;

        if uri.scheme_str() != Some("http") {
            return Err(TransportError::InvalidEndpoint(endpoint.to_string()).into());
        }

        let authority = uri
            .authority()
            .ok_or_else(|| TransportError::InvalidEndpoint(endpoint.to_string()))?;
        let port = authority.port_u16().unwrap_or(80);

        Ok(Self {
            authority: format!("{}:{}", authority.host(), port),
            path: METHOD_PATH.to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        })
    }

    /// Call a different method path.
    pub fn with_method_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Reject request and response messages larger than `limit` bytes.
    pub fn with_max_message_size(mut self, limit: u32) -> Self {
        self.max_message_size = limit;
        self
    }

    /// `host:port` the client connects to.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn method_path(&self) -> &str {
        &self.path
    }

    /// Send `message` and return the server's reply.
    ///
    /// # Errors
    ///
    /// - [`PingwireError::Transport`] on connect failure, HTTP errors, non-2xx status
    /// - [`PingwireError::Rpc`] if the trailers carry a non-OK status
    /// - [`PingwireError::Decode`] if the response frames are malformed, or
    ///   `message` encodes to more than the size limit
    pub async fn ping(&self, message: &str) -> Result<String> {
        let encoded = TextCodec::encode(message);
        if encoded.len() > self.max_message_size as usize {
            return Err(DecodeError::MessageTooLarge {
                size: u32::try_from(encoded.len()).unwrap_or(u32::MAX),
                max: self.max_message_size,
            }
            .into());
        }

        let stream = TcpStream::connect(&self.authority)
            .await
            .map_err(TransportError::Connect)?;

        let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(TransportError::Http)?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("Connection closed with error: {}", e);
            }
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.path.as_str())
            .header(header::HOST, self.authority.as_str())
            .header(header::CONTENT_TYPE, HeaderValue::from_static(GRPC_WEB_PROTO))
            .header(header::ACCEPT, HeaderValue::from_static(GRPC_WEB_PROTO))
            .header("x-grpc-web", "1")
            .body(Full::new(build_frame(flags::NONE, &encoded)))
            .map_err(TransportError::Request)?;

        tracing::debug!(authority = %self.authority, path = %self.path, "Sending request");

        let response = sender
            .send_request(request)
            .await
            .map_err(TransportError::Http)?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()).into());
        }

        let frames = self.read_frames(response.into_body()).await?;
        Self::decode_reply(&frames)
    }

    /// Feed the body into a frame buffer as chunks arrive.
    async fn read_frames<B>(&self, mut body: B) -> Result<Vec<Frame>>
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut buffer = FrameBuffer::with_max_message(self.max_message_size);
        let mut frames = Vec::new();

        while let Some(chunk) = body.frame().await {
            let chunk = chunk.map_err(|e| TransportError::Body(e.into()))?;
            if let Ok(data) = chunk.into_data() {
                frames.extend(buffer.push(&data)?);
            }
        }

        if !buffer.is_idle() {
            tracing::debug!(buffered = buffer.len(), "Response body ended mid-frame");
            return Err(DecodeError::Truncated.into());
        }

        Ok(frames)
    }

    fn decode_reply(frames: &[Frame]) -> Result<String> {
        if let Some(trailers) = frames.iter().find(|f| f.is_trailers()) {
            let status = parse_trailers(trailers.payload());
            if !status.is_ok() {
                return Err(PingwireError::Rpc(status));
            }
        }

        let data = frames
            .iter()
            .find(|f| f.is_data())
            .ok_or(TransportError::MissingMessage)?;

        Ok(TextCodec::decode(data.payload(), false)?)
    }
}
