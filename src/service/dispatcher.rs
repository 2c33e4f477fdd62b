//! Request dispatch: decode, invoke, encode.
//!
//! The dispatcher turns one gRPC-web request body into one complete
//! response body:
//!
//! ```text
//! success: [data frame: reply message][trailers frame: grpc-status:0]
//! failure: [trailers frame: grpc-status:N, grpc-message:...]
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use tracing::Instrument;

use super::echo::METHOD_PATH;
use super::handler::Handler;
use super::observer::{CallEvent, CallObserver, NoopObserver};
use crate::codec::TextCodec;
use crate::protocol::{build_frame, encode_trailers, flags, DEFAULT_MAX_MESSAGE_SIZE, ENVELOPE_SIZE};
use crate::status::Status;

/// Routes calls for a single method path to its handler.
#[derive(Clone)]
pub struct Dispatcher {
    path: Arc<str>,
    handler: Arc<dyn Handler>,
    observer: Arc<dyn CallObserver>,
    max_message_size: u32,
}

impl Dispatcher {
    /// Dispatcher for the echo method path with no observer.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_parts(
            METHOD_PATH,
            Arc::new(handler),
            Arc::new(NoopObserver),
            DEFAULT_MAX_MESSAGE_SIZE,
        )
    }

    pub(crate) fn from_parts(
        path: &str,
        handler: Arc<dyn Handler>,
        observer: Arc<dyn CallObserver>,
        max_message_size: u32,
    ) -> Self {
        Self {
            path: Arc::from(path),
            handler,
            observer,
            max_message_size,
        }
    }

    /// Serve a different method path.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Arc::from(path);
        self
    }

    /// Report calls to `observer`.
    pub fn with_observer<O: CallObserver>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Reject request messages larger than `limit` bytes.
    pub fn with_max_message_size(mut self, limit: u32) -> Self {
        self.max_message_size = limit;
        self
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn max_message_size(&self) -> u32 {
        self.max_message_size
    }

    /// Handle one request body addressed to `path`.
    ///
    /// Never fails: every error becomes a status in the trailers frame.
    pub async fn dispatch(&self, path: &str, body: &[u8]) -> Bytes {
        let span = tracing::info_span!("rpc", method = path, request_bytes = body.len());

        async {
            let started = Instant::now();
            let outcome = self
                .invoke(path, body)
                .await
                .and_then(|reply| self.encode_reply(&reply));

            let mut response = BytesMut::new();
            let status = match outcome {
                Ok(frame) => {
                    response.extend_from_slice(&frame);
                    Status::ok()
                }
                Err(status) => status,
            };

            self.observer.observe(&CallEvent::Response {
                method: path,
                status: &status,
                elapsed: started.elapsed(),
            });

            response.extend_from_slice(&encode_trailers(&status));
            response.freeze()
        }
        .instrument(span)
        .await
    }

    async fn invoke(&self, path: &str, body: &[u8]) -> Result<String, Status> {
        if path != &*self.path {
            return Err(Status::unimplemented(format!("unknown method {}", path)));
        }

        let limit = ENVELOPE_SIZE + self.max_message_size as usize;
        if body.len() > limit {
            return Err(Status::resource_exhausted(format!(
                "request of {} bytes exceeds maximum {}",
                body.len(),
                limit
            )));
        }

        let message =
            TextCodec::decode(body, true).map_err(|e| Status::invalid_argument(e.to_string()))?;

        self.observer.observe(&CallEvent::Request {
            method: path,
            message: &message,
        });

        self.handler.call(message).await
    }

    /// Frame the handler's reply, holding it to the same size limit as requests.
    fn encode_reply(&self, reply: &str) -> Result<Bytes, Status> {
        let message = TextCodec::encode(reply);
        if message.len() > self.max_message_size as usize {
            return Err(Status::resource_exhausted(format!(
                "reply of {} bytes exceeds maximum {}",
                message.len(),
                self.max_message_size
            )));
        }

        Ok(build_frame(flags::NONE, &message))
    }
}
