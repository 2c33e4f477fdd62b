//! Server builder and accept loop.
//!
//! The [`ServerBuilder`] provides a fluent API for configuring the method
//! handler and the listener. The [`Server`] manages the lifecycle:
//! 1. Bind TCP listener
//! 2. Accept connections until shutdown is requested
//! 3. Serve each connection with hyper's HTTP/1.1 implementation
//! 4. Hand every gRPC-web request body to the [`Dispatcher`]
//!
//! # Example
//!
//! ```no_run
//! use pingwire::server::Server;
//! use pingwire::service::{echo_handler, TracingObserver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .bind("127.0.0.1:8080")
//!         .handler(echo_handler())
//!         .observer(TracingObserver)
//!         .start()
//!         .await?;
//!
//!     server.wait_for_shutdown(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{PingwireError, Result};
use crate::protocol::{DEFAULT_MAX_MESSAGE_SIZE, ENVELOPE_SIZE};
use crate::service::{echo_handler, CallObserver, Dispatcher, Handler, NoopObserver, METHOD_PATH};

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Content type of binary gRPC-web bodies.
pub const GRPC_WEB_PROTO: &str = "application/grpc-web+proto";

/// Bare gRPC-web content type (implies protobuf).
pub const GRPC_WEB: &str = "application/grpc-web";

const CORS_ALLOW_HEADERS: &str = "content-type,x-grpc-web,x-user-agent,grpc-timeout";
const CORS_EXPOSE_HEADERS: &str = "grpc-status,grpc-message";
const CORS_MAX_AGE: &str = "1728000";

/// Pause after an accept error that is not tied to a single connection.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Builder for configuring and starting a server.
pub struct ServerBuilder {
    addr: String,
    path: String,
    handler: Option<Arc<dyn Handler>>,
    observer: Arc<dyn CallObserver>,
    max_message_size: u32,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            addr: DEFAULT_LISTEN.to_string(),
            path: METHOD_PATH.to_string(),
            handler: None,
            observer: Arc::new(NoopObserver),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Address to listen on. Port 0 picks a free port.
    ///
    /// Default: `127.0.0.1:8080`
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// HTTP path the method is served under.
    ///
    /// Default: `/ping.PingService/Ping`
    pub fn method_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Method implementation. Defaults to [`echo_handler`].
    pub fn handler<H: Handler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Receiver of per-call events. Defaults to [`NoopObserver`].
    pub fn observer<O: CallObserver>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Maximum request message size in bytes.
    ///
    /// Default: 4 MiB
    pub fn max_message_size(mut self, limit: u32) -> Self {
        self.max_message_size = limit;
        self
    }

    /// Bind the listener and start accepting connections.
    pub async fn start(self) -> Result<Server> {
        let handler = self
            .handler
            .unwrap_or_else(|| Arc::new(echo_handler()) as Arc<dyn Handler>);
        let dispatcher = Dispatcher::from_parts(
            &self.path,
            handler,
            self.observer,
            self.max_message_size,
        );

        Server::start(&self.addr, dispatcher).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running server.
pub struct Server {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    async fn start(addr: &str, dispatcher: Dispatcher) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            addr = %local_addr,
            method = dispatcher.path(),
            max_message_size = dispatcher.max_message_size(),
            "Server listening"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let accept_task = tokio::spawn(accept_loop(listener, dispatcher, shutdown_rx));

        Ok(Server {
            local_addr,
            shutdown_tx,
            accept_task,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    ///
    /// Connections already being served finish on their own tasks.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        self.accept_task
            .await
            .map_err(|e| PingwireError::Io(std::io::Error::other(e)))
    }

    /// Serve until `signal` resolves, then shut down.
    pub async fn wait_for_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        signal.await;
        tracing::info!("Shutdown signal received");
        self.shutdown().await
    }
}

async fn accept_loop(
    listener: TcpListener,
    dispatcher: Dispatcher,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) if is_connection_error(&e) => {
                    tracing::debug!("Accept error: {}", e);
                    continue;
                }
                Err(e) => {
                    // Persistent errors such as EMFILE
                    tracing::warn!("Accept error: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            },
            _ = &mut shutdown_rx => return,
        };

        tracing::debug!(%peer, "Accepted connection");

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let dispatcher = dispatcher.clone();
                async move { Ok::<_, Infallible>(handle_request(&dispatcher, req).await) }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::warn!(%peer, "Connection error: {}", e);
            }
        });
    }
}

/// Errors that only affect the connection being accepted.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

/// Translate one HTTP request into a gRPC-web response.
async fn handle_request<B>(dispatcher: &Dispatcher, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() == Method::OPTIONS {
        return preflight();
    }

    if req.method() != Method::POST {
        return empty(StatusCode::METHOD_NOT_ALLOWED);
    }

    if !is_grpc_web(req.headers()) {
        return empty(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    let path = req.uri().path().to_owned();
    let limit = ENVELOPE_SIZE + dispatcher.max_message_size() as usize;

    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return empty(StatusCode::PAYLOAD_TOO_LARGE);
        }
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            return empty(StatusCode::BAD_REQUEST);
        }
    };

    let payload = dispatcher.dispatch(&path, &body).await;

    let mut response = Response::new(Full::new(payload));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(GRPC_WEB_PROTO));
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(CORS_EXPOSE_HEADERS),
    );
    allow_origin(headers);
    response
}

fn is_grpc_web(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let media_type = v.split(';').next().unwrap_or("").trim();
            media_type.eq_ignore_ascii_case(GRPC_WEB_PROTO)
                || media_type.eq_ignore_ascii_case(GRPC_WEB)
        })
        .unwrap_or(false)
}

fn preflight() -> Response<Full<Bytes>> {
    let mut response = empty(StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(CORS_MAX_AGE),
    );
    response
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    allow_origin(response.headers_mut());
    response
}

fn allow_origin(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
}
