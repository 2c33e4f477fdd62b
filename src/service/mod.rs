//! Service module - the echo method and its dispatch.
//!
//! Provides:
//! - [`Handler`] / [`handler_fn`] - the single-method abstraction
//! - [`echo`] / [`echo_handler`] - the identity method
//! - [`CallObserver`] - injected observability hook
//! - [`Dispatcher`] - decode, invoke, encode, trailers
//!
//! # Example
//!
//! ```
//! use pingwire::codec::TextCodec;
//! use pingwire::service::{echo_handler, Dispatcher, TracingObserver, METHOD_PATH};
//!
//! # tokio_test_block(async {
//! let dispatcher = Dispatcher::new(echo_handler()).with_observer(TracingObserver);
//! let body = dispatcher
//!     .dispatch(METHOD_PATH, &TextCodec::encode_framed("Hello, Server!"))
//!     .await;
//! assert!(!body.is_empty());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod dispatcher;
mod echo;
mod handler;
mod observer;

pub use dispatcher::Dispatcher;
pub use echo::{echo, echo_handler, METHOD_NAME, METHOD_PATH, SERVICE_NAME};
pub use handler::{handler_fn, BoxFuture, FnHandler, Handler, HandlerResult};
pub use observer::{CallEvent, CallObserver, NoopObserver, TracingObserver};
