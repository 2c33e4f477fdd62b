//! Single-method handler abstraction.
//!
//! A handler is a function from the decoded request text to the reply text.
//! Any async closure becomes a handler through [`handler_fn`].
//!
//! # Example
//!
//! ```
//! use pingwire::service::handler_fn;
//!
//! let upper = handler_fn(|message: String| async move { Ok(message.to_uppercase()) });
//! # let _ = upper;
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use crate::status::Status;

/// Result type for handler functions.
pub type HandlerResult = std::result::Result<String, Status>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for the method implementation.
pub trait Handler: Send + Sync + 'static {
    /// Handle one call with the decoded request text.
    fn call(&self, message: String) -> BoxFuture<'static, HandlerResult>;
}

/// Adapter turning a closure into a [`Handler`].
pub struct FnHandler<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, message: String) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(message))
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(handler: F) -> FnHandler<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler {
        handler,
        _phantom: PhantomData,
    }
}
