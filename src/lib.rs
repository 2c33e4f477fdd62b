//! # pingwire
//!
//! Echo RPC over gRPC-web framing.
//!
//! A single method, `/ping.PingService/Ping`, returns its input unchanged.
//! Requests and responses are one-field messages (field 1, length-delimited
//! UTF-8 text) wrapped in a 5-byte envelope and carried in HTTP/1.1 bodies.
//!
//! ## Layers
//!
//! - **Codec** ([`codec`]): message encoding with full varint lengths
//! - **Protocol** ([`protocol`]): envelopes, frame buffering, trailers
//! - **Service** ([`service`]): handler, observer hook, dispatcher
//! - **Transport** ([`server`], [`client`]): hyper server and client
//!
//! ## Example
//!
//! ```no_run
//! use pingwire::{EchoClient, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder().bind("127.0.0.1:0").start().await?;
//!
//!     let client = EchoClient::new(&format!("http://{}", server.local_addr()))?;
//!     assert_eq!(client.ping("Hello, Server!").await?, "Hello, Server!");
//!
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod service;
pub mod status;

pub use client::EchoClient;
pub use error::{DecodeError, PingwireError, TransportError};
pub use server::{Server, ServerBuilder};
pub use status::{Code, Status};
