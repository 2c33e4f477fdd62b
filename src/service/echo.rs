//! The echo method.

use super::handler::{handler_fn, Handler};

/// Fully qualified service name.
pub const SERVICE_NAME: &str = "ping.PingService";

/// Method name within the service.
pub const METHOD_NAME: &str = "Ping";

/// HTTP path of the echo method.
pub const METHOD_PATH: &str = "/ping.PingService/Ping";

/// Return the message unchanged.
pub fn echo(message: String) -> String {
    message
}

/// [`echo`] as a handler.
pub fn echo_handler() -> impl Handler {
    handler_fn(|message: String| async move { Ok(echo(message)) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_path() {
        assert_eq!(METHOD_PATH, format!("/{}/{}", SERVICE_NAME, METHOD_NAME));
    }

    #[test]
    fn test_echo_is_identity() {
        assert_eq!(echo("Hello, gRPC World!".to_string()), "Hello, gRPC World!");
        assert_eq!(echo(String::new()), "");
        let long = "A".repeat(1000);
        assert_eq!(echo(long.clone()), long);
    }

    #[tokio::test]
    async fn test_echo_handler() {
        let handler = echo_handler();
        let reply = handler.call("Hello 世界! 🌍".to_string()).await.unwrap();
        assert_eq!(reply, "Hello 世界! 🌍");
    }
}
