//! pingwire-server: gRPC-web echo server.
//!
//! Answers `POST /ping.PingService/Ping` with the request message unchanged.
//! Configuration via CLI arguments or a TOML file; runs until Ctrl-C.

use pingwire::config::{init_logging, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    init_logging(&config.log_level);

    info!(
        listen = %config.listen,
        max_message_size = config.max_message_size,
        log_calls = config.log_calls,
        "Starting pingwire server"
    );

    let server = config.server_builder().start().await?;

    server
        .wait_for_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await?;

    Ok(())
}
