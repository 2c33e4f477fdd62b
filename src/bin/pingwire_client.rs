//! pingwire-client: send one message to the echo server and print the reply.

use std::process::ExitCode;

use clap::Parser;
use pingwire::client::DEFAULT_ENDPOINT;
use pingwire::config::init_logging;
use pingwire::EchoClient;

#[derive(Parser, Debug)]
#[command(name = "pingwire-client")]
#[command(version)]
#[command(about = "Send a message to the gRPC-web echo server", long_about = None)]
struct ClientArgs {
    /// Message to send
    message: String,

    /// Server endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Method path to call
    #[arg(long)]
    method: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = ClientArgs::parse();

    init_logging(&args.log_level);

    match run(args).await {
        Ok(reply) => {
            println!("Server Response: {}", reply);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

/// Send the message; errors come back as the line shown to the user.
async fn run(args: ClientArgs) -> Result<String, String> {
    if args.message.trim().is_empty() {
        return Err("Please enter a message".to_string());
    }

    let mut client = EchoClient::new(&args.endpoint).map_err(|e| e.to_string())?;
    if let Some(method) = args.method {
        client = client.with_method_path(method);
    }

    client
        .ping(&args.message)
        .await
        .map_err(|e| format!("Failed to communicate with server: {}", e))
}
