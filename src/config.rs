//! Server configuration and logging setup.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::{PingwireError, Result};
use crate::protocol::DEFAULT_MAX_MESSAGE_SIZE;
use crate::server::{ServerBuilder, DEFAULT_LISTEN};
use crate::service::TracingObserver;

/// Command-line arguments for the echo server
#[derive(Parser, Debug, Default)]
#[command(name = "pingwire-server")]
#[command(version)]
#[command(about = "gRPC-web echo server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:8080)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Maximum request message size in bytes
    #[arg(long)]
    pub max_message_size: Option<u32>,

    /// Do not log every call
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_max_message_size")]
    pub max_message_size: u32,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_message_size: default_max_message_size(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log every call through the tracing observer
    #[serde(default = "default_log_calls")]
    pub log_calls: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_calls: default_log_calls(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_max_message_size() -> u32 {
    DEFAULT_MAX_MESSAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_calls() -> bool {
    true
}

/// Final resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen: String,
    pub max_message_size: u32,
    pub log_calls: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Merge parsed CLI args with the file they point to, if any.
    pub fn from_args(cli: CliArgs) -> Result<Self> {
        let file = match cli.config {
            Some(ref path) => Self::read_file(path)?,
            None => TomlConfig::default(),
        };

        Ok(Self::merge(cli, file))
    }

    fn read_file(path: &Path) -> Result<TomlConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PingwireError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&contents).map_err(|e| {
            PingwireError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    fn merge(cli: CliArgs, file: TomlConfig) -> Self {
        Self {
            listen: cli.listen.unwrap_or(file.server.listen),
            max_message_size: cli.max_message_size.unwrap_or(file.server.max_message_size),
            log_calls: !cli.quiet && file.logging.log_calls,
            log_level: cli.log_level.unwrap_or(file.logging.level),
        }
    }

    /// Server builder carrying this configuration.
    pub fn server_builder(&self) -> ServerBuilder {
        let builder = ServerBuilder::new()
            .bind(self.listen.clone())
            .max_message_size(self.max_message_size);

        if self.log_calls {
            builder.observer(TracingObserver)
        } else {
            builder
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `level` when set. Calling this twice is harmless.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::from_args(CliArgs::default()).unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert!(config.log_calls);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "0.0.0.0:9001"
            max_message_size = 1024

            [logging]
            level = "debug"
            log_calls = false
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:9001");
        assert_eq!(config.server.max_message_size, 1024);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.log_calls);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(config.server.listen, DEFAULT_LISTEN);
        assert!(config.logging.log_calls);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: TomlConfig = toml::from_str(
            "[server]\nlisten = \"0.0.0.0:9001\"\nmax_message_size = 10\n",
        )
        .unwrap();
        let cli = CliArgs {
            listen: Some("127.0.0.1:7000".to_string()),
            quiet: true,
            log_level: Some("trace".to_string()),
            ..CliArgs::default()
        };

        let config = Config::merge(cli, file);
        assert_eq!(config.listen, "127.0.0.1:7000");
        assert_eq!(config.max_message_size, 10);
        assert!(!config.log_calls);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_cli_parsing() {
        let cli = CliArgs::try_parse_from([
            "pingwire-server",
            "-l",
            "0.0.0.0:8080",
            "--max-message-size",
            "2048",
            "--quiet",
        ])
        .unwrap();

        assert_eq!(cli.listen.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(cli.max_message_size, Some(2048));
        assert!(cli.quiet);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let cli = CliArgs {
            config: Some(PathBuf::from("/nonexistent/pingwire.toml")),
            ..CliArgs::default()
        };

        match Config::from_args(cli) {
            Err(PingwireError::Config(message)) => {
                assert!(message.contains("Failed to read config file"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let path = std::env::temp_dir().join(format!("pingwire-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nlisten = 42\n").unwrap();

        let cli = CliArgs {
            config: Some(path.clone()),
            ..CliArgs::default()
        };
        let result = Config::from_args(cli);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(PingwireError::Config(_))));
    }
}
