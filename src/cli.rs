//! # Command-Line Interface
//!
//! Thin clap front-end. The only command is `serve`, which loads the
//! environment configuration, applies flag overrides, and runs the server.

use clap::{Parser, Subcommand};

use crate::config::{self, AppConfig};
use crate::http;

/// OrderTogether - self-hostable group order coordination
#[derive(Parser, Debug)]
#[command(name = "ordertogether")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the OrderTogether server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Local timezone as a fixed UTC offset, e.g. +02:00
        #[arg(long)]
        timezone_offset: Option<String>,

        /// Public base URL for generated admin and join links
        #[arg(long)]
        base_url: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parse arguments and dispatch
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    match cli.command {
        Command::Serve {
            host,
            port,
            timezone_offset,
            base_url,
        } => {
            let mut app_config = AppConfig::from_env()?;
            if let Some(host) = host {
                app_config.host = host;
            }
            if let Some(port) = port {
                app_config.port = port;
            }
            if let Some(raw) = timezone_offset {
                app_config.timezone_offset = config::parse_offset(&raw)?;
            }
            if let Some(url) = base_url {
                app_config.base_url = url.trim_end_matches('/').to_string();
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(http::serve(app_config))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "ordertogether",
            "serve",
            "--port",
            "9001",
            "--timezone-offset",
            "+01:00",
        ])
        .unwrap();

        match cli.command {
            Command::Serve { port, timezone_offset, .. } => {
                assert_eq!(port, Some(9001));
                assert_eq!(timezone_offset.as_deref(), Some("+01:00"));
            }
        }
    }
}
