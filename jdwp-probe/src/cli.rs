// Command line arguments
//
// Timeouts are milliseconds; zero or negative waits indefinitely. Values not
// given on the command line come from the config file, then the defaults.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jdwp_transport::{timeout, TransportConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "jdwp-probe", version, about = "Check that a JDWP endpoint completes the handshake")]
pub struct Cli {
    /// JSON transport config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to a VM started with server=y
    Attach {
        /// "host:port" or "port"
        address: String,

        #[arg(long, allow_negative_numbers = true)]
        attach_timeout: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        handshake_timeout: Option<i64>,
    },

    /// Wait for a VM started with server=n to connect
    Listen {
        /// "host:port" or "port"; the configured default port if omitted
        address: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        accept_timeout: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        handshake_timeout: Option<i64>,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<TransportConfig> {
        match &self.config {
            Some(path) => TransportConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(TransportConfig::default()),
        }
    }
}

/// Command line value if given, otherwise the configured one
pub fn resolve_timeout(arg: Option<i64>, configured: Duration) -> Duration {
    arg.map(timeout::from_millis).unwrap_or(configured)
}
