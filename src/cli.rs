//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Variant;

/// Remote gate signalling demo server
#[derive(Parser, Debug)]
#[command(name = "gate-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "GATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "GATE_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "GATE_HOST")]
    pub host: Option<String>,

    /// Endpoint variant to expose (broadcast or poll)
    #[arg(long, env = "GATE_VARIANT")]
    pub variant: Option<Variant>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "GATE_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "GATE_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gate server (default)
    Serve,
}
