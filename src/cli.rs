//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Simple webserver for testing the wasm
#[derive(Debug, Clone, Parser)]
#[command(name = "servetool", version)]
pub struct Cli {
    /// Port to listen on [default: 8000]
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Address to bind (empty means all interfaces)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Directory to serve [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Configuration file (defaults to ./servetool.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
