use std::path::PathBuf;

use clap::Parser;

/// `lineguard-mcp`: an MCP text-editor server speaking JSON-RPC over stdio.
#[derive(Debug, Parser)]
#[command(name = "lineguard-mcp")]
#[command(about = "MCP text-editor server with hash-guarded line edits")]
pub struct Cli {
    /// Write logs to this file instead of stderr. Never writes to stdout,
    /// which carries the JSON-RPC stream.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv). Ignored if RUST_LOG is set.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Default character encoding applied when a tool call omits `encoding`.
    #[arg(long, default_value = lineguard_mcp::encoding::DEFAULT_ENCODING)]
    pub encoding: String,
}
