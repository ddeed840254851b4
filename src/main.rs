mod cli;

use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::Cli;
use lineguard_mcp::server::EditorServer;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "server exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let server = EditorServer::new();
    let running = rmcp::ServiceExt::serve(server, (tokio::io::stdin(), tokio::io::stdout()))
        .await
        .map_err(|error| anyhow::anyhow!("MCP server init error: {error}"))?;
    running
        .waiting()
        .await
        .map_err(|error| anyhow::anyhow!("MCP server error: {error}"))?;
    Ok(())
}

/// Logging must never touch stdout: it carries the JSON-RPC stream and any
/// stray byte there corrupts the framed protocol for the client.
fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(log_file) = &cli.log_file {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
        {
            let _ = tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .try_init();
            return;
        }
    }

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
