//! poshelp MCP server - entry point with stdio transport.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use poshelp::{ChatSession, Config};
use rmcp::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use poshelp_mcp::PosHelpServer;

/// poshelp MCP server - POS manual help for AI assistants.
#[derive(Parser, Debug)]
#[command(name = "poshelp-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(long, env = "POSHELP_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the PDF manuals (overrides the config file).
    #[arg(long, env = "POSHELP_RESOURCES")]
    resources: Option<PathBuf>,

    /// Manual to select on start.
    #[arg(short, long)]
    manual: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the MCP stream
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(resources) = args.resources {
        config.resources = resources;
    }

    let mut session = ChatSession::new(&config);
    if let Some(name) = args.manual.as_deref() {
        match session.library().find_manual(name)? {
            Some(info) => {
                if let Err(e) = session.select_manual(&info.name) {
                    tracing::warn!(manual = %info.name, error = %e, "could not preselect manual");
                }
            }
            None => tracing::warn!(manual = name, "manual not found"),
        }
    }

    let server = PosHelpServer::with_session(session);

    tracing::info!(resources = %config.resources.display(), "starting poshelp MCP server with stdio transport");

    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
