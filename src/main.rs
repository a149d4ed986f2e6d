//! Ledger MCP server entry point.
//!
//! Parses configuration from flags and the environment, opens the ledger
//! store, then serves the tools over HTTP or stdio.

mod auth;
mod config;
mod dispatch;
mod error;
mod http;
mod ledger;
mod params;
mod response;
mod server;
mod store;
mod tools;

extern crate alloc;

use alloc::sync::Arc;

use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config};
use crate::dispatch::Dispatcher;
use crate::ledger::Ledger;
use crate::server::LedgerMcpServer;

/// Runs the server until the transport closes.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the store cannot be
/// opened, or the transport fails.
async fn run() -> Result<(), Box<dyn core::error::Error>> {
    // Initialise tracing to stderr (stdout is used for MCP stdio transport).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_cli(Cli::parse())?;
    tracing::info!("starting ledger MCP server");

    let store = config.store.open().await?;
    let dispatcher = Arc::new(Dispatcher::new(
        Ledger::new(store),
        config.auth,
        config.currency,
    ));

    if let Some(addr) = config.transport.http_addr() {
        http::serve(addr, dispatcher).await?;
        return Ok(());
    }

    let mcp_server = LedgerMcpServer::new(dispatcher);
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = mcp_server.serve(transport).await?;

    tracing::info!("MCP server running on stdio");
    let _quit_reason = service.waiting().await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(%err, "fatal error");
        std::process::exit(1);
    }
}
