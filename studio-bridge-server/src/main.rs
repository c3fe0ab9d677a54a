//! studio-bridge - MCP server for Roblox Studio
//!
//! Speaks MCP on stdio and serves the HTTP endpoints the Studio plugin polls.

use std::sync::Arc;

use tracing::{error, info, warn};

use studio_bridge_utils::{init_logging_with_config, LogConfig, LogOutput, Result, StudioError};

mod bridge;
mod config;
mod http;
mod mcp;
mod observability;
mod state;
mod tools;

use bridge::spawn_sweeper;
use config::{ConfigLoader, DEFAULT_CONFIG_TOML, PORT_ENV};
use mcp::McpServer;
use state::SharedState;

/// What the process was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// MCP on stdio plus the HTTP surface
    Serve,
    /// HTTP surface only
    HttpOnly,
    Version,
    Help,
}

fn parse_args<I>(args: I) -> Result<Mode>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    match args.as_slice() {
        [] => Ok(Mode::Serve),
        [arg] => match arg.as_str() {
            "http" => Ok(Mode::HttpOnly),
            "--version" | "-V" => Ok(Mode::Version),
            "--help" | "-h" => Ok(Mode::Help),
            other => Err(StudioError::config(format!(
                "Unknown argument '{}' (try --help)",
                other
            ))),
        },
        _ => Err(StudioError::config("Too many arguments (try --help)")),
    }
}

fn usage() -> String {
    format!(
        "studio-bridge {}\n\n\
         USAGE:\n    studio-bridge [http | --version | --help]\n\n\
         With no arguments, serves MCP on stdio and the plugin endpoints over HTTP.\n\
         `http` serves only the HTTP endpoints, including POST /mcp/<tool>.\n\n\
         ENVIRONMENT:\n    \
         {}    HTTP port (default 3002)\n    \
         STUDIO_BRIDGE_CONFIG  config file path\n    \
         STUDIO_BRIDGE_LOG     log filter, e.g. debug\n\n\
         DEFAULT CONFIG:{}",
        env!("CARGO_PKG_VERSION"),
        PORT_ENV,
        DEFAULT_CONFIG_TOML
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    match mode {
        Mode::Version => {
            println!("studio-bridge {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Mode::Help => {
            println!("{}", usage());
            return Ok(());
        }
        Mode::Serve | Mode::HttpOnly => {}
    }

    let config = ConfigLoader::load_and_validate()?;
    let output: LogOutput = config.logging.output.parse()?;
    init_logging_with_config(LogConfig::server(&config.logging.filter, output))?;

    run(config, mode).await
}

async fn run(config: config::AppConfig, mode: Mode) -> Result<()> {
    let addr = config.http.bind_addr();
    let listener = http::bind(&addr).await.inspect_err(|e| error!("{}", e))?;

    let state = Arc::new(SharedState::new(config));
    info!(
        timeout_ms = state.bridge.timeout().as_millis() as u64,
        sweep_interval_ms = state.config.bridge.sweep_interval_ms,
        "studio-bridge {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let http_task = tokio::spawn(http::run_http_server(listener, Arc::clone(&state)));
    let sweeper = spawn_sweeper(
        state.bridge.clone(),
        state.config.bridge.sweep_interval(),
        state.subscribe_shutdown(),
    );

    match mode {
        Mode::Serve => serve_stdio(&state).await,
        _ => wait_for_ctrl_c().await,
    }

    state.shutdown();
    for (name, task) in [("http", http_task), ("sweeper", sweeper)] {
        if let Err(e) = task.await {
            warn!(task = name, error = %e, "Background task ended abnormally");
        }
    }

    info!("studio-bridge stopped");
    Ok(())
}

/// Serve MCP until stdin closes, the transport fails, or Ctrl-C arrives
async fn serve_stdio(state: &SharedState) {
    let server = McpServer::new(state.tools.clone());
    state.set_mcp_active(true);
    info!("MCP server running on stdio");

    tokio::select! {
        result = server.run_stdio() => match result {
            Ok(()) => info!("stdin closed"),
            Err(e) => error!(error = %e, "MCP transport failed"),
        },
        _ = wait_for_ctrl_c() => {}
    }

    state.set_mcp_active(false);
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
    }
}
