//! Weather MCP Server
//!
//! Serves the `get_alerts` and `get_forecast` tools over HTTP, or calls a tool
//! on a running server.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use weather_mcp_server::auth::verifier::JwksVerifier;
use weather_mcp_server::config::Config;
use weather_mcp_server::mcp::client::{parse_arguments, McpClient};
use weather_mcp_server::mcp::http;

/// Weather MCP Server
#[derive(Parser)]
#[command(name = "weather-mcp-server")]
#[command(author, version, about = "Weather MCP Server - weather alerts and forecasts over MCP")]
struct Cli {
    /// Interface to bind (overrides WEATHER_MCP_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to bind (overrides WEATHER_MCP_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a tool on a running server and print its output
    Call {
        /// Tool name
        tool: String,

        /// Tool argument as key=value (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// MCP endpoint URL
        #[arg(long, default_value = "http://localhost:8000/mcp")]
        url: String,

        /// Bearer token
        #[arg(long, env = "WEATHER_MCP_TOKEN")]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    match cli.command {
        Some(Commands::Call {
            tool,
            args,
            url,
            token,
        }) => {
            let client = McpClient::new(url, token);
            client.initialize().await.context("initializing session")?;
            let result = client
                .call_tool(&tool, parse_arguments(&args)?)
                .await
                .with_context(|| format!("calling {}", tool))?;
            println!("{}", result.all_text());
            if result.is_error {
                std::process::exit(1);
            }
        }
        None => {
            let verifier = Arc::new(JwksVerifier::new(&config));
            http::serve(&config, verifier).await?;
        }
    }

    Ok(())
}
