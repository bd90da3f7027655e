use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flink_mcp_server::config::{AppConfig, CliConfig, FileConfig};
use flink_mcp_server::gateway::SqlGatewayClient;
use flink_mcp_server::mcp::{
    register_all_resources, register_all_tools, McpRegistry, McpServer, ToolContext,
};
use flink_mcp_server::orchestrator::QueryOrchestrator;

#[derive(Parser, Debug)]
#[command(name = "flink-mcp-server", about = "MCP server for the Flink SQL Gateway")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Base URL of the Flink SQL Gateway REST endpoint.
    #[clap(long)]
    base_url: Option<String>,

    /// Timeout in seconds for individual gateway HTTP requests.
    #[clap(long, default_value_t = 30)]
    request_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Stdout carries the MCP protocol, so the fmt layer writes to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = args.config.as_deref().map(FileConfig::load).transpose()?;
    let cli_config = CliConfig {
        base_url: args.base_url,
        request_timeout_sec: args.request_timeout_sec,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        base_url = %config.base_url,
        request_timeout_sec = config.request_timeout.as_secs(),
        "Starting Flink MCP server"
    );

    let gateway = Arc::new(SqlGatewayClient::new(
        config.base_url.clone(),
        config.request_timeout,
    ));
    let orchestrator = Arc::new(QueryOrchestrator::new(gateway));

    let mut registry = McpRegistry::new();
    register_all_tools(&mut registry);
    register_all_resources(&mut registry);
    info!(
        "MCP registry initialized with {} tools and {} resources",
        registry.tool_count(),
        registry.resource_count()
    );

    let context = ToolContext {
        orchestrator,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: std::time::Instant::now(),
    };

    let mut server = McpServer::new(Arc::new(registry), context);
    server.run().await?;

    info!("Stdin closed, shutting down");
    Ok(())
}
