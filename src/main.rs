//! MCP Server Entry Point
//!
//! This is the main entry point for the MCP server. It initializes logging,
//! loads configuration, and starts the server with the configured transport.

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use datascan_mcp_server::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level, config.logging.with_timestamps);

    info!("Starting {} v{}", config.server.name, config.server.version);
    info!(
        "Dataplex source: project={:?}, endpoint={}, client authorization={}",
        config.dataplex.project, config.dataplex.endpoint, config.dataplex.use_client_authorization
    );

    // Create the MCP server
    let server = McpServer::new(config.clone())?;

    info!("Server initialized");

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
