//! TCP transport implementation.
//!
//! Raw TCP socket transport with JSON-RPC messages (line-delimited).
//! Like STDIO, it carries no caller credentials.

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the TCP transport, serving each connection on its own task.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("Accepted connection from {}", peer_addr);

                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                    }

                    let server = server.clone();
                    tokio::spawn(async move {
                        Self::handle_connection(server, stream, peer_addr).await;
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    // Back off so a persistent accept error does not spin
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn handle_connection(server: McpServer, stream: TcpStream, peer_addr: std::net::SocketAddr) {
        let service = match server.serve(stream).await {
            Ok(s) => {
                info!("Client {} connected, serving...", peer_addr);
                s
            }
            Err(e) => {
                warn!("Failed to initialize service for {}: {}", peer_addr, e);
                return;
            }
        };

        match service.waiting().await {
            Ok(reason) => info!("Client {} disconnected: {:?}", peer_addr, reason),
            Err(e) => warn!("Error while serving client {}: {:?}", peer_addr, e),
        }
    }
}
