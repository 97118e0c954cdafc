//! Server network layer: TCP listener, optional TLS and per-connection tasks

use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::error::ServerError;
use crate::registry::{SessionRegistry, SharedRegistry};
use crate::tls;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

/// Accepts players and hands each socket to its own connection task
pub struct Server {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    registry: SharedRegistry,
}

impl Server {
    /// Loads TLS material (if configured) and binds the listener
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let tls = config.tls.as_ref().map(tls::load_acceptor).transpose()?;
        let listener = TcpListener::bind(config.bind_addr()).await?;

        info!(
            "Server listening on {} ({})",
            listener.local_addr()?,
            if tls.is_some() { "TLS" } else { "plain TCP" }
        );

        Ok(Server {
            listener,
            tls,
            registry: SessionRegistry::shared(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Accept loop. Only returns if the task is cancelled.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.spawn_connection(stream, addr),
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }
        let registry = Arc::clone(&self.registry);

        match self.tls.clone() {
            None => {
                tokio::spawn(handle_connection(stream, addr, registry));
            }
            Some(acceptor) => {
                tokio::spawn(async move {
                    match acceptor.accept(stream).await {
                        Ok(stream) => handle_connection(stream, addr, registry).await,
                        Err(e) => warn!("TLS handshake with {} failed: {}", addr, e),
                    }
                });
            }
        }
    }
}
