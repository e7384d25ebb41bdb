//! TCP bootstrap for authshake sessions.
//!
//! Socket creation, bind, listen, accept and connect live here so the
//! sessions only ever see an established [`Transport`](super::Transport).
//! Every failure in this module is an
//! [`AuthError::TransportSetup`](crate::error::AuthError::TransportSetup).

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};

use super::config::TransportConfig;
use super::{establish, Transport};
use crate::error::{AuthError, Result};

/// Reference port shared by both roles
pub const DEFAULT_PORT: u16 = 12345;

/// Pending connection backlog; one session per run
const LISTEN_BACKLOG: u32 = 1;

/// Raw transport over a TCP connection
pub type TcpTransport = super::StreamTransport<TcpStream>;

/// A TCP address either listened on (server) or dialled (client).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpEndpoint {
    addr: SocketAddr,
}

impl TcpEndpoint {
    /// Create a new endpoint.
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Loopback endpoint, the client's reference target.
    pub fn localhost(port: u16) -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    /// All-interfaces endpoint, the server's reference bind address.
    pub fn any(port: u16) -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Create, bind and listen.
    pub async fn listen(&self) -> Result<TcpListener> {
        let addr = self.addr;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(|e| AuthError::TransportSetup(format!("Socket creation failed: {}", e)))?;

        socket
            .set_reuseaddr(true)
            .map_err(|e| AuthError::TransportSetup(format!("Socket option failed: {}", e)))?;
        socket
            .bind(addr)
            .map_err(|e| AuthError::TransportSetup(format!("Bind to {} failed: {}", addr, e)))?;
        let listener = socket
            .listen(LISTEN_BACKLOG)
            .map_err(|e| AuthError::TransportSetup(format!("Listen failed: {}", e)))?;

        let local = listener.local_addr().unwrap_or(addr);
        tracing::info!("Server listening on {}", local);
        Ok(listener)
    }

    /// Connect to the endpoint.
    pub async fn connect(&self, config: &TransportConfig) -> Result<Box<dyn Transport>> {
        let stream = TcpStream::connect(self.addr).await.map_err(|e| {
            AuthError::TransportSetup(format!("Connection to {} failed: {}", self.addr, e))
        })?;

        tracing::info!("Connected to {}", self.addr);
        Ok(establish(stream, config))
    }
}

impl Default for TcpEndpoint {
    fn default() -> Self {
        Self::localhost(DEFAULT_PORT)
    }
}

/// Accept a single client connection.
pub async fn accept_one(
    listener: &TcpListener,
    config: &TransportConfig,
) -> Result<(Box<dyn Transport>, SocketAddr)> {
    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|e| AuthError::TransportSetup(format!("Accept failed: {}", e)))?;

    tracing::info!("Accepted connection from {}", peer);
    Ok((establish(stream, config), peer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_default() {
        let endpoint = TcpEndpoint::default();
        assert_eq!(endpoint.addr().port(), 12345);
        assert!(endpoint.addr().ip().is_loopback());
    }

    #[test]
    fn test_endpoint_any() {
        let endpoint = TcpEndpoint::any(3000);
        assert!(endpoint.addr().ip().is_unspecified());
        assert_eq!(endpoint.addr().port(), 3000);
    }

    #[tokio::test]
    async fn test_connect_refused_is_setup_error() {
        // Grab a free port, then release it so nothing is listening
        let listener = TcpEndpoint::localhost(0).listen().await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpEndpoint::localhost(port)
            .connect(&TransportConfig::default())
            .await;
        let err = result.err().unwrap();
        assert!(err.is_setup());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_setup_error() {
        let first = TcpEndpoint::localhost(0).listen().await.unwrap();
        let port = first.local_addr().unwrap().port();

        // SO_REUSEADDR does not allow two active listeners on one port
        let second = TcpEndpoint::localhost(port).listen().await;
        assert!(matches!(second, Err(AuthError::TransportSetup(_))));
    }
}
