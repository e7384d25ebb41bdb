//! Transport layer for authshake sessions.
//!
//! Sessions consume exactly two operations from a transport: `send(bytes)`
//! and `receive() -> bytes`, over an ordered, reliable stream between one
//! client and one server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     ServerSession / ClientSession       │
//! │     PlaintextServer / PlaintextClient   │
//! └──────────────────┬──────────────────────┘
//!                    │ dyn Transport
//!          ┌─────────┴─────────┐
//!          ▼                   │
//! ┌──────────────────┐         │
//! │ FramedTransport  │         │  (raw mode)
//! │ varint(len)+data │         │
//! └────────┬─────────┘         │
//!          ▼                   ▼
//! ┌─────────────────────────────────────────┐
//! │ StreamTransport<S>  (one bounded read)  │
//! └──────────────────┬──────────────────────┘
//!                    ▼
//!          TcpStream / DuplexStream
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use authshake::transport::{establish, TransportConfig};
//!
//! let (stream, _) = listener.accept().await?;
//! let mut transport = establish(stream, &TransportConfig::default());
//! let greeting = transport.receive().await?;
//! ```

mod config;
mod framed;
mod stream;
pub mod tcp;
mod varint;

pub use config::{
    Framing, TransportConfig, DEFAULT_MAX_FRAME_SIZE, DEFAULT_MAX_READ_SIZE,
    DEFAULT_RECEIVE_TIMEOUT,
};
pub use framed::FramedTransport;
pub use stream::StreamTransport;
pub use tcp::{TcpEndpoint, TcpTransport, DEFAULT_PORT};

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// Ordered, reliable message transport.
///
/// Implementations own their connection exclusively; a session holds the
/// transport by `&mut` for its whole lifetime.
pub trait Transport: Send {
    /// Write the whole message.
    ///
    /// Fails with `AuthError::Transport` on a broken connection.
    fn send<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, Result<()>>;

    /// Receive the next message.
    ///
    /// End-of-stream is `AuthError::PeerClosed`, never an empty message.
    fn receive(&mut self) -> BoxFuture<'_, Result<Bytes>>;

    /// Tear the connection down after the session.
    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        async { Ok(()) }.boxed()
    }

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        (**self).send(data)
    }

    fn receive(&mut self) -> BoxFuture<'_, Result<Bytes>> {
        (**self).receive()
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        (**self).close()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the configured transport stack over an established stream.
pub fn establish<S>(stream: S, config: &TransportConfig) -> Box<dyn Transport>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let raw = StreamTransport::with_config(stream, config);
    match config.framing {
        Framing::Raw => Box::new(raw),
        Framing::LengthPrefixed => {
            Box::new(FramedTransport::new(raw).with_max_frame_size(config.max_frame_size))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_establish_raw() {
        let (a, _b) = duplex(64);
        let config = TransportConfig::default().with_framing(Framing::Raw);
        assert_eq!(establish(a, &config).name(), "raw");
    }

    #[tokio::test]
    async fn test_establish_framed_roundtrip() {
        let (a, b) = duplex(1024);
        let config = TransportConfig::default();
        let mut left = establish(a, &config);
        let mut right = establish(b, &config);

        assert_eq!(left.name(), "length-prefixed");
        left.send(b"ping").await.unwrap();
        assert_eq!(&right.receive().await.unwrap()[..], b"ping");
    }
}
