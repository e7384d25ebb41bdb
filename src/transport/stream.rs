//! Raw transport over any async byte stream.
//!
//! Each `receive` is a single bounded read, so one read is assumed to carry
//! one logical message. Wrap it in a
//! [`FramedTransport`](super::FramedTransport) to drop that assumption.

use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::config::{TransportConfig, DEFAULT_MAX_READ_SIZE};
use super::Transport;
use crate::error::{AuthError, Result};

/// Unframed transport: one read per message.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    max_read_size: usize,
    receive_timeout: Option<Duration>,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream with reference settings (1024-byte reads, no timeout)
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            max_read_size: DEFAULT_MAX_READ_SIZE,
            receive_timeout: None,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Wrap a stream using read size and timeout from `config`
    pub fn with_config(stream: S, config: &TransportConfig) -> Self {
        Self {
            max_read_size: config.max_read_size.max(1),
            receive_timeout: config.receive_timeout,
            ..Self::new(stream)
        }
    }

    /// Set receive timeout
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Total bytes written
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes read
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consume the transport, returning the stream
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn read_once(&mut self) -> Result<Bytes> {
        let limit = self.receive_timeout;
        let mut buf = vec![0u8; self.max_read_size];

        let read = self.stream.read(&mut buf);
        let n = match limit {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| AuthError::Timeout(limit))?,
            None => read.await,
        }
        .map_err(|e| AuthError::Transport(format!("Read failed: {}", e)))?;

        if n == 0 {
            return Err(AuthError::PeerClosed);
        }

        buf.truncate(n);
        self.bytes_received += n as u64;
        tracing::trace!(bytes = n, "raw read");
        Ok(Bytes::from(buf))
    }

    async fn write_message(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(|e| AuthError::Transport(format!("Write failed: {}", e)))?;
        self.stream
            .flush()
            .await
            .map_err(|e| AuthError::Transport(format!("Flush failed: {}", e)))?;

        self.bytes_sent += data.len() as u64;
        tracing::trace!(bytes = data.len(), "raw write");
        Ok(())
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn send<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        self.write_message(data).boxed()
    }

    fn receive(&mut self) -> BoxFuture<'_, Result<Bytes>> {
        self.read_once().boxed()
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        async move {
            // Peer may already be gone; shutdown failure is not a session error
            if let Err(e) = self.stream.shutdown().await {
                tracing::debug!("Shutdown after session: {}", e);
            }
            Ok(())
        }
        .boxed()
    }

    fn name(&self) -> &'static str {
        "raw"
    }
}
