//! Length-prefixed framing over any [`Transport`].
//!
//! # Wire Format
//!
//! ```text
//! +----------------+---------------------+
//! | varint(len)    | payload (len bytes) |
//! +----------------+---------------------+
//! ```
//!
//! Reads are accumulated in an internal buffer until a whole frame is
//! available, so a message split across several reads, or several messages
//! coalesced into one read, cannot desynchronize a session. A zero-length
//! frame is a valid empty message; only end-of-stream is `PeerClosed`.

use bytes::{Buf, Bytes, BytesMut};
use futures::future::{BoxFuture, FutureExt};

use super::config::DEFAULT_MAX_FRAME_SIZE;
use super::varint::{decode_varint, varint_size, write_varint_vec};
use super::Transport;
use crate::error::{AuthError, Result};

/// Framing layer exposing whole messages on top of a raw transport.
#[derive(Debug)]
pub struct FramedTransport<T> {
    inner: T,
    buffer: BytesMut,
    max_frame_size: usize,
}

impl<T: Transport> FramedTransport<T> {
    /// Wrap a transport with the default 64 KiB frame limit
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set maximum frame payload size
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Get a reference to the wrapped transport
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Bytes received but not yet returned as a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Send one message as a single frame
    pub async fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.max_frame_size {
            return Err(AuthError::FrameTooLarge {
                size: payload.len() as u64,
                max: self.max_frame_size,
            });
        }

        let len = payload.len() as u64;
        let mut frame = Vec::with_capacity(varint_size(len) + payload.len());
        write_varint_vec(&mut frame, len);
        frame.extend_from_slice(payload);

        self.inner.send(&frame).await
    }

    /// Receive the next whole frame, reading from the transport as needed
    pub async fn receive_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = self.try_decode()? {
                return Ok(frame);
            }

            let chunk = self.inner.receive().await?;
            self.buffer.extend_from_slice(&chunk);
        }
    }

    fn try_decode(&mut self) -> Result<Option<Bytes>> {
        let Some((len, header)) = decode_varint(&self.buffer)? else {
            return Ok(None);
        };

        if len > self.max_frame_size as u64 {
            return Err(AuthError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        let len = len as usize;
        if self.buffer.len() < header + len {
            return Ok(None);
        }

        self.buffer.advance(header);
        Ok(Some(self.buffer.split_to(len).freeze()))
    }
}

impl<T: Transport> Transport for FramedTransport<T> {
    fn send<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        self.send_frame(data).boxed()
    }

    fn receive(&mut self) -> BoxFuture<'_, Result<Bytes>> {
        self.receive_frame().boxed()
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        self.inner.close()
    }

    fn name(&self) -> &'static str {
        "length-prefixed"
    }
}
