//! authshake error types.
//!
//! # Error Classification
//!
//! Errors are split by how far their damage reaches:
//!
//! - **Setup errors** (`TransportSetup`, `Config`): the process cannot start
//!   a session at all. Logged and fatal, never retried.
//! - **Session errors** (`Transport`, `PeerClosed`, `Timeout`,
//!   `FrameTooLarge`, `Crypto`, `Protocol`, `Io`): the current session ends
//!   without a verdict and its connection is dropped. A server running more
//!   than one session must not let these escape the failing session.
//!
//! A failed authentication is **not** an error. It is
//! [`Verdict::Failure`](crate::session::Verdict::Failure), delivered to the
//! peer as a normal protocol outcome.

use std::time::Duration;

use thiserror::Error;

use crate::crypto::CryptoError;

/// authshake errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Socket creation, bind, listen, connect or accept failed.
    #[error("Transport setup error: {0}")]
    TransportSetup(String),

    /// Read or write failed mid-session.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The peer closed the connection (zero-byte read).
    #[error("Peer closed the connection")]
    PeerClosed,

    /// No data arrived within the configured receive timeout.
    #[error("Receive timed out after {0:?}")]
    Timeout(Duration),

    /// A length-prefixed frame exceeded the configured maximum.
    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Announced frame size.
        size: u64,
        /// Configured maximum.
        max: usize,
    },

    /// Cryptographic operation failed.
    ///
    /// This variant preserves the full error chain via `#[source]`.
    #[error("Crypto error: {0}")]
    Crypto(#[source] CryptoError),

    /// A session step was invoked in the wrong state.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Whether this error prevents any session from starting.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::TransportSetup(_) | Self::Config(_))
    }
}

/// Result type alias for authshake operations
pub type Result<T> = std::result::Result<T, AuthError>;

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        AuthError::Crypto(err)
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(err: toml::de::Error) -> Self {
        AuthError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_error_conversion() {
        let err: AuthError = CryptoError::RandomnessUnavailable("test".to_string()).into();
        assert!(matches!(err, AuthError::Crypto(_)));
        assert!(err.to_string().contains("Randomness unavailable"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let err: AuthError = CryptoError::RandomnessUnavailable("no entropy".to_string()).into();
        let source = err.source();
        assert!(source.is_some());
        assert!(source.unwrap().to_string().contains("no entropy"));
    }

    #[test]
    fn test_setup_classification() {
        assert!(AuthError::TransportSetup("bind failed".to_string()).is_setup());
        assert!(AuthError::Config("bad port".to_string()).is_setup());
        assert!(!AuthError::PeerClosed.is_setup());
        assert!(!AuthError::Timeout(Duration::from_secs(1)).is_setup());
        assert!(!AuthError::Transport("reset".to_string()).is_setup());
    }
}
