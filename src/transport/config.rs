//! Transport configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum bytes taken from the stream by a single raw read
pub const DEFAULT_MAX_READ_SIZE: usize = 1024;

/// Maximum accepted length-prefixed frame (64 KiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Default receive timeout
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// How logical messages are delimited on the byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// One read per message, unframed. Safe only while every message fits
    /// in a single read and the peer never coalesces writes.
    Raw,
    /// Each message is prefixed with its LEB128 varint length (default)
    #[default]
    LengthPrefixed,
}

impl Framing {
    /// Get descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::LengthPrefixed => "length-prefixed",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" | "none" => Ok(Self::Raw),
            "length-prefixed" | "length_prefixed" | "lp" | "framed" => Ok(Self::LengthPrefixed),
            _ => Err(format!("Unknown framing: {}", s)),
        }
    }
}

/// Runtime transport settings shared by both roles.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Message delimiting mode
    pub framing: Framing,
    /// Receive timeout (`None` waits forever)
    pub receive_timeout: Option<Duration>,
    /// Maximum bytes per raw read
    pub max_read_size: usize,
    /// Maximum frame payload in length-prefixed mode
    pub max_frame_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            receive_timeout: Some(DEFAULT_RECEIVE_TIMEOUT),
            max_read_size: DEFAULT_MAX_READ_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl TransportConfig {
    /// Reference behaviour: raw single reads, no timeout
    pub fn reference() -> Self {
        Self {
            framing: Framing::Raw,
            receive_timeout: None,
            ..Default::default()
        }
    }

    /// Set framing mode
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Set receive timeout; a zero duration disables it
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    /// Set maximum frame size
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_from_str() {
        assert_eq!(Framing::from_str("raw").unwrap(), Framing::Raw);
        assert_eq!(
            Framing::from_str("LENGTH-PREFIXED").unwrap(),
            Framing::LengthPrefixed
        );
        assert_eq!(Framing::from_str("lp").unwrap(), Framing::LengthPrefixed);
        assert!(Framing::from_str("invalid").is_err());
    }

    #[test]
    fn test_framing_default() {
        assert_eq!(Framing::default(), Framing::LengthPrefixed);
        assert_eq!(Framing::default().to_string(), "length-prefixed");
    }

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.max_read_size, 1024);
        assert_eq!(config.receive_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = TransportConfig::default().with_receive_timeout(Duration::ZERO);
        assert!(config.receive_timeout.is_none());
    }

    #[test]
    fn test_reference_config() {
        let config = TransportConfig::reference();
        assert_eq!(config.framing, Framing::Raw);
        assert!(config.receive_timeout.is_none());
    }
}
