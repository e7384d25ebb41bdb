//! Pre-shared secret material.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret known to both client and server before the session starts.
///
/// Never serialized onto the transport. The bytes are wiped when the value
/// is dropped and never shown in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    /// Create a shared secret from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Get the secret bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the secret length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for SharedSecret {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for SharedSecret {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SharedSecret {}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Don't leak key material in debug output
        write!(f, "SharedSecret([REDACTED, {} bytes])", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SharedSecret::from("pass123");
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("pass123"));
        assert!(rendered.contains("7 bytes"));
    }

    #[test]
    fn test_empty_secret_allowed() {
        let secret = SharedSecret::new(Vec::new());
        assert!(secret.is_empty());
        assert_eq!(secret.len(), 0);
    }

    #[test]
    fn test_equality() {
        assert_eq!(SharedSecret::from("pass123"), SharedSecret::from("pass123"));
        assert_ne!(SharedSecret::from("pass123"), SharedSecret::from("pass124"));
        assert_ne!(SharedSecret::from("pass123"), SharedSecret::from("pass1234"));
        assert_eq!(SharedSecret::new(Vec::new()), SharedSecret::from(""));
    }

    #[test]
    fn test_zeroize_clears_bytes() {
        let mut secret = SharedSecret::from("pass123");
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
