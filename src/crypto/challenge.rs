//! Fresh random challenges.
//!
//! A challenge is public, single-use, and must be unpredictable: a guessable
//! challenge lets an attacker replay a previously observed digest.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use super::error::CryptoError;
use super::CHALLENGE_SIZE;

/// Random, non-secret value issued by the server.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Challenge(Vec<u8>);

impl Challenge {
    /// Wrap bytes received from the server
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the challenge bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the challenge length
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the challenge is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for Challenge {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge({})", self.to_hex())
    }
}

/// Challenge generator backed by a cryptographically secure RNG.
///
/// Uses the operating system CSPRNG by default. Any `RngCore + CryptoRng`
/// can be injected with [`ChallengeGenerator::with_rng`].
#[derive(Debug, Clone)]
pub struct ChallengeGenerator<R = OsRng> {
    rng: R,
    length: usize,
}

impl ChallengeGenerator<OsRng> {
    /// Generator with the default 16-byte length
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for ChallengeGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> ChallengeGenerator<R> {
    /// Generator drawing from the given RNG
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            length: CHALLENGE_SIZE,
        }
    }

    /// Set the length used by [`ChallengeGenerator::next_challenge`]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Configured challenge length
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a challenge of the configured length
    pub fn next_challenge(&mut self) -> Result<Challenge, CryptoError> {
        self.generate(self.length)
    }

    /// Generate a challenge of `length` random bytes.
    ///
    /// Fails with [`CryptoError::RandomnessUnavailable`] if the RNG cannot
    /// fill the buffer. No retry is attempted.
    pub fn generate(&mut self, length: usize) -> Result<Challenge, CryptoError> {
        if length == 0 {
            return Err(CryptoError::InvalidChallengeLength(length));
        }

        let mut buf = vec![0u8; length];
        self.rng
            .try_fill_bytes(&mut buf)
            .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;

        Ok(Challenge(buf))
    }
}
