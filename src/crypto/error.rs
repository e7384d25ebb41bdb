//! Cryptographic error type for authshake.
//!
//! # Error Classification
//!
//! Crypto errors fall into two categories:
//!
//! | Error | Cause | Handling |
//! |-------|-------|----------|
//! | `InvalidChallengeLength` | Caller asked for an impossible challenge | Fix the caller, don't retry |
//! | `RandomnessUnavailable` | System RNG could not fill the buffer | Abort the session, don't retry |
//!
//! An entropy failure indicates a broken environment rather than a transient
//! fault, so it is never retried. Digest computation itself has no error
//! conditions.

use thiserror::Error;

/// Errors from challenge generation.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A zero-length challenge was requested.
    #[error("Invalid challenge length: {0} (must be positive)")]
    InvalidChallengeLength(usize),

    /// The entropy source could not fill the requested challenge.
    ///
    /// RNG failure is rare but catastrophic. If this occurs, the system
    /// entropy pool may be exhausted or unavailable.
    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CryptoError::RandomnessUnavailable("getrandom failed".to_string());
        assert!(err.to_string().contains("getrandom failed"));

        let err = CryptoError::InvalidChallengeLength(0);
        assert!(err.to_string().contains("must be positive"));
    }
}
