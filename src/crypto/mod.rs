//! Cryptographic primitives for challenge-response authentication.
//!
//! - **KeyedDigest**: HMAC-SHA1 over the challenge, keyed with the shared secret
//! - **ChallengeGenerator**: fresh random challenges from the system CSPRNG
//! - **constant_time_eq**: digest comparison without timing side-channels
//!
//! # Exchange
//!
//! ```text
//! Client                                   Server
//!    |                                       |
//!    |------------- greeting -------------->|
//!    |<------------ challenge (16) ----------|  C = random(16)
//!    |                                       |
//!    |  D = HMAC-SHA1(S, C)                  |
//!    |------------- digest (20) ------------>|  D == HMAC-SHA1(S, C) ?
//!    |<------------ verdict -----------------|
//! ```
//!
//! The shared secret `S` is configured out of band on both sides and never
//! crosses the wire.

mod challenge;
mod digest;
mod error;
mod secret;

pub use challenge::{Challenge, ChallengeGenerator};
pub use digest::{constant_time_eq, Digest, KeyedDigest};
pub use error::CryptoError;
pub use secret::SharedSecret;

/// Default challenge size (128 bits)
pub const CHALLENGE_SIZE: usize = 16;

/// HMAC-SHA1 digest size (160 bits)
pub const DIGEST_SIZE: usize = 20;
