//! HMAC-SHA1 keyed digest for challenge-response authentication.
//!
//! The client proves possession of the shared secret by returning
//! `HMAC-SHA1(secret, challenge)`. The secret itself never crosses the wire.

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use super::secret::SharedSecret;
use super::DIGEST_SIZE;

type HmacSha1 = Hmac<Sha1>;

/// Keyed digest over a challenge.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Wrap raw digest bytes
    pub fn new(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Interpret a received payload as a digest.
    ///
    /// Returns `None` unless the payload is exactly [`DIGEST_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; DIGEST_SIZE]>::try_from(bytes).ok().map(Self)
    }

    /// Get the digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Stateless HMAC-SHA1 keyed digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedDigest;

impl KeyedDigest {
    /// Compute `HMAC-SHA1(key, message)`.
    ///
    /// Empty keys and empty messages are valid inputs.
    pub fn compute(message: &[u8], key: &SharedSecret) -> Digest {
        let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key size");
        mac.update(message);

        let mut out = [0u8; DIGEST_SIZE];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Digest(out)
    }

    /// Recompute the digest for `message` and compare it with `claimed`
    /// in constant time.
    pub fn verify(message: &[u8], key: &SharedSecret, claimed: &[u8]) -> bool {
        let expected = Self::compute(message, key);
        constant_time_eq(expected.as_bytes(), claimed)
    }
}

/// Constant-time comparison to prevent timing attacks.
///
/// Only the length is allowed to leak; for equal lengths the running time
/// does not depend on where the inputs differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
