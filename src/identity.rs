//! Identity store: who may authenticate, and with what.
//!
//! Sessions never hold a compiled-in secret. They consult an
//! [`IdentityStore`] by the identity the peer claims:
//!
//! - challenge-response: the greeting names the identity, the store supplies
//!   the shared secret used to verify the digest;
//! - plaintext: the username names the identity, the store checks the
//!   password.
//!
//! [`MemoryIdentityStore`] is the in-process implementation populated from
//! configuration. Nothing is ever written back.

use std::collections::HashMap;

use crate::crypto::{constant_time_eq, SharedSecret};

/// Identity used when none is configured
pub const DEFAULT_IDENTITY: &str = "default";

/// Reference shared secret
pub const DEFAULT_SECRET: &str = "pass123";

/// Reference plaintext username
pub const DEFAULT_USERNAME: &str = "admin";

/// Reference plaintext password
pub const DEFAULT_PASSWORD: &str = "pass123";

/// Lookup collaborator consulted by sessions.
pub trait IdentityStore: Send + Sync {
    /// Shared secret for a claimed identity.
    ///
    /// Implementations may fall back to a default principal when the claimed
    /// identity is unknown. `None` means no secret can verify this peer.
    fn secret_for(&self, identity: &str) -> Option<&SharedSecret>;

    /// Check a plaintext username/password pair by exact equality.
    fn check_credential(&self, username: &[u8], password: &[u8]) -> bool;
}

/// Username/password record for the plaintext baseline.
#[derive(Debug, Clone)]
pub struct Credential {
    username: String,
    password: SharedSecret,
}

impl Credential {
    /// Create a credential record
    pub fn new(username: impl Into<String>, password: impl Into<SharedSecret>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Get the username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Exact match against a received pair
    pub fn matches(&self, username: &[u8], password: &[u8]) -> bool {
        self.username.as_bytes() == username && constant_time_eq(self.password.as_bytes(), password)
    }
}

/// In-memory identity store.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    /// Secrets indexed by identity
    secrets: HashMap<String, SharedSecret>,
    /// Identity used when the claimed one is unknown
    default_identity: Option<String>,
    /// Plaintext credentials indexed by username
    credentials: HashMap<String, Credential>,
}

impl MemoryIdentityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the reference principal: one shared secret
    /// (`"pass123"`) and one credential (`"admin"`/`"pass123"`).
    pub fn reference() -> Self {
        Self::new()
            .with_secret(DEFAULT_IDENTITY, DEFAULT_SECRET)
            .with_credential(Credential::new(DEFAULT_USERNAME, DEFAULT_PASSWORD))
    }

    /// Add a shared secret. The first secret added becomes the default.
    pub fn add_secret(&mut self, identity: impl Into<String>, secret: impl Into<SharedSecret>) {
        let identity = identity.into();
        if self.secrets.is_empty() {
            self.default_identity = Some(identity.clone());
        }
        self.secrets.insert(identity, secret.into());
    }

    /// Builder form of [`MemoryIdentityStore::add_secret`]
    pub fn with_secret(
        mut self,
        identity: impl Into<String>,
        secret: impl Into<SharedSecret>,
    ) -> Self {
        self.add_secret(identity, secret);
        self
    }

    /// Add a plaintext credential, replacing any with the same username
    pub fn add_credential(&mut self, credential: Credential) {
        self.credentials
            .insert(credential.username().to_string(), credential);
    }

    /// Builder form of [`MemoryIdentityStore::add_credential`]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.add_credential(credential);
        self
    }

    /// Change the fallback identity.
    ///
    /// Returns `false` if no secret is stored under `identity`.
    pub fn set_default(&mut self, identity: &str) -> bool {
        if !self.secrets.contains_key(identity) {
            return false;
        }
        self.default_identity = Some(identity.to_string());
        true
    }

    /// Remove the fallback so unknown identities are refused
    pub fn clear_default(&mut self) {
        self.default_identity = None;
    }

    /// Number of stored secrets
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }

    /// Number of stored credentials
    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn secret_for(&self, identity: &str) -> Option<&SharedSecret> {
        self.secrets.get(identity).or_else(|| {
            self.default_identity
                .as_ref()
                .and_then(|id| self.secrets.get(id))
        })
    }

    fn check_credential(&self, username: &[u8], password: &[u8]) -> bool {
        let Ok(name) = std::str::from_utf8(username) else {
            return false;
        };
        self.credentials
            .get(name)
            .is_some_and(|cred| cred.matches(username, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_store() {
        let store = MemoryIdentityStore::reference();
        assert_eq!(
            store.secret_for("anyone").map(SharedSecret::as_bytes),
            Some(DEFAULT_SECRET.as_bytes())
        );
        assert!(store.check_credential(b"admin", b"pass123"));
    }

    #[test]
    fn test_distinct_principals() {
        let store = MemoryIdentityStore::new()
            .with_secret("alice", "alice-secret")
            .with_secret("bob", "bob-secret");

        assert_eq!(store.secret_for("alice").unwrap().as_bytes(), b"alice-secret");
        assert_eq!(store.secret_for("bob").unwrap().as_bytes(), b"bob-secret");
        // First secret added is the fallback
        assert_eq!(store.secret_for("mallory").unwrap().as_bytes(), b"alice-secret");
    }

    #[test]
    fn test_no_fallback() {
        let mut store = MemoryIdentityStore::new().with_secret("alice", "alice-secret");
        store.clear_default();
        assert!(store.secret_for("mallory").is_none());
        assert!(store.secret_for("alice").is_some());
    }

    #[test]
    fn test_set_default() {
        let mut store = MemoryIdentityStore::new()
            .with_secret("alice", "a")
            .with_secret("bob", "b");
        assert!(store.set_default("bob"));
        assert_eq!(store.secret_for("carol").unwrap().as_bytes(), b"b");
        assert!(!store.set_default("carol"));
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryIdentityStore::new();
        assert!(store.secret_for("default").is_none());
        assert!(!store.check_credential(b"admin", b"pass123"));
    }

    #[test]
    fn test_credential_mismatch() {
        let store = MemoryIdentityStore::reference();
        assert!(!store.check_credential(b"admin", b"pass124"));
        assert!(!store.check_credential(b"root", b"pass123"));
        assert!(!store.check_credential(b"Admin", b"pass123"));
        assert!(!store.check_credential(b"admin\n", b"pass123"));
    }

    #[test]
    fn test_empty_fields_rejected() {
        let store = MemoryIdentityStore::reference();
        assert!(!store.check_credential(b"", b""));
        assert!(!store.check_credential(b"admin", b""));
        assert!(!store.check_credential(b"", b"pass123"));
    }

    #[test]
    fn test_non_utf8_username_rejected() {
        let store = MemoryIdentityStore::reference();
        assert!(!store.check_credential(&[0xff, 0xfe], b"pass123"));
    }
}
