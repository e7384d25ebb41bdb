//! # authshake - Challenge-Response Authentication over TCP
//!
//! A minimal client/server authentication protocol in which the client proves
//! knowledge of a pre-shared secret without ever transmitting it, plus the
//! plaintext username/password baseline it replaces.
//!
//! ## Protocol Overview
//!
//! ```text
//! Client                                      Server
//!    |                                           |
//!    |------ greeting ("hello" or identity) ---->|
//!    |                                           |  challenge = 16 random bytes
//!    |<----- challenge --------------------------|
//!    |                                           |
//!    |  digest = HMAC-SHA1(secret, challenge)    |
//!    |------ digest (20 bytes) ----------------->|
//!    |                                           |  constant-time compare
//!    |<----- verdict message --------------------|
//!    |                                           |
//!    X  connection closed by both sides          X
//! ```
//!
//! The server draws a fresh challenge from the OS CSPRNG per session, so a
//! captured digest is useless against any later session. Authentication is
//! one-way: the server is not authenticated to the client.
//!
//! ### Plaintext Baseline
//!
//! ```text
//! Client                                      Server
//!    |<----- "Hello. Send your greeting." -------|
//!    |------ "hello" --------------------------->|
//!    |<----- "Enter username:" ------------------|
//!    |------ username -------------------------->|
//!    |<----- "Enter password:" ------------------|
//!    |------ password -------------------------->|
//!    |<----- verdict message --------------------|
//! ```
//!
//! The baseline carries the password in clear and exists for comparison.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use authshake::{
//!     ClientSession, MemoryIdentityStore, ServerSession, SharedSecret, TcpEndpoint,
//!     TransportConfig,
//! };
//! use authshake::transport::tcp::accept_one;
//!
//! let config = TransportConfig::default();
//! let listener = TcpEndpoint::any(12345).listen().await?;
//!
//! // Server
//! let (mut transport, _peer) = accept_one(&listener, &config).await?;
//! let store = Arc::new(MemoryIdentityStore::reference());
//! let outcome = ServerSession::new(store).run(&mut transport).await?;
//!
//! // Client
//! let mut transport = TcpEndpoint::localhost(12345).connect(&config).await?;
//! let outcome = ClientSession::new(SharedSecret::from("pass123"))
//!     .run(&mut transport)
//!     .await?;
//! assert!(outcome.is_success());
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: Challenge generation, HMAC-SHA1 digests, secret handling
//! - [`identity`]: Secret and credential lookup
//! - [`session`]: Client and server state machines for both modes
//! - [`transport`]: TCP transport, framing, timeouts
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use config::Config;
pub use crypto::{Challenge, ChallengeGenerator, Digest, KeyedDigest, SharedSecret};
pub use error::{AuthError, Result};
pub use identity::{Credential, IdentityStore, MemoryIdentityStore};
pub use session::{
    ClientSession, PlaintextClient, PlaintextServer, ServerSession, SessionOutcome, Verdict,
};
pub use transport::{Framing, TcpEndpoint, Transport, TransportConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
