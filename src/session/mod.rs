//! Authentication sessions.
//!
//! Two handshakes are provided, each with a server and a client role:
//!
//! | Mode | Server | Client | Secret on the wire |
//! |------|--------|--------|--------------------|
//! | Challenge-response | [`ServerSession`] | [`ClientSession`] | never |
//! | Plaintext baseline | [`PlaintextServer`] | [`PlaintextClient`] | every session |
//!
//! Each role is split in two layers:
//!
//! - a pure state machine ([`ServerHandshake`], [`ClientHandshake`],
//!   [`PlaintextHandshake`]) that consumes received bytes and returns the
//!   next bytes to send, with no I/O;
//! - an async driver that runs the state machine over one
//!   [`Transport`](crate::transport::Transport), logs each step, and tears
//!   the connection down when the session ends.
//!
//! ## Challenge-Response State Machines
//!
//! ```text
//! Server:  AwaitGreeting ──greeting──> ChallengeSent ──send──> AwaitResponse
//!                                                                   │ digest
//!                                                                   v
//!                                                           Verified(verdict)
//!
//! Client:  Idle ──greeting──> GreetingSent ──challenge──> ChallengeReceived
//!                                                              │ digest
//!                                                              v
//!                                     Done <──verdict── DigestSent
//! ```
//!
//! Every session is a single round trip: one verdict, no retries.

mod client;
mod console;
mod plaintext;
mod server;

pub use client::{ClientHandshake, ClientSession, ClientState, DEFAULT_GREETING};
pub use console::{OperatorConsole, ScriptedConsole, StdConsole};
pub use plaintext::{
    PlaintextClient, PlaintextHandshake, PlaintextServer, PlaintextState, GREETING_PROMPT,
    PASSWORD_PROMPT, PLAINTEXT_FAILURE_MESSAGE, PLAINTEXT_SUCCESS_MESSAGE, USERNAME_PROMPT,
};
pub use server::{ServerHandshake, ServerSession, ServerState};

use std::fmt;

/// Challenge-response success message
pub const SUCCESS_MESSAGE: &str = "Authentication successful. Welcome!";

/// Failure message shared by both modes
pub const FAILURE_MESSAGE: &str = "Authentication failed.";

/// Binary authentication outcome, computed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Peer proved knowledge of the secret / credential
    Success,
    /// Mismatch; delivered to the peer as a normal outcome
    Failure,
}

impl Verdict {
    /// Verdict from a comparison result
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Self::Success
        } else {
            Self::Failure
        }
    }

    /// Check if authentication succeeded
    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }

    /// Challenge-response verdict message sent to the client
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => SUCCESS_MESSAGE,
            Self::Failure => FAILURE_MESSAGE,
        }
    }

    /// Classify a verdict message received from a server.
    ///
    /// Anything that does not announce success counts as failure.
    pub fn from_message(message: &str) -> Self {
        Self::from_match(message.starts_with("Authentication successful"))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Result of one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Session ID used in log lines
    pub session_id: String,
    /// Authentication outcome
    pub verdict: Verdict,
    /// Verdict text as sent (server) or received (client)
    pub message: String,
}

impl SessionOutcome {
    /// Check if authentication succeeded
    pub fn is_success(&self) -> bool {
        self.verdict.is_success()
    }
}

/// Fresh session ID
pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_messages() {
        assert_eq!(Verdict::Success.message(), SUCCESS_MESSAGE);
        assert_eq!(Verdict::Failure.message(), FAILURE_MESSAGE);
    }

    #[test]
    fn test_verdict_from_message() {
        assert_eq!(Verdict::from_message(SUCCESS_MESSAGE), Verdict::Success);
        assert_eq!(
            Verdict::from_message(PLAINTEXT_SUCCESS_MESSAGE),
            Verdict::Success
        );
        assert_eq!(Verdict::from_message(FAILURE_MESSAGE), Verdict::Failure);
        assert_eq!(Verdict::from_message(""), Verdict::Failure);
        assert_eq!(Verdict::from_message("garbage"), Verdict::Failure);
    }

    #[test]
    fn test_session_ids_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }
}
