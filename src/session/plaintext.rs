//! Plaintext username/password handshake.
//!
//! The baseline the challenge-response mode is contrasted with: the password
//! crosses the wire in clear on every session and nothing is fresh, so any
//! observer can replay it. Kept for comparison, not for deployment.
//!
//! ```text
//! Client                                       Server
//!    |<------ "Hello. Send your greeting." -------|
//!    |------- "hello" --------------------------->|
//!    |<------ "Enter username:" ------------------|
//!    |------- username -------------------------->|
//!    |<------ "Enter password:" ------------------|
//!    |------- password -------------------------->|  (username, password) == stored?
//!    |<------ verdict ----------------------------|
//! ```

use std::sync::Arc;

use tracing::Instrument;

use super::client::DEFAULT_GREETING;
use super::console::OperatorConsole;
use super::{new_session_id, SessionOutcome, Verdict, FAILURE_MESSAGE};
use crate::error::{AuthError, Result};
use crate::identity::IdentityStore;
use crate::transport::Transport;

/// Server's opening prompt
pub const GREETING_PROMPT: &str = "Hello. Send your greeting.";

/// Username prompt
pub const USERNAME_PROMPT: &str = "Enter username:";

/// Password prompt
pub const PASSWORD_PROMPT: &str = "Enter password:";

/// Plaintext success message
pub const PLAINTEXT_SUCCESS_MESSAGE: &str =
    "Authentication successful.\n secret_data_from_server...";

/// Plaintext failure message
pub const PLAINTEXT_FAILURE_MESSAGE: &str = FAILURE_MESSAGE;

/// Plaintext server state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaintextState {
    /// Greeting prompt pending
    AwaitGreeting,
    /// Username prompt pending
    AskUsername,
    /// Password prompt pending
    AskPassword,
    /// Credential checked (terminal)
    Verified(Verdict),
}

/// Pure plaintext server handshake: no I/O.
pub struct PlaintextHandshake {
    state: PlaintextState,
    store: Arc<dyn IdentityStore>,
    username: Vec<u8>,
}

impl PlaintextHandshake {
    /// Create a handshake checking credentials against `store`
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            state: PlaintextState::AwaitGreeting,
            store,
            username: Vec::new(),
        }
    }

    /// Get current state
    pub fn state(&self) -> PlaintextState {
        self.state
    }

    /// Prompt to send next, `None` once verified
    pub fn next_prompt(&self) -> Option<&'static str> {
        match self.state {
            PlaintextState::AwaitGreeting => Some(GREETING_PROMPT),
            PlaintextState::AskUsername => Some(USERNAME_PROMPT),
            PlaintextState::AskPassword => Some(PASSWORD_PROMPT),
            PlaintextState::Verified(_) => None,
        }
    }

    /// Consume the client's reply to the current prompt.
    ///
    /// Returns the verdict after the password reply.
    pub fn process_reply(&mut self, reply: &[u8]) -> Result<Option<Verdict>> {
        match self.state {
            PlaintextState::AwaitGreeting => {
                self.state = PlaintextState::AskUsername;
                Ok(None)
            }
            PlaintextState::AskUsername => {
                self.username = reply.to_vec();
                self.state = PlaintextState::AskPassword;
                Ok(None)
            }
            PlaintextState::AskPassword => {
                let verdict =
                    Verdict::from_match(self.store.check_credential(&self.username, reply));
                self.state = PlaintextState::Verified(verdict);
                Ok(Some(verdict))
            }
            PlaintextState::Verified(_) => Err(AuthError::Protocol(
                "Cannot process reply after verdict".to_string(),
            )),
        }
    }

    /// Claimed username, lossily decoded
    pub fn username(&self) -> String {
        String::from_utf8_lossy(&self.username).into_owned()
    }
}

/// Verdict text for the plaintext mode
fn verdict_message(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Success => PLAINTEXT_SUCCESS_MESSAGE,
        Verdict::Failure => PLAINTEXT_FAILURE_MESSAGE,
    }
}

/// Plaintext server session over one transport.
pub struct PlaintextServer {
    id: String,
    handshake: PlaintextHandshake,
}

impl PlaintextServer {
    /// Create a session checking credentials against `store`
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            id: new_session_id(),
            handshake: PlaintextHandshake::new(store),
        }
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the whole session, then tear the connection down.
    pub async fn run<T>(mut self, transport: &mut T) -> Result<SessionOutcome>
    where
        T: Transport + ?Sized,
    {
        let span = tracing::info_span!("plaintext_server", session = %self.id);

        async move {
            let result = self.exchange(transport).await;

            if let Err(e) = transport.close().await {
                tracing::debug!("Close after session: {}", e);
            }

            match result {
                Ok(verdict) => Ok(SessionOutcome {
                    session_id: self.id,
                    verdict,
                    message: verdict_message(verdict).to_string(),
                }),
                Err(e) => {
                    tracing::warn!(error = %e, state = ?self.handshake.state(), "Session aborted");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn exchange<T>(&mut self, transport: &mut T) -> Result<Verdict>
    where
        T: Transport + ?Sized,
    {
        while let Some(prompt) = self.handshake.next_prompt() {
            transport.send(prompt.as_bytes()).await?;
            let reply = transport.receive().await?;

            if self.handshake.state() == PlaintextState::AwaitGreeting {
                tracing::info!(greeting = %String::from_utf8_lossy(&reply), "Client greeting");
            }

            if let Some(verdict) = self.handshake.process_reply(&reply)? {
                transport.send(verdict_message(verdict).as_bytes()).await?;
                tracing::info!(username = %self.handshake.username(), %verdict, "Verdict sent");
                return Ok(verdict);
            }
        }

        Err(AuthError::Protocol("Session already verified".to_string()))
    }
}

/// Plaintext client session: relays prompts to an operator.
pub struct PlaintextClient<C> {
    id: String,
    console: C,
    greeting: String,
    reject_empty: bool,
}

impl<C: OperatorConsole> PlaintextClient<C> {
    /// Create a session reading credentials from `console`
    pub fn new(console: C) -> Self {
        Self {
            id: new_session_id(),
            console,
            greeting: DEFAULT_GREETING.to_string(),
            reject_empty: false,
        }
    }

    /// Refuse empty operator answers instead of sending them.
    ///
    /// Needed on unframed transports, where an empty write carries no bytes
    /// and the server would wait for an answer that never arrives.
    pub fn reject_empty_answers(mut self, reject: bool) -> Self {
        self.reject_empty = reject;
        self
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the whole session and surface the server's verdict.
    pub async fn run<T>(mut self, transport: &mut T) -> Result<SessionOutcome>
    where
        T: Transport + ?Sized,
    {
        let span = tracing::info_span!("plaintext_client", session = %self.id);

        async move {
            let result = self.exchange(transport).await;

            if let Err(e) = transport.close().await {
                tracing::debug!("Close after session: {}", e);
            }

            let (verdict, message) = result.inspect_err(|e| {
                tracing::warn!(error = %e, "Session aborted");
            })?;

            Ok(SessionOutcome {
                session_id: self.id,
                verdict,
                message,
            })
        }
        .instrument(span)
        .await
    }

    async fn exchange<T>(&mut self, transport: &mut T) -> Result<(Verdict, String)>
    where
        T: Transport + ?Sized,
    {
        // Greeting prompt, answered automatically
        self.show_next(transport).await?;
        transport.send(self.greeting.as_bytes()).await?;

        // Username and password prompts, answered by the operator
        for _ in 0..2 {
            self.show_next(transport).await?;
            let answer = self.console.read_line().await?;
            if answer.is_empty() && self.reject_empty {
                return Err(AuthError::Protocol(
                    "Empty answer cannot be delivered without framing".to_string(),
                ));
            }
            transport.send(answer.as_bytes()).await?;
        }

        let message = self.show_next(transport).await?;
        let verdict = Verdict::from_message(&message);
        tracing::info!(%verdict, "Plaintext verdict received");
        Ok((verdict, message))
    }

    async fn show_next<T>(&mut self, transport: &mut T) -> Result<String>
    where
        T: Transport + ?Sized,
    {
        let message = transport.receive().await?;
        let text = String::from_utf8_lossy(&message).into_owned();
        self.console.display(&text).await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityStore;

    fn handshake() -> PlaintextHandshake {
        PlaintextHandshake::new(Arc::new(MemoryIdentityStore::reference()))
    }

    fn run_replies(replies: [&[u8]; 3]) -> Verdict {
        let mut server = handshake();
        assert_eq!(server.process_reply(replies[0]).unwrap(), None);
        assert_eq!(server.process_reply(replies[1]).unwrap(), None);
        server.process_reply(replies[2]).unwrap().unwrap()
    }

    #[test]
    fn test_prompts_in_order() {
        let mut server = handshake();
        assert_eq!(server.next_prompt(), Some(GREETING_PROMPT));
        server.process_reply(b"hello").unwrap();
        assert_eq!(server.next_prompt(), Some(USERNAME_PROMPT));
        server.process_reply(b"admin").unwrap();
        assert_eq!(server.next_prompt(), Some(PASSWORD_PROMPT));
        server.process_reply(b"pass123").unwrap();
        assert_eq!(server.next_prompt(), None);
        assert_eq!(server.state(), PlaintextState::Verified(Verdict::Success));
    }

    #[test]
    fn test_correct_credentials() {
        assert_eq!(run_replies([b"hello", b"admin", b"pass123"]), Verdict::Success);
    }

    #[test]
    fn test_wrong_credentials() {
        assert_eq!(run_replies([b"hello", b"admin", b"wrong"]), Verdict::Failure);
        assert_eq!(run_replies([b"hello", b"root", b"pass123"]), Verdict::Failure);
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert_eq!(run_replies([b"hello", b"", b""]), Verdict::Failure);
        assert_eq!(run_replies([b"hello", b"admin", b""]), Verdict::Failure);
    }

    #[test]
    fn test_greeting_content_ignored() {
        assert_eq!(run_replies([b"", b"admin", b"pass123"]), Verdict::Success);
    }

    #[test]
    fn test_reply_after_verdict() {
        let mut server = handshake();
        for reply in [&b"hello"[..], b"admin", b"pass123"] {
            server.process_reply(reply).unwrap();
        }
        assert!(matches!(
            server.process_reply(b"again"),
            Err(AuthError::Protocol(_))
        ));
    }

    #[test]
    fn test_verdict_messages() {
        assert_eq!(verdict_message(Verdict::Success), PLAINTEXT_SUCCESS_MESSAGE);
        assert_eq!(verdict_message(Verdict::Failure), "Authentication failed.");
    }
}
