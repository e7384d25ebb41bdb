//! Challenge-response session, server role.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::Instrument;

use super::{new_session_id, SessionOutcome, Verdict};
use crate::crypto::{Challenge, ChallengeGenerator, KeyedDigest};
use crate::error::{AuthError, Result};
use crate::identity::IdentityStore;
use crate::transport::Transport;

/// Server state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for the client greeting
    AwaitGreeting,
    /// Challenge generated, not yet on the wire
    ChallengeSent,
    /// Challenge delivered, waiting for the digest
    AwaitResponse,
    /// Verdict computed (terminal)
    Verified(Verdict),
}

/// Pure server-side handshake: no I/O.
pub struct ServerHandshake<R = OsRng> {
    state: ServerState,
    store: Arc<dyn IdentityStore>,
    generator: ChallengeGenerator<R>,
    identity: Option<String>,
    challenge: Option<Challenge>,
}

impl ServerHandshake<OsRng> {
    /// Create a handshake drawing challenges from the OS CSPRNG
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self::with_generator(store, ChallengeGenerator::new())
    }
}

impl<R: RngCore + CryptoRng> ServerHandshake<R> {
    /// Create a handshake with a specific challenge generator
    pub fn with_generator(store: Arc<dyn IdentityStore>, generator: ChallengeGenerator<R>) -> Self {
        Self {
            state: ServerState::AwaitGreeting,
            store,
            generator,
            identity: None,
            challenge: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Identity claimed in the greeting
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Challenge issued for this session
    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    /// Verdict, once computed
    pub fn verdict(&self) -> Option<Verdict> {
        match self.state {
            ServerState::Verified(verdict) => Some(verdict),
            _ => None,
        }
    }

    /// Accept the greeting and issue a fresh challenge.
    ///
    /// The greeting content is not validated; it only names the claimed
    /// identity. Fails without changing state if no randomness is available.
    pub fn process_greeting(&mut self, greeting: &[u8]) -> Result<Challenge> {
        if self.state != ServerState::AwaitGreeting {
            return Err(AuthError::Protocol(format!(
                "Cannot process greeting in state {:?}",
                self.state
            )));
        }

        let challenge = self.generator.next_challenge()?;

        self.identity = Some(String::from_utf8_lossy(greeting).trim().to_string());
        self.challenge = Some(challenge.clone());
        self.state = ServerState::ChallengeSent;
        Ok(challenge)
    }

    /// Record that the challenge is on the wire
    pub fn challenge_sent(&mut self) -> Result<()> {
        if self.state != ServerState::ChallengeSent {
            return Err(AuthError::Protocol(format!(
                "Cannot mark challenge sent in state {:?}",
                self.state
            )));
        }
        self.state = ServerState::AwaitResponse;
        Ok(())
    }

    /// Check the client's claimed digest and settle the verdict.
    pub fn process_response(&mut self, response: &[u8]) -> Result<Verdict> {
        if self.state != ServerState::AwaitResponse {
            return Err(AuthError::Protocol(format!(
                "Cannot process response in state {:?}",
                self.state
            )));
        }

        let challenge = self
            .challenge
            .as_ref()
            .ok_or_else(|| AuthError::Protocol("No challenge issued".to_string()))?;
        let identity = self.identity.as_deref().unwrap_or_default();

        let matched = match self.store.secret_for(identity) {
            Some(secret) => KeyedDigest::verify(challenge.as_bytes(), secret, response),
            None => {
                tracing::warn!(identity, "No shared secret for identity");
                false
            }
        };

        let verdict = Verdict::from_match(matched);
        self.state = ServerState::Verified(verdict);
        Ok(verdict)
    }
}

/// Challenge-response server session over one transport.
///
/// ```rust,ignore
/// let store = Arc::new(MemoryIdentityStore::reference());
/// let outcome = ServerSession::new(store).run(&mut transport).await?;
/// ```
pub struct ServerSession<R = OsRng> {
    id: String,
    handshake: ServerHandshake<R>,
}

impl ServerSession<OsRng> {
    /// Create a session consulting `store` for secrets
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self::from_handshake(ServerHandshake::new(store))
    }
}

impl<R> ServerSession<R>
where
    R: RngCore + CryptoRng + Send,
{
    /// Drive an existing handshake
    pub fn from_handshake(handshake: ServerHandshake<R>) -> Self {
        Self {
            id: new_session_id(),
            handshake,
        }
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the whole session, then tear the connection down.
    ///
    /// Errors end this session only; the transport is closed either way.
    pub async fn run<T>(mut self, transport: &mut T) -> Result<SessionOutcome>
    where
        T: Transport + ?Sized,
    {
        let span = tracing::info_span!("auth_server", session = %self.id);

        async move {
            let result = self.exchange(transport).await;

            if let Err(e) = transport.close().await {
                tracing::debug!("Close after session: {}", e);
            }

            match result {
                Ok(verdict) => Ok(SessionOutcome {
                    session_id: self.id,
                    verdict,
                    message: verdict.message().to_string(),
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
        let greeting = transport.receive().await?;
        tracing::info!(greeting = %String::from_utf8_lossy(&greeting), "Client greeting");

        let challenge = self.handshake.process_greeting(&greeting)?;
        transport.send(challenge.as_bytes()).await?;
        self.handshake.challenge_sent()?;
        tracing::debug!(challenge = %challenge.to_hex(), "Challenge sent");

        let response = transport.receive().await?;
        tracing::debug!(bytes = response.len(), "Digest received");
        let verdict = self.handshake.process_response(&response)?;

        transport.send(verdict.message().as_bytes()).await?;
        tracing::info!(
            identity = self.handshake.identity().unwrap_or_default(),
            %verdict,
            "Verdict sent"
        );

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{SharedSecret, CHALLENGE_SIZE};
    use crate::identity::MemoryIdentityStore;

    fn store() -> Arc<dyn IdentityStore> {
        Arc::new(MemoryIdentityStore::reference())
    }

    #[test]
    fn test_server_success() {
        let mut server = ServerHandshake::new(store());
        assert_eq!(server.state(), ServerState::AwaitGreeting);

        let challenge = server.process_greeting(b"hello").unwrap();
        assert_eq!(challenge.len(), CHALLENGE_SIZE);
        assert_eq!(server.state(), ServerState::ChallengeSent);

        server.challenge_sent().unwrap();
        assert_eq!(server.state(), ServerState::AwaitResponse);

        let digest = KeyedDigest::compute(challenge.as_bytes(), &SharedSecret::from("pass123"));
        let verdict = server.process_response(digest.as_bytes()).unwrap();
        assert_eq!(verdict, Verdict::Success);
        assert_eq!(server.state(), ServerState::Verified(Verdict::Success));
        assert_eq!(server.verdict(), Some(Verdict::Success));
    }

    #[test]
    fn test_server_wrong_secret() {
        let mut server = ServerHandshake::new(store());
        let challenge = server.process_greeting(b"hello").unwrap();
        server.challenge_sent().unwrap();

        let digest =
            KeyedDigest::compute(challenge.as_bytes(), &SharedSecret::from("wrongsecret"));
        assert_eq!(
            server.process_response(digest.as_bytes()).unwrap(),
            Verdict::Failure
        );
    }

    #[test]
    fn test_server_truncated_digest() {
        let mut server = ServerHandshake::new(store());
        let challenge = server.process_greeting(b"hello").unwrap();
        server.challenge_sent().unwrap();

        let digest = KeyedDigest::compute(challenge.as_bytes(), &SharedSecret::from("pass123"));
        assert_eq!(
            server.process_response(&digest.as_bytes()[..10]).unwrap(),
            Verdict::Failure
        );
    }

    #[test]
    fn test_server_empty_greeting_accepted() {
        let mut server = ServerHandshake::new(store());
        assert!(server.process_greeting(b"").is_ok());
        assert_eq!(server.identity(), Some(""));
    }

    #[test]
    fn test_server_unknown_identity_without_fallback() {
        let mut inner = MemoryIdentityStore::new().with_secret("alice", "alice-secret");
        inner.clear_default();
        let mut server = ServerHandshake::new(Arc::new(inner));

        let challenge = server.process_greeting(b"mallory").unwrap();
        server.challenge_sent().unwrap();

        let digest = KeyedDigest::compute(challenge.as_bytes(), &SharedSecret::from(""));
        assert_eq!(
            server.process_response(digest.as_bytes()).unwrap(),
            Verdict::Failure
        );
    }

    #[test]
    fn test_server_out_of_order() {
        let mut server = ServerHandshake::new(store());
        assert!(matches!(
            server.process_response(&[0u8; 20]),
            Err(AuthError::Protocol(_))
        ));
        assert!(server.challenge_sent().is_err());

        server.process_greeting(b"hello").unwrap();
        assert!(server.process_greeting(b"hello").is_err());
        assert!(server.process_response(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_server_verdict_is_terminal() {
        let mut server = ServerHandshake::new(store());
        server.process_greeting(b"hello").unwrap();
        server.challenge_sent().unwrap();
        server.process_response(&[0u8; 20]).unwrap();

        assert!(server.process_response(&[0u8; 20]).is_err());
        assert!(server.process_greeting(b"hello").is_err());
        assert_eq!(server.verdict(), Some(Verdict::Failure));
    }
}
