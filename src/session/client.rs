//! Challenge-response session, client role.
//!
//! Authentication is one-way: the client proves knowledge of the shared
//! secret but does not verify the server.

use tracing::Instrument;

use super::{new_session_id, SessionOutcome, Verdict};
use crate::crypto::{Challenge, Digest, KeyedDigest, SharedSecret, CHALLENGE_SIZE};
use crate::error::{AuthError, Result};
use crate::transport::Transport;

/// Greeting sent when no identity is configured
pub const DEFAULT_GREETING: &str = "hello";

/// Client state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Nothing sent yet
    Idle,
    /// Greeting sent, waiting for the challenge
    GreetingSent,
    /// Challenge received, digest computed
    ChallengeReceived,
    /// Digest sent, waiting for the verdict
    DigestSent,
    /// Verdict received (terminal)
    Done(Verdict),
}

/// Pure client-side handshake: no I/O.
#[derive(Debug)]
pub struct ClientHandshake {
    state: ClientState,
    secret: SharedSecret,
    greeting: Vec<u8>,
    challenge: Option<Challenge>,
}

impl ClientHandshake {
    /// Create a handshake that greets with `"hello"`
    pub fn new(secret: SharedSecret) -> Self {
        Self {
            state: ClientState::Idle,
            secret,
            greeting: DEFAULT_GREETING.as_bytes().to_vec(),
            challenge: None,
        }
    }

    /// Greet with an identity so the server can pick the matching secret
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.greeting = identity.into().into_bytes();
        self
    }

    /// Get current state
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Challenge received from the server
    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    /// Produce the greeting payload
    pub fn create_greeting(&mut self) -> Result<Vec<u8>> {
        if self.state != ClientState::Idle {
            return Err(AuthError::Protocol(format!(
                "Cannot send greeting in state {:?}",
                self.state
            )));
        }
        self.state = ClientState::GreetingSent;
        Ok(self.greeting.clone())
    }

    /// Answer the challenge with `HMAC-SHA1(secret, challenge)`
    pub fn process_challenge(&mut self, challenge: &[u8]) -> Result<Digest> {
        if self.state != ClientState::GreetingSent {
            return Err(AuthError::Protocol(format!(
                "Cannot process challenge in state {:?}",
                self.state
            )));
        }

        if challenge.len() != CHALLENGE_SIZE {
            tracing::debug!(
                len = challenge.len(),
                expected = CHALLENGE_SIZE,
                "Unexpected challenge length"
            );
        }

        let digest = KeyedDigest::compute(challenge, &self.secret);
        self.challenge = Some(Challenge::from_bytes(challenge));
        self.state = ClientState::ChallengeReceived;
        Ok(digest)
    }

    /// Record that the digest is on the wire
    pub fn digest_sent(&mut self) -> Result<()> {
        if self.state != ClientState::ChallengeReceived {
            return Err(AuthError::Protocol(format!(
                "Cannot mark digest sent in state {:?}",
                self.state
            )));
        }
        self.state = ClientState::DigestSent;
        Ok(())
    }

    /// Read the server's verdict message
    pub fn process_verdict(&mut self, message: &[u8]) -> Result<(Verdict, String)> {
        if self.state != ClientState::DigestSent {
            return Err(AuthError::Protocol(format!(
                "Cannot process verdict in state {:?}",
                self.state
            )));
        }

        let text = String::from_utf8_lossy(message).into_owned();
        let verdict = Verdict::from_message(&text);
        self.state = ClientState::Done(verdict);
        Ok((verdict, text))
    }
}

/// Challenge-response client session over one transport.
#[derive(Debug)]
pub struct ClientSession {
    id: String,
    handshake: ClientHandshake,
}

impl ClientSession {
    /// Create a session using the pre-shared `secret`
    pub fn new(secret: SharedSecret) -> Self {
        Self::from_handshake(ClientHandshake::new(secret))
    }

    /// Drive an existing handshake
    pub fn from_handshake(handshake: ClientHandshake) -> Self {
        Self {
            id: new_session_id(),
            handshake,
        }
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
        let span = tracing::info_span!("auth_client", session = %self.id);

        async move {
            let result = self.exchange(transport).await;

            if let Err(e) = transport.close().await {
                tracing::debug!("Close after session: {}", e);
            }

            match result {
                Ok((verdict, message)) => Ok(SessionOutcome {
                    session_id: self.id,
                    verdict,
                    message,
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

    async fn exchange<T>(&mut self, transport: &mut T) -> Result<(Verdict, String)>
    where
        T: Transport + ?Sized,
    {
        let greeting = self.handshake.create_greeting()?;
        transport.send(&greeting).await?;

        let challenge = transport.receive().await?;
        tracing::info!(challenge = %hex::encode(&challenge), "Received challenge");

        let digest = self.handshake.process_challenge(&challenge)?;
        transport.send(digest.as_bytes()).await?;
        self.handshake.digest_sent()?;
        tracing::debug!(digest = %digest.to_hex(), "Digest sent");

        let message = transport.receive().await?;
        let (verdict, text) = self.handshake.process_verdict(&message)?;
        tracing::info!(%verdict, "Server: {}", text);

        Ok((verdict, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_flow() {
        let mut client = ClientHandshake::new(SharedSecret::from("pass123"));
        assert_eq!(client.state(), ClientState::Idle);

        assert_eq!(client.create_greeting().unwrap(), b"hello");
        assert_eq!(client.state(), ClientState::GreetingSent);

        let challenge = [9u8; CHALLENGE_SIZE];
        let digest = client.process_challenge(&challenge).unwrap();
        assert_eq!(
            digest,
            KeyedDigest::compute(&challenge, &SharedSecret::from("pass123"))
        );
        assert_eq!(client.state(), ClientState::ChallengeReceived);

        client.digest_sent().unwrap();
        assert_eq!(client.state(), ClientState::DigestSent);

        let (verdict, text) = client
            .process_verdict(b"Authentication successful. Welcome!")
            .unwrap();
        assert_eq!(verdict, Verdict::Success);
        assert_eq!(text, "Authentication successful. Welcome!");
        assert_eq!(client.state(), ClientState::Done(Verdict::Success));
    }

    #[test]
    fn test_client_identity_greeting() {
        let mut client = ClientHandshake::new(SharedSecret::from("s")).with_identity("alice");
        assert_eq!(client.create_greeting().unwrap(), b"alice");
    }

    #[test]
    fn test_client_out_of_order() {
        let mut client = ClientHandshake::new(SharedSecret::from("pass123"));
        assert!(client.process_challenge(&[0u8; 16]).is_err());
        assert!(client.digest_sent().is_err());
        assert!(client.process_verdict(b"x").is_err());

        client.create_greeting().unwrap();
        assert!(client.create_greeting().is_err());
    }

    #[test]
    fn test_client_failure_verdict() {
        let mut client = ClientHandshake::new(SharedSecret::from("pass123"));
        client.create_greeting().unwrap();
        client.process_challenge(&[1u8; 16]).unwrap();
        client.digest_sent().unwrap();

        let (verdict, _) = client.process_verdict(b"Authentication failed.").unwrap();
        assert_eq!(verdict, Verdict::Failure);
    }

    #[test]
    fn test_debug_hides_secret() {
        let client = ClientHandshake::new(SharedSecret::from("pass123"));
        assert!(!format!("{:?}", client).contains("pass123"));
    }
}
