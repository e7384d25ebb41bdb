//! Randomized property tests for the keyed digest and the pure handshakes.

use std::sync::Arc;

use authshake::crypto::{constant_time_eq, KeyedDigest, DIGEST_SIZE};
use authshake::session::{ClientHandshake, ServerHandshake};
use authshake::{MemoryIdentityStore, SharedSecret, Verdict};
use proptest::prelude::*;

/// Drive both pure handshakes against each other
fn handshake(server_secret: &[u8], client_secret: &[u8]) -> Verdict {
    let store = MemoryIdentityStore::new()
        .with_secret("default", SharedSecret::new(server_secret.to_vec()));
    let mut server = ServerHandshake::new(Arc::new(store));
    let mut client = ClientHandshake::new(SharedSecret::new(client_secret.to_vec()));

    let greeting = client.create_greeting().unwrap();
    let challenge = server.process_greeting(&greeting).unwrap();
    server.challenge_sent().unwrap();

    let digest = client.process_challenge(challenge.as_bytes()).unwrap();
    client.digest_sent().unwrap();

    let verdict = server.process_response(digest.as_bytes()).unwrap();
    let (seen, _) = client.process_verdict(verdict.message().as_bytes()).unwrap();
    assert_eq!(seen, verdict);
    verdict
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_digest_is_deterministic(
        challenge in prop::collection::vec(any::<u8>(), 0..64),
        secret in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let key = SharedSecret::new(secret);
        let a = KeyedDigest::compute(&challenge, &key);
        let b = KeyedDigest::compute(&challenge, &key);
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.as_bytes().len(), DIGEST_SIZE);
    }

    #[test]
    fn prop_distinct_challenges_distinct_digests(
        c1 in prop::array::uniform16(any::<u8>()),
        c2 in prop::array::uniform16(any::<u8>()),
        secret in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        prop_assume!(c1 != c2);
        let key = SharedSecret::new(secret);
        prop_assert_ne!(KeyedDigest::compute(&c1, &key), KeyedDigest::compute(&c2, &key));
    }

    #[test]
    fn prop_wrong_key_never_verifies(
        challenge in prop::array::uniform16(any::<u8>()),
        right in prop::collection::vec(any::<u8>(), 1..64),
        wrong in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        prop_assume!(right != wrong);
        let digest = KeyedDigest::compute(&challenge, &SharedSecret::new(wrong));
        prop_assert!(!KeyedDigest::verify(&challenge, &SharedSecret::new(right), digest.as_bytes()));
    }

    #[test]
    fn prop_handshake_verdict_tracks_secret(
        server in prop::collection::vec(any::<u8>(), 1..32),
        client in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        prop_assert_eq!(handshake(&server, &server), Verdict::Success);
        let expected = Verdict::from_match(server == client);
        prop_assert_eq!(handshake(&server, &client), expected);
    }

    #[test]
    fn prop_constant_time_eq_agrees_with_eq(
        a in prop::collection::vec(any::<u8>(), 0..32),
        b in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        prop_assert_eq!(constant_time_eq(&a, &b), a == b);
        prop_assert!(constant_time_eq(&a, &a));
    }
}
