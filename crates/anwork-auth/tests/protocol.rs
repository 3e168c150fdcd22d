//! End-to-end mint / present / accept behaviour

mod common;

use std::sync::Arc;
use std::time::Duration;

use anwork_auth::{
    AcceptError, ClaimsError, Client, MintError, PresentError, Server, ShortRandom,
    SigningAlgorithm, jws,
};
use common::{Harness, KEY_PAIR, OTHER_KEY_PAIR, OTHER_SECRET, SECRET, T0};
use pretty_assertions::assert_eq;

#[test]
fn test_round_trip() {
    let harness = Harness::new();
    let presented = harness.handshake();
    assert_eq!(harness.server.accept(&presented), Ok(()));
}

#[test]
fn test_accept_is_repeatable_until_next_mint() {
    let harness = Harness::new();
    let presented = harness.handshake();

    assert_eq!(harness.server.accept(&presented), Ok(()));
    assert_eq!(harness.server.accept(&presented), Ok(()));
}

#[test]
fn test_example_scenario() {
    let harness = Harness::new();
    let minted = harness.server.mint().unwrap();
    let presented = harness.client.present(&minted).unwrap();

    let claims = jws::verify(&presented, SECRET, SigningAlgorithm::HS512).unwrap();
    assert_eq!(claims.issuer(), "anwork");
    assert_eq!(claims.subject(), "andrew");
    assert_eq!(claims.issued_at(), T0 as i64);
    assert_eq!(claims.not_before(), T0 as i64);
    assert_eq!(claims.expiry(), T0 as i64 + 3600);
    assert_eq!(claims.id().len(), 64);
    assert!(claims.id().chars().all(|c| c.is_ascii_hexdigit()));

    harness.clock.advance(Duration::from_secs(30 * 60));
    assert_eq!(harness.server.accept(&presented), Ok(()));

    harness.clock.advance(Duration::from_secs(90 * 60));
    assert!(matches!(
        harness.server.accept(&presented),
        Err(AcceptError::Claims(ClaimsError::Expired { .. }))
    ));

    harness.clock.rewind(Duration::from_secs(90 * 60));
    harness.server.mint().unwrap();
    assert_eq!(
        harness.server.accept(&presented),
        Err(AcceptError::Claims(ClaimsError::StaleNonce))
    );
}

#[test]
fn test_anti_replay() {
    let harness = Harness::new();
    let first = harness.handshake();
    let second = harness.handshake();

    assert_eq!(
        harness.server.accept(&first),
        Err(AcceptError::Claims(ClaimsError::StaleNonce))
    );
    assert_eq!(harness.server.accept(&second), Ok(()));
}

#[test]
fn test_minted_token_cannot_be_accepted_directly() {
    let harness = Harness::new();
    let minted = harness.server.mint().unwrap();

    assert!(matches!(
        harness.server.accept(&minted),
        Err(AcceptError::Parse { .. })
    ));
}

#[test]
fn test_key_mismatch() {
    let harness = Harness::with(&OTHER_KEY_PAIR, SECRET, SECRET);
    let minted = harness.server.mint().unwrap();

    assert_eq!(harness.client.present(&minted), Err(PresentError::Decrypt));
}

#[test]
fn test_secret_mismatch_on_present() {
    let harness = Harness::with(&KEY_PAIR, SECRET, OTHER_SECRET);
    let minted = harness.server.mint().unwrap();

    assert!(matches!(
        harness.client.present(&minted),
        Err(PresentError::ClaimsRead { .. })
    ));
}

#[test]
fn test_secret_mismatch_on_accept() {
    let honest = Harness::new();
    let presented = honest.handshake();

    let other = Server::new(KEY_PAIR.1.clone(), common::secret(OTHER_SECRET))
        .with_clock(honest.clock.clone());
    assert_eq!(other.accept(&presented), Err(AcceptError::Signature));
}

#[test]
fn test_present_rejects_expired_and_early_tokens() {
    let harness = Harness::new();

    let minted = harness.server.mint().unwrap();
    harness.clock.advance(Duration::from_secs(3600));
    assert!(matches!(
        harness.client.present(&minted),
        Err(PresentError::ClaimsValidation(ClaimsError::Expired { .. }))
    ));

    let minted = harness.server.mint().unwrap();
    harness.clock.rewind(Duration::from_secs(1));
    assert!(matches!(
        harness.client.present(&minted),
        Err(PresentError::ClaimsValidation(ClaimsError::NotYetValid { .. }))
    ));
}

#[test]
fn test_accept_before_any_mint() {
    let harness = Harness::new();
    let presented = harness.handshake();

    let fresh = Server::new(KEY_PAIR.1.clone(), common::secret(SECRET))
        .with_clock(harness.clock.clone());
    assert!(!fresh.has_active_nonce());
    assert_eq!(
        fresh.accept(&presented),
        Err(AcceptError::NonceNotInitialized)
    );
}

#[test]
fn test_short_randomness_leaves_nonce_unchanged() {
    let harness = Harness::new();
    let presented = harness.handshake();

    let server = harness
        .server
        .with_random_source(Arc::new(ShortRandom::new(16)));
    assert_eq!(
        server.mint(),
        Err(MintError::InsufficientRandomness {
            requested: 32,
            received: 16
        })
    );
    assert_eq!(server.accept(&presented), Ok(()));
}

#[test]
fn test_tampered_presented_token() {
    let harness = Harness::new();
    let presented = harness.handshake();
    let mut parts: Vec<String> = presented.split('.').map(str::to_string).collect();
    let replacement = if parts[2].starts_with('A') { "B" } else { "A" };
    parts[2].replace_range(..1, replacement);

    assert_eq!(
        harness.server.accept(&parts.join(".")),
        Err(AcceptError::Signature)
    );
}

#[test]
fn test_garbage_inputs() {
    let harness = Harness::new();
    harness.server.mint().unwrap();

    for input in ["", "bearer", "a.b.c", "a.b.c.d.e"] {
        assert!(
            matches!(harness.server.accept(input), Err(AcceptError::Parse { .. })),
            "accept({input:?})"
        );
        assert!(
            matches!(harness.client.present(input), Err(PresentError::Parse { .. })),
            "present({input:?})"
        );
    }
}

#[test]
fn test_configured_algorithm_must_match() {
    let harness = Harness::new();
    let client = Client::new(KEY_PAIR.0.clone(), common::secret(SECRET))
        .with_clock(harness.clock.clone())
        .with_algorithms(anwork_auth::TokenAlgorithms {
            signing: SigningAlgorithm::HS256,
            ..Default::default()
        });

    let minted = harness.server.mint().unwrap();
    assert!(matches!(
        client.present(&minted),
        Err(PresentError::ClaimsRead { .. })
    ));
}

#[test]
fn test_concurrent_mints_leave_one_valid_nonce() {
    let harness = Arc::new(Harness::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let harness = Arc::clone(&harness);
            std::thread::spawn(move || harness.handshake())
        })
        .collect();
    let presented: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let accepted = presented
        .iter()
        .filter(|token| harness.server.accept(token).is_ok())
        .count();
    assert_eq!(accepted, 1);
}
