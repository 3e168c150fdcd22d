//! Common test utilities for integration tests
//!
//! Key generation is slow, so the key pairs are generated once per test
//! binary and shared.

#![allow(dead_code)]

use std::sync::Arc;

use anwork_auth::{Client, ManualClock, SequenceRandom, Server, SharedSecret, generate_rsa_key_pair};
use once_cell::sync::Lazy;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// 2023-11-14T22:13:20Z
pub const T0: u64 = 1_700_000_000;

pub const SECRET: &[u8] = b"tuna-fish-marlin";
pub const OTHER_SECRET: &[u8] = b"salmon-trout-carp";

pub static KEY_PAIR: Lazy<(RsaPrivateKey, RsaPublicKey)> =
    Lazy::new(|| generate_rsa_key_pair(2048).expect("RSA key generation"));

pub static OTHER_KEY_PAIR: Lazy<(RsaPrivateKey, RsaPublicKey)> =
    Lazy::new(|| generate_rsa_key_pair(2048).expect("RSA key generation"));

pub fn secret(bytes: &[u8]) -> SharedSecret {
    SharedSecret::new(bytes.to_vec()).expect("valid secret")
}

/// Server, client and the clock they share
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub server: Server,
    pub client: Client,
}

impl Harness {
    /// Matching key pair and secret, clock at [`T0`]
    pub fn new() -> Self {
        Self::with(&KEY_PAIR, SECRET, SECRET)
    }

    /// Server keyed with `KEY_PAIR.1`/`server_secret`, client with
    /// `client_keys.0`/`client_secret`
    pub fn with(
        client_keys: &(RsaPrivateKey, RsaPublicKey),
        server_secret: &[u8],
        client_secret: &[u8],
    ) -> Self {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let server = Server::new(KEY_PAIR.1.clone(), secret(server_secret))
            .with_clock(clock.clone())
            .with_random_source(Arc::new(SequenceRandom::new(42)));
        let client = Client::new(client_keys.0.clone(), secret(client_secret))
            .with_clock(clock.clone());

        Self {
            clock,
            server,
            client,
        }
    }

    /// mint then present
    pub fn handshake(&self) -> String {
        let minted = self.server.mint().expect("mint");
        self.client.present(&minted).expect("present")
    }
}
