//! Token issuer and verifier
//!
//! The server mints encrypted tokens that only the private key holder can
//! open, and accepts the re-signed tokens that come back. Each successful
//! mint replaces the single valid nonce, so every earlier token stops being
//! acceptable.

use std::sync::Arc;
use std::time::Duration;

use rsa::RsaPublicKey;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::algorithms::TokenAlgorithms;
use crate::claims::{Claims, Identity};
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::errors::{AcceptError, ClaimsError, KeyError, MintError};
use crate::jws::{self, JwsError};
use crate::keys::{SharedSecret, load_public_key_file};
use crate::nonce::{MemoryNonceStore, NonceStore};
use crate::random::{RandomSource, SystemRandomSource};
use crate::{DEFAULT_NONCE_LEN, DEFAULT_TOKEN_TTL_SECONDS, jwe};

/// Issuer and verifier of nonce-bound tokens
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use anwork_auth::{ManualClock, Server, SharedSecret, generate_rsa_key_pair};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (_, public_key) = generate_rsa_key_pair(2048)?;
/// let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
///
/// let server = Server::new(public_key, SharedSecret::new(b"tuna-fish-marlin".to_vec())?)
///     .with_clock(clock.clone())
///     .with_token_ttl(Duration::from_secs(600));
///
/// let token = server.mint()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    public_key: RsaPublicKey,
    secret: SharedSecret,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    nonces: Arc<dyn NonceStore>,
    identity: Identity,
    algorithms: TokenAlgorithms,
    token_ttl: Duration,
    nonce_len: usize,
}

impl Server {
    /// Create a server using the system clock, the OS CSPRNG and an
    /// in-memory nonce slot
    #[must_use]
    pub fn new(public_key: RsaPublicKey, secret: SharedSecret) -> Self {
        Self {
            public_key,
            secret,
            clock: Arc::new(SystemClock),
            random: Arc::new(SystemRandomSource::new()),
            nonces: Arc::new(MemoryNonceStore::new()),
            identity: Identity::default(),
            algorithms: TokenAlgorithms::default(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
            nonce_len: DEFAULT_NONCE_LEN,
        }
    }

    /// Create a server from configuration, loading the public key file
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the configuration has no usable public key or
    /// secret.
    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        config.validate()?;
        let path = config.public_key_path.as_ref().ok_or_else(|| {
            KeyError::Configuration("public key path is required for the server".to_string())
        })?;
        let public_key = load_public_key_file(path)?;
        let secret = config.shared_secret()?;

        Ok(Self::new(public_key, secret)
            .with_identity(config.identity.clone())
            .with_algorithms(config.algorithms)
            .with_token_ttl(config.token_ttl())
            .with_nonce_len(config.nonce_len))
    }

    /// Use a specific clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a specific random source for nonces
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Use a specific nonce store
    pub fn with_nonce_store(mut self, nonces: Arc<dyn NonceStore>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Issue tokens for a different identity
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Use different JOSE algorithms
    pub fn with_algorithms(mut self, algorithms: TokenAlgorithms) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Set the lifetime of minted tokens
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the nonce length in bytes
    pub fn with_nonce_len(mut self, nonce_len: usize) -> Self {
        self.nonce_len = nonce_len;
        self
    }

    /// Mint a new encrypted token and make its nonce the only valid one
    ///
    /// The nonce is replaced only after signing and encryption succeed, so a
    /// failed mint leaves the previous token usable.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::InvalidNonceLength`] for a zero nonce length,
    /// [`MintError::InsufficientRandomness`] if the random source comes up
    /// short, or a signing/encryption failure.
    pub fn mint(&self) -> Result<String, MintError> {
        if self.nonce_len == 0 {
            warn!("Refusing to mint with a zero-length nonce");
            return Err(MintError::InvalidNonceLength { len: 0 });
        }

        let mut nonce = Zeroizing::new(vec![0u8; self.nonce_len]);
        let received = self.random.fill(&mut nonce);
        if received < self.nonce_len {
            warn!(
                requested = self.nonce_len,
                received, "Random source returned too few bytes for nonce"
            );
            return Err(MintError::InsufficientRandomness {
                requested: self.nonce_len,
                received,
            });
        }

        let now = self.clock.unix_now();
        let claims = Claims::build_for(&self.identity, now, self.token_ttl, &nonce);

        let signed = Zeroizing::new(
            jws::sign(&claims, self.secret.expose(), self.algorithms.signing).map_err(|e| {
                MintError::Signing {
                    reason: e.to_string(),
                }
            })?,
        );

        let token = jwe::encrypt(
            signed.as_bytes(),
            &self.public_key,
            self.algorithms.key_management,
            self.algorithms.content_encryption,
        )
        .map_err(|e| MintError::Encryption {
            reason: e.to_string(),
        })?;

        self.nonces.set(claims.id().to_string());

        debug!(
            issued_at = claims.issued_at(),
            expires_at = claims.expiry(),
            nonce_len = self.nonce_len,
            "Minted token"
        );

        Ok(token)
    }

    /// Accept or reject a presented (signed-only) token
    ///
    /// # Errors
    ///
    /// - [`AcceptError::Parse`] for anything that is not a compact JWS
    /// - [`AcceptError::Signature`] if the MAC does not verify
    /// - [`AcceptError::NonceNotInitialized`] before the first mint
    /// - [`AcceptError::Claims`] for identity, time window or nonce failures
    pub fn accept(&self, token: &str) -> Result<(), AcceptError> {
        self.verify(token).map(|_| ())
    }

    /// Like [`Server::accept`] but hands back the accepted claims
    ///
    /// # Errors
    ///
    /// See [`Server::accept`].
    pub fn verify(&self, token: &str) -> Result<Claims, AcceptError> {
        let result = self.verify_inner(token);
        match &result {
            Ok(claims) => debug!(expires_at = claims.expiry(), "Accepted token"),
            Err(e) => warn!(category = e.category(), error = %e, "Rejected token"),
        }
        result
    }

    fn verify_inner(&self, token: &str) -> Result<Claims, AcceptError> {
        let claims = jws::verify(token, self.secret.expose(), self.algorithms.signing).map_err(
            |e| match e {
                JwsError::Malformed(reason) => AcceptError::Parse { reason },
                JwsError::BadSignature => AcceptError::Signature,
            },
        )?;

        if !self.has_active_nonce() {
            return Err(AcceptError::NonceNotInitialized);
        }

        claims.validate_for(&self.identity, self.clock.unix_now(), None)?;
        if !self.nonces.matches(claims.id()) {
            return Err(ClaimsError::StaleNonce.into());
        }

        Ok(claims)
    }

    /// Whether any token has been minted (and so could be accepted)
    pub fn has_active_nonce(&self) -> bool {
        self.nonces
            .current()
            .is_some_and(|nonce| !nonce.is_empty())
    }

    /// Lifetime of minted tokens
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}
