//! Private key holder side of the handshake
//!
//! The client opens a minted token, checks that it really came from a server
//! sharing its secret and is currently valid, then re-signs the same claims
//! without encryption so the server can check possession.

use std::fmt;
use std::sync::Arc;

use rsa::RsaPrivateKey;
use rsa::traits::PublicKeyParts;
use tracing::{debug, warn};

use crate::algorithms::TokenAlgorithms;
use crate::claims::Identity;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::errors::{KeyError, PresentError};
use crate::jwe::{self, JweError};
use crate::jws;
use crate::keys::{SharedSecret, load_private_key_file};

/// Presenter of minted tokens
pub struct Client {
    private_key: RsaPrivateKey,
    secret: SharedSecret,
    clock: Arc<dyn Clock>,
    identity: Identity,
    algorithms: TokenAlgorithms,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field(
                "private_key",
                &format_args!("[REDACTED] {}-bit", self.private_key.size() * 8),
            )
            .field("secret", &self.secret)
            .field("clock", &self.clock)
            .field("identity", &self.identity)
            .field("algorithms", &self.algorithms)
            .finish()
    }
}

impl Client {
    /// Create a client using the system clock
    #[must_use]
    pub fn new(private_key: RsaPrivateKey, secret: SharedSecret) -> Self {
        Self {
            private_key,
            secret,
            clock: Arc::new(SystemClock),
            identity: Identity::default(),
            algorithms: TokenAlgorithms::default(),
        }
    }

    /// Create a client from configuration, loading the private key file
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the configuration has no usable private key or
    /// secret.
    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        config.validate()?;
        let path = config.private_key_path.as_ref().ok_or_else(|| {
            KeyError::Configuration("private key path is required for the client".to_string())
        })?;
        let private_key = load_private_key_file(path)?;
        let secret = config.shared_secret()?;

        Ok(Self::new(private_key, secret)
            .with_identity(config.identity.clone())
            .with_algorithms(config.algorithms))
    }

    /// Use a specific clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Expect a different identity in minted tokens
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Use different JOSE algorithms
    pub fn with_algorithms(mut self, algorithms: TokenAlgorithms) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Turn a minted (encrypted) token into a presentable (signed-only) one
    ///
    /// The nonce is not checked here; only the server knows the current one.
    ///
    /// # Errors
    ///
    /// - [`PresentError::Parse`] for anything that is not a compact JWE
    /// - [`PresentError::Decrypt`] if the private key does not open it
    /// - [`PresentError::ClaimsRead`] if the inner token fails verification
    /// - [`PresentError::ClaimsValidation`] for identity or time window failures
    pub fn present(&self, token: &str) -> Result<String, PresentError> {
        let result = self.present_inner(token);
        match &result {
            Ok(_) => debug!("Presented token"),
            Err(e) => warn!(category = e.category(), error = %e, "Refused to present token"),
        }
        result
    }

    fn present_inner(&self, token: &str) -> Result<String, PresentError> {
        let plaintext = jwe::decrypt(
            token,
            &self.private_key,
            self.algorithms.key_management,
            self.algorithms.content_encryption,
        )
        .map_err(|e| match e {
            JweError::Malformed(reason) => PresentError::Parse { reason },
            JweError::Unsupported { alg, enc } => PresentError::Parse {
                reason: format!("unsupported algorithms alg={alg}, enc={enc}"),
            },
            JweError::Decryption | JweError::Encryption(_) => PresentError::Decrypt,
        })?;

        let inner = std::str::from_utf8(&plaintext).map_err(|_| PresentError::ClaimsRead {
            reason: "inner token is not UTF-8".to_string(),
        })?;

        let claims = jws::verify(inner, self.secret.expose(), self.algorithms.signing).map_err(
            |e| PresentError::ClaimsRead {
                reason: e.to_string(),
            },
        )?;

        claims.validate_for(&self.identity, self.clock.unix_now(), None)?;

        jws::sign(&claims, self.secret.expose(), self.algorithms.signing).map_err(|e| {
            PresentError::Signing {
                reason: e.to_string(),
            }
        })
    }
}
