//! Configuration for the server and client
//!
//! Loaded from the environment in deployments or deserialized from a config
//! file. Key material itself stays on disk; only paths are configured.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::algorithms::{SigningAlgorithm, TokenAlgorithms};
use crate::claims::Identity;
use crate::errors::KeyError;
use crate::keys::SharedSecret;
use crate::{DEFAULT_NONCE_LEN, DEFAULT_TOKEN_TTL_SECONDS, MIN_SECRET_LEN};

/// Environment variable holding the shared secret
pub const ENV_SECRET: &str = "ANWORK_AUTH_SECRET";
/// Environment variable holding the public key PEM path
pub const ENV_PUBLIC_KEY: &str = "ANWORK_AUTH_PUBLIC_KEY";
/// Environment variable holding the private key PEM path
pub const ENV_PRIVATE_KEY: &str = "ANWORK_AUTH_PRIVATE_KEY";
/// Environment variable holding the token lifetime in seconds
pub const ENV_TOKEN_TTL: &str = "ANWORK_AUTH_TOKEN_TTL_SECS";
/// Environment variable holding the nonce length in bytes
pub const ENV_NONCE_LEN: &str = "ANWORK_AUTH_NONCE_LEN";
/// Environment variable holding the HMAC algorithm name
pub const ENV_SIGNING_ALG: &str = "ANWORK_AUTH_SIGNING_ALG";

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret (zeroized on drop)
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: SecretString,

    /// Public key PEM file, needed by the server
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,

    /// Private key PEM file, needed by the client
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// Identity tokens are issued for
    #[serde(default)]
    pub identity: Identity,

    /// JOSE algorithms for both layers
    #[serde(default)]
    pub algorithms: TokenAlgorithms,

    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Nonce length in bytes
    #[serde(default = "default_nonce_len")]
    pub nonce_len: usize,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

fn default_nonce_len() -> usize {
    DEFAULT_NONCE_LEN
}

impl AuthConfig {
    /// Create a configuration with defaults and the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            public_key_path: None,
            private_key_path: None,
            identity: Identity::default(),
            algorithms: TokenAlgorithms::default(),
            token_ttl_secs: default_token_ttl_secs(),
            nonce_len: default_nonce_len(),
        }
    }

    /// Load configuration from `ANWORK_AUTH_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Configuration`] if the secret is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, KeyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, KeyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(ENV_SECRET).ok_or_else(|| {
            KeyError::Configuration(format!("{ENV_SECRET} environment variable not set"))
        })?;

        let mut config = Self::new(secret);
        config.public_key_path = lookup(ENV_PUBLIC_KEY).map(PathBuf::from);
        config.private_key_path = lookup(ENV_PRIVATE_KEY).map(PathBuf::from);

        if let Some(ttl) = lookup(ENV_TOKEN_TTL) {
            config.token_ttl_secs = parse_var(ENV_TOKEN_TTL, &ttl)?;
        }
        if let Some(len) = lookup(ENV_NONCE_LEN) {
            config.nonce_len = parse_var(ENV_NONCE_LEN, &len)?;
        }
        if let Some(alg) = lookup(ENV_SIGNING_ALG) {
            config.algorithms.signing = alg
                .parse::<SigningAlgorithm>()
                .map_err(|e| KeyError::Configuration(format!("{ENV_SIGNING_ALG}: {e}")))?;
        }

        Ok(config)
    }

    /// Set the public key path
    pub fn with_public_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_key_path = Some(path.into());
        self
    }

    /// Set the private key path
    pub fn with_private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    /// Set the token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the nonce length
    pub fn with_nonce_len(mut self, nonce_len: usize) -> Self {
        self.nonce_len = nonce_len;
        self
    }

    /// Set the HMAC algorithm
    pub fn with_signing_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithms.signing = algorithm;
        self
    }

    /// Token lifetime as a [`Duration`]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// The shared secret as HMAC key material
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::SecretTooShort`] if the secret is too short.
    pub fn shared_secret(&self) -> Result<SharedSecret, KeyError> {
        SharedSecret::new(self.secret.expose_secret().as_bytes().to_vec())
    }

    /// Check the configuration for values that can never work
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Configuration`] for a zero TTL or nonce length,
    /// or [`KeyError::SecretTooShort`] for a short secret.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.token_ttl_secs == 0 {
            return Err(KeyError::Configuration(
                "token TTL must be greater than zero".to_string(),
            ));
        }
        if self.nonce_len == 0 {
            return Err(KeyError::Configuration(
                "nonce length must be greater than zero".to_string(),
            ));
        }
        let len = self.secret.expose_secret().len();
        if len < MIN_SECRET_LEN {
            return Err(KeyError::SecretTooShort {
                len,
                min_len: MIN_SECRET_LEN,
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, KeyError> {
    value
        .trim()
        .parse()
        .map_err(|_| KeyError::Configuration(format!("{name}: invalid value '{value}'")))
}
