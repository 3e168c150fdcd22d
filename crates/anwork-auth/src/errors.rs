//! Error types for token minting, presentation and acceptance
//!
//! Every protocol stage fails with its own enum so callers can match on the
//! exact failure instead of inspecting messages. None of the messages carry
//! secret or key material.

use thiserror::Error;

/// Claim set validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// `iss` does not name the expected issuer
    #[error("Wrong issuer: expected '{expected}', got '{actual}'")]
    WrongIssuer {
        /// Issuer the verifier expects
        expected: String,
        /// Issuer carried by the token
        actual: String,
    },

    /// `sub` does not name the expected subject
    #[error("Wrong subject: expected '{expected}', got '{actual}'")]
    WrongSubject {
        /// Subject the verifier expects
        expected: String,
        /// Subject carried by the token
        actual: String,
    },

    /// Current time is before `nbf`
    #[error("Token not valid before {not_before} (now {now})")]
    NotYetValid {
        /// `nbf` claim
        not_before: i64,
        /// Verification time
        now: i64,
    },

    /// Current time is at or past `exp`
    #[error("Token expired at {expiry} (now {now})")]
    Expired {
        /// `exp` claim
        expiry: i64,
        /// Verification time
        now: i64,
    },

    /// `jti` is not the nonce of the most recently minted token
    #[error("Stale nonce: token was superseded by a newer mint")]
    StaleNonce,
}

impl ClaimsError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ClaimsError::WrongIssuer { .. } => "wrong_issuer",
            ClaimsError::WrongSubject { .. } => "wrong_subject",
            ClaimsError::NotYetValid { .. } => "not_yet_valid",
            ClaimsError::Expired { .. } => "expired",
            ClaimsError::StaleNonce => "stale_nonce",
        }
    }
}

/// Failures while minting a token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    /// The configured nonce length cannot produce a usable nonce
    #[error("Invalid nonce length: {len} bytes")]
    InvalidNonceLength {
        /// Configured nonce length in bytes
        len: usize,
    },

    /// The random source produced fewer bytes than the nonce needs
    #[error("Insufficient randomness: requested {requested} bytes, received {received}")]
    InsufficientRandomness {
        /// Nonce length in bytes
        requested: usize,
        /// Bytes actually produced
        received: usize,
    },

    /// HMAC signing of the claim set failed
    #[error("Token signing failed: {reason}")]
    Signing {
        /// Underlying failure
        reason: String,
    },

    /// Wrapping the signed token for the key holder failed
    #[error("Token encryption failed: {reason}")]
    Encryption {
        /// Underlying failure
        reason: String,
    },
}

impl MintError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            MintError::InvalidNonceLength { .. } => "invalid_nonce_length",
            MintError::InsufficientRandomness { .. } => "insufficient_randomness",
            MintError::Signing { .. } => "signing",
            MintError::Encryption { .. } => "encryption",
        }
    }
}

/// Failures while accepting a presented token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcceptError {
    /// Not a well-formed signed-only compact token
    #[error("Malformed token: {reason}")]
    Parse {
        /// What was wrong with the input
        reason: String,
    },

    /// MAC verification failed (wrong secret, wrong algorithm or tampering)
    #[error("Token signature verification failed")]
    Signature,

    /// No token has been minted yet
    #[error("No nonce has been issued yet")]
    NonceNotInitialized,

    /// Claims were readable but not acceptable
    #[error("Claims rejected: {0}")]
    Claims(#[from] ClaimsError),
}

impl AcceptError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            AcceptError::Parse { .. } => "parse",
            AcceptError::Signature => "signature",
            AcceptError::NonceNotInitialized => "nonce_not_initialized",
            AcceptError::Claims(e) => e.category(),
        }
    }
}

/// Failures while turning a minted token into a presentable one
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresentError {
    /// Not a well-formed encrypted compact token
    #[error("Malformed token: {reason}")]
    Parse {
        /// What was wrong with the input
        reason: String,
    },

    /// The private key could not unwrap or open the token
    #[error("Token decryption failed")]
    Decrypt,

    /// The inner signed token could not be verified or read
    #[error("Unable to read token claims: {reason}")]
    ClaimsRead {
        /// What went wrong with the inner token
        reason: String,
    },

    /// Claims were readable but not acceptable
    #[error("Claims rejected: {0}")]
    ClaimsValidation(#[from] ClaimsError),

    /// Re-signing the claims failed
    #[error("Token signing failed: {reason}")]
    Signing {
        /// Underlying failure
        reason: String,
    },
}

impl PresentError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            PresentError::Parse { .. } => "parse",
            PresentError::Decrypt => "decrypt",
            PresentError::ClaimsRead { .. } => "claims_read",
            PresentError::ClaimsValidation(e) => e.category(),
            PresentError::Signing { .. } => "signing",
        }
    }
}

/// Startup-time key, secret and configuration failures
#[derive(Error, Debug)]
pub enum KeyError {
    /// PEM text did not hold a usable RSA key
    #[error("Invalid {kind} key: {reason}")]
    InvalidKey {
        /// "public" or "private"
        kind: &'static str,
        /// Parser failure
        reason: String,
    },

    /// RSA modulus below the accepted minimum
    #[error("RSA key too small: {bits} bits < {min_bits} bits")]
    KeyTooSmall {
        /// Size of the supplied key
        bits: usize,
        /// Minimum accepted size
        min_bits: usize,
    },

    /// Shared secret below the accepted minimum
    #[error("Shared secret too short: {len} bytes < {min_len} bytes")]
    SecretTooShort {
        /// Length of the supplied secret
        len: usize,
        /// Minimum accepted length
        min_len: usize,
    },

    /// RSA key generation failed
    #[error("Key generation failed: {0}")]
    Generation(String),

    /// Key file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl KeyError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            KeyError::InvalidKey { .. } => "invalid_key",
            KeyError::KeyTooSmall { .. } => "key_too_small",
            KeyError::SecretTooShort { .. } => "secret_too_short",
            KeyError::Generation(_) => "key_generation",
            KeyError::Io(_) => "io_error",
            KeyError::Configuration(_) => "configuration_error",
        }
    }
}
