//! Token claim set and its validation rules
//!
//! The claim set is plain data with no cryptographic behaviour. Validation is
//! a pure function of the claims, the supplied time and the expectations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ClaimsError;
use crate::nonce::constant_time_eq;
use crate::{DEFAULT_ISSUER, DEFAULT_SUBJECT};

/// The fixed identity tokens are issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `sub` claim
    pub subject: String,
}

impl Identity {
    /// Create an identity
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(DEFAULT_ISSUER, DEFAULT_SUBJECT)
    }
}

/// RFC 7519 claim set carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "iss")]
    issuer: String,

    #[serde(rename = "sub")]
    subject: String,

    #[serde(rename = "exp")]
    expiry: i64,

    #[serde(rename = "nbf")]
    not_before: i64,

    #[serde(rename = "iat")]
    issued_at: i64,

    /// Hex-encoded nonce
    #[serde(rename = "jti")]
    id: String,
}

impl Claims {
    /// Build a claim set for the default identity
    ///
    /// `now` is a Unix timestamp in seconds; `nonce` becomes the hex `jti`.
    pub fn build(now: i64, ttl: Duration, nonce: &[u8]) -> Self {
        Self::build_for(&Identity::default(), now, ttl, nonce)
    }

    /// Build a claim set for a specific identity
    pub fn build_for(identity: &Identity, now: i64, ttl: Duration, nonce: &[u8]) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            issuer: identity.issuer.clone(),
            subject: identity.subject.clone(),
            expiry: now.saturating_add(ttl_secs),
            not_before: now,
            issued_at: now,
            id: hex::encode(nonce),
        }
    }

    /// Check the claims against the verifier's expectations at time `now`
    ///
    /// The nonce is only compared when `expected_nonce` is supplied; a client
    /// cannot know the server's current nonce and must not reject on it.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, in order: issuer, subject,
    /// not-before, expiry, nonce.
    pub fn validate(
        &self,
        now: i64,
        expected_issuer: &str,
        expected_subject: &str,
        expected_nonce: Option<&str>,
    ) -> Result<(), ClaimsError> {
        if self.issuer != expected_issuer {
            return Err(ClaimsError::WrongIssuer {
                expected: expected_issuer.to_string(),
                actual: self.issuer.clone(),
            });
        }

        if self.subject != expected_subject {
            return Err(ClaimsError::WrongSubject {
                expected: expected_subject.to_string(),
                actual: self.subject.clone(),
            });
        }

        if now < self.not_before {
            return Err(ClaimsError::NotYetValid {
                not_before: self.not_before,
                now,
            });
        }

        if now >= self.expiry {
            return Err(ClaimsError::Expired {
                expiry: self.expiry,
                now,
            });
        }

        if let Some(expected) = expected_nonce {
            if !constant_time_eq(&self.id, expected) {
                return Err(ClaimsError::StaleNonce);
            }
        }

        Ok(())
    }

    /// Validate against an [`Identity`]
    ///
    /// # Errors
    ///
    /// See [`Claims::validate`].
    pub fn validate_for(
        &self,
        identity: &Identity,
        now: i64,
        expected_nonce: Option<&str>,
    ) -> Result<(), ClaimsError> {
        self.validate(now, &identity.issuer, &identity.subject, expected_nonce)
    }

    /// `iss` claim
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// `sub` claim
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `exp` claim
    pub fn expiry(&self) -> i64 {
        self.expiry
    }

    /// `nbf` claim
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// `iat` claim
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// `jti` claim (hex-encoded nonce)
    pub fn id(&self) -> &str {
        &self.id
    }
}
