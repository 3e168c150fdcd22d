//! Signed token layer (RFC 7515, HMAC)
//!
//! Thin wrapper over `jsonwebtoken`. Time-based checks are switched off here
//! because claims are validated against the injected clock by the caller.

use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use thiserror::Error;

use crate::JWT_TYPE;
use crate::algorithms::SigningAlgorithm;
use crate::claims::Claims;

/// Why a signed token could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwsError {
    /// Not a compact JWS, bad encoding, wrong `typ`, or unreadable claims
    #[error("Malformed JWS: {0}")]
    Malformed(String),

    /// MAC mismatch or algorithm other than the configured one
    #[error("JWS signature rejected")]
    BadSignature,
}

/// Sign `claims` into a compact JWS with `typ: "JWT"`
///
/// # Errors
///
/// Returns the `jsonwebtoken` failure if serialization or signing fails.
pub fn sign(
    claims: &Claims,
    secret: &[u8],
    algorithm: SigningAlgorithm,
) -> Result<String, jsonwebtoken::errors::Error> {
    let mut header = Header::new(algorithm.to_jwt());
    header.typ = Some(JWT_TYPE.to_string());

    encode(&header, claims, &EncodingKey::from_secret(secret))
}

/// Verify a compact JWS and return its claims
///
/// Only `algorithm` is accepted, which rules out `none` and asymmetric
/// algorithm confusion. No time or audience checks are performed.
///
/// # Errors
///
/// [`JwsError::BadSignature`] when the MAC does not verify under `secret` or
/// the header names another algorithm, [`JwsError::Malformed`] otherwise.
pub fn verify(
    token: &str,
    secret: &[u8],
    algorithm: SigningAlgorithm,
) -> Result<Claims, JwsError> {
    if token.split('.').count() != 3 {
        return Err(JwsError::Malformed(
            "expected three dot-separated segments".to_string(),
        ));
    }

    let header = decode_header(token).map_err(|e| JwsError::Malformed(e.to_string()))?;
    if header.typ.as_deref() != Some(JWT_TYPE) {
        return Err(JwsError::Malformed(format!(
            "expected typ '{}', got {:?}",
            JWT_TYPE, header.typ
        )));
    }

    let mut validation = Validation::new(algorithm.to_jwt());
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => JwsError::BadSignature,
            _ => JwsError::Malformed(e.to_string()),
        })
}
