//! JOSE algorithm identifiers
//!
//! The protocol defaults to HS512 inside RSA-OAEP-256/A256GCM. The choice is
//! kept in one place so a deployment can move the MAC strength without
//! touching the protocol code.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

/// HMAC algorithm for the signed layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256 (RFC 7518)
    #[serde(rename = "HS256")]
    HS256,

    /// HMAC with SHA-384 (RFC 7518)
    #[serde(rename = "HS384")]
    HS384,

    /// HMAC with SHA-512 (RFC 7518)
    #[default]
    #[serde(rename = "HS512")]
    HS512,
}

impl SigningAlgorithm {
    /// Get the algorithm name as specified in RFC 7518
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }

    /// The equivalent `jsonwebtoken` algorithm
    #[must_use]
    pub fn to_jwt(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(format!("Unsupported signing algorithm: {other}")),
        }
    }
}

/// Key management algorithm for the encrypted layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyManagement {
    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256 (RFC 7518 4.3)
    #[default]
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
}

impl KeyManagement {
    /// Header `alg` value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RsaOaep256 => "RSA-OAEP-256",
        }
    }
}

/// Content encryption algorithm for the encrypted layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContentEncryption {
    /// AES GCM using a 256-bit key (RFC 7518 5.3)
    #[default]
    #[serde(rename = "A256GCM")]
    A256Gcm,
}

impl ContentEncryption {
    /// Header `enc` value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A256Gcm => "A256GCM",
        }
    }

    /// Content encryption key length in bytes
    #[must_use]
    pub fn key_len(self) -> usize {
        match self {
            Self::A256Gcm => 32,
        }
    }

    /// Initialization vector length in bytes
    #[must_use]
    pub fn iv_len(self) -> usize {
        match self {
            Self::A256Gcm => 12,
        }
    }
}

/// Complete algorithm selection for both token layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenAlgorithms {
    /// MAC for the signed layer
    #[serde(default)]
    pub signing: SigningAlgorithm,
    /// Key wrapping for the encrypted layer
    #[serde(default)]
    pub key_management: KeyManagement,
    /// Payload cipher for the encrypted layer
    #[serde(default)]
    pub content_encryption: ContentEncryption,
}
