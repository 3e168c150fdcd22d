//! RSA key pair and shared secret handling
//!
//! Keys are loaded once at startup. Anything wrong here is a deployment
//! problem, so failures surface as [`KeyError`] before any token is minted.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, Secret};

use crate::errors::KeyError;
use crate::{MIN_RSA_KEY_BITS, MIN_SECRET_LEN};

/// Symmetric secret shared by server and client for HMAC
///
/// Cloning shares the same zeroize-on-drop allocation.
#[derive(Clone)]
pub struct SharedSecret {
    bytes: Arc<Secret<Vec<u8>>>,
}

impl SharedSecret {
    /// Wrap raw secret bytes
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::SecretTooShort`] below [`MIN_SECRET_LEN`] bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self, KeyError> {
        if bytes.len() < MIN_SECRET_LEN {
            return Err(KeyError::SecretTooShort {
                len: bytes.len(),
                min_len: MIN_SECRET_LEN,
            });
        }
        Ok(Self {
            bytes: Arc::new(Secret::new(bytes)),
        })
    }

    /// Secret bytes, for keying the MAC only
    pub fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }

    /// Secret length in bytes
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Whether the secret is empty (never true for a constructed secret)
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("len", &self.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Parse an RSA private key from PEM (PKCS#8 or PKCS#1)
///
/// # Errors
///
/// Returns [`KeyError::InvalidKey`] if neither encoding parses, or
/// [`KeyError::KeyTooSmall`] below [`MIN_RSA_KEY_BITS`].
pub fn load_private_key(pem: &str) -> Result<RsaPrivateKey, KeyError> {
    let key = RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| KeyError::InvalidKey {
            kind: "private",
            reason: e.to_string(),
        })?;
    check_size(key.size())?;
    Ok(key)
}

/// Parse an RSA public key from PEM (SPKI or PKCS#1)
///
/// # Errors
///
/// Returns [`KeyError::InvalidKey`] if neither encoding parses, or
/// [`KeyError::KeyTooSmall`] below [`MIN_RSA_KEY_BITS`].
pub fn load_public_key(pem: &str) -> Result<RsaPublicKey, KeyError> {
    let key = RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| KeyError::InvalidKey {
            kind: "public",
            reason: e.to_string(),
        })?;
    check_size(key.size())?;
    Ok(key)
}

/// Read and parse a private key PEM file
///
/// # Errors
///
/// Returns [`KeyError::Io`] if the file cannot be read, otherwise as
/// [`load_private_key`].
pub fn load_private_key_file(path: impl AsRef<Path>) -> Result<RsaPrivateKey, KeyError> {
    let pem = std::fs::read_to_string(path)?;
    load_private_key(&pem)
}

/// Read and parse a public key PEM file
///
/// # Errors
///
/// Returns [`KeyError::Io`] if the file cannot be read, otherwise as
/// [`load_public_key`].
pub fn load_public_key_file(path: impl AsRef<Path>) -> Result<RsaPublicKey, KeyError> {
    let pem = std::fs::read_to_string(path)?;
    load_public_key(&pem)
}

/// Generate a fresh RSA key pair
///
/// # Errors
///
/// Returns [`KeyError::KeyTooSmall`] below [`MIN_RSA_KEY_BITS`] or
/// [`KeyError::Generation`] if the RSA library fails.
pub fn generate_rsa_key_pair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey), KeyError> {
    check_size(bits / 8)?;
    let private_key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| KeyError::Generation(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);
    Ok((private_key, public_key))
}

fn check_size(size_bytes: usize) -> Result<(), KeyError> {
    let bits = size_bytes * 8;
    if bits < MIN_RSA_KEY_BITS {
        return Err(KeyError::KeyTooSmall {
            bits,
            min_bits: MIN_RSA_KEY_BITS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    static KEY_PAIR: Lazy<(RsaPrivateKey, RsaPublicKey)> =
        Lazy::new(|| generate_rsa_key_pair(2048).expect("RSA key generation"));

    #[test]
    fn test_secret_minimum_length() {
        assert!(SharedSecret::new(b"tuna-fish-marlin".to_vec()).is_ok());

        let result = SharedSecret::new(b"short".to_vec());
        assert!(matches!(
            result,
            Err(KeyError::SecretTooShort { len: 5, min_len: 16 })
        ));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SharedSecret::new(b"tuna-fish-marlin".to_vec()).unwrap();
        let debug = format!("{secret:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("tuna"));
        assert_eq!(secret.len(), 16);
    }

    #[test]
    fn test_load_pkcs8_and_pkcs1_pem() {
        let (private_key, public_key) = &*KEY_PAIR;

        let pkcs8 = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let pkcs1 = private_key.to_pkcs1_pem(LineEnding::LF).unwrap();
        assert_eq!(&load_private_key(&pkcs8).unwrap(), private_key);
        assert_eq!(&load_private_key(&pkcs1).unwrap(), private_key);

        let spki = public_key.to_public_key_pem(LineEnding::LF).unwrap();
        let pkcs1 = public_key.to_pkcs1_pem(LineEnding::LF).unwrap();
        assert_eq!(&load_public_key(&spki).unwrap(), public_key);
        assert_eq!(&load_public_key(&pkcs1).unwrap(), public_key);
    }

    #[test]
    fn test_load_garbage() {
        assert!(matches!(
            load_private_key("not a key"),
            Err(KeyError::InvalidKey { kind: "private", .. })
        ));
        assert!(matches!(
            load_public_key("-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n"),
            Err(KeyError::InvalidKey { kind: "public", .. })
        ));
    }

    #[test]
    fn test_small_keys_rejected() {
        assert!(matches!(
            generate_rsa_key_pair(1024),
            Err(KeyError::KeyTooSmall {
                bits: 1024,
                min_bits: 2048
            })
        ));
    }

    #[test]
    fn test_load_key_files() {
        let (private_key, public_key) = &*KEY_PAIR;
        let dir = tempfile::tempdir().unwrap();

        let private_path = dir.path().join("id_rsa.pem");
        let public_path = dir.path().join("id_rsa.pub.pem");
        std::fs::write(
            &private_path,
            private_key.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes(),
        )
        .unwrap();
        std::fs::write(
            &public_path,
            public_key.to_public_key_pem(LineEnding::LF).unwrap(),
        )
        .unwrap();

        assert_eq!(&load_private_key_file(&private_path).unwrap(), private_key);
        assert_eq!(&load_public_key_file(&public_path).unwrap(), public_key);
        assert!(matches!(
            load_public_key_file(dir.path().join("missing.pem")),
            Err(KeyError::Io(_))
        ));
    }
}
