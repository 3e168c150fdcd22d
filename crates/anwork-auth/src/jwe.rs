//! Encrypted token layer (RFC 7516 compact serialization)
//!
//! A fresh content encryption key (CEK) is wrapped with RSA-OAEP-256 for the
//! private key holder and the payload is sealed with AES-256-GCM. The
//! base64url protected header is the AEAD additional data, so header
//! tampering fails authentication.
//!
//! ```text
//! BASE64URL(header) . BASE64URL(wrapped CEK) . BASE64URL(IV) . BASE64URL(ciphertext) . BASE64URL(tag)
//! ```

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::JWT_TYPE;
use crate::algorithms::{ContentEncryption, KeyManagement};

/// Why an encrypted token could not be produced or opened
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JweError {
    /// Not a compact JWE or an unreadable header
    #[error("Malformed JWE: {0}")]
    Malformed(String),

    /// Header names algorithms this side is not configured for
    #[error("Unsupported JWE algorithms: alg={alg}, enc={enc}")]
    Unsupported {
        /// Header `alg`
        alg: String,
        /// Header `enc`
        enc: String,
    },

    /// Key unwrap or AEAD open failed
    #[error("JWE decryption failed")]
    Decryption,

    /// Key wrap or AEAD seal failed
    #[error("JWE encryption failed: {0}")]
    Encryption(String),
}

/// JWE protected header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct JweHeader {
    alg: String,
    enc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    /// Content type; `JWT` marks a nested token (RFC 7519 section 5.2)
    #[serde(skip_serializing_if = "Option::is_none")]
    cty: Option<String>,
}

/// Encrypt `plaintext` (a compact JWS) for the holder of `public_key`
///
/// # Errors
///
/// Returns [`JweError::Encryption`] if key wrapping or sealing fails.
pub fn encrypt(
    plaintext: &[u8],
    public_key: &RsaPublicKey,
    key_management: KeyManagement,
    content_encryption: ContentEncryption,
) -> Result<String, JweError> {
    let header = JweHeader {
        alg: key_management.as_str().to_string(),
        enc: content_encryption.as_str().to_string(),
        typ: Some(JWT_TYPE.to_string()),
        cty: Some(JWT_TYPE.to_string()),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|e| JweError::Encryption(e.to_string()))?;
    let encoded_header = URL_SAFE_NO_PAD.encode(header_json);

    let mut cek = Zeroizing::new(vec![0u8; content_encryption.key_len()]);
    OsRng.fill_bytes(&mut cek);
    let mut iv = vec![0u8; content_encryption.iv_len()];
    OsRng.fill_bytes(&mut iv);

    let wrapped_key = match key_management {
        KeyManagement::RsaOaep256 => public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek)
            .map_err(|e| JweError::Encryption(format!("key wrap failed: {e}")))?,
    };

    let sealing_key = aead_key(content_encryption, &cek)?;
    let nonce = Nonce::try_assume_unique_for_key(&iv)
        .map_err(|_| JweError::Encryption("invalid IV length".to_string()))?;

    let mut ciphertext = plaintext.to_vec();
    let tag = sealing_key
        .seal_in_place_separate_tag(nonce, Aad::from(encoded_header.as_bytes()), &mut ciphertext)
        .map_err(|_| JweError::Encryption("AEAD seal failed".to_string()))?;

    Ok(format!(
        "{}.{}.{}.{}.{}",
        encoded_header,
        URL_SAFE_NO_PAD.encode(wrapped_key),
        URL_SAFE_NO_PAD.encode(&iv),
        URL_SAFE_NO_PAD.encode(&ciphertext),
        URL_SAFE_NO_PAD.encode(tag.as_ref()),
    ))
}

/// Decrypt a compact JWE with `private_key`
///
/// # Errors
///
/// [`JweError::Malformed`] or [`JweError::Unsupported`] for structural
/// problems, [`JweError::Decryption`] when the key does not fit or the
/// ciphertext was altered.
pub fn decrypt(
    token: &str,
    private_key: &RsaPrivateKey,
    key_management: KeyManagement,
    content_encryption: ContentEncryption,
) -> Result<Zeroizing<Vec<u8>>, JweError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 5 {
        return Err(JweError::Malformed(format!(
            "expected 5 segments, got {}",
            parts.len()
        )));
    }
    let [encoded_header, wrapped_key, iv, ciphertext, tag] = [
        parts[0], parts[1], parts[2], parts[3], parts[4],
    ];

    let header_json = decode_segment("header", encoded_header)?;
    let header: JweHeader = serde_json::from_slice(&header_json)
        .map_err(|e| JweError::Malformed(format!("invalid header: {e}")))?;
    if header.alg != key_management.as_str() || header.enc != content_encryption.as_str() {
        return Err(JweError::Unsupported {
            alg: header.alg,
            enc: header.enc,
        });
    }

    let wrapped_key = decode_segment("encrypted key", wrapped_key)?;
    let iv = decode_segment("IV", iv)?;
    let ciphertext = decode_segment("ciphertext", ciphertext)?;
    let tag = decode_segment("tag", tag)?;
    if iv.len() != content_encryption.iv_len() {
        return Err(JweError::Malformed(format!("bad IV length {}", iv.len())));
    }

    let cek = match key_management {
        KeyManagement::RsaOaep256 => private_key
            .decrypt(Oaep::new::<Sha256>(), &wrapped_key)
            .map(Zeroizing::new)
            .map_err(|_| JweError::Decryption)?,
    };
    if cek.len() != content_encryption.key_len() {
        return Err(JweError::Decryption);
    }

    let opening_key = aead_key(content_encryption, &cek).map_err(|_| JweError::Decryption)?;
    let nonce = Nonce::try_assume_unique_for_key(&iv).map_err(|_| JweError::Decryption)?;

    let mut in_out = Zeroizing::new([ciphertext, tag].concat());
    let plaintext_len = opening_key
        .open_in_place(nonce, Aad::from(encoded_header.as_bytes()), &mut in_out)
        .map_err(|_| JweError::Decryption)?
        .len();
    in_out.truncate(plaintext_len);

    Ok(in_out)
}

fn aead_key(content_encryption: ContentEncryption, cek: &[u8]) -> Result<LessSafeKey, JweError> {
    let algorithm = match content_encryption {
        ContentEncryption::A256Gcm => &AES_256_GCM,
    };
    UnboundKey::new(algorithm, cek)
        .map(LessSafeKey::new)
        .map_err(|_| JweError::Encryption("invalid content encryption key".to_string()))
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, JweError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JweError::Malformed(format!("bad base64 in {name}: {e}")))
}
