//! Building server and client from configuration

mod common;

use anwork_auth::{AuthConfig, Client, KeyError, Server};
use common::{KEY_PAIR, SECRET};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

fn write_keys(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let (private_key, public_key) = &*KEY_PAIR;
    let private_path = dir.join("anwork.pem");
    let public_path = dir.join("anwork.pub.pem");

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

    (private_path, public_path)
}

#[test]
fn test_handshake_from_env_style_config() {
    let dir = tempfile::tempdir().unwrap();
    let (private_path, public_path) = write_keys(dir.path());

    let secret = String::from_utf8(SECRET.to_vec()).unwrap();
    let private = private_path.to_string_lossy().into_owned();
    let public = public_path.to_string_lossy().into_owned();
    let config = AuthConfig::from_lookup(|key| match key {
        "ANWORK_AUTH_SECRET" => Some(secret.clone()),
        "ANWORK_AUTH_PRIVATE_KEY" => Some(private.clone()),
        "ANWORK_AUTH_PUBLIC_KEY" => Some(public.clone()),
        "ANWORK_AUTH_TOKEN_TTL_SECS" => Some("120".to_string()),
        _ => None,
    })
    .unwrap();

    let server = Server::from_config(&config).unwrap();
    let client = Client::from_config(&config).unwrap();
    assert_eq!(server.token_ttl().as_secs(), 120);

    let presented = client.present(&server.mint().unwrap()).unwrap();
    assert_eq!(server.accept(&presented), Ok(()));
}

#[test]
fn test_missing_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = AuthConfig::new("tuna-fish-marlin")
        .with_public_key_path(dir.path().join("nope.pem"))
        .with_private_key_path(dir.path().join("nope.pem"));

    assert!(matches!(Server::from_config(&config), Err(KeyError::Io(_))));
    assert!(matches!(Client::from_config(&config), Err(KeyError::Io(_))));
}

#[test]
fn test_swapped_key_files() {
    let dir = tempfile::tempdir().unwrap();
    let (private_path, public_path) = write_keys(dir.path());
    let config = AuthConfig::new("tuna-fish-marlin")
        .with_public_key_path(private_path)
        .with_private_key_path(public_path);

    assert!(matches!(
        Server::from_config(&config),
        Err(KeyError::InvalidKey { kind: "public", .. })
    ));
    assert!(matches!(
        Client::from_config(&config),
        Err(KeyError::InvalidKey { kind: "private", .. })
    ));
}

#[test]
fn test_short_secret_is_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_, public_path) = write_keys(dir.path());
    let config = AuthConfig::new("tuna").with_public_key_path(public_path);

    assert!(matches!(
        Server::from_config(&config),
        Err(KeyError::SecretTooShort { .. })
    ));
}
