//! # anwork-auth - Nonce-Bound Challenge-Response Authentication
//!
//! Single-tenant authentication for the anwork task API. One fixed identity
//! authenticates by holding an RSA private key and a shared HMAC secret.
//!
//! ## Protocol
//!
//! ```text
//!   Server::mint()            Client::present()            Server::accept()
//! ┌────────────────┐  JWE   ┌───────────────────┐  JWS   ┌──────────────────┐
//! │ fresh nonce    │ ─────▶ │ RSA-OAEP unwrap   │ ─────▶ │ HMAC verify      │
//! │ HS512 sign     │        │ HMAC verify       │        │ nonce == current │
//! │ RSA-OAEP/A256  │        │ claims check      │        │ claims check     │
//! │ nonce := jti   │        │ HS512 re-sign     │        │                  │
//! └────────────────┘        └───────────────────┘        └──────────────────┘
//! ```
//!
//! - **Proof of possession** - only the holder of the private key can unwrap
//!   the minted token
//! - **Anti-replay** - exactly one nonce is valid at a time; every successful
//!   mint replaces it
//! - **Deterministic testing** - clock, randomness and nonce storage are
//!   injected
//!
//! ## Architecture
//!
//! - [`claims`] - claim set construction and validation
//! - [`clock`] / [`random`] - injected time and entropy sources
//! - [`nonce`] - the single-slot current nonce
//! - [`jws`] / [`jwe`] - the two JOSE layers
//! - [`keys`] - RSA key and shared secret loading
//! - [`server`] / [`client`] - the three protocol operations
//! - [`config`] - environment-driven configuration
//! - [`errors`] - typed failure taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anwork_auth::{Client, Server, SharedSecret, generate_rsa_key_pair};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (private_key, public_key) = generate_rsa_key_pair(2048)?;
//! let secret = SharedSecret::new(b"tuna-fish-marlin".to_vec())?;
//!
//! let server = Server::new(public_key, secret.clone());
//! let client = Client::new(private_key, secret);
//!
//! let minted = server.mint()?;
//! let presented = client.present(&minted)?;
//! server.accept(&presented)?;
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod claims;
pub mod client;
pub mod clock;
pub mod config;
pub mod errors;
pub mod jwe;
pub mod jws;
pub mod keys;
pub mod nonce;
pub mod random;
pub mod server;

pub use algorithms::{ContentEncryption, KeyManagement, SigningAlgorithm, TokenAlgorithms};
pub use claims::{Claims, Identity};
pub use client::Client;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use errors::*;
pub use keys::{SharedSecret, generate_rsa_key_pair, load_private_key, load_public_key};
pub use nonce::{MemoryNonceStore, NonceStore};
pub use random::{RandomSource, SequenceRandom, ShortRandom, SystemRandomSource};
pub use server::Server;

/// JWT `typ` header value used on both token layers
pub const JWT_TYPE: &str = "JWT";

/// Issuer of every token
pub const DEFAULT_ISSUER: &str = "anwork";

/// Subject of every token
pub const DEFAULT_SUBJECT: &str = "andrew";

/// Default token lifetime (one hour)
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;

/// Default nonce length in bytes
pub const DEFAULT_NONCE_LEN: usize = 32;

/// Smallest RSA modulus accepted for the key pair
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// Smallest shared secret accepted, in bytes
pub const MIN_SECRET_LEN: usize = 16;
