//! anwork-auth demo
//!
//! Runs the mint / present / accept handshake in one process and then shows
//! how replayed, expired and foreign tokens are turned away.
//!
//! ```bash
//! RUST_LOG=anwork_auth=debug cargo run -p anwork-auth-demo -- handshake
//! cargo run -p anwork-auth-demo -- keygen --out ./keys
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anwork_auth::{
    AcceptError, ClaimsError, Client, ManualClock, PresentError, Server, SharedSecret,
    generate_rsa_key_pair,
};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "anwork-auth-demo", version, about = "anwork-auth handshake demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RSA modulus size in bits
    #[arg(long, global = true, default_value_t = 2048)]
    bits: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the handshake and the rejection scenarios
    Handshake {
        /// Shared secret
        #[arg(long, env = "ANWORK_AUTH_SECRET", default_value = "tuna-fish-marlin")]
        secret: String,

        /// Token lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },

    /// Generate a key pair as PKCS#8 / SPKI PEM files
    Keygen {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Handshake { secret, ttl_secs } => handshake(cli.bits, &secret, ttl_secs),
        Commands::Keygen { out } => keygen(cli.bits, &out),
    }
}

fn handshake(bits: usize, secret: &str, ttl_secs: u64) -> Result<()> {
    let ttl = Duration::from_secs(ttl_secs);
    let (private_key, public_key) = generate_rsa_key_pair(bits)?;
    let secret = SharedSecret::new(secret.as_bytes().to_vec())?;
    let clock = Arc::new(ManualClock::new(SystemTime::now()));

    let server = Server::new(public_key, secret.clone())
        .with_clock(clock.clone())
        .with_token_ttl(ttl);
    let client = Client::new(private_key, secret).with_clock(clock.clone());

    let minted = server.mint()?;
    info!(segments = minted.split('.').count(), "Server minted token");
    let presented = client.present(&minted)?;
    info!(segments = presented.split('.').count(), "Client presented token");
    server.accept(&presented)?;
    info!("Server accepted token");

    clock.advance(ttl / 2);
    server.accept(&presented)?;
    info!(elapsed_secs = ttl.as_secs() / 2, "Still accepted halfway through lifetime");

    clock.advance(ttl);
    match server.accept(&presented) {
        Err(e @ AcceptError::Claims(ClaimsError::Expired { .. })) => {
            info!(error = %e, "Rejected after expiry")
        }
        other => bail!("expected expiry rejection, got {other:?}"),
    }

    clock.rewind(ttl);
    let newer = client.present(&server.mint()?)?;
    match server.accept(&presented) {
        Err(e @ AcceptError::Claims(ClaimsError::StaleNonce)) => {
            info!(error = %e, "Replayed token rejected")
        }
        other => bail!("expected stale nonce rejection, got {other:?}"),
    }
    server.accept(&newer)?;
    info!("Newest token accepted");

    let (other_key, _) = generate_rsa_key_pair(bits)?;
    let intruder = Client::new(other_key, SharedSecret::new(b"salmon-trout-carp".to_vec())?)
        .with_clock(clock);
    match intruder.present(&server.mint()?) {
        Err(e @ PresentError::Decrypt) => info!(error = %e, "Foreign key holder cannot open token"),
        other => bail!("expected decryption failure, got {other:?}"),
    }

    Ok(())
}

fn keygen(bits: usize, out: &Path) -> Result<()> {
    let (private_key, public_key) = generate_rsa_key_pair(bits)?;
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let private_path = out.join("anwork.pem");
    let public_path = out.join("anwork.pub.pem");
    std::fs::write(
        &private_path,
        private_key
            .to_pkcs8_pem(LineEnding::LF)
            .context("encoding private key")?
            .as_bytes(),
    )
    .with_context(|| format!("writing {}", private_path.display()))?;
    std::fs::write(
        &public_path,
        public_key
            .to_public_key_pem(LineEnding::LF)
            .context("encoding public key")?,
    )
    .with_context(|| format!("writing {}", public_path.display()))?;

    info!(
        private_key = %private_path.display(),
        public_key = %public_path.display(),
        "Wrote key pair"
    );
    Ok(())
}
