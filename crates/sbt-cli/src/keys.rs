//! # Keys Subcommand
//!
//! Generates Ed25519 key pairs for recovery and derives the ledger address
//! a key controls. Key files hold lowercase hex: the 32-byte seed in
//! `<prefix>.key`, the 32-byte public key in `<prefix>.pub`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use sbt_core::Address;
use sbt_crypto::{Ed25519KeyPair, Ed25519PublicKey};

/// Arguments for `sbt keys`.
#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

/// Key subcommands.
#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Generate a new Ed25519 key pair.
    Keygen {
        /// Output directory for the key files.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
        /// Prefix for the key filenames.
        #[arg(long, default_value = "sbt")]
        prefix: String,
    },

    /// Print the address controlled by a key.
    Address {
        /// Public key file (hex).
        #[arg(long, conflicts_with = "key")]
        pubkey: Option<PathBuf>,
        /// Private key file (hex seed).
        #[arg(long)]
        key: Option<PathBuf>,
    },
}

/// Execute the keys subcommand.
pub fn run_keys(args: &KeysArgs) -> Result<u8> {
    match &args.command {
        KeysCommand::Keygen { output, prefix } => cmd_keygen(output, prefix),
        KeysCommand::Address { pubkey, key } => {
            let address = match (pubkey, key) {
                (Some(path), None) => address_from_pubkey_file(path)?,
                (None, Some(path)) => load_keypair(path)?.address(),
                _ => bail!("exactly one of --pubkey or --key is required"),
            };
            println!("{address}");
            Ok(0)
        }
    }
}

/// Load a key pair from a hex seed file.
pub fn load_keypair(path: &Path) -> Result<Ed25519KeyPair> {
    let seed = crate::read_hex_file(path, "private key")?;
    Ed25519KeyPair::from_seed_hex(&seed)
        .with_context(|| format!("invalid private key: {}", path.display()))
}

fn address_from_pubkey_file(path: &Path) -> Result<Address> {
    let hex = crate::read_hex_file(path, "public key")?;
    let pk = Ed25519PublicKey::from_hex(&hex)
        .with_context(|| format!("invalid public key: {}", path.display()))?;
    Ok(pk.address())
}

fn cmd_keygen(output_dir: &Path, prefix: &str) -> Result<u8> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let kp = Ed25519KeyPair::generate();
    let key_path = output_dir.join(format!("{prefix}.key"));
    let pub_path = output_dir.join(format!("{prefix}.pub"));

    std::fs::write(&key_path, kp.seed_hex())
        .with_context(|| format!("failed to write private key: {}", key_path.display()))?;
    std::fs::write(&pub_path, kp.public_key().to_hex())
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;

    tracing::info!(address = %kp.address(), path = %key_path.display(), "key pair generated");
    println!("OK: generated Ed25519 key pair");
    println!("  Private key: {}", key_path.display());
    println!("  Public key:  {}", pub_path.display());
    println!("  Address:     {}", kp.address());

    Ok(0)
}
