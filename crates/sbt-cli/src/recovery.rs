//! # Recovery Subcommand
//!
//! Offline side of the recovery protocol. The holder of a lost address's
//! key builds the challenge for a recipient and prints the hex proof the
//! recipient submits to the ledger.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use sbt_core::Address;
use sbt_crypto::{Ed25519KeyPair, RecoveryProof};
use sbt_ledger::RecoveryMessage;

/// Arguments for `sbt recovery`.
#[derive(Args, Debug)]
pub struct RecoveryArgs {
    #[command(subcommand)]
    pub command: RecoveryCommand,
}

/// Recovery subcommands.
#[derive(Subcommand, Debug)]
pub enum RecoveryCommand {
    /// Print the canonical challenge bytes for an owner and recipient.
    Challenge {
        /// Address whose tokens are recovered.
        #[arg(long)]
        owner: Address,
        #[command(flatten)]
        target: ChallengeTarget,
    },

    /// Sign the challenge with the owner's private key and print the proof.
    Sign {
        /// Private key file of the lost address (hex seed).
        #[arg(long)]
        key: PathBuf,
        #[command(flatten)]
        target: ChallengeTarget,
    },
}

/// Recipient, nonce and domain shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct ChallengeTarget {
    /// Address receiving the tokens.
    #[arg(long)]
    pub recipient: Address,
    /// The owner's current recovery nonce on the ledger.
    #[arg(long, default_value_t = 0)]
    pub nonce: u64,
    /// Ledger domain; defaults to the domain in `--config`.
    #[arg(long)]
    pub domain: Option<String>,
}

/// Execute the recovery subcommand.
pub fn run_recovery(args: &RecoveryArgs, config: Option<&Path>) -> Result<u8> {
    match &args.command {
        RecoveryCommand::Challenge { owner, target } => {
            let message = build_message(*owner, target, config)?;
            let bytes = message
                .canonical_bytes()
                .context("failed to canonicalize recovery message")?;
            println!("{}", String::from_utf8_lossy(bytes.as_bytes()));
            Ok(0)
        }
        RecoveryCommand::Sign { key, target } => {
            let keypair = crate::keys::load_keypair(key)?;
            let message = build_message(keypair.address(), target, config)?;
            let proof = sign_message(&keypair, &message)?;
            tracing::info!(
                owner = %message.owner,
                recipient = %message.recipient,
                nonce = message.nonce,
                "recovery challenge signed"
            );
            println!("{proof}");
            Ok(0)
        }
    }
}

/// Resolve the domain and assemble the message.
pub fn build_message(
    owner: Address,
    target: &ChallengeTarget,
    config: Option<&Path>,
) -> Result<RecoveryMessage> {
    let domain = match (&target.domain, config) {
        (Some(domain), _) => domain.clone(),
        (None, Some(path)) => crate::load_config(path)?.domain,
        (None, None) => bail!("either --domain or --config is required"),
    };
    if owner == target.recipient {
        bail!("recipient must differ from the owner {owner}");
    }
    Ok(RecoveryMessage {
        domain,
        owner,
        recipient: target.recipient,
        nonce: target.nonce,
    })
}

/// Sign `message` and return the hex-encoded proof.
pub fn sign_message(keypair: &Ed25519KeyPair, message: &RecoveryMessage) -> Result<String> {
    let bytes = message
        .canonical_bytes()
        .context("failed to canonicalize recovery message")?;
    Ok(RecoveryProof::sign(keypair, &bytes).to_hex())
}
