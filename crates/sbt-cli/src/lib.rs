//! # sbt-cli — Command-Line Tool for the Token Ledger
//!
//! ## Subcommands
//!
//! - `sbt keys` — Ed25519 key generation and address derivation.
//! - `sbt recovery` — Recovery challenge construction and signing.
//! - `sbt replay` — Deterministic replay of a scripted operation sequence.
//!
//! ```bash
//! sbt keys keygen --output keys --prefix alice
//! sbt --config ledger.yaml recovery sign --key keys/alice.key --recipient 0x...
//! sbt --config ledger.yaml replay script.yaml --snapshot out.json
//! ```

pub mod keys;
pub mod recovery;
pub mod replay;

use std::path::Path;

use anyhow::{bail, Context, Result};
use sbt_ledger::LedgerConfig;

/// Load a ledger configuration from a YAML or JSON file.
///
/// JSON is a subset of YAML, so one parser covers both.
pub fn load_config(path: &Path) -> Result<LedgerConfig> {
    if !path.exists() {
        bail!("configuration file not found: {}", path.display());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration: {}", path.display()))?;
    let config: LedgerConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse configuration: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration: {}", path.display()))?;
    Ok(config)
}

/// Read a hex-encoded value from a file, trimming surrounding whitespace.
pub(crate) fn read_hex_file(path: &Path, what: &str) -> Result<String> {
    if !path.exists() {
        bail!("{what} file not found: {}", path.display());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what}: {}", path.display()))?;
    Ok(text.trim().to_string())
}
