//! # Replay Subcommand
//!
//! Runs a YAML script of ledger operations against a fresh in-memory
//! ledger driven by a manual clock, then prints a JSON report of each
//! step's outcome and the emitted events. A step may declare the error
//! kind it expects; any other failure aborts the replay.
//!
//! ```yaml
//! start: 1700000000
//! steps:
//!   - op: mint
//!     caller: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
//!     owner: "0x0101010101010101010101010101010101010101"
//!     value: 100
//!     slot: 1
//!   - op: consume
//!     caller: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
//!     token: 1
//!     value: 500
//!     expect_error: invalid_state
//!   - op: advance_clock
//!     secs: 3600
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sbt_core::{hex, Address, ManualClock, RequestId, SlotId, Timestamp, TokenId};
use sbt_ledger::{Ledger, LedgerConfig, LedgerError, LedgerEvent};

/// Arguments for `sbt replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Script file (YAML).
    #[arg(value_name = "FILE")]
    pub script: PathBuf,

    /// Write the final ledger snapshot as JSON to this path.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

/// A replay script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Ledger configuration; `--config` takes precedence.
    #[serde(default)]
    pub config: Option<LedgerConfig>,
    /// Initial clock reading. Defaults to the epoch.
    #[serde(default)]
    pub start: Option<Timestamp>,
    /// Operations, applied in order.
    pub steps: Vec<Step>,
}

/// One scripted operation.
#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub op: Op,
    /// Error kind the step must fail with, e.g. `unauthorized`.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Ledger operations a script can invoke.
///
/// Every variant except `advance_clock` names the acting `caller`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Direct mint; `id` selects `mint_with_id`.
    Mint {
        caller: Address,
        /// Recipient of the new token.
        owner: Address,
        value: u64,
        slot: SlotId,
        /// Explicit token id instead of the next sequential one.
        #[serde(default)]
        id: Option<TokenId>,
    },
    /// Add `value` to a token.
    Charge {
        caller: Address,
        token: TokenId,
        value: u64,
    },
    /// Subtract `value` from a token.
    Consume {
        caller: Address,
        token: TokenId,
        value: u64,
    },
    Revoke {
        caller: Address,
        token: TokenId,
    },
    Destroy {
        caller: Address,
        token: TokenId,
    },
    SetSlot {
        caller: Address,
        token: TokenId,
        /// New slot; zero is rejected.
        slot: SlotId,
    },
    AddVoter {
        caller: Address,
        voter: Address,
    },
    RemoveVoter {
        caller: Address,
        voter: Address,
    },
    /// File an approval request; the result carries its id.
    CreateApprovalRequest {
        caller: Address,
        value: u64,
        slot: SlotId,
    },
    RemoveApprovalRequest {
        caller: Address,
        request: RequestId,
    },
    /// Voter mints to `owner` under an approval request.
    ApproveMint {
        caller: Address,
        owner: Address,
        request: RequestId,
    },
    /// Voter revokes a token.
    ApproveRevoke {
        caller: Address,
        token: TokenId,
    },
    /// File a delegate request for `owner`; the result carries its id.
    CreateDelegateRequest {
        caller: Address,
        owner: Address,
        value: u64,
        slot: SlotId,
    },
    RemoveDelegateRequest {
        caller: Address,
        request: RequestId,
    },
    /// Grant `operator` one mint under `request`.
    MintDelegate {
        caller: Address,
        operator: Address,
        request: RequestId,
    },
    /// Pairwise mint grants: `operators[i]` on `requests[i]`.
    MintDelegateBatch {
        caller: Address,
        operators: Vec<Address>,
        requests: Vec<RequestId>,
    },
    /// Grant `operator` one revoke of `token`.
    RevokeDelegate {
        caller: Address,
        operator: Address,
        token: TokenId,
    },
    /// Pairwise revoke grants: `operators[i]` on `tokens[i]`.
    RevokeDelegateBatch {
        caller: Address,
        operators: Vec<Address>,
        tokens: Vec<TokenId>,
    },
    /// Operator redeems its mint grant.
    DelegateMint {
        caller: Address,
        request: RequestId,
    },
    /// Operator redeems its revoke grant.
    DelegateRevoke {
        caller: Address,
        token: TokenId,
    },
    SetExpiryDate {
        caller: Address,
        token: TokenId,
        /// Expiry instant in epoch seconds.
        date: Timestamp,
    },
    /// Pairwise expiry dates: `dates[i]` on `tokens[i]`.
    SetBatchExpiryDates {
        caller: Address,
        tokens: Vec<TokenId>,
        dates: Vec<Timestamp>,
    },
    Shadow {
        caller: Address,
        token: TokenId,
    },
    Reveal {
        caller: Address,
        token: TokenId,
    },
    /// Recipient `caller` submits a proof signed by `owner`.
    Recover {
        caller: Address,
        owner: Address,
        /// Hex-encoded recovery proof.
        proof: String,
    },
    /// Move the manual clock forward.
    AdvanceClock {
        /// Seconds to advance.
        secs: u64,
    },
}

impl Op {
    /// The `op` tag as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Charge { .. } => "charge",
            Self::Consume { .. } => "consume",
            Self::Revoke { .. } => "revoke",
            Self::Destroy { .. } => "destroy",
            Self::SetSlot { .. } => "set_slot",
            Self::AddVoter { .. } => "add_voter",
            Self::RemoveVoter { .. } => "remove_voter",
            Self::CreateApprovalRequest { .. } => "create_approval_request",
            Self::RemoveApprovalRequest { .. } => "remove_approval_request",
            Self::ApproveMint { .. } => "approve_mint",
            Self::ApproveRevoke { .. } => "approve_revoke",
            Self::CreateDelegateRequest { .. } => "create_delegate_request",
            Self::RemoveDelegateRequest { .. } => "remove_delegate_request",
            Self::MintDelegate { .. } => "mint_delegate",
            Self::MintDelegateBatch { .. } => "mint_delegate_batch",
            Self::RevokeDelegate { .. } => "revoke_delegate",
            Self::RevokeDelegateBatch { .. } => "revoke_delegate_batch",
            Self::DelegateMint { .. } => "delegate_mint",
            Self::DelegateRevoke { .. } => "delegate_revoke",
            Self::SetExpiryDate { .. } => "set_expiry_date",
            Self::SetBatchExpiryDates { .. } => "set_batch_expiry_dates",
            Self::Shadow { .. } => "shadow",
            Self::Reveal { .. } => "reveal",
            Self::Recover { .. } => "recover",
            Self::AdvanceClock { .. } => "advance_clock",
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    /// Zero-based position in the script.
    pub index: usize,
    /// The step's `op` tag.
    pub op: &'static str,
    /// Returned ids or readings, when the operation produces any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Expected failure, as `kind: message`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of a replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// One entry per script step, in order.
    pub steps: Vec<StepReport>,
    /// The ledger's event journal after the last step.
    pub events: Vec<LedgerEvent>,
    /// Absent when enumeration is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<usize>,
}

/// Execute the replay subcommand.
pub fn run_replay(args: &ReplayArgs, config: Option<&Path>) -> Result<u8> {
    if !args.script.exists() {
        bail!("script file not found: {}", args.script.display());
    }
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script: {}", args.script.display()))?;
    let script: Script = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse script: {}", args.script.display()))?;

    let config = match (config, &script.config) {
        (Some(path), _) => crate::load_config(path)?,
        (None, Some(embedded)) => embedded.clone(),
        (None, None) => bail!("no ledger configuration: pass --config or embed `config` in the script"),
    };

    let (ledger, report) = replay(&script, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = &args.snapshot {
        let snapshot = serde_json::to_string_pretty(&ledger.snapshot())?;
        std::fs::write(path, snapshot)
            .with_context(|| format!("failed to write snapshot: {}", path.display()))?;
        println!("OK: snapshot written to {}", path.display());
    }
    Ok(0)
}

/// Apply every step of `script` to a new ledger built from `config`.
pub fn replay(script: &Script, config: LedgerConfig) -> Result<(Ledger, ReplayReport)> {
    let clock = ManualClock::new(script.start.unwrap_or(Timestamp::EPOCH));
    let mut ledger = Ledger::new(config)
        .context("failed to construct ledger")?
        .with_clock(Arc::new(clock.clone()));

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let name = step.op.name();
        let outcome = apply(&mut ledger, &clock, &step.op);
        let report = match (outcome, &step.expect_error) {
            (Ok(result), None) => StepReport {
                index,
                op: name,
                result,
                error: None,
            },
            (Err(err), Some(kind)) if err.kind().as_str() == kind => {
                tracing::debug!(index, op = name, error = %err, "expected failure");
                StepReport {
                    index,
                    op: name,
                    result: None,
                    error: Some(format!("{kind}: {err}")),
                }
            }
            (Ok(_), Some(kind)) => {
                bail!("step {index} ({name}) succeeded but was expected to fail with {kind}")
            }
            (Err(err), Some(kind)) => {
                return Err(anyhow!(err)).with_context(|| {
                    format!("step {index} ({name}) expected {kind} but failed differently")
                })
            }
            (Err(err), None) => {
                return Err(anyhow!(err)).with_context(|| format!("step {index} ({name}) failed"))
            }
        };
        steps.push(report);
    }

    ledger
        .check_consistency()
        .context("ledger indices inconsistent after replay")?;
    tracing::info!(steps = steps.len(), events = ledger.events().len(), "replay complete");

    let report = ReplayReport {
        steps,
        events: ledger.events().to_vec(),
        total_supply: ledger.total_supply().ok(),
    };
    Ok((ledger, report))
}

fn apply(ledger: &mut Ledger, clock: &ManualClock, op: &Op) -> Result<Option<Value>, LedgerError> {
    let minted = |id: TokenId| Some(json!({ "token": id }));
    let filed = |id: RequestId| Some(json!({ "request": id }));

    match op.clone() {
        Op::Mint {
            caller,
            owner,
            value,
            slot,
            id: Some(id),
        } => ledger.mint_with_id(caller, id, owner, value, slot).map(minted),
        Op::Mint {
            caller,
            owner,
            value,
            slot,
            id: None,
        } => ledger.mint(caller, owner, value, slot).map(minted),
        Op::Charge { caller, token, value } => ledger.charge(caller, token, value).map(|_| None),
        Op::Consume { caller, token, value } => ledger.consume(caller, token, value).map(|_| None),
        Op::Revoke { caller, token } => ledger.revoke(caller, token).map(|_| None),
        Op::Destroy { caller, token } => ledger.destroy(caller, token).map(|_| None),
        Op::SetSlot { caller, token, slot } => ledger.set_slot(caller, token, slot).map(|_| None),
        Op::AddVoter { caller, voter } => ledger.add_voter(caller, voter).map(|_| None),
        Op::RemoveVoter { caller, voter } => ledger.remove_voter(caller, voter).map(|_| None),
        Op::CreateApprovalRequest { caller, value, slot } => ledger
            .create_approval_request(caller, value, slot)
            .map(filed),
        Op::RemoveApprovalRequest { caller, request } => ledger
            .remove_approval_request(caller, request)
            .map(|_| None),
        Op::ApproveMint {
            caller,
            owner,
            request,
        } => ledger.approve_mint(caller, owner, request).map(minted),
        Op::ApproveRevoke { caller, token } => ledger.approve_revoke(caller, token).map(|_| None),
        Op::CreateDelegateRequest {
            caller,
            owner,
            value,
            slot,
        } => ledger
            .create_delegate_request(caller, owner, value, slot)
            .map(filed),
        Op::RemoveDelegateRequest { caller, request } => ledger
            .remove_delegate_request(caller, request)
            .map(|_| None),
        Op::MintDelegate {
            caller,
            operator,
            request,
        } => ledger.mint_delegate(caller, operator, request).map(|_| None),
        Op::MintDelegateBatch {
            caller,
            operators,
            requests,
        } => ledger
            .mint_delegate_batch(caller, &operators, &requests)
            .map(|_| None),
        Op::RevokeDelegate {
            caller,
            operator,
            token,
        } => ledger.revoke_delegate(caller, operator, token).map(|_| None),
        Op::RevokeDelegateBatch {
            caller,
            operators,
            tokens,
        } => ledger
            .revoke_delegate_batch(caller, &operators, &tokens)
            .map(|_| None),
        Op::DelegateMint { caller, request } => ledger.delegate_mint(caller, request).map(minted),
        Op::DelegateRevoke { caller, token } => ledger.delegate_revoke(caller, token).map(|_| None),
        Op::SetExpiryDate {
            caller,
            token,
            date,
        } => ledger.set_expiry_date(caller, token, date).map(|_| None),
        Op::SetBatchExpiryDates {
            caller,
            tokens,
            dates,
        } => ledger
            .set_batch_expiry_dates(caller, &tokens, &dates)
            .map(|_| None),
        Op::Shadow { caller, token } => ledger.shadow(caller, token).map(|_| None),
        Op::Reveal { caller, token } => ledger.reveal(caller, token).map(|_| None),
        Op::Recover {
            caller,
            owner,
            proof,
        } => {
            let bytes = hex::decode(proof.trim().trim_start_matches("0x"))
                .map_err(|e| LedgerError::InvalidSignature(format!("proof is not hex: {e}")))?;
            ledger
                .recover(caller, owner, &bytes)
                .map(|moved| Some(json!({ "tokens": moved })))
        }
        Op::AdvanceClock { secs } => {
            clock.advance(secs);
            Ok(Some(json!({ "now": ledger.now() })))
        }
    }
}
