// One account's vote flow: derive identity, open a session, check
// eligibility, sign, submit. Failures come back as values in the report.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::accounts::Account;
use crate::api::{SubmitReceipt, VoteApi, VoteApiConnector, VoteSubmission, VotingStatus};
use crate::error::VoteError;
use crate::signing::{identity_from_key, SignedMessageBuilder};

/// How an account's flow ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    /// Submission accepted with a transaction hash.
    Voted { tx_hash: String },
    /// Submission accepted but the response had no `txHash`.
    Unconfirmed { response: Value },
    /// No voting power, or the account already voted. Nothing was signed.
    Ineligible { status: VotingStatus },
}

/// Settled result of one account.
#[derive(Debug)]
pub struct AccountReport {
    pub sequence_id: usize,
    /// `None` when the key could not be parsed (or the task died first).
    pub voter: Option<Address>,
    pub result: Result<VoteOutcome, VoteError>,
}

impl AccountReport {
    pub fn aborted(sequence_id: usize, reason: impl Into<String>) -> Self {
        Self {
            sequence_id,
            voter: None,
            result: Err(VoteError::Aborted(reason.into())),
        }
    }

    pub fn is_voted(&self) -> bool {
        matches!(self.result, Ok(VoteOutcome::Voted { .. }))
    }

    fn voter_label(&self) -> String {
        self.voter
            .map(|a| a.to_checksum(None))
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Human-readable log line for this report.
    pub fn summary(&self) -> String {
        let voter = self.voter_label();
        match &self.result {
            Ok(VoteOutcome::Voted { tx_hash }) => format!("{voter} Success Vote (tx {tx_hash})"),
            Ok(VoteOutcome::Unconfirmed { response }) => {
                format!("{voter} vote submitted but not confirmed: {response}")
            }
            Ok(VoteOutcome::Ineligible { status }) => format!(
                "{voter} no voting power or already voted (power={}, voted={})",
                status.voting_power, status.has_voted
            ),
            Err(e) => format!("ID account:{} ({voter}) Failed: {e}", self.sequence_id),
        }
    }

    /// Emit `summary()` at the level that matches the outcome.
    pub fn log(&self) {
        let id = self.sequence_id;
        match &self.result {
            Ok(VoteOutcome::Voted { .. }) | Ok(VoteOutcome::Ineligible { .. }) => {
                info!(account = id, "{}", self.summary())
            }
            Ok(VoteOutcome::Unconfirmed { .. }) => warn!(account = id, "{}", self.summary()),
            Err(_) => error!(account = id, "{}", self.summary()),
        }
    }
}

/// Run the full flow for `account`. Never panics on API or signing errors;
/// they land in `AccountReport::result`.
pub async fn run_account<C: VoteApiConnector>(
    account: &Account,
    connector: &C,
    builder: &SignedMessageBuilder,
) -> AccountReport {
    let signer = match identity_from_key(&account.private_key) {
        Ok(signer) => signer,
        Err(e) => {
            return AccountReport {
                sequence_id: account.sequence_id,
                voter: None,
                result: Err(e),
            }
        }
    };

    let result = vote(account, &signer, connector, builder).await;
    AccountReport {
        sequence_id: account.sequence_id,
        voter: Some(signer.address()),
        result,
    }
}

async fn vote<C: VoteApiConnector>(
    account: &Account,
    signer: &PrivateKeySigner,
    connector: &C,
    builder: &SignedMessageBuilder,
) -> Result<VoteOutcome, VoteError> {
    let voter = signer.address();
    // The session lives until this function returns, on every path.
    let api = connector.connect(account.proxy_url().as_deref())?;

    let status = api.voting_status(voter).await?;
    if !status.is_eligible() {
        return Ok(VoteOutcome::Ineligible { status });
    }

    let signed = builder.sign(signer)?;
    let receipt = api
        .submit_vote(&VoteSubmission::new(voter, &signed))
        .await?;

    Ok(match receipt {
        SubmitReceipt::Confirmed { tx_hash } => VoteOutcome::Voted { tx_hash },
        SubmitReceipt::Unconfirmed { body } => VoteOutcome::Unconfirmed { response: body },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
