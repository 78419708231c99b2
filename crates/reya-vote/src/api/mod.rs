// Voting API surface: the eligibility read and the signed vote submission.
//
// `VoteApi` is the per-account session; `VoteApiConnector` opens one. The HTTP
// implementation lives in `client`, and tests swap in an in-memory fake.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::VoteError;
use crate::signing::SignedVote;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /{proposal}/user/{address}` response. Extra fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatus {
    pub voting_power: f64,
    /// `null` reads as not voted; a missing field is still an error.
    #[serde(deserialize_with = "null_as_false")]
    pub has_voted: bool,
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl VotingStatus {
    /// Only accounts with power that have not voted yet get a signature.
    pub fn is_eligible(&self) -> bool {
        self.voting_power > 0.0 && !self.has_voted
    }
}

/// `PUT /{contract}/vote` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmission {
    pub voter: String,
    pub is_yes_vote: &'static str,
    pub signature: String,
    pub signature_deadline: u64,
}

impl VoteSubmission {
    pub fn new(voter: Address, signed: &SignedVote) -> Self {
        Self {
            voter: voter.to_checksum(None),
            is_yes_vote: "yes",
            signature: signed.signature_hex(),
            signature_deadline: signed.deadline,
        }
    }
}

/// What the submission endpoint told us.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReceipt {
    /// The response carried a `txHash`.
    Confirmed { tx_hash: String },
    /// A 2xx body without `txHash`; kept for the log line.
    Unconfirmed { body: Value },
}

/// Classify a submission response body by the presence of `txHash`.
pub fn parse_submit_response(body: Value) -> SubmitReceipt {
    match body.get("txHash") {
        Some(Value::String(hash)) => SubmitReceipt::Confirmed {
            tx_hash: hash.clone(),
        },
        Some(Value::Null) | None => SubmitReceipt::Unconfirmed { body },
        Some(other) => SubmitReceipt::Confirmed {
            tx_hash: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One account's session with the voting API. Dropping it releases its
/// connections.
#[async_trait]
pub trait VoteApi: Send + Sync {
    async fn voting_status(&self, voter: Address) -> Result<VotingStatus, VoteError>;

    async fn submit_vote(&self, submission: &VoteSubmission) -> Result<SubmitReceipt, VoteError>;
}

/// Opens a fresh `VoteApi` session, optionally routed through a proxy URL.
pub trait VoteApiConnector: Send + Sync {
    type Api: VoteApi;

    fn connect(&self, proxy_url: Option<&str>) -> Result<Self::Api, VoteError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
