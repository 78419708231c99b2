// EIP-712 vote intent construction and signing.
//
// The voting API accepts a `CastVoteBySig` struct signed under a domain that
// carries name, version and verifying contract only (no chain id, no salt).

use std::borrow::Cow;

use alloy_primitives::{hex, Address, Signature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, Eip712Domain, SolStruct};

use crate::config::VoteConfig;
use crate::error::VoteError;

sol! {
    /// The vote intent, field order as the verifying contract hashes it.
    #[derive(Debug, PartialEq, Eq)]
    struct CastVoteBySig {
        uint256 verifyingChainId;
        address voter;
        bool yesVote;
        uint256 nonce;
        uint256 deadline;
    }
}

/// Derive an account's signer (and so its address) from a hex private key.
pub fn identity_from_key(private_key: &str) -> Result<PrivateKeySigner, VoteError> {
    private_key
        .trim()
        .parse::<PrivateKeySigner>()
        .map_err(|e| VoteError::Signing(format!("invalid private key: {e}")))
}

/// A signature over one vote intent, plus the deadline that was signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedVote {
    pub signature: Signature,
    pub deadline: u64,
}

impl SignedVote {
    /// `0x`-prefixed r ‖ s ‖ v, with v in {27, 28}.
    pub fn signature_hex(&self) -> String {
        hex::encode_prefixed(self.signature.as_bytes())
    }
}

/// Builds and signs `CastVoteBySig` messages for one configured domain.
#[derive(Debug, Clone)]
pub struct SignedMessageBuilder {
    domain: Eip712Domain,
    chain_id: U256,
    nonce: U256,
    deadline_offset_secs: u64,
}

impl SignedMessageBuilder {
    pub fn from_config(vote: &VoteConfig) -> Self {
        Self {
            domain: Eip712Domain::new(
                Some(Cow::Owned(vote.domain_name.clone())),
                Some(Cow::Owned(vote.domain_version.clone())),
                None,
                Some(vote.verifying_contract),
                None,
            ),
            chain_id: U256::from(vote.chain_id),
            nonce: U256::from(vote.nonce),
            deadline_offset_secs: vote.deadline_offset_secs,
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// Deadline for a signature made at `now_secs` (unix seconds).
    pub fn deadline_at(&self, now_secs: u64) -> u64 {
        now_secs.saturating_add(self.deadline_offset_secs)
    }

    /// The affirmative vote intent for `voter`.
    pub fn intent(&self, voter: Address, deadline: u64) -> CastVoteBySig {
        CastVoteBySig {
            verifyingChainId: self.chain_id,
            voter,
            yesVote: true,
            nonce: self.nonce,
            deadline: U256::from(deadline),
        }
    }

    /// EIP-712 digest: keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(intent)).
    pub fn signing_hash(&self, intent: &CastVoteBySig) -> B256 {
        intent.eip712_signing_hash(&self.domain)
    }

    /// Sign with a frozen clock.
    pub fn sign_at(&self, signer: &PrivateKeySigner, now_secs: u64) -> Result<SignedVote, VoteError> {
        let deadline = self.deadline_at(now_secs);
        let hash = self.signing_hash(&self.intent(signer.address(), deadline));
        let signature = signer
            .sign_hash_sync(&hash)
            .map_err(|e| VoteError::Signing(e.to_string()))?;
        Ok(SignedVote {
            signature,
            deadline,
        })
    }

    /// Sign against the wall clock.
    pub fn sign(&self, signer: &PrivateKeySigner) -> Result<SignedVote, VoteError> {
        self.sign_at(signer, unix_now())
    }
}

pub(crate) fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
