// In-memory VoteApi used by the worker and runner tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{parse_submit_response, SubmitReceipt, VoteApi, VoteApiConnector, VoteSubmission, VotingStatus};
use crate::error::VoteError;

/// Scripted behaviour for one voter address.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Status(VotingStatus),
    NetworkFailure,
}

/// Shared counters the tests inspect after a run.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    pub submissions: Mutex<Vec<VoteSubmission>>,
    pub proxies: Mutex<Vec<Option<String>>>,
    pub status_calls: AtomicUsize,
    pub open_sessions: AtomicUsize,
    pub max_open_sessions: AtomicUsize,
}

impl Probe {
    pub fn submissions(&self) -> Vec<VoteSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn max_open(&self) -> usize {
        self.max_open_sessions.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub(crate) struct FakeConnector {
    scripts: HashMap<Address, Script>,
    default_status: VotingStatus,
    submit_reply: Value,
    delay: Duration,
    pub probe: Arc<Probe>,
}

impl FakeConnector {
    /// Every voter is eligible and every submission confirms.
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            default_status: VotingStatus {
                voting_power: 5.0,
                has_voted: false,
            },
            submit_reply: json!({ "txHash": "0xabc" }),
            delay: Duration::ZERO,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn with_script(mut self, voter: Address, script: Script) -> Self {
        self.scripts.insert(voter, script);
        self
    }

    pub fn with_submit_reply(mut self, reply: Value) -> Self {
        self.submit_reply = reply;
        self
    }

    /// Hold each eligibility request open this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl VoteApiConnector for FakeConnector {
    type Api = FakeApi;

    fn connect(&self, proxy_url: Option<&str>) -> Result<FakeApi, VoteError> {
        self.probe
            .proxies
            .lock()
            .unwrap()
            .push(proxy_url.map(str::to_string));
        let open = self.probe.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_open_sessions.fetch_max(open, Ordering::SeqCst);
        Ok(FakeApi {
            connector: self.clone(),
        })
    }
}

pub(crate) struct FakeApi {
    connector: FakeConnector,
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.connector
            .probe
            .open_sessions
            .fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoteApi for FakeApi {
    async fn voting_status(&self, voter: Address) -> Result<VotingStatus, VoteError> {
        let c = &self.connector;
        c.probe.status_calls.fetch_add(1, Ordering::SeqCst);
        if !c.delay.is_zero() {
            tokio::time::sleep(c.delay).await;
        }
        match c.scripts.get(&voter) {
            Some(Script::Status(status)) => Ok(*status),
            Some(Script::NetworkFailure) => {
                Err(VoteError::Network("connection failed: simulated".into()))
            }
            None => Ok(c.default_status),
        }
    }

    async fn submit_vote(&self, submission: &VoteSubmission) -> Result<SubmitReceipt, VoteError> {
        let c = &self.connector;
        c.probe.submissions.lock().unwrap().push(submission.clone());
        Ok(parse_submit_response(c.submit_reply.clone()))
    }
}
