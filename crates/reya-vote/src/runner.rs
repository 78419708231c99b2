// Bounded-concurrency fan-out of account workers.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::accounts::Account;
use crate::api::VoteApiConnector;
use crate::signing::SignedMessageBuilder;
use crate::worker::{run_account, AccountReport, VoteOutcome};

/// Settled reports in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<AccountReport>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn voted(&self) -> usize {
        self.reports.iter().filter(|r| r.is_voted()).count()
    }

    pub fn ineligible(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(VoteOutcome::Ineligible { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_err()).count()
    }
}

/// Spawns one worker per account; at most `concurrency` hold a permit at once.
pub struct BatchRunner<C> {
    connector: Arc<C>,
    builder: Arc<SignedMessageBuilder>,
    permits: Arc<Semaphore>,
    concurrency: usize,
}

impl<C: VoteApiConnector + 'static> BatchRunner<C> {
    /// A `concurrency` of 0 is raised to 1; zero permits would never finish.
    pub fn new(connector: C, builder: SignedMessageBuilder, concurrency: usize) -> Self {
        if concurrency == 0 {
            warn!("batch concurrency of 0 raised to 1");
        }
        let concurrency = concurrency.max(1);
        Self {
            connector: Arc::new(connector),
            builder: Arc::new(builder),
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    /// Effective permit count.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Vote with every account and wait for all of them. Each report is
    /// logged as soon as its account settles. Nothing is cancelled early.
    pub async fn run(&self, accounts: Vec<Account>) -> BatchReport {
        let mut handles = Vec::with_capacity(accounts.len());

        for account in accounts {
            let sequence_id = account.sequence_id;
            let permits = Arc::clone(&self.permits);
            let connector = Arc::clone(&self.connector);
            let builder = Arc::clone(&self.builder);

            let handle = tokio::spawn(async move {
                // Released when the task ends, whatever the outcome.
                let Ok(_permit) = permits.acquire_owned().await else {
                    return AccountReport::aborted(sequence_id, "permit pool closed");
                };
                debug!(account = sequence_id, "worker started");

                let report = run_account(&account, connector.as_ref(), &builder).await;
                report.log();
                report
            });
            handles.push((sequence_id, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (sequence_id, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    let report = AccountReport::aborted(sequence_id, e.to_string());
                    error!(account = sequence_id, "{}", report.summary());
                    reports.push(report);
                }
            }
        }

        BatchReport { reports }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
