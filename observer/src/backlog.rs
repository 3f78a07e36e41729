//! Inbound vote backlog.
//!
//! Votes whose monitoring reported a failure are kept here, keyed by ballot
//! index, and handed back to the inbound scanner as extra trackers until the
//! ledger shows the ballot finalized or this client's vote recorded.
//!
//! The entry map is only locked for snapshots and applying the outcome; ledger
//! RPCs run without the lock held, so reconciliation never blocks
//! [`InboundBacklog::add_failed_inbound`].

use crate::ObserverError;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use xchain_ledger::LedgerRepo;
use xchain_types::{ChainId, InboundTracker, InboundVote, MonitorError, Timestamp};
use xchain_utils::Clock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacklogConfig {
    /// Minimum time between two retries of the same entry.
    pub retry_interval: Duration,
    /// Entries whose retry timestamp is refreshed per reconciliation.
    pub max_trackers_per_scan: usize,
    /// How long a vote monitor may stay silent before its vote is assumed successful.
    pub monitoring_timeout: Duration,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(60),
            max_trackers_per_scan: 50,
            monitoring_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Clone, Debug)]
struct BacklogEntry {
    tracker: InboundTracker,
    last_retried: Option<Timestamp>,
}

/// How a monitored vote ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Failure reported; the vote's ballot is (now) in the backlog.
    Failed { ballot: String },
    /// The monitor finished without reporting a failure.
    Completed,
    /// No report before the timeout; the vote is assumed to have succeeded.
    TimedOut,
}

enum Resolution {
    Finalized,
    Voted,
    Pending,
    Unknown,
}

pub struct InboundBacklog {
    chain_id: ChainId,
    ledger: Arc<dyn LedgerRepo>,
    clock: Arc<dyn Clock>,
    config: BacklogConfig,
    entries: Mutex<HashMap<String, BacklogEntry>>,
}

impl InboundBacklog {
    pub fn new(
        chain_id: ChainId,
        ledger: Arc<dyn LedgerRepo>,
        clock: Arc<dyn Clock>,
        config: BacklogConfig,
    ) -> Self {
        Self {
            chain_id,
            ledger,
            clock,
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, ballot: &str) -> bool {
        self.entries.lock().contains_key(ballot)
    }

    /// Add a failed vote. Returns `false` if its ballot was already held or is
    /// already resolved on the ledger. A failed resolution check still adds it.
    pub async fn add_failed_inbound(&self, vote: &InboundVote) -> bool {
        let ballot = vote.ballot_index();
        if self.contains(&ballot) {
            return false;
        }

        match self.resolve(&ballot).await {
            Resolution::Finalized | Resolution::Voted => {
                tracing::info!(chain = %self.chain_id, ballot = %ballot, "inbound already resolved; not adding to backlog");
                return false;
            }
            Resolution::Pending | Resolution::Unknown => {}
        }

        let mut entries = self.entries.lock();
        if entries.contains_key(&ballot) {
            return false;
        }
        entries.insert(
            ballot.clone(),
            BacklogEntry {
                tracker: vote.inbound_tracker(),
                last_retried: None,
            },
        );
        tracing::info!(
            chain = %self.chain_id,
            ballot = %ballot,
            tx = %vote.inbound_hash,
            backlog = entries.len(),
            "added failed inbound to backlog"
        );
        true
    }

    pub fn remove_failed_inbound(&self, ballot: &str) -> bool {
        let removed = self.entries.lock().remove(ballot);
        if let Some(entry) = &removed {
            tracing::info!(chain = %self.chain_id, ballot, tx = %entry.tracker.tx_hash, "removed inbound from backlog");
        }
        removed.is_some()
    }

    /// Ledger trackers for this chain plus the backlog trackers still unresolved.
    ///
    /// Backlog entries resolved on the ledger are dropped. Entries retried
    /// within the retry interval, entries whose status cannot be determined,
    /// and entries already tracked by the ledger are not returned.
    pub async fn get_trackers_with_backlog(&self) -> Result<Vec<InboundTracker>, ObserverError> {
        let mut trackers = self
            .ledger
            .get_inbound_trackers_for_chain(self.chain_id)
            .await?;
        let known: HashSet<String> = trackers.iter().map(|t| t.tx_hash.clone()).collect();

        let now = self.clock.now();
        let mut snapshot: Vec<(String, BacklogEntry)> = self
            .entries
            .lock()
            .iter()
            .map(|(ballot, entry)| (ballot.clone(), entry.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        let mut resolved = Vec::new();
        let mut retry = Vec::new();
        for (ballot, entry) in snapshot {
            if let Some(last) = entry.last_retried {
                if last.elapsed_since(now) < self.config.retry_interval {
                    continue;
                }
            }
            match self.resolve(&ballot).await {
                Resolution::Finalized | Resolution::Voted => resolved.push(ballot),
                Resolution::Unknown => {}
                Resolution::Pending => {
                    if !known.contains(&entry.tracker.tx_hash) {
                        retry.push((ballot, entry.tracker));
                    }
                }
            }
        }

        {
            let mut entries = self.entries.lock();
            for ballot in &resolved {
                if let Some(entry) = entries.remove(ballot) {
                    tracing::info!(chain = %self.chain_id, ballot = %ballot, tx = %entry.tracker.tx_hash, "backlog inbound resolved");
                }
            }
            for (ballot, _) in retry.iter().take(self.config.max_trackers_per_scan) {
                if let Some(entry) = entries.get_mut(ballot) {
                    entry.last_retried = Some(now);
                }
            }
        }

        if !retry.is_empty() {
            tracing::info!(chain = %self.chain_id, count = retry.len(), "retrying backlog inbounds");
        }
        trackers.extend(retry.into_iter().map(|(_, tracker)| tracker));
        Ok(trackers)
    }

    /// Wait for a vote monitor's failure report.
    ///
    /// Silence until `monitoring_timeout` is taken as success. A monitor that
    /// hangs therefore hides its vote's failure; the ledger's own inbound
    /// trackers are the only remaining path for such a vote.
    pub async fn handle_monitoring_error(
        &self,
        errors: oneshot::Receiver<MonitorError>,
        label: &str,
    ) -> MonitorOutcome {
        match tokio::time::timeout(self.config.monitoring_timeout, errors).await {
            Ok(Ok(failure)) => {
                let ballot = failure.vote.ballot_index();
                tracing::warn!(
                    chain = %self.chain_id,
                    label,
                    ballot = %ballot,
                    vote_tx = %failure.vote_tx_hash,
                    reason = %failure.reason,
                    "inbound vote failed; adding to backlog"
                );
                self.add_failed_inbound(&failure.vote).await;
                MonitorOutcome::Failed { ballot }
            }
            Ok(Err(_)) => MonitorOutcome::Completed,
            Err(_) => {
                tracing::warn!(
                    chain = %self.chain_id,
                    label,
                    timeout_secs = self.config.monitoring_timeout.as_secs(),
                    "vote monitor silent until timeout; assuming vote succeeded"
                );
                MonitorOutcome::TimedOut
            }
        }
    }

    async fn resolve(&self, ballot: &str) -> Resolution {
        match self.ledger.get_cctx_by_hash(ballot).await {
            Ok(Some(_)) => return Resolution::Finalized,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(chain = %self.chain_id, ballot, error = %e, "unable to look up ballot status");
                return Resolution::Unknown;
            }
        }
        let voter = self.ledger.operator_address();
        match self.ledger.has_voted(ballot, &voter).await {
            Ok(true) => Resolution::Voted,
            Ok(false) => Resolution::Pending,
            Err(e) => {
                tracing::warn!(chain = %self.chain_id, ballot, error = %e, "unable to check vote status");
                Resolution::Unknown
            }
        }
    }
}
