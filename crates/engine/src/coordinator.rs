use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use tillsync_core::IntentId;
use tillsync_storage::{QueueRecord, SaleQueue};

use crate::committer::{CommitError, CommitOutcome, RemoteCommitter};
use crate::error::EngineError;
use crate::remote::DocumentStore;

/// Process-wide online/offline signal. Injected rather than ambient so
/// tests can drive transitions deterministically.
pub trait Connectivity {
    fn is_online(&self) -> bool;
}

/// Best-effort notifications out of the drain loop. Default impls do
/// nothing; a listener must never block the state machine.
pub trait CommitListener {
    fn sale_committed(&mut self, _id: IntentId, _receipt: &str) {}

    fn sale_failed(&mut self, _id: IntentId, _receipt: &str, _reason: &str) {}

    /// A record has passed the retry-report ceiling. It stays Pending
    /// and keeps retrying; this is a surfacing hook, not a terminal
    /// state.
    fn retries_exhausted(&mut self, _id: IntentId, _receipt: &str, _attempts: u32) {}
}

/// Listener that drops every notification.
#[derive(Debug, Default)]
pub struct NoListener;

impl CommitListener for NoListener {}

/// Why a drain pass was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    Startup,
    ConnectivityChanged,
    Tick,
}

/// Exponential backoff for retryable failures, doubling from `base` up
/// to `cap`. `report_after` is the attempt count past which a still-
/// pending record is surfaced to the listener.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub report_after: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(5),
            cap: Duration::from_secs(300),
            report_after: 8,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, given how many attempts have
    /// already run. No attempts yet means no delay.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let exp = attempts.saturating_sub(1).min(16);
        self.base.saturating_mul(1u32 << exp).min(self.cap)
    }
}

/// Counts from one drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub committed: usize,
    pub retried: usize,
    pub failed: usize,
    pub skipped_backoff: usize,
    pub deferred_offline: usize,
}

/// Drains the persistent queue through the remote committer and
/// reconciles results back into the queue.
///
/// One coordinator per queue; the drain loop is serialized, so no record
/// is ever concurrently attempted twice by this process. A second
/// process retrying the same record is handled by the committer's
/// duplicate-sale detection, not by locking.
pub struct SyncCoordinator<S: DocumentStore, C: Connectivity, L: CommitListener> {
    committer: RemoteCommitter<S>,
    connectivity: C,
    listener: L,
    retry: RetryPolicy,
}

impl<S: DocumentStore, C: Connectivity, L: CommitListener> SyncCoordinator<S, C, L> {
    pub fn new(store: S, connectivity: C, listener: L, retry: RetryPolicy) -> Self {
        Self {
            committer: RemoteCommitter::new(store),
            connectivity,
            listener,
            retry,
        }
    }

    pub fn store(&self) -> &S {
        self.committer.store()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.committer.store_mut()
    }

    pub fn into_store(self) -> S {
        self.committer.into_store()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// React to a wake-up signal. Every signal kind triggers the same
    /// drain pass; the distinction only matters for logging and for
    /// callers deciding when to send signals (startup, offline→online,
    /// periodic tick while online).
    pub fn handle<Q: SaleQueue>(
        &mut self,
        signal: SyncSignal,
        queue: &mut Q,
        now: DateTime<Utc>,
    ) -> Result<DrainReport, EngineError> {
        debug!(?signal, "sync signal");
        self.drain(queue, now)
    }

    /// One sweep over the pending records, oldest first. Per-record
    /// success and failure are independent: a retryable failure does not
    /// block later records. Connectivity is re-checked before each
    /// record, so a transition to offline mid-pass stops new attempts
    /// without aborting the one in flight.
    pub fn drain<Q: SaleQueue>(
        &mut self,
        queue: &mut Q,
        now: DateTime<Utc>,
    ) -> Result<DrainReport, EngineError> {
        let mut report = DrainReport::default();
        let pending = queue.list_pending()?;
        let total = pending.len();

        for (index, record) in pending.into_iter().enumerate() {
            if !self.connectivity.is_online() {
                report.deferred_offline = total - index;
                debug!(deferred = report.deferred_offline, "offline, deferring remaining records");
                break;
            }
            if !self.due(&record, now) {
                report.skipped_backoff += 1;
                continue;
            }
            self.attempt(queue, &record, now, &mut report)?;
        }

        Ok(report)
    }

    fn due(&self, record: &QueueRecord, now: DateTime<Utc>) -> bool {
        let Some(last) = record.last_attempt_at else {
            return true;
        };
        let delay = self.retry.delay_for(record.attempts);
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        // Overflow pushes the due time past any representable `now`.
        last.checked_add_signed(delay)
            .is_some_and(|due| now >= due)
    }

    fn attempt<Q: SaleQueue>(
        &mut self,
        queue: &mut Q,
        record: &QueueRecord,
        now: DateTime<Utc>,
        report: &mut DrainReport,
    ) -> Result<(), EngineError> {
        let id = record.intent.id;
        let receipt = record.intent.receipt_number.clone();

        // Attempts are persisted before the network round-trip so backoff
        // survives a crash mid-attempt.
        queue.mark_attempt(id, now)?;
        let attempts = record.attempts + 1;

        match self.committer.commit(&record.intent) {
            Ok(outcome) => {
                queue.complete(id)?;
                report.committed += 1;
                info!(intent = %id, receipt = %receipt, ?outcome, "sale committed");
                self.listener.sale_committed(id, &receipt);
            }
            Err(CommitError::Retryable(reason)) => {
                report.retried += 1;
                if attempts >= self.retry.report_after {
                    warn!(intent = %id, receipt = %receipt, attempts, %reason,
                        "sale still pending past retry ceiling");
                    self.listener.retries_exhausted(id, &receipt, attempts);
                } else {
                    debug!(intent = %id, attempts, %reason, "retryable failure, will back off");
                }
            }
            Err(CommitError::Fatal(reason)) => {
                queue.fail(id, &reason)?;
                report.failed += 1;
                warn!(intent = %id, receipt = %receipt, %reason, "sale failed, parked for review");
                self.listener.sale_failed(id, &receipt, &reason);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for(0), Duration::ZERO);
        assert_eq!(retry.delay_for(1), Duration::from_secs(5));
        assert_eq!(retry.delay_for(2), Duration::from_secs(10));
        assert_eq!(retry.delay_for(4), Duration::from_secs(40));
        assert_eq!(retry.delay_for(7), Duration::from_secs(300));
        assert_eq!(retry.delay_for(60), Duration::from_secs(300));
    }
}
