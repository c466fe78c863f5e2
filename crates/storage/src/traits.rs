use chrono::{DateTime, Utc};

use tillsync_core::{IntentId, SaleIntent};

use crate::error::QueueError;

/// Lifecycle state of a queued record. A committed sale has no state of
/// its own: `complete` deletes the record, so "committed" is the absence
/// of a record for an intent id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Pending,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, QueueError> {
        match s {
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            _ => Err(QueueError::Serialization(format!(
                "unknown queue status: {s}"
            ))),
        }
    }
}

/// Durable representation of a `SaleIntent` plus its retry bookkeeping.
/// `attempts` and `last_attempt_at` are persisted so backoff survives
/// restarts.
#[derive(Debug, Clone)]
pub struct QueueRecord {
    pub intent: SaleIntent,
    pub status: QueueStatus,
    pub attempts: u32,
    pub fail_reason: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Crash-surviving store of pending sale-commit intents.
///
/// Durability contract: `enqueue` must not return `Ok` until the record
/// is persisted such that a crash immediately afterwards still lets
/// `list_pending` return it after restart. Every mutation is flushed to
/// durable storage; records never exist only in volatile memory.
pub trait SaleQueue {
    fn enqueue(&mut self, intent: &SaleIntent, now: DateTime<Utc>) -> Result<(), QueueError>;

    /// Pending records in insertion order (oldest first).
    fn list_pending(&self) -> Result<Vec<QueueRecord>, QueueError>;

    /// Records parked for manual operator review.
    fn list_failed(&self) -> Result<Vec<QueueRecord>, QueueError>;

    fn get(&self, id: IntentId) -> Result<Option<QueueRecord>, QueueError>;

    /// Record the start of a remote-commit attempt: attempts += 1 and
    /// `last_attempt_at` stamped, durably, before the attempt runs.
    fn mark_attempt(&mut self, id: IntentId, now: DateTime<Utc>) -> Result<(), QueueError>;

    /// Remove a confirmed-committed record. Idempotent: completing an
    /// already-removed id is not an error.
    fn complete(&mut self, id: IntentId) -> Result<(), QueueError>;

    /// Keep the record, mark it Failed with the reason, retain attempts.
    fn fail(&mut self, id: IntentId, reason: &str) -> Result<(), QueueError>;

    fn pending_count(&self) -> Result<u64, QueueError>;
}
