use tillsync_core::IntentId;
use tillsync_engine::CommitListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Committed { id: IntentId, receipt: String },
    Failed { id: IntentId, receipt: String, reason: String },
    RetriesExhausted { id: IntentId, receipt: String, attempts: u32 },
}

/// Listener that records every notification for assertion.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<SyncEvent>,
}

impl RecordingListener {
    pub fn committed_receipts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::Committed { receipt, .. } => Some(receipt.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl CommitListener for RecordingListener {
    fn sale_committed(&mut self, id: IntentId, receipt: &str) {
        self.events.push(SyncEvent::Committed {
            id,
            receipt: receipt.to_string(),
        });
    }

    fn sale_failed(&mut self, id: IntentId, receipt: &str, reason: &str) {
        self.events.push(SyncEvent::Failed {
            id,
            receipt: receipt.to_string(),
            reason: reason.to_string(),
        });
    }

    fn retries_exhausted(&mut self, id: IntentId, receipt: &str, attempts: u32) {
        self.events.push(SyncEvent::RetriesExhausted {
            id,
            receipt: receipt.to_string(),
            attempts,
        });
    }
}
