use thiserror::Error;
use tracing::debug;

use tillsync_core::SaleIntent;

use crate::remote::{DocumentStore, RemoteError, SaleDocument, StockDecrement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Sale document inserted, stock decremented.
    Applied,
    /// A sale document for this intent id already existed; nothing was
    /// re-applied. Happens when a prior attempt succeeded remotely but
    /// the local acknowledgment was lost.
    AlreadyApplied,
}

#[derive(Debug, Clone, Error)]
pub enum CommitError {
    #[error("retryable: {0}")]
    Retryable(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

/// Applies one sale-commit intent against the document store as a single
/// atomic batch: one stock decrement per line item plus the sale-record
/// insert. At-least-once delivery is turned into exactly-once
/// application by treating the store's duplicate-id rejection as
/// success.
pub struct RemoteCommitter<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> RemoteCommitter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn commit(&mut self, intent: &SaleIntent) -> Result<CommitOutcome, CommitError> {
        let sale = SaleDocument::from_intent(intent);
        let decrements: Vec<StockDecrement> = intent
            .items
            .iter()
            .map(|item| StockDecrement {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect();

        debug!(intent = %intent.id, receipt = %intent.receipt_number, "submitting sale batch");

        match self.store.apply_sale(&sale, &decrements) {
            Ok(()) => Ok(CommitOutcome::Applied),
            Err(RemoteError::DuplicateSale(_)) => {
                debug!(intent = %intent.id, "sale already recorded, treating as committed");
                Ok(CommitOutcome::AlreadyApplied)
            }
            Err(e) if e.is_retryable() => Err(CommitError::Retryable(e.to_string())),
            Err(e) => Err(CommitError::Fatal(e.to_string())),
        }
    }
}
