use serde::{Deserialize, Serialize};
use thiserror::Error;

use tillsync_core::{Customer, IntentId, LineItem, Payment, ProductId, SaleIntent, StaffId, StoreId};

/// Wire shape of a committed sale as written to the document store,
/// keyed by the intent id so re-commits of the same intent are
/// detectable. The store assigns `createdAt` server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDocument {
    pub intent_id: IntentId,
    pub store_id: StoreId,
    pub staff_id: StaffId,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub payment: Payment,
    pub receipt_number: String,
    pub status: String,
}

impl SaleDocument {
    pub fn from_intent(intent: &SaleIntent) -> Self {
        Self {
            intent_id: intent.id,
            store_id: intent.store_id.clone(),
            staff_id: intent.staff_id.clone(),
            customer: intent.customer.clone(),
            items: intent.items.clone(),
            payment: intent.payment.clone(),
            receipt_number: intent.receipt_number.clone(),
            status: "completed".to_string(),
        }
    }
}

/// Unconditional stock decrement for one line item. Applied as an atomic
/// server-side increment-by-negative-value, never read-modify-write, so
/// concurrent sales of the same product cannot lose updates. Stock may
/// go negative; there is no reservation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("rejected by store: {0}")]
    Rejected(String),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("sale already recorded for intent {0}")]
    DuplicateSale(IntentId),
}

impl RemoteError {
    /// Transport and availability faults are worth retrying; everything
    /// else reflects a request the store will never accept.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// The hosted document store, as seen by the committer. Implementations
/// must apply `apply_sale` all-or-nothing: either the sale document is
/// inserted and every decrement applied, or nothing is observable. The
/// store enforces at most one sale document per intent id and returns
/// `DuplicateSale` on re-delivery.
pub trait DocumentStore {
    fn apply_sale(
        &mut self,
        sale: &SaleDocument,
        decrements: &[StockDecrement],
    ) -> Result<(), RemoteError>;
}
