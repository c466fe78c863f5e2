pub mod committer;
pub mod coordinator;
pub mod error;
pub mod remote;

pub use committer::{CommitError, CommitOutcome, RemoteCommitter};
pub use coordinator::{
    CommitListener, Connectivity, DrainReport, NoListener, RetryPolicy, SyncCoordinator,
    SyncSignal,
};
pub use error::EngineError;
pub use remote::{DocumentStore, RemoteError, SaleDocument, StockDecrement};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use tillsync_core::{
    CartLedger, Customer, IntentId, LineItem, PaymentInput, ProductId, SaleComposer, VariantId,
};
use tillsync_storage::SaleQueue;

/// What checkout hands back to the operator: the sale is durably
/// *queued*, not yet applied to the backing store. Confirmation arrives
/// later through the sync coordinator's listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub intent_id: IntentId,
    pub receipt_number: String,
    pub total: Decimal,
    pub change: Decimal,
}

/// The cashier-facing checkout surface: owns the cart and the durable
/// queue, composes intents, and guarantees the cart is cleared only
/// after the intent has been durably enqueued.
pub struct Register<Q: SaleQueue> {
    cart: CartLedger,
    composer: SaleComposer,
    queue: Q,
}

impl<Q: SaleQueue> Register<Q> {
    pub fn new(composer: SaleComposer, queue: Q) -> Self {
        Self {
            cart: CartLedger::new(),
            composer,
            queue,
        }
    }

    pub fn cart(&self) -> &CartLedger {
        &self.cart
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.cart.add(item);
    }

    pub fn remove_item(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) {
        self.cart.remove(product_id, variant_id);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    /// Complete the sale: validate and compose an intent, enqueue it
    /// durably, then clear the cart. If composition or the durable write
    /// fails the cart is left untouched, so nothing is lost.
    pub fn checkout(
        &mut self,
        customer: Customer,
        payment: PaymentInput,
        now: DateTime<Utc>,
    ) -> Result<CheckoutReceipt, EngineError> {
        let intent = self.composer.compose(&self.cart, customer, payment, now)?;
        self.queue.enqueue(&intent, now)?;
        self.cart.clear();

        info!(intent = %intent.id, receipt = %intent.receipt_number,
            total = %intent.payment.total, "sale queued");

        Ok(CheckoutReceipt {
            intent_id: intent.id,
            receipt_number: intent.receipt_number,
            total: intent.payment.total,
            change: intent.payment.change,
        })
    }
}
