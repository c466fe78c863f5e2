use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};

use tillsync_core::{IntentId, ProductId};
use tillsync_engine::{DocumentStore, RemoteError, SaleDocument, StockDecrement};

/// A sale as recorded server-side, with the store-assigned timestamp.
#[derive(Debug, Clone)]
pub struct RecordedSale {
    pub document: SaleDocument,
    pub created_at: DateTime<Utc>,
}

/// In-memory stand-in for the hosted document store. Honors the two
/// contracts the committer relies on: `apply_sale` is all-or-nothing
/// (validation happens before any mutation), and at most one sale
/// document exists per intent id.
///
/// Failures are scripted: each queued `RemoteError` is returned by the
/// next `apply_sale` call without touching state.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    products: BTreeMap<ProductId, i64>,
    sales: BTreeMap<IntentId, RecordedSale>,
    script: VecDeque<RemoteError>,
    apply_calls: u64,
    clock_ms: i64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product_id: impl Into<String>, stock: i64) -> Self {
        self.products.insert(ProductId::new(product_id), stock);
        self
    }

    pub fn stock(&self, product_id: &ProductId) -> Option<i64> {
        self.products.get(product_id).copied()
    }

    pub fn sale(&self, intent_id: IntentId) -> Option<&RecordedSale> {
        self.sales.get(&intent_id)
    }

    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    /// Number of `apply_sale` calls that reached the backend, including
    /// scripted failures.
    pub fn apply_calls(&self) -> u64 {
        self.apply_calls
    }

    /// Script the next `apply_sale` call to fail with `error`.
    pub fn fail_next(&mut self, error: RemoteError) {
        self.script.push_back(error);
    }

    /// Script the next `times` calls to fail with clones of `error`.
    pub fn fail_next_times(&mut self, times: usize, error: RemoteError) {
        for _ in 0..times {
            self.script.push_back(error.clone());
        }
    }
}

impl DocumentStore for InMemoryBackend {
    fn apply_sale(
        &mut self,
        sale: &SaleDocument,
        decrements: &[StockDecrement],
    ) -> Result<(), RemoteError> {
        self.apply_calls += 1;

        if let Some(error) = self.script.pop_front() {
            return Err(error);
        }

        // Validate the whole batch before mutating anything, so a
        // rejected batch leaves no partial application behind.
        if self.sales.contains_key(&sale.intent_id) {
            return Err(RemoteError::DuplicateSale(sale.intent_id));
        }
        for decrement in decrements {
            if !self.products.contains_key(&decrement.product_id) {
                return Err(RemoteError::UnknownProduct(decrement.product_id.clone()));
            }
        }

        for decrement in decrements {
            if let Some(stock) = self.products.get_mut(&decrement.product_id) {
                *stock -= i64::from(decrement.quantity);
            }
        }
        self.clock_ms += 1;
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.clock_ms)
            .unwrap_or_default();
        self.sales.insert(
            sale.intent_id,
            RecordedSale {
                document: sale.clone(),
                created_at,
            },
        );
        Ok(())
    }
}
