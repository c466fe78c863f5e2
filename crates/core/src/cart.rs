use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, VariantId};

/// One cart line. A product with variants is keyed by `(product, variant)`
/// so the same product in two variants occupies two lines; the caller
/// resolves the variant before adding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn key(&self) -> CartKey {
        (self.product_id.clone(), self.variant_id.clone())
    }
}

type CartKey = (ProductId, Option<VariantId>);

/// In-memory aggregate of the active sale. Single-writer (the checkout
/// task); never touched by the sync loop. Cleared only after an intent
/// built from it has been durably enqueued.
#[derive(Debug, Default, Clone)]
pub struct CartLedger {
    items: BTreeMap<CartKey, LineItem>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line to the cart. Re-adding the same `(product, variant)` key
    /// merges by incrementing the quantity. Zero-quantity adds are no-ops,
    /// so the ledger never holds a zero-or-negative-quantity line.
    pub fn add(&mut self, item: LineItem) {
        if item.quantity == 0 {
            return;
        }
        match self.items.get_mut(&item.key()) {
            Some(existing) => existing.quantity += item.quantity,
            None => {
                self.items.insert(item.key(), item);
            }
        }
    }

    /// Remove a line entirely. Missing keys are a no-op, not an error.
    pub fn remove(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) {
        self.items
            .remove(&(product_id.clone(), variant_id.cloned()));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.values()
    }

    /// By-value copy of the current lines, taken when an intent is built.
    /// Later cart mutations must not affect a queued intent.
    pub fn snapshot_items(&self) -> Vec<LineItem> {
        self.items.values().cloned().collect()
    }

    /// Sum of line totals before tax.
    pub fn subtotal(&self) -> Decimal {
        self.items.values().map(LineItem::line_total).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
