use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::cart::CartLedger;
use crate::error::ComposeError;
use crate::ids::{IntentId, StaffId, StoreId};
use crate::intent::{Customer, Payment, PaymentInput, SaleIntent};
use crate::money::{round_money, DEFAULT_TAX_RATE};

/// Builds sale-commit intents from the current cart, customer, and
/// tendered payment. Pure: composing an intent has no side effects, so
/// "build intent" and "commit to the durable queue" stay separable.
///
/// Store and staff ids come from the surrounding session (store
/// selection and the identity provider) and are injected at
/// construction time.
#[derive(Debug, Clone)]
pub struct SaleComposer {
    store_id: StoreId,
    staff_id: StaffId,
    tax_rate: Decimal,
}

impl SaleComposer {
    pub fn new(store_id: StoreId, staff_id: StaffId) -> Self {
        Self {
            store_id,
            staff_id,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    pub fn staff_id(&self) -> &StaffId {
        &self.staff_id
    }

    /// Validate the checkout and produce a `SaleIntent`.
    ///
    /// Fails with `EmptyCart`, `MissingPaymentMethod`, or
    /// `InsufficientPayment` before any intent exists; on success the
    /// invariant `amount_tendered >= total` holds and
    /// `change = amount_tendered - total`.
    pub fn compose(
        &self,
        cart: &CartLedger,
        customer: Customer,
        payment: PaymentInput,
        now: DateTime<Utc>,
    ) -> Result<SaleIntent, ComposeError> {
        if cart.is_empty() {
            return Err(ComposeError::EmptyCart);
        }
        let method = payment
            .method
            .ok_or(ComposeError::MissingPaymentMethod)?;

        let subtotal = cart.subtotal();
        let tax = round_money(subtotal * self.tax_rate);
        let total = subtotal + tax;
        if payment.amount_tendered < total {
            return Err(ComposeError::InsufficientPayment {
                required: total,
                tendered: payment.amount_tendered,
            });
        }

        Ok(SaleIntent {
            id: IntentId::new(),
            store_id: self.store_id.clone(),
            staff_id: self.staff_id.clone(),
            customer,
            items: cart.snapshot_items(),
            payment: Payment {
                method,
                amount_tendered: payment.amount_tendered,
                subtotal,
                tax,
                total,
                change: payment.amount_tendered - total,
            },
            receipt_number: receipt_number(now),
            created_at: now,
        })
    }
}

/// Time-derived, human-readable receipt number (`MH-YYMMDD-HHMMSS`).
/// Unique enough for display; the idempotency key is the intent id.
pub fn receipt_number(now: DateTime<Utc>) -> String {
    format!("MH-{}", now.format("%y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::LineItem;
    use crate::ids::ProductId;
    use crate::money::cents;
    use chrono::TimeZone;

    fn composer() -> SaleComposer {
        SaleComposer::new(StoreId::from("store-1"), StaffId::from("staff-1"))
    }

    fn cart_with(price_cents: i64, qty: u32) -> CartLedger {
        let mut cart = CartLedger::new();
        cart.add(LineItem {
            product_id: ProductId::from("product-a"),
            variant_id: None,
            name: "Product A".to_string(),
            unit_price: cents(price_cents),
            quantity: qty,
        });
        cart
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap()
    }

    #[test]
    fn computes_totals_and_change() {
        // 2 x 10.00 at 12% tax: subtotal 20.00, tax 2.40, total 22.40.
        let cart = cart_with(1000, 2);
        let intent = composer()
            .compose(&cart, Customer::guest(), PaymentInput::cash(cents(2500)), at())
            .unwrap();

        assert_eq!(intent.payment.subtotal, cents(2000));
        assert_eq!(intent.payment.tax, cents(240));
        assert_eq!(intent.payment.total, cents(2240));
        assert_eq!(intent.payment.change, cents(260));
        assert_eq!(intent.items.len(), 1);
        assert_eq!(intent.items[0].quantity, 2);
    }

    #[test]
    fn exact_tender_yields_zero_change() {
        let cart = cart_with(1000, 2);
        let intent = composer()
            .compose(&cart, Customer::guest(), PaymentInput::cash(cents(2240)), at())
            .unwrap();
        assert_eq!(intent.payment.change, Decimal::ZERO);
    }

    #[test]
    fn rejects_insufficient_tender() {
        let cart = cart_with(1000, 2);
        let err = composer()
            .compose(&cart, Customer::guest(), PaymentInput::cash(cents(2000)), at())
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::InsufficientPayment {
                required: cents(2240),
                tendered: cents(2000),
            }
        );
    }

    #[test]
    fn rejects_empty_cart() {
        let err = composer()
            .compose(
                &CartLedger::new(),
                Customer::guest(),
                PaymentInput::cash(cents(100)),
                at(),
            )
            .unwrap_err();
        assert_eq!(err, ComposeError::EmptyCart);
    }

    #[test]
    fn rejects_missing_payment_method() {
        let cart = cart_with(100, 1);
        let err = composer()
            .compose(
                &cart,
                Customer::guest(),
                PaymentInput {
                    method: None,
                    amount_tendered: cents(10000),
                },
                at(),
            )
            .unwrap_err();
        assert_eq!(err, ComposeError::MissingPaymentMethod);
    }

    #[test]
    fn receipt_number_is_time_derived() {
        assert_eq!(receipt_number(at()), "MH-240305-143009");
    }

    #[test]
    fn each_intent_gets_a_fresh_id() {
        let cart = cart_with(1000, 1);
        let a = composer()
            .compose(&cart, Customer::guest(), PaymentInput::cash(cents(2000)), at())
            .unwrap();
        let b = composer()
            .compose(&cart, Customer::guest(), PaymentInput::cash(cents(2000)), at())
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn intent_roundtrips_through_msgpack() {
        let cart = cart_with(1000, 2);
        let intent = composer()
            .compose(&cart, Customer::guest(), PaymentInput::cash(cents(2500)), at())
            .unwrap();
        let bytes = intent.to_msgpack().unwrap();
        assert_eq!(SaleIntent::from_msgpack(&bytes).unwrap(), intent);
    }
}
