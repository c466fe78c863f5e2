use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use tillsync_core::ComposeError;
use tillsync_engine::EngineError;
use tillsync_harness::{InMemoryBackend, SyncEvent, TestTill};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

fn cents(n: i64) -> Decimal {
    Decimal::new(n, 2)
}

// ============================================================================
// Checkout: compose + durable enqueue + cart clearing
// ============================================================================

#[test]
fn checkout_queues_sale_and_clears_cart() -> Result<(), Box<dyn std::error::Error>> {
    let backend = InMemoryBackend::new().with_product("product-a", 10);
    let mut till = TestTill::new(backend)?;

    // 2 x 10.00 at 12% tax: subtotal 20.00, tax 2.40, total 22.40.
    till.add("product-a", "Product A", 1000, 2);
    let receipt = till.checkout_cash(2500, at(0))?;

    assert_eq!(receipt.total, cents(2240));
    assert_eq!(receipt.change, cents(260));
    assert!(receipt.receipt_number.starts_with("MH-"));

    // Cart cleared only after the intent is durably queued.
    assert!(till.register.cart().is_empty());
    let pending = till.pending()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].intent.id, receipt.intent_id);
    assert_eq!(pending[0].intent.payment.subtotal, cents(2000));
    assert_eq!(pending[0].intent.payment.tax, cents(240));

    // Queued is not applied: the remote store is untouched until a drain.
    assert_eq!(till.stock("product-a"), Some(10));
    assert_eq!(till.sale_count(), 0);
    Ok(())
}

#[test]
fn failed_checkout_leaves_cart_and_queue_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let backend = InMemoryBackend::new().with_product("product-a", 10);
    let mut till = TestTill::new(backend)?;

    till.add("product-a", "Product A", 1000, 2);
    let err = till.checkout_cash(2000, at(0)).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Compose(ComposeError::InsufficientPayment { .. })
    ));

    // The operator can fix the tender and retry: nothing was lost.
    assert_eq!(till.register.cart().len(), 1);
    assert_eq!(till.pending()?.len(), 0);
    Ok(())
}

#[test]
fn empty_cart_checkout_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut till = TestTill::new(InMemoryBackend::new())?;
    let err = till.checkout_cash(1000, at(0)).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Compose(ComposeError::EmptyCart)
    ));
    Ok(())
}

#[test]
fn drain_applies_queued_sale() -> Result<(), Box<dyn std::error::Error>> {
    let backend = InMemoryBackend::new().with_product("product-a", 10);
    let mut till = TestTill::new(backend)?;

    till.add("product-a", "Product A", 1000, 2);
    let receipt = till.checkout_cash(2500, at(0))?;

    let report = till.drain(at(1))?;
    assert_eq!(report.committed, 1);

    assert_eq!(till.stock("product-a"), Some(8));
    assert_eq!(till.sale_count(), 1);
    let sale = till
        .coordinator
        .store()
        .sale(receipt.intent_id)
        .expect("sale recorded");
    assert_eq!(sale.document.payment.total, cents(2240));
    assert_eq!(sale.document.status, "completed");

    // Queue record is gone and the listener was told.
    assert_eq!(till.pending()?.len(), 0);
    assert_eq!(
        till.events(),
        &[SyncEvent::Committed {
            id: receipt.intent_id,
            receipt: receipt.receipt_number.clone(),
        }][..]
    );
    Ok(())
}

#[test]
fn variant_lines_are_kept_separate_through_commit() -> Result<(), Box<dyn std::error::Error>> {
    let backend = InMemoryBackend::new().with_product("coffee", 20);
    let mut till = TestTill::new(backend)?;

    till.register.add_item(tillsync_core::LineItem {
        product_id: "coffee".into(),
        variant_id: Some("large".into()),
        name: "Coffee (L)".to_string(),
        unit_price: cents(450),
        quantity: 1,
    });
    till.register.add_item(tillsync_core::LineItem {
        product_id: "coffee".into(),
        variant_id: Some("small".into()),
        name: "Coffee (S)".to_string(),
        unit_price: cents(300),
        quantity: 2,
    });

    till.checkout_cash(2000, at(0))?;
    till.drain(at(1))?;

    // Two lines, one product: stock decremented by the summed quantity.
    assert_eq!(till.stock("coffee"), Some(17));
    assert_eq!(till.sale_count(), 1);
    Ok(())
}
