use rust_decimal::Decimal;
use thiserror::Error;

/// Checkout-time validation failures. These are surfaced synchronously to
/// the operator and never reach the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("payment method is required")]
    MissingPaymentMethod,

    #[error("insufficient payment: {tendered} tendered, {required} required")]
    InsufficientPayment { required: Decimal, tendered: Decimal },
}
