use rust_decimal::{Decimal, RoundingStrategy};

/// Flat sales-tax rate applied to every sale (12%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// Round a monetary amount to whole cents.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convenience constructor for amounts expressed in cents.
pub fn cents(n: i64) -> Decimal {
    Decimal::new(n, 2)
}
