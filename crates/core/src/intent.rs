use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::ids::{IntentId, StaffId, StoreId};

/// Customer attribution for a sale. Walk-ins default to "Guest".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

impl Customer {
    pub fn guest() -> Self {
        Self {
            name: "Guest".to_string(),
            phone: String::new(),
        }
    }

    /// Trim whitespace; a blank name becomes "Guest".
    pub fn normalized(name: &str, phone: &str) -> Self {
        let name = name.trim();
        Self {
            name: if name.is_empty() {
                "Guest".to_string()
            } else {
                name.to_string()
            },
            phone: phone.trim().to_string(),
        }
    }
}

impl Default for Customer {
    fn default() -> Self {
        Self::guest()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// What the operator keys in at checkout, before validation.
#[derive(Debug, Clone, Copy)]
pub struct PaymentInput {
    pub method: Option<PaymentMethod>,
    pub amount_tendered: Decimal,
}

impl PaymentInput {
    pub fn cash(amount_tendered: Decimal) -> Self {
        Self {
            method: Some(PaymentMethod::Cash),
            amount_tendered,
        }
    }
}

/// Validated, fully computed payment figures carried in the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount_tendered: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub change: Decimal,
}

/// The unit of work and idempotency boundary: a durable, replayable
/// description of a completed checkout awaiting application to the
/// backing store. Items are a by-value snapshot; the intent never
/// observes later cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleIntent {
    pub id: IntentId,
    pub store_id: StoreId,
    pub staff_id: StaffId,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub payment: Payment,
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
}

impl SaleIntent {
    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(self)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_customer_name_normalizes_to_guest() {
        let c = Customer::normalized("   ", " 555-0100 ");
        assert_eq!(c.name, "Guest");
        assert_eq!(c.phone, "555-0100");
    }
}
