pub mod cart;
pub mod compose;
pub mod error;
pub mod ids;
pub mod intent;
pub mod money;

pub use cart::{CartLedger, LineItem};
pub use compose::SaleComposer;
pub use error::ComposeError;
pub use ids::*;
pub use intent::{Customer, Payment, PaymentInput, PaymentMethod, SaleIntent};
