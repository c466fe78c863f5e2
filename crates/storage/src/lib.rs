pub mod error;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::QueueError;
pub use sqlite::SqliteQueue;
pub use traits::*;
