pub mod backend;
pub mod connectivity;
pub mod listener;
pub mod till;

pub use backend::{InMemoryBackend, RecordedSale};
pub use connectivity::{ScriptedConnectivity, SharedConnectivity};
pub use listener::{RecordingListener, SyncEvent};
pub use till::TestTill;
