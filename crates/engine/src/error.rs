use thiserror::Error;
use tillsync_core::ComposeError;
use tillsync_storage::QueueError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
}
