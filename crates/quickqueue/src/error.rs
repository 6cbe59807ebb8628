use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("null item offered to queue")]
    NullItem,

    #[error("invalid capacity {capacity}: a ring needs at least 2 slots")]
    InvalidCapacity { capacity: usize },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
