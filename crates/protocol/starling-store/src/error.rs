//! Error types for the event store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored row failed to decode: {0}")]
    Corrupt(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        StoreError::Corrupt(msg.into())
    }

    /// Whether retrying the same operation might succeed without
    /// intervention (a lock contention blip, a momentarily busy database).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::LockPoisoned(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_constructor_wraps_message() {
        let err = StoreError::corrupt("bad tags json");
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert!(err.to_string().contains("bad tags json"));
    }
}
