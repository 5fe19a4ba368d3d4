//! Error types for the paid-relay engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("event store error: {0}")]
    Store(#[from] starling_store::StoreError),

    #[error("malformed gossip message: {0}")]
    Decode(#[from] starling_wire::DecodeError),

    #[error("too many concurrent subscriptions on this connection")]
    TooManySubscriptions,

    #[error("too many filters in one subscription")]
    TooManyFilters,

    #[error("unknown subscription id {0:?}")]
    UnknownSubscription(String),
}
