//! Validation error type and its mapping onto the shared reject taxonomy (§7).

use starling_types::{Reject, RejectCode};
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed message: {0}")]
    BadRequest(String),

    #[error("payment required: {required}")]
    InsufficientPayment { required: u64 },

    #[error("message created_at {created_at} is outside the allowed clock skew of now ({now_ms})")]
    Stale { created_at: u64, now_ms: u64 },

    #[error("no settlement chain is supported by both sides")]
    ChainMismatch,

    #[error("sender is not in the current peer set")]
    NotPeered,

    #[error("requester did not author the message it is trying to affect")]
    Unauthorized,
}

impl ValidationError {
    /// Maps this validation failure onto the shared `RejectCode` taxonomy,
    /// the vocabulary the connector boundary and the relay write-gate speak.
    pub fn reject_code(&self) -> RejectCode {
        match self {
            Self::BadRequest(_) => RejectCode::BadRequest,
            Self::InsufficientPayment { .. } => RejectCode::InsufficientPayment,
            Self::Stale { .. } => RejectCode::BadRequest,
            Self::ChainMismatch => RejectCode::ChainMismatch,
            Self::NotPeered => RejectCode::NotPeered,
            Self::Unauthorized => RejectCode::Unauthorized,
        }
    }

    pub fn into_reject(self) -> Reject {
        let code = self.reject_code();
        let required_amount = match &self {
            Self::InsufficientPayment { required } => Some(*required),
            _ => None,
        };
        Reject { code, message: self.to_string(), required_amount }
    }
}
