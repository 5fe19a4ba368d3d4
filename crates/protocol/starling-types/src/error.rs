//! The protocol-wide error taxonomy (§7).
//!
//! Individual crates define their own `thiserror` error enums for
//! crate-local failure modes; at the boundaries named in the spec (the
//! payment handler, the connector client) those errors are mapped onto
//! this shared taxonomy so the connector and the relay write-gate can speak
//! a single vocabulary of reject reasons.

use thiserror::Error;

/// ILP-style reject code a boundary reports upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RejectCode {
    /// `F00` — malformed envelope, bad signature, unknown kind with no handler.
    BadRequest,
    /// `F06` — amount below required; `required` metadata lets the sender retry.
    InsufficientPayment,
    /// `T00` — transient: channel-open failure, store I/O error, connector unreachable.
    Internal,
    /// `T00` — packet expiry exceeded.
    Timeout,
    /// Handshake/application message received from a key not in the peer set.
    NotPeered,
    /// No intersection in supported settlement chains.
    ChainMismatch,
    /// Deletion referencing a message the requester did not author.
    Unauthorized,
}

impl RejectCode {
    /// The wire-level short code, matching the spec's `F00`/`F06`/`T00` naming.
    pub fn wire_code(self) -> &'static str {
        match self {
            Self::BadRequest => "F00",
            Self::InsufficientPayment => "F06",
            Self::Internal => "T00",
            Self::Timeout => "T00",
            Self::NotPeered => "F00",
            Self::ChainMismatch => "F00",
            Self::Unauthorized => "F00",
        }
    }
}

/// A reject decision with its reason and optional machine-readable metadata
/// (e.g. `required` on `InsufficientPayment`).
#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct Reject {
    pub code: RejectCode,
    pub message: String,
    pub required_amount: Option<u64>,
}

impl Reject {
    pub fn new(code: RejectCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            required_amount: None,
        }
    }

    pub fn insufficient_payment(required: u64) -> Self {
        Self {
            code: RejectCode::InsufficientPayment,
            message: format!("payment-required: {required}"),
            required_amount: Some(required),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(RejectCode::BadRequest, reason)
    }
}
