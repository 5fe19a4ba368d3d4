//! Cross-cutting validation rules shared across components (§7, §8):
//! signature/freshness checks, payment-amount checks, chain-intersection
//! checks, and peer-gating/deletion-authority checks, each mapping onto the
//! shared [`starling_types::RejectCode`] taxonomy at the boundary that needs
//! it (the relay write gate, the payment handler, the handshake responder).

mod access;
mod chain;
mod error;
mod message;
mod payment;

pub use access::{validate_deletion_authority, validate_peered};
pub use chain::intersect_chains;
pub use error::{ValidationError, ValidationResult};
pub use message::{validate_fresh_signed, validate_freshness, validate_signature};
pub use payment::validate_payment;
