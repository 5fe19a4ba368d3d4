//! Signature and freshness validation for signed messages (§4.1, §4.5, §7).

use starling_types::{constants, SignedMessage};

use crate::error::{ValidationError, ValidationResult};

/// Recomputes `msg.id` and checks `msg.signature` against `msg.author`.
pub fn validate_signature(msg: &SignedMessage) -> ValidationResult<()> {
    starling_wire::verify(msg).map_err(|e| ValidationError::BadRequest(e.to_string()))
}

/// A message's `created_at` must sit within [`constants::MAX_CLOCK_SKEW_MS`]
/// of `now_ms` in either direction. Used for ephemeral request/response
/// kinds (handshake) where a stale or far-future timestamp signals a replay
/// or a clock problem rather than a legitimate message.
pub fn validate_freshness(created_at: u64, now_ms: u64) -> ValidationResult<()> {
    if created_at.abs_diff(now_ms) > constants::MAX_CLOCK_SKEW_MS {
        return Err(ValidationError::Stale { created_at, now_ms });
    }
    Ok(())
}

/// Signature plus freshness in one call, for kinds where both apply.
pub fn validate_fresh_signed(msg: &SignedMessage, now_ms: u64) -> ValidationResult<()> {
    validate_signature(msg)?;
    validate_freshness(msg.created_at, now_ms)
}
