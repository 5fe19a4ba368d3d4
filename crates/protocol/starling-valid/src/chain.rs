//! Settlement-chain negotiation validation (§4.5 chain negotiation, §7 `ChainMismatch`).

use starling_types::ChainId;

use crate::error::{ValidationError, ValidationResult};

/// `C = requester.supportedChains ∩ self.supportedChains`, preserving the
/// requester's order (documented as most-preferred first) so later
/// preference-ordering steps can just take `C`'s first element.
pub fn intersect_chains(requester: &[ChainId], responder: &[ChainId]) -> ValidationResult<Vec<ChainId>> {
    let shared: Vec<ChainId> = requester.iter().filter(|c| responder.contains(c)).cloned().collect();
    if shared.is_empty() {
        return Err(ValidationError::ChainMismatch);
    }
    Ok(shared)
}
