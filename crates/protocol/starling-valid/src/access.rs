//! Peer-gating and deletion-authority validation (§7 `NotPeered`, `Unauthorized`).

use std::collections::HashSet;

use starling_crypto::PeerId;
use starling_types::SignedMessage;

use crate::error::{ValidationError, ValidationResult};

/// When peer gating is enabled, `author` must already be in `known_peers`.
/// Gating off (the bootstrap default) always passes — a node must be able
/// to handshake with peers it doesn't know yet.
pub fn validate_peered(author: &PeerId, known_peers: &HashSet<PeerId>, gating_enabled: bool) -> ValidationResult<()> {
    if gating_enabled && !known_peers.contains(author) {
        return Err(ValidationError::NotPeered);
    }
    Ok(())
}

/// A deletion message may only remove content authored by the same key
/// (testable property 4). The store itself scopes its `DELETE` by author,
/// so this exists to let callers upstream of the store (the payment
/// handler) reject with `Unauthorized` explicitly instead of only
/// observing a deletion that silently removed nothing.
pub fn validate_deletion_authority(deletion: &SignedMessage, target_author: &PeerId) -> ValidationResult<()> {
    if deletion.author != *target_author {
        return Err(ValidationError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> PeerId {
        let (_, pk) = starling_crypto::generate_identity();
        starling_crypto::peer_id_from_public_key(&pk)
    }

    fn deletion_from(author: PeerId) -> SignedMessage {
        let (sk, _) = starling_crypto::generate_identity();
        starling_wire::sign_message(&sk, author, 1000, 5, vec![], "".into())
    }

    #[test]
    fn gating_disabled_always_passes() {
        let author = peer();
        assert!(validate_peered(&author, &HashSet::new(), false).is_ok());
    }

    #[test]
    fn gating_enabled_rejects_unknown_peers() {
        let author = peer();
        let err = validate_peered(&author, &HashSet::new(), true);
        assert!(matches!(err, Err(ValidationError::NotPeered)));
    }

    #[test]
    fn gating_enabled_accepts_known_peers() {
        let author = peer();
        let mut known = HashSet::new();
        known.insert(author);
        assert!(validate_peered(&author, &known, true).is_ok());
    }

    #[test]
    fn deletion_by_same_author_is_authorized() {
        let author = peer();
        assert!(validate_deletion_authority(&deletion_from(author), &author).is_ok());
    }

    #[test]
    fn deletion_by_other_author_is_unauthorized() {
        let author = peer();
        let other = peer();
        let err = validate_deletion_authority(&deletion_from(other), &author);
        assert!(matches!(err, Err(ValidationError::Unauthorized)));
    }
}
