//! Test keypairs and signed message fixtures.

use starling_crypto::{PeerId, PrivateKey, PublicKey};
use starling_types::{SignedMessage, Tag};

/// Generate a fresh keypair and its derived peer id.
pub fn test_keypair() -> (PrivateKey, PublicKey, PeerId) {
    let (private_key, public_key) = starling_crypto::generate_identity();
    let peer = starling_crypto::peer_id_from_public_key(&public_key);
    (private_key, public_key, peer)
}

/// Sign a plain-content test message of the given `kind` authored by a
/// freshly generated identity, timestamped at `created_at`.
pub fn signed_message(kind: u16, created_at: u64, tags: Vec<Tag>, content: &str) -> SignedMessage {
    let (sk, _pk, author) = test_keypair();
    starling_wire::sign_message(&sk, author, created_at, kind, tags, content.to_string())
}

/// Sign a message on behalf of a caller-supplied identity, for tests that
/// need several messages from the same author.
pub fn signed_message_from(
    private_key: &PrivateKey,
    author: PeerId,
    kind: u16,
    created_at: u64,
    tags: Vec<Tag>,
    content: &str,
) -> SignedMessage {
    starling_wire::sign_message(private_key, author, created_at, kind, tags, content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_peer_id_matches_public_key() {
        let (_, pk, peer) = test_keypair();
        assert_eq!(peer, starling_crypto::peer_id_from_public_key(&pk));
    }

    #[test]
    fn signed_message_verifies() {
        let msg = signed_message(1, 1_000, vec![], "hello");
        assert!(starling_wire::verify(&msg).is_ok());
    }

    #[test]
    fn signed_message_from_shares_author() {
        let (sk, _pk, author) = test_keypair();
        let a = signed_message_from(&sk, author, 1, 1_000, vec![], "a");
        let b = signed_message_from(&sk, author, 1, 1_001, vec![], "b");
        assert_eq!(a.author, author);
        assert_eq!(b.author, author);
        assert_ne!(a.id, b.id);
    }
}
