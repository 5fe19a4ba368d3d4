//! Canonical encoding, id computation, and signing for `SignedMessage` (C1).
//!
//! The canonical encoding is a JSON array of `[author, created_at, kind,
//! tags, content]` — tags preserve their original nesting and element
//! order, never re-sorted. `serde_json` emits array elements positionally,
//! so no key-ordering ambiguity exists the way it would for a JSON object.

use serde::Serialize;
use sha2::{Digest, Sha256};
use starling_crypto::{Hash, PeerId, PrivateKey, PublicKey, Signature, Timestamp};
use starling_types::{SignedMessage, Tag};

use crate::error::VerifyError;

#[derive(Serialize)]
struct Canonical<'a> {
    author: PeerId,
    created_at: Timestamp,
    kind: u16,
    tags: &'a [Tag],
    content: &'a str,
}

/// Bytes hashed (and signed) to produce a message's `id`.
pub fn canonical_bytes(
    author: PeerId,
    created_at: Timestamp,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> Vec<u8> {
    let canonical = Canonical {
        author,
        created_at,
        kind,
        tags,
        content,
    };
    // A `Vec<Tag>` (array of arrays) serializes positionally; there is no
    // object whose key order could vary between encodes.
    serde_json::to_vec(&canonical).expect("canonical fields always serialize")
}

/// `H(canonical(author, created_at, kind, tags, content))`.
pub fn compute_id(author: PeerId, created_at: Timestamp, kind: u16, tags: &[Tag], content: &str) -> Hash {
    let bytes = canonical_bytes(author, created_at, kind, tags, content);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Hash(hasher.finalize().into())
}

/// Build and sign a new message. `author` is derived from `private_key`'s
/// matching public key by the caller.
pub fn sign_message(
    private_key: &PrivateKey,
    author: PeerId,
    created_at: Timestamp,
    kind: u16,
    tags: Vec<Tag>,
    content: String,
) -> SignedMessage {
    let id = compute_id(author, created_at, kind, &tags, &content);
    let signature = starling_crypto::sign(private_key, id.as_ref());
    SignedMessage {
        id,
        author,
        created_at,
        kind,
        tags,
        content,
        signature,
    }
}

/// Recompute `msg.id` and verify `msg.signature` against `msg.author`.
pub fn verify(msg: &SignedMessage) -> Result<(), VerifyError> {
    let expected_id = compute_id(msg.author, msg.created_at, msg.kind, &msg.tags, &msg.content);
    if expected_id != msg.id {
        return Err(VerifyError::BadId);
    }
    let public_key: PublicKey = msg.author.into();
    if !starling_crypto::verify(&public_key, msg.id.as_ref(), &msg.signature) {
        return Err(VerifyError::BadSignature);
    }
    Ok(())
}

/// Recompute the signature over `id` without checking it against `msg.id`
/// first; used when constructing a fresh signature for re-signing flows.
pub fn sign_id(private_key: &PrivateKey, id: &Hash) -> Signature {
    starling_crypto::sign(private_key, id.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> (PrivateKey, PeerId) {
        let (sk, pk) = starling_crypto::generate_identity();
        (sk, starling_crypto::peer_id_from_public_key(&pk))
    }

    #[test]
    fn sign_then_verify_ok() {
        let (sk, author) = identity();
        let msg = sign_message(&sk, author, 1000, 1, vec![], "hello".into());
        assert!(verify(&msg).is_ok());
    }

    #[test]
    fn mutated_content_invalidates_id() {
        let (sk, author) = identity();
        let mut msg = sign_message(&sk, author, 1000, 1, vec![], "hello".into());
        msg.content = "goodbye".into();
        assert!(matches!(verify(&msg), Err(VerifyError::BadId)));
    }

    #[test]
    fn tags_are_not_reordered() {
        let (sk, author) = identity();
        let tags = vec![vec!["d".to_string(), "x".to_string()], vec!["p".to_string(), "y".to_string()]];
        let msg = sign_message(&sk, author, 1000, 1, tags.clone(), "c".into());
        assert_eq!(msg.tags, tags);
        assert!(verify(&msg).is_ok());
    }

    #[test]
    fn wrong_author_fails_signature_check() {
        let (sk, _author) = identity();
        let (_, other_author) = identity();
        // Forge a message claiming to be authored by `other_author` but
        // signed by `sk` (whose public key does not match).
        let id = compute_id(other_author, 1000, 1, &[], "x");
        let signature = starling_crypto::sign(&sk, id.as_ref());
        let forged = SignedMessage {
            id,
            author: other_author,
            created_at: 1000,
            kind: 1,
            tags: vec![],
            content: "x".into(),
            signature,
        };
        assert!(matches!(verify(&forged), Err(VerifyError::BadSignature)));
    }
}
