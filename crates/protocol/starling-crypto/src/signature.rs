//! Signing and verification of signed-message ids.
//!
//! All protocol messages are signed over the hash of their canonical bytes:
//! ```text
//! signature = Ed25519_Sign(private_key, H(canonical_bytes))
//! ```
//!
//! This module signs/verifies arbitrary byte strings; callers (the wire codec)
//! are responsible for producing the canonical bytes to sign.

use ed25519_dalek::{Signature as DalekSignature, Signer, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::{PeerId, PrivateKey, PublicKey, Signature};

/// Sign a message: hash it, then sign the hash.
pub fn sign(private_key: &PrivateKey, message: &[u8]) -> Signature {
    let mut hasher = Sha256::new();
    hasher.update(message);
    let message_hash: [u8; 32] = hasher.finalize().into();

    let signing_key = private_key.to_signing_key();
    let sig: DalekSignature = signing_key.sign(&message_hash);
    Signature(sig.to_bytes())
}

/// Verify a signature against a public key and message.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(message);
    let message_hash: [u8; 32] = hasher.finalize().into();

    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let sig = DalekSignature::from_bytes(&signature.0);

    verifying_key.verify(&message_hash, &sig).is_ok()
}

/// A payload together with the signer's identity and signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub payload: Vec<u8>,
    pub signer: PeerId,
    pub signature: Signature,
}

impl SignedPayload {
    pub fn new(private_key: &PrivateKey, signer: PeerId, payload: Vec<u8>) -> Self {
        let signature = sign(private_key, &payload);
        Self {
            payload,
            signer,
            signature,
        }
    }

    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(public_key, &self.payload, &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_identity, peer_id_from_public_key};

    #[test]
    fn sign_then_verify_ok() {
        let (sk, pk) = generate_identity();
        let sig = sign(&sk, b"test message");
        assert!(verify(&pk, b"test message", &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let (sk1, _) = generate_identity();
        let (_, pk2) = generate_identity();
        let sig = sign(&sk1, b"test message");
        assert!(!verify(&pk2, b"test message", &sig));
    }

    #[test]
    fn tampered_message_fails() {
        let (sk, pk) = generate_identity();
        let sig = sign(&sk, b"test message");
        assert!(!verify(&pk, b"different message", &sig));
    }

    #[test]
    fn signed_payload_roundtrip() {
        let (sk, pk) = generate_identity();
        let peer_id = peer_id_from_public_key(&pk);
        let signed = SignedPayload::new(&sk, peer_id, b"payload".to_vec());
        assert!(signed.verify(&pk));
    }
}
