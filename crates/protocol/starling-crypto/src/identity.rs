//! Identity management: Ed25519 keypair generation and PeerId encoding.
//!
//! A `PeerId` is not a hash of the public key: it wraps the same 32 bytes as
//! the `PublicKey` it was derived from, so a signed message's `author` can be
//! converted straight back to the key that must verify its signature, with
//! no directory lookup in between. It exists as a distinct type purely for
//! its human-readable `star1...` form — the wire and storage layers are free
//! to use either, and [`PeerId`]/[`PublicKey`] convert between each other for
//! free via `From`.
//!
//! Human-readable format: `star1` + base58(public key bytes)

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use crate::error::CryptoError;
use crate::{PeerId, PrivateKey, PublicKey};

const PEER_ID_PREFIX: &str = "star1";

/// Generate a new Ed25519 identity (keypair) using the OS CSPRNG.
pub fn generate_identity() -> (PrivateKey, PublicKey) {
    let mut csprng = OsRng;
    let signing_key = SigningKey::generate(&mut csprng);
    let verifying_key = signing_key.verifying_key();

    let private_key = PrivateKey::from_signing_key(&signing_key);
    let public_key = PublicKey(verifying_key.to_bytes());

    (private_key, public_key)
}

/// Encode a public key as its PeerId (the same bytes, a different type).
pub fn peer_id_from_public_key(public_key: &PublicKey) -> PeerId {
    PeerId(public_key.0)
}

/// Convert a PeerId to its human-readable `star1...` form.
pub fn peer_id_to_string(peer_id: &PeerId) -> String {
    format!("{}{}", PEER_ID_PREFIX, bs58::encode(&peer_id.0).into_string())
}

/// Parse a human-readable PeerId string.
pub fn peer_id_from_string(s: &str) -> Result<PeerId, CryptoError> {
    if !s.starts_with(PEER_ID_PREFIX) {
        let prefix = if s.len() >= PEER_ID_PREFIX.len() {
            &s[..PEER_ID_PREFIX.len()]
        } else {
            s
        };
        return Err(CryptoError::InvalidPeerIdPrefix(prefix.to_string()));
    }

    let base58_part = &s[PEER_ID_PREFIX.len()..];
    if base58_part.is_empty() {
        return Err(CryptoError::InvalidPeerIdFormat(
            "missing data after prefix".to_string(),
        ));
    }

    let decoded = bs58::decode(base58_part)
        .into_vec()
        .map_err(|e| CryptoError::InvalidBase58(e.to_string()))?;

    if decoded.len() != 32 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 32,
            actual: decoded.len(),
        });
    }

    let mut peer_id = [0u8; 32];
    peer_id.copy_from_slice(&decoded);
    Ok(PeerId(peer_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_32_byte_public_key() {
        let (_, public_key) = generate_identity();
        assert_eq!(public_key.0.len(), 32);
    }

    #[test]
    fn peer_id_deterministic() {
        let (_, public_key) = generate_identity();
        assert_eq!(
            peer_id_from_public_key(&public_key).0,
            peer_id_from_public_key(&public_key).0
        );
    }

    #[test]
    fn peer_id_roundtrip() {
        let (_, public_key) = generate_identity();
        let peer_id = peer_id_from_public_key(&public_key);
        let encoded = peer_id_to_string(&peer_id);
        let decoded = peer_id_from_string(&encoded).unwrap();
        assert_eq!(peer_id.0, decoded.0);
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(matches!(
            peer_id_from_string("xyz1abc"),
            Err(CryptoError::InvalidPeerIdPrefix(_))
        ));
    }

    #[test]
    fn peer_id_converts_back_to_the_same_public_key() {
        let (_, public_key) = generate_identity();
        let peer_id = peer_id_from_public_key(&public_key);
        let recovered: PublicKey = peer_id.into();
        assert_eq!(recovered, public_key);
    }
}
