//! Cryptographic primitives for the Starling protocol.
//!
//! - **Content hashing**: SHA-256 with domain separation, used to compute
//!   canonical signed-message ids.
//! - **Identity**: Ed25519 keypair generation and PeerId derivation.
//! - **Signatures**: message signing and verification.
//! - **Sealed payloads**: X25519 + HKDF + ChaCha20-Poly1305 authenticated
//!   encryption for the handshake protocol (see [`seal`]).
//!
//! # Example
//!
//! ```
//! use starling_crypto::{generate_identity, peer_id_from_public_key, peer_id_to_string, sign, verify};
//!
//! let (private_key, public_key) = generate_identity();
//! let peer_id = peer_id_from_public_key(&public_key);
//! println!("peer id: {}", peer_id_to_string(&peer_id));
//!
//! let message = b"important message";
//! let signature = sign(&private_key, message);
//! assert!(verify(&public_key, message, &signature));
//! ```

mod error;
mod hash;
mod identity;
pub mod seal;
mod serde_impl;
mod signature;

pub use error::CryptoError;
pub use hash::{content_hash, verify_content};
pub use identity::{
    generate_identity, peer_id_from_public_key, peer_id_from_string, peer_id_to_string,
};
pub use seal::{generate_seal_keypair, SealPrivateKey, SealPublicKey};
pub use signature::{sign, verify, SignedPayload};

use ed25519_dalek::SigningKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; 32]);

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash({})", hex_string(&self.0[..8]))
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An Ed25519 private key (32 bytes). Never logged; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub(crate) fn from_signing_key(key: &SigningKey) -> Self {
        Self(key.to_bytes())
    }

    pub(crate) fn to_signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.0)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex_string(&self.0[..8]))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex_string(&self.0[..8]))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A public key (32 bytes) encoded for human-readable display and routing
/// tables. Bit-identical to the [`PublicKey`] it was derived from; see
/// [`identity`] for why this is a distinct type rather than a `Display` impl
/// on `PublicKey` itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<PublicKey> for PeerId {
    fn from(key: PublicKey) -> Self {
        PeerId(key.0)
    }
}

impl From<PeerId> for PublicKey {
    fn from(id: PeerId) -> Self {
        PublicKey(id.0)
    }
}

impl std::fmt::Debug for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PeerId({})", peer_id_to_string(self))
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", peer_id_to_string(self))
    }
}

impl AsRef<[u8]> for PeerId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Milliseconds since Unix epoch.
pub type Timestamp = u64;

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>() + ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_display_is_64_hex_chars() {
        let hash = content_hash(b"test");
        assert_eq!(format!("{}", hash).len(), 64);
    }

    #[test]
    fn peer_id_display_has_prefix() {
        let (_, public_key) = generate_identity();
        let peer_id = peer_id_from_public_key(&public_key);
        assert!(format!("{}", peer_id).starts_with("star1"));
    }

    #[test]
    fn private_key_debug_is_redacted() {
        let (private_key, _) = generate_identity();
        let debug = format!("{:?}", private_key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&format!("{:02x}", private_key.0[0])));
    }

    #[test]
    fn private_key_zeroizes() {
        use zeroize::Zeroize;
        let (mut private_key, _) = generate_identity();
        assert!(private_key.0.iter().any(|&b| b != 0));
        private_key.zeroize();
        assert!(private_key.0.iter().all(|&b| b == 0));
    }
}
