//! Authenticated asymmetric encryption for handshake payloads.
//!
//! Treated as an opaque, pluggable primitive: X25519 (ECDH) for key agreement,
//! HKDF-SHA256 for key derivation, ChaCha20-Poly1305 for the authenticated
//! cipher. Callers never touch these primitives directly, only `seal`/`open`.
//!
//! The handshake uses a dedicated encryption keypair distinct from the
//! Ed25519 signing identity, rather than converting the Edwards key into
//! Montgomery form. A peer record carries both public keys.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

const HKDF_INFO: &[u8] = b"starling-handshake-v1";
const NONCE_LEN: usize = 12;

/// A private X25519 key used only for handshake encryption.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SealPrivateKey([u8; 32]);

impl SealPrivateKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn to_static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

impl std::fmt::Debug for SealPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealPrivateKey([REDACTED])")
    }
}

/// A public X25519 key advertised in a peer record for handshake encryption.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SealPublicKey(pub [u8; 32]);

impl SealPublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn to_dalek(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl std::fmt::Debug for SealPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealPublicKey({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Generate a fresh handshake encryption keypair.
pub fn generate_seal_keypair() -> (SealPrivateKey, SealPublicKey) {
    let secret = StaticSecret::random_from_rng(rand::rngs::OsRng);
    let public = X25519PublicKey::from(&secret);
    (SealPrivateKey(secret.to_bytes()), SealPublicKey(public.to_bytes()))
}

fn derive_key(self_priv: &SealPrivateKey, peer_pub: &SealPublicKey) -> [u8; 32] {
    let shared = self_priv.to_static_secret().diffie_hellman(&peer_pub.to_dalek());
    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .expect("32 is a valid HKDF-SHA256 output length");
    okm
}

/// Encrypt `plaintext` so only the holder of `peer_pub`'s matching private
/// key can read it. Output is `nonce || ciphertext`.
pub fn seal(self_priv: &SealPrivateKey, peer_pub: &SealPublicKey, plaintext: &[u8]) -> Vec<u8> {
    let key = derive_key(self_priv, peer_pub);
    let cipher = ChaCha20Poly1305::new((&key).into());
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .expect("ChaCha20Poly1305 encryption over a bounded plaintext cannot fail");

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypt a payload produced by `seal` addressed to `self_priv` from `peer_pub`.
pub fn open(
    self_priv: &SealPrivateKey,
    peer_pub: &SealPublicKey,
    sealed: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_LEN {
        return Err(CryptoError::SealOpenFailed);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let key = derive_key(self_priv, peer_pub);
    let cipher = ChaCha20Poly1305::new((&key).into());
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::SealOpenFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let (a_priv, a_pub) = generate_seal_keypair();
        let (b_priv, b_pub) = generate_seal_keypair();

        let sealed = seal(&a_priv, &b_pub, b"handshake request payload");
        let opened = open(&b_priv, &a_pub, &sealed).unwrap();
        assert_eq!(opened, b"handshake request payload");
    }

    #[test]
    fn wrong_recipient_cannot_open() {
        let (a_priv, _a_pub) = generate_seal_keypair();
        let (_b_priv, b_pub) = generate_seal_keypair();
        let (c_priv, _c_pub) = generate_seal_keypair();

        let sealed = seal(&a_priv, &b_pub, b"secret");
        // c's key does not match the shared secret derived for b.
        assert!(open(&c_priv, &b_pub, &sealed).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (a_priv, a_pub) = generate_seal_keypair();
        let (b_priv, b_pub) = generate_seal_keypair();

        let mut sealed = seal(&a_priv, &b_pub, b"message");
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(open(&b_priv, &a_pub, &sealed).is_err());
    }

    #[test]
    fn nonces_vary_between_calls() {
        let (a_priv, _a_pub) = generate_seal_keypair();
        let (_b_priv, b_pub) = generate_seal_keypair();
        let s1 = seal(&a_priv, &b_pub, b"same plaintext");
        let s2 = seal(&a_priv, &b_pub, b"same plaintext");
        assert_ne!(s1, s2, "nonce must be randomized per call");
    }
}
