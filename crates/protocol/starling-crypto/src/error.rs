//! Error types for starling-crypto

use thiserror::Error;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid PeerId string format
    #[error("invalid PeerId format: {0}")]
    InvalidPeerIdFormat(String),

    /// Invalid prefix in human-readable PeerId
    #[error("invalid PeerId prefix: expected 'star1', got '{0}'")]
    InvalidPeerIdPrefix(String),

    /// Invalid base58 encoding
    #[error("invalid base58 encoding: {0}")]
    InvalidBase58(String),

    /// Invalid key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Signature verification failed
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Sealed-payload decryption failed (wrong key, tampered ciphertext, or malformed nonce)
    #[error("seal decryption failed")]
    SealOpenFailed,
}
