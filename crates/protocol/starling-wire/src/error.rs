//! Error types for message verification, envelope encoding, and the gossip
//! wire protocol.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerifyError {
    /// Recomputed `id` does not match the message's declared `id`.
    #[error("id mismatch: message id does not match its canonical hash")]
    BadId,
    /// Signature does not verify against `author`.
    #[error("bad signature")]
    BadSignature,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("CBOR encoding failed: {0}")]
    Cbor(String),
}

impl From<ciborium::ser::Error<std::io::Error>> for EncodeError {
    fn from(err: ciborium::ser::Error<std::io::Error>) -> Self {
        EncodeError::Cbor(err.to_string())
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("CBOR decoding failed: {0}")]
    Cbor(String),
    #[error("invalid gossip message: {0}")]
    Gossip(String),
}

impl From<ciborium::de::Error<std::io::Error>> for DecodeError {
    fn from(err: ciborium::de::Error<std::io::Error>) -> Self {
        DecodeError::Cbor(err.to_string())
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Gossip(err.to_string())
    }
}
