//! Error types for the handshake protocol.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandshakeError>;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("sealed payload could not be opened: {0}")]
    Open(#[from] starling_crypto::CryptoError),

    #[error("payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request {0} is stale (outside freshness window)")]
    Stale(String),

    #[error("requester and responder share no settlement chain")]
    ChainMismatch,

    #[error("connector rejected the channel open: {0}")]
    ChannelOpenFailed(#[from] starling_connector::ConnectorError),

    #[error("peer {0} exceeded the handshake rate limit")]
    RateLimited(starling_crypto::PeerId),

    #[error("no pending request matches requestId {0}")]
    UnknownRequestId(String),

    #[error("handshake response carried an error: {0:?}")]
    Rejected(starling_types::HandshakeError),
}
