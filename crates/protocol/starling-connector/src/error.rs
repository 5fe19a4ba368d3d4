//! Error types for the connector client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectorError>;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel open timed out after {0}ms")]
    ChannelOpenTimeout(u64),

    #[error("no route to {0}")]
    NoRoute(String),

    #[error("packet send timed out after {0}ms")]
    PacketTimeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("remote connector returned an application-level error: {0}")]
    Remote(String),

    #[error("response body could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ConnectorError {
    /// Transient failures (network blips, timeouts) are worth retrying;
    /// application-level rejections (unknown peer, no route) are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::PacketTimeout(_) | Self::ChannelOpenTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        assert!(ConnectorError::Network("refused".into()).is_retryable());
        assert!(!ConnectorError::UnknownPeer("x".into()).is_retryable());
    }
}
