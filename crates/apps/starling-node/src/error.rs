//! Node-level error type (§7, §10.1): wraps the lower crates' errors and
//! maps the ones that cross the payment-handler boundary onto
//! [`starling_types::RejectCode`]. `anyhow` is reserved for `main.rs`.

use starling_types::RejectCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("identity error: {0}")]
    Identity(String),

    #[error(transparent)]
    Store(#[from] starling_store::StoreError),

    #[error(transparent)]
    Connector(#[from] starling_connector::ConnectorError),

    #[error(transparent)]
    Handshake(#[from] starling_handshake::HandshakeError),

    #[error(transparent)]
    Validation(#[from] starling_valid::ValidationError),

    #[error("server error: {0}")]
    Server(String),
}

impl NodeError {
    pub fn reject_code(&self) -> RejectCode {
        match self {
            Self::Config(_) | Self::Identity(_) | Self::Server(_) => RejectCode::Internal,
            Self::Store(_) => RejectCode::Internal,
            Self::Connector(_) => RejectCode::Internal,
            Self::Handshake(_) => RejectCode::BadRequest,
            Self::Validation(e) => e.reject_code(),
        }
    }
}
