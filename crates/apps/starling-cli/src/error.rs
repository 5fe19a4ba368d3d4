//! CLI error type.

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Node(#[from] starling_node::NodeError),

    #[error("could not reach node at {url}: {source}")]
    Unreachable { url: String, source: reqwest::Error },

    #[error("node returned an error: {0}")]
    NodeResponse(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("identity already exists at {0}")]
    IdentityExists(String),

    #[error("{0}")]
    User(String),
}

impl CliError {
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Process exit code, following the corpus convention of a small
    /// per-category ladder rather than a single catch-all 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) | Self::IdentityExists(_) => 1,
            Self::Unreachable { .. } => 2,
            Self::NodeResponse(_) => 3,
            Self::Io(_) => 4,
            Self::Node(_) => 5,
        }
    }
}
