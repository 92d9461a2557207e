use thiserror::Error;

/// Main error type for shellyrpc operations
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Timeout")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for shellyrpc operations
pub type RpcResult<T> = Result<T, RpcError>;
