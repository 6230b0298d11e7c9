//! Error types for thumbtrack-rpc

use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl RpcError {
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL: i32 = -32603;
    pub const UNAUTHORIZED: i32 = -32003;
    pub const NOT_FOUND: i32 = -32004;
    pub const FORBIDDEN: i32 = -32005;
    pub const STORE: i32 = -32001;

    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidParams(_) => Self::INVALID_PARAMS,
            RpcError::Internal(_) => Self::INTERNAL,
            RpcError::Unauthorized(_) => Self::UNAUTHORIZED,
            RpcError::NotFound(_) => Self::NOT_FOUND,
            RpcError::Forbidden(_) => Self::FORBIDDEN,
            RpcError::Store(_) => Self::STORE,
        }
    }

    /// Rebuild an error from a code and message received over the wire
    pub fn from_code(code: i32, message: String) -> Self {
        match code {
            Self::INVALID_PARAMS => RpcError::InvalidParams(message),
            Self::UNAUTHORIZED => RpcError::Unauthorized(message),
            Self::NOT_FOUND => RpcError::NotFound(message),
            Self::FORBIDDEN => RpcError::Forbidden(message),
            Self::STORE => RpcError::Store(message),
            _ => RpcError::Internal(message),
        }
    }
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(e: RpcError) -> Self {
        ErrorObjectOwned::owned(e.code(), e.to_string(), None::<()>)
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
