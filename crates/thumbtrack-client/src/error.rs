//! Error types for thumbtrack-client

use thiserror::Error;
use thumbtrack_rpc::RpcError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Server returned an error: {0}")]
    Rpc(RpcError),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<jsonrpsee::core::client::Error> for ClientError {
    fn from(e: jsonrpsee::core::client::Error) -> Self {
        match e {
            jsonrpsee::core::client::Error::Call(object) => {
                ClientError::Rpc(RpcError::from_code(object.code(), object.message().to_string()))
            }
            other => ClientError::Transport(other.to_string()),
        }
    }
}

impl ClientError {
    /// The JSON-RPC error code, for errors the server reported
    pub fn code(&self) -> Option<i32> {
        match self {
            ClientError::Rpc(e) => Some(e.code()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
