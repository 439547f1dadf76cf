use crate::messages::{BackgroundRequest, BackgroundResponse};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unexpected response to {request}: {response}")]
    UnexpectedResponse { request: String, response: String },
    #[error("Timed out waiting for classification")]
    Timeout,
}

/// Request/response channel to the background process.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, request: BackgroundRequest) -> Result<BackgroundResponse, ProtocolError>;
}
