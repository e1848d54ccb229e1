use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One text-generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    /// System message (stage persona)
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("provider returned no content")]
    EmptyResponse,
}

/// External text-generation capability, treated as opaque
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
