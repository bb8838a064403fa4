use shared::{FrameError, ImageError};

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("API error: {status} {reason}")]
    RequestRejected { status: u16, reason: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed stream: {0}")]
    Frame(#[from] FrameError),
    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn rejected(status: reqwest::StatusCode) -> Self {
        AnalysisError::RequestRejected {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }
}
