use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::catalog::{AnalysisType, DetailLevel, Provider};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Image payload is empty")]
    Empty,
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Image is too large: {size} bytes (limit {max})")]
    TooLarge { size: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(ImageError::UnsupportedType(mime_type));
        }
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        })
    }

    pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            _ => None,
        }
    }

    pub fn check_size(&self, max: usize) -> Result<(), ImageError> {
        if self.bytes.len() > max {
            return Err(ImageError::TooLarge {
                size: self.bytes.len(),
                max,
            });
        }
        Ok(())
    }

    /// SHA-256 of the image bytes, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One submission. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub image: ImagePayload,
    pub provider: Provider,
    pub model: String,
    pub analysis_type: AnalysisType,
    pub prompt: Option<String>,
    pub detail_level: Option<DetailLevel>,
}

impl AnalysisRequest {
    pub fn new(
        image: ImagePayload,
        provider: Provider,
        model: impl Into<String>,
        analysis_type: AnalysisType,
    ) -> Self {
        Self {
            image,
            provider,
            model: model.into(),
            analysis_type,
            prompt: None,
            detail_level: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.prompt = if prompt.is_empty() { None } else { Some(prompt) };
        self
    }

    pub fn with_detail_level(mut self, detail_level: DetailLevel) -> Self {
        self.detail_level = Some(detail_level);
        self
    }

    pub fn prompt_or_empty(&self) -> &str {
        self.prompt.as_deref().unwrap_or("")
    }

    pub fn detail_level_or_empty(&self) -> &str {
        match &self.detail_level {
            Some(level) => level.as_ref(),
            None => "",
        }
    }
}

/// One frame of a streamed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingChunk {
    pub chunk: String,
    pub is_complete: bool,
    pub chunk_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
pub struct ResultId(Uuid);

impl ResultId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: ResultId,
    pub text: String,
    pub provider: Provider,
    pub model: String,
    pub analysis_type: AnalysisType,
    pub confidence: Option<f32>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn from_request(request: &AnalysisRequest, text: String, confidence: Option<f32>) -> Self {
        Self {
            id: ResultId::generate(),
            text,
            provider: request.provider,
            model: request.model.clone(),
            analysis_type: request.analysis_type,
            confidence,
            timestamp: Utc::now(),
        }
    }

    /// Plain-text export of the result.
    pub fn report(&self) -> String {
        let mut out = String::from("Image Analysis Result\n");
        out.push_str(&format!("Provider: {}\n", self.provider.label()));
        out.push_str(&format!("Model: {}\n", self.model));
        out.push_str(&format!("Analysis Type: {}\n", self.analysis_type.label()));
        out.push_str(&format!(
            "Timestamp: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(confidence) = self.confidence {
            out.push_str(&format!("Confidence: {:.1}%\n", confidence * 100.0));
        }
        out.push_str("\nAnalysis:\n");
        out.push_str(&self.text);
        out
    }

    pub fn report_file_name(&self) -> String {
        format!("analysis-{}.txt", self.id)
    }
}

/// Keeps a confidence only when it is a usable probability.
pub fn sanitize_confidence(confidence: Option<f64>) -> Option<f32> {
    match confidence {
        Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => Some(c as f32),
        Some(c) => {
            log::warn!("Discarding out-of-range confidence {}", c);
            None
        }
        None => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonStatus {
    Pending,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub id: ResultId,
    pub text: String,
    pub provider: Provider,
    pub model: String,
    pub analysis_type: AnalysisType,
    pub confidence: Option<f32>,
    pub timestamp: DateTime<Utc>,
    pub status: ComparisonStatus,
    pub error: Option<String>,
}

impl ComparisonResult {
    pub fn pending(provider: Provider, model: impl Into<String>, analysis_type: AnalysisType) -> Self {
        Self {
            id: ResultId::generate(),
            text: String::new(),
            provider,
            model: model.into(),
            analysis_type,
            confidence: None,
            timestamp: Utc::now(),
            status: ComparisonStatus::Pending,
            error: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status != ComparisonStatus::Pending
    }
}
