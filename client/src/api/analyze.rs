use serde_json::Value;
use shared::model::sanitize_confidence;
use shared::{AnalysisRequest, AnalysisResult};

use super::{VisionClient, analysis_form};
use crate::config::ANALYZE_PATH;
use crate::error::AnalysisError;

const TEXT_FIELDS: [&str; 4] = ["response_text", "analysis", "result", "caption"];
const FALLBACK_TEXT: &str = "Analysis completed";

/// Text and confidence pulled out of a whole-response analysis body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnalysisReply {
    pub text: String,
    pub confidence: Option<f32>,
}

impl AnalysisReply {
    pub fn from_body(body: &Value) -> Self {
        let text = TEXT_FIELDS
            .iter()
            .filter_map(|field| body.get(*field).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .unwrap_or(FALLBACK_TEXT)
            .to_string();
        let confidence = sanitize_confidence(body.get("confidence").and_then(Value::as_f64));
        Self { text, confidence }
    }
}

impl VisionClient {
    /// Runs one analysis and waits for the complete response.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let reply = self.request_analysis(request).await?;
        Ok(AnalysisResult::from_request(request, reply.text, reply.confidence))
    }

    pub(crate) async fn request_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisReply, AnalysisError> {
        request.image.check_size(self.config.max_image_bytes)?;
        log::info!(
            "Analyzing {} with {}/{} ({})",
            request.image.file_name(),
            request.provider,
            request.model,
            request.analysis_type
        );

        let form = analysis_form(request)?;
        let response = self.post_form(ANALYZE_PATH, form).await?;
        let body: Value = response.json().await?;
        Ok(AnalysisReply::from_body(&body))
    }
}
