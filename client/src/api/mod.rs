mod analyze;
mod compare;
mod stream;

use std::path::Path;

use reqwest::multipart::{Form, Part};
use shared::{AnalysisRequest, ImageError, ImagePayload};

use crate::config::ClientConfig;
use crate::error::AnalysisError;

pub use compare::ComparisonParams;
pub use stream::{ChunkCallback, ingest};

/// HTTP client for the image analysis service. Cheap to clone; clones share
/// the connection pool.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl VisionClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<reqwest::Response, AnalysisError> {
        let url = self.config.endpoint(path)?;
        log::debug!("POST {}", url);

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Analysis service returned {}: {}", status, body);
            return Err(AnalysisError::rejected(status));
        }
        Ok(response)
    }
}

fn image_part(image: &ImagePayload) -> Result<Part, AnalysisError> {
    let part = Part::bytes(image.bytes().to_vec())
        .file_name(image.file_name().to_string())
        .mime_str(image.mime_type())?;
    Ok(part)
}

/// Fields for the whole-response endpoint, also used per model in comparisons.
fn analysis_form(request: &AnalysisRequest) -> Result<Form, AnalysisError> {
    Ok(Form::new()
        .part("file", image_part(&request.image)?)
        .text("provider", request.provider.to_string())
        .text("model_name", request.model.clone())
        .text("analysis_type", request.analysis_type.to_string())
        .text("prompt", request.prompt_or_empty().to_string())
        .text("detail_level", request.detail_level_or_empty().to_string()))
}

fn stream_form(request: &AnalysisRequest) -> Result<Form, AnalysisError> {
    Ok(Form::new()
        .part("file", image_part(&request.image)?)
        .text("model_name", request.model.clone())
        .text("provider", request.provider.to_string())
        .text("prompt", request.prompt_or_empty().to_string()))
}

/// Reads an image from disk, taking the MIME type from the file extension.
pub async fn load_image(path: impl AsRef<Path>) -> Result<ImagePayload, AnalysisError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let mime_type = ImagePayload::mime_for_extension(extension)
        .ok_or_else(|| ImageError::UnsupportedType(format!(".{}", extension)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let bytes = tokio::fs::read(path).await?;
    Ok(ImagePayload::new(file_name, mime_type, bytes)?)
}
