use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
    HuggingFace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub value: &'static str,
    pub label: &'static str,
}

const GEMINI_MODELS: &[ModelInfo] = &[
    ModelInfo { value: "gemini-2.5-flash", label: "Gemini 2.5 Flash" },
    ModelInfo { value: "gemini-1.5-pro", label: "Gemini 1.5 Pro" },
    ModelInfo { value: "gemini-vision-pro", label: "Gemini Vision Pro" },
];

const OPENAI_MODELS: &[ModelInfo] = &[
    ModelInfo { value: "gpt-4-vision-preview", label: "GPT-4 Vision Preview" },
    ModelInfo { value: "gpt-4o", label: "GPT-4o" },
];

const ANTHROPIC_MODELS: &[ModelInfo] = &[
    ModelInfo { value: "claude-3-opus", label: "Claude 3 Opus" },
    ModelInfo { value: "claude-3-sonnet", label: "Claude 3 Sonnet" },
];

const HUGGINGFACE_MODELS: &[ModelInfo] = &[
    ModelInfo { value: "blip2", label: "BLIP-2" },
    ModelInfo { value: "llava", label: "LLaVA" },
];

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Gemini => "Google Gemini",
            Provider::OpenAi => "OpenAI GPT-4 Vision",
            Provider::Anthropic => "Anthropic Claude",
            Provider::HuggingFace => "Hugging Face",
        }
    }

    /// Models the analysis service is known to accept for this provider.
    /// Model names are not restricted to this list.
    pub fn models(&self) -> &'static [ModelInfo] {
        match self {
            Provider::Gemini => GEMINI_MODELS,
            Provider::OpenAi => OPENAI_MODELS,
            Provider::Anthropic => ANTHROPIC_MODELS,
            Provider::HuggingFace => HUGGINGFACE_MODELS,
        }
    }

    pub fn knows_model(&self, model: &str) -> bool {
        self.models().iter().any(|m| m.value == model)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisType {
    SceneUnderstanding,
    ObjectDetection,
    TextExtraction,
    CaptionGeneration,
    DetailedDescription,
}

impl AnalysisType {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::SceneUnderstanding => "Scene Understanding",
            AnalysisType::ObjectDetection => "Object Detection",
            AnalysisType::TextExtraction => "Text Extraction",
            AnalysisType::CaptionGeneration => "Caption Generation",
            AnalysisType::DetailedDescription => "Detailed Description",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetailLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DetailLevel {
    pub fn label(&self) -> &'static str {
        match self {
            DetailLevel::Low => "Low Detail",
            DetailLevel::Medium => "Medium Detail",
            DetailLevel::High => "High Detail",
            DetailLevel::VeryHigh => "Very High Detail",
        }
    }
}
