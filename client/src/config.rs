use std::env;
use std::time::Duration;

use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9005";
pub const DEFAULT_TYPING_INTERVAL_MS: u64 = 30;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const ANALYZE_PATH: &str = "api/v1/analyze-image";
pub const STREAM_PATH: &str = "api/v1/analyze-image/stream";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid base URL {value}: {source}")]
    BaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("Base URL {0} cannot carry API paths")]
    NotABase(String),
    #[error("Invalid value for {name}: {value}")]
    Number { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    pub typing_interval: Duration,
    pub max_image_bytes: usize,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            typing_interval: Duration::from_millis(DEFAULT_TYPING_INTERVAL_MS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        })
    }

    /// Reads `VISIONLENS_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("VISIONLENS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Some(value) = lookup("VISIONLENS_TYPING_INTERVAL_MS") {
            let millis = parse_number::<u64>("VISIONLENS_TYPING_INTERVAL_MS", &value)?;
            if millis == 0 {
                return Err(ConfigError::Number {
                    name: "VISIONLENS_TYPING_INTERVAL_MS",
                    value,
                });
            }
            config.typing_interval = Duration::from_millis(millis);
        }
        if let Some(value) = lookup("VISIONLENS_MAX_IMAGE_BYTES") {
            config.max_image_bytes = parse_number("VISIONLENS_MAX_IMAGE_BYTES", &value)?;
        }

        log::info!(
            "Analysis service at {} (typing interval {:?}, max image {} bytes)",
            config.base_url,
            config.typing_interval,
            config.max_image_bytes
        );
        Ok(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url.join(path).map_err(|source| ConfigError::BaseUrl {
            value: format!("{}{}", self.base_url, path),
            source,
        })
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value).map_err(|source| ConfigError::BaseUrl {
        value: value.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(value.to_string()));
    }
    // A trailing slash keeps any path prefix when joining endpoint paths.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Number {
        name,
        value: value.to_string(),
    })
}
