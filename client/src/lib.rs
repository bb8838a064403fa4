pub mod api;
pub mod config;
pub mod error;
pub mod playback;

pub use api::{ChunkCallback, ComparisonParams, VisionClient, ingest, load_image};
pub use config::{ClientConfig, ConfigError};
pub use error::AnalysisError;
pub use playback::{FeedSession, LiveFeed, MIN_TICK, Playback, SourceText, spawn_playback};
