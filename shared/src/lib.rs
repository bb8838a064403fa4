pub mod catalog;
pub mod comparison;
pub mod framing;
pub mod history;
pub mod model;
pub mod pacer;

pub use catalog::{AnalysisType, DetailLevel, ModelInfo, Provider};
pub use comparison::{ComparisonBoard, ComparisonEvent, ComparisonSummary, ModelSelection, ModelSelections};
pub use framing::{FrameDecoder, FrameError};
pub use history::{HistoryEntry, ResultHistory};
pub use model::{
    AnalysisRequest, AnalysisResult, ComparisonResult, ComparisonStatus, ImageError, ImagePayload, ResultId,
    StreamingChunk,
};
pub use pacer::{Pacer, Tick};
