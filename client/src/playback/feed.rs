use std::sync::Arc;

use shared::StreamingChunk;
use tokio::sync::watch;

/// Text the pacer reads from: everything received so far for the current
/// stream, and whether more is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    pub streaming: bool,
    pub generation: u64,
}

/// Live accumulator between the ingestion callback and the pacer.
///
/// Each [`LiveFeed::begin`] starts a new generation. Sessions from earlier
/// generations keep running in the background after a resubmission, and
/// anything they push is dropped.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    tx: Arc<watch::Sender<SourceText>>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SourceText::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SourceText> {
        self.tx.subscribe()
    }

    pub fn begin(&self) -> FeedSession {
        let mut generation = 0;
        self.tx.send_modify(|source| {
            source.generation += 1;
            source.text.clear();
            source.streaming = true;
            generation = source.generation;
        });
        log::debug!("Live feed generation {} started", generation);
        FeedSession {
            tx: self.tx.clone(),
            generation,
        }
    }

    pub fn snapshot(&self) -> SourceText {
        self.tx.borrow().clone()
    }
}

/// Write handle for one stream. Dropping it marks the stream as finished.
#[derive(Debug)]
pub struct FeedSession {
    tx: Arc<watch::Sender<SourceText>>,
    generation: u64,
}

impl FeedSession {
    pub fn push(&self, chunk: &StreamingChunk) -> bool {
        self.push_text(&chunk.chunk)
    }

    /// Appends text. Returns `false` if the session was superseded or already
    /// finished.
    pub fn push_text(&self, text: &str) -> bool {
        self.tx.send_if_modified(|source| {
            if source.generation != self.generation || !source.streaming || text.is_empty() {
                return false;
            }
            source.text.push_str(text);
            true
        })
    }

    pub fn finish(&self) -> bool {
        self.tx.send_if_modified(|source| {
            if source.generation != self.generation || !source.streaming {
                return false;
            }
            source.streaming = false;
            true
        })
    }

    pub fn is_current(&self) -> bool {
        self.tx.borrow().generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.finish();
    }
}
