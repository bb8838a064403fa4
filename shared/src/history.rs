use std::collections::VecDeque;

use crate::model::{AnalysisResult, ImagePayload, ResultId};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub image_fingerprint: String,
    pub file_name: String,
    pub result: AnalysisResult,
}

/// Session-scoped list of finished analyses, newest first.
#[derive(Debug, Clone)]
pub struct ResultHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for ResultHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ResultHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, image: &ImagePayload, result: AnalysisResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(HistoryEntry {
            image_fingerprint: image.fingerprint(),
            file_name: image.file_name().to_string(),
            result,
        });
    }

    pub fn find(&self, id: ResultId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.result.id == id)
    }

    pub fn for_image<'a>(&'a self, fingerprint: &'a str) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.image_fingerprint == fingerprint)
    }

    pub fn remove(&mut self, id: ResultId) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.result.id == id)?;
        self.entries.remove(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
