use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{AnalysisType, Provider};
use crate::model::{ComparisonResult, ComparisonStatus, ResultId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: Provider,
    pub model: String,
    pub enabled: bool,
}

impl ModelSelection {
    fn matches(&self, provider: Provider, model: &str) -> bool {
        self.provider == provider && self.model == model
    }
}

/// Ordered, duplicate-free set of (provider, model) pairs to compare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelections {
    items: Vec<ModelSelection>,
}

impl ModelSelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the pair enabled. Returns `false` if it is already present.
    pub fn add(&mut self, provider: Provider, model: impl Into<String>) -> bool {
        let model = model.into();
        if self.items.iter().any(|s| s.matches(provider, &model)) {
            return false;
        }
        self.items.push(ModelSelection {
            provider,
            model,
            enabled: true,
        });
        true
    }

    pub fn remove(&mut self, provider: Provider, model: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|s| !s.matches(provider, model));
        self.items.len() != before
    }

    /// Flips the enabled flag, returning the new state.
    pub fn toggle(&mut self, provider: Provider, model: &str) -> Option<bool> {
        let selection = self.items.iter_mut().find(|s| s.matches(provider, model))?;
        selection.enabled = !selection.enabled;
        Some(selection.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ModelSelection> {
        self.items.iter().filter(|s| s.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSelection> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComparisonEvent {
    Started(ComparisonResult),
    Completed {
        id: ResultId,
        text: String,
        confidence: Option<f32>,
    },
    Failed {
        id: ResultId,
        message: String,
    },
}

impl ComparisonEvent {
    pub fn id(&self) -> ResultId {
        match self {
            ComparisonEvent::Started(result) => result.id,
            ComparisonEvent::Completed { id, .. } | ComparisonEvent::Failed { id, .. } => *id,
        }
    }
}

/// Comparison results keyed by id, built by replaying an append-only event
/// log. Each entry starts pending and settles at most once.
#[derive(Debug, Clone, Default)]
pub struct ComparisonBoard {
    order: Vec<ResultId>,
    entries: HashMap<ResultId, ComparisonResult>,
    log: Vec<ComparisonEvent>,
}

impl ComparisonBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replay<'a>(events: impl IntoIterator<Item = &'a ComparisonEvent>) -> Self {
        let mut board = Self::new();
        for event in events {
            board.apply(event.clone());
        }
        board
    }

    /// Records the event. Returns `false` when it changed nothing: a repeated
    /// start, an unknown id, or a second settlement of the same entry.
    pub fn apply(&mut self, event: ComparisonEvent) -> bool {
        let id = event.id();
        let applied = match &event {
            ComparisonEvent::Started(result) => {
                if self.entries.contains_key(&id) {
                    false
                } else {
                    self.order.push(id);
                    self.entries.insert(id, result.clone());
                    true
                }
            }
            ComparisonEvent::Completed { text, confidence, .. } => {
                match self.entries.get_mut(&id).filter(|e| !e.is_settled()) {
                    Some(entry) => {
                        entry.text = text.clone();
                        entry.confidence = *confidence;
                        entry.status = ComparisonStatus::Completed;
                        true
                    }
                    None => false,
                }
            }
            ComparisonEvent::Failed { message, .. } => {
                match self.entries.get_mut(&id).filter(|e| !e.is_settled()) {
                    Some(entry) => {
                        entry.error = Some(message.clone());
                        entry.status = ComparisonStatus::Error;
                        true
                    }
                    None => false,
                }
            }
        };

        if applied {
            self.log.push(event);
        } else {
            log::warn!("Ignoring comparison event for {}", id);
        }
        applied
    }

    pub fn get(&self, id: ResultId) -> Option<&ComparisonResult> {
        self.entries.get(&id)
    }

    /// Entries in the order they were started.
    pub fn results(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn into_results(mut self) -> Vec<ComparisonResult> {
        self.order
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect()
    }

    pub fn events(&self) -> &[ComparisonEvent] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_settled(&self) -> bool {
        self.entries.values().all(ComparisonResult::is_settled)
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary::from_results(self.results())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
}

impl ComparisonSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ComparisonResult>) -> Self {
        results
            .into_iter()
            .fold(Self::default(), |mut summary, result| {
                match result.status {
                    ComparisonStatus::Completed => summary.completed += 1,
                    ComparisonStatus::Error => summary.failed += 1,
                    ComparisonStatus::Pending => summary.pending += 1,
                }
                summary
            })
    }

    pub fn headline(&self) -> String {
        if self.completed == 0 {
            return "All analyses failed".to_string();
        }
        let plural = if self.completed > 1 { "s" } else { "" };
        let mut line = format!("{} model{} analyzed successfully", self.completed, plural);
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }
}

/// Pending entries for every enabled selection, in selection order.
pub fn pending_results(selections: &ModelSelections, analysis_type: AnalysisType) -> Vec<ComparisonResult> {
    selections
        .enabled()
        .map(|s| ComparisonResult::pending(s.provider, s.model.clone(), analysis_type))
        .collect()
}
