use futures::StreamExt;
use futures::stream::FuturesUnordered;
use shared::comparison::pending_results;
use shared::{
    AnalysisRequest, AnalysisType, ComparisonBoard, ComparisonEvent, DetailLevel, ImagePayload,
    ModelSelections,
};
use tokio::sync::mpsc::UnboundedSender;

use super::VisionClient;

/// One image and analysis configuration to run against several models.
#[derive(Debug, Clone)]
pub struct ComparisonParams {
    pub image: ImagePayload,
    pub selections: ModelSelections,
    pub analysis_type: AnalysisType,
    pub prompt: Option<String>,
    pub detail_level: Option<DetailLevel>,
}

impl ComparisonParams {
    fn request_for(&self, provider: shared::Provider, model: &str) -> AnalysisRequest {
        AnalysisRequest {
            image: self.image.clone(),
            provider,
            model: model.to_string(),
            analysis_type: self.analysis_type,
            prompt: self.prompt.clone(),
            detail_level: self.detail_level,
        }
    }
}

fn record(
    board: &mut ComparisonBoard,
    updates: Option<&UnboundedSender<ComparisonEvent>>,
    event: ComparisonEvent,
) {
    if board.apply(event.clone()) {
        if let Some(updates) = updates {
            // A dropped receiver only means nobody is watching any more.
            let _ = updates.send(event);
        }
    }
}

impl VisionClient {
    /// Runs every enabled selection concurrently and waits for all of them.
    ///
    /// A pending entry is created per selection before any request goes out.
    /// Each entry then settles on its own as its call finishes; a failed call
    /// marks only its own entry as an error. Every event is also sent to
    /// `updates` when given. Callers are expected to pass at least one
    /// enabled selection.
    pub async fn compare(
        &self,
        params: &ComparisonParams,
        updates: Option<UnboundedSender<ComparisonEvent>>,
    ) -> ComparisonBoard {
        let mut board = ComparisonBoard::new();
        let pending = pending_results(&params.selections, params.analysis_type);
        if pending.is_empty() {
            log::warn!("Comparison requested without any enabled model");
            return board;
        }
        log::info!(
            "Comparing {} models on {}",
            pending.len(),
            params.image.file_name()
        );

        let mut calls = FuturesUnordered::new();
        for result in pending {
            let id = result.id;
            let request = params.request_for(result.provider, &result.model);
            record(&mut board, updates.as_ref(), ComparisonEvent::Started(result));
            calls.push(async move { (id, self.request_analysis(&request).await) });
        }

        while let Some((id, outcome)) = calls.next().await {
            let event = match outcome {
                Ok(reply) => ComparisonEvent::Completed {
                    id,
                    text: reply.text,
                    confidence: reply.confidence,
                },
                Err(err) => {
                    log::warn!("Comparison entry {} failed: {}", id, err);
                    ComparisonEvent::Failed {
                        id,
                        message: err.to_string(),
                    }
                }
            };
            record(&mut board, updates.as_ref(), event);
        }

        log::info!("{}", board.summary().headline());
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{client_for, closed_port_client, image, init_logging};
    use serde_json::json;
    use shared::{ComparisonStatus, Provider};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params() -> ComparisonParams {
        let mut selections = ModelSelections::new();
        selections.add(Provider::Gemini, "gemini-2.5-flash");
        selections.add(Provider::OpenAi, "gpt-4o");
        selections.add(Provider::HuggingFace, "llava");
        ComparisonParams {
            image: image(),
            selections,
            analysis_type: AnalysisType::SceneUnderstanding,
            prompt: None,
            detail_level: Some(DetailLevel::Medium),
        }
    }

    async fn mount_models(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze-image"))
            .and(body_string_contains("gemini-2.5-flash"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response_text": "A cat on a sofa.", "confidence": 0.9}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze-image"))
            .and(body_string_contains("gpt-4o"))
            .respond_with(ResponseTemplate::new(502))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze-image"))
            .and(body_string_contains("llava"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"caption": "cat"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn every_entry_settles_and_failures_stay_isolated() {
        init_logging();
        let server = MockServer::start().await;
        mount_models(&server).await;

        let board = client_for(&server).compare(&params(), None).await;
        assert!(board.is_settled());
        assert_eq!(
            board.summary().headline(),
            "2 models analyzed successfully, 1 failed"
        );

        let results = board.into_results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].model, "gemini-2.5-flash");
        assert_eq!(results[0].status, ComparisonStatus::Completed);
        assert_eq!(results[0].text, "A cat on a sofa.");
        assert_eq!(results[0].confidence, Some(0.9));

        assert_eq!(results[1].status, ComparisonStatus::Error);
        assert_eq!(results[1].error.as_deref(), Some("API error: 502 Bad Gateway"));

        assert_eq!(results[2].status, ComparisonStatus::Completed);
        assert_eq!(results[2].text, "cat");
    }

    #[tokio::test]
    async fn updates_arrive_in_settlement_order() {
        init_logging();
        let server = MockServer::start().await;
        mount_models(&server).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let board = client_for(&server).compare(&params(), Some(tx)).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 6);
        assert!(events[..3].iter().all(|e| matches!(e, ComparisonEvent::Started(_))));

        // the delayed model settles last
        let slow = board.results().next().unwrap().id;
        assert_eq!(events[5].id(), slow);

        let replayed = ComparisonBoard::replay(&events);
        assert_eq!(
            replayed.results().collect::<Vec<_>>(),
            board.results().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn unreachable_service_marks_every_entry() {
        init_logging();
        let board = closed_port_client().compare(&params(), None).await;
        assert_eq!(board.len(), 3);
        assert_eq!(board.summary().headline(), "All analyses failed");
        for result in board.into_results() {
            assert_eq!(result.status, ComparisonStatus::Error);
            let message = result.error.unwrap_or_default();
            assert!(message.starts_with("Network error"), "{}", message);
        }
    }

    #[tokio::test]
    async fn nothing_enabled() {
        let server = MockServer::start().await;
        let mut params = params();
        params.selections = ModelSelections::new();
        let board = client_for(&server).compare(&params, None).await;
        assert!(board.is_empty());
    }
}
