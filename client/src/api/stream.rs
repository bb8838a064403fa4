use futures::{Stream, StreamExt};
use shared::{AnalysisRequest, AnalysisResult, FrameDecoder, StreamingChunk};

use super::{VisionClient, stream_form};
use crate::config::STREAM_PATH;
use crate::error::AnalysisError;

/// Receives every non-empty chunk as soon as its frame is complete.
pub type ChunkCallback<'a> = &'a mut (dyn FnMut(&StreamingChunk) + Send);

impl VisionClient {
    /// Streams an analysis, forwarding chunks to `on_chunk` as they arrive.
    ///
    /// The returned result carries the full text regardless of what the
    /// callback did with the chunks. Any malformed frame fails the whole call.
    pub async fn analyze_stream(
        &self,
        request: &AnalysisRequest,
        on_chunk: Option<ChunkCallback<'_>>,
    ) -> Result<AnalysisResult, AnalysisError> {
        request.image.check_size(self.config.max_image_bytes)?;
        log::info!(
            "Streaming analysis of {} with {}/{}",
            request.image.file_name(),
            request.provider,
            request.model
        );

        let form = stream_form(request)?;
        let response = self.post_form(STREAM_PATH, form).await?;
        ingest(response.bytes_stream(), request, on_chunk).await
    }
}

#[derive(Debug, Default)]
struct Accumulated {
    text: String,
    frames: usize,
    last_index: Option<u64>,
}

impl Accumulated {
    /// Returns whether the chunk should be forwarded to the caller.
    fn accept(&mut self, chunk: &StreamingChunk) -> bool {
        self.frames += 1;
        if matches!(self.last_index, Some(last) if chunk.chunk_index < last) {
            log::warn!(
                "Chunk index went backwards ({} after {}), keeping arrival order",
                chunk.chunk_index,
                self.last_index.unwrap_or_default()
            );
        }
        self.last_index = Some(chunk.chunk_index);
        log::debug!(
            "Frame {} (index {}, {} bytes, complete: {})",
            self.frames,
            chunk.chunk_index,
            chunk.chunk.len(),
            chunk.is_complete
        );

        if chunk.chunk.is_empty() {
            return false;
        }
        self.text.push_str(&chunk.chunk);
        true
    }
}

/// Turns a chunked NDJSON body into one [`AnalysisResult`].
///
/// Works on any byte stream so the framing does not depend on how the
/// transport happens to split reads.
pub async fn ingest<S, B, E>(
    body: S,
    request: &AnalysisRequest,
    mut on_chunk: Option<ChunkCallback<'_>>,
) -> Result<AnalysisResult, AnalysisError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    AnalysisError: From<E>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = FrameDecoder::new();
    let mut accumulated = Accumulated::default();

    while let Some(read) = body.next().await {
        let bytes = read?;
        decoder.push(bytes.as_ref());
        while let Some(chunk) = decoder.next_frame()? {
            if accumulated.accept(&chunk) {
                if let Some(callback) = on_chunk.as_mut() {
                    callback(&chunk);
                }
            }
        }
    }

    if let Some(chunk) = decoder.finish()? {
        log::debug!("Stream ended without a trailing newline");
        if accumulated.accept(&chunk) {
            if let Some(callback) = on_chunk.as_mut() {
                callback(&chunk);
            }
        }
    }

    log::info!(
        "Stream finished: {} frames, {} chars",
        accumulated.frames,
        accumulated.text.chars().count()
    );
    Ok(AnalysisResult::from_request(request, accumulated.text, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{client_for, init_logging, request};
    use crate::config::ClientConfig;
    use crate::playback::LiveFeed;
    use futures::stream;
    use std::time::Duration;
    use shared::FrameError;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = concat!(
        "{\"chunk\":\"A cat\",\"is_complete\":false,\"chunk_index\":0}\n",
        "{\"chunk\":\" sitting.\",\"is_complete\":false,\"chunk_index\":1}\n",
        "{\"chunk\":\"\",\"is_complete\":true,\"chunk_index\":2}\n",
    );

    fn reads(parts: &[&[u8]]) -> impl Stream<Item = Result<Vec<u8>, reqwest::Error>> {
        let parts: Vec<Result<Vec<u8>, reqwest::Error>> = parts.iter().map(|p| Ok(p.to_vec())).collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn split_inside_second_line() {
        let bytes = BODY.as_bytes();
        let second_line = BODY.find(" sitting").unwrap();
        for cut in second_line..second_line + 20 {
            let mut seen = Vec::new();
            let mut callback = |chunk: &StreamingChunk| seen.push(chunk.clone());
            let result = ingest(
                reads(&[&bytes[..cut], &bytes[cut..]]),
                &request(),
                Some(&mut callback),
            )
            .await
            .unwrap();

            assert_eq!(result.text, "A cat sitting.");
            assert_eq!(seen.len(), 2, "cut at {}", cut);
            assert_eq!(seen[0].chunk, "A cat");
            assert_eq!(seen[1].chunk, " sitting.");
            assert_eq!(result.confidence, None);
        }
    }

    #[tokio::test]
    async fn any_split_gives_same_chunks() {
        let bytes = BODY.as_bytes();
        let whole: Vec<StreamingChunk> = shared::framing::decode_all(bytes)
            .unwrap()
            .into_iter()
            .filter(|c| !c.chunk.is_empty())
            .collect();

        for cut in 0..=bytes.len() {
            for second in cut..=bytes.len() {
                let mut seen = Vec::new();
                let mut callback = |chunk: &StreamingChunk| seen.push(chunk.clone());
                let parts = [&bytes[..cut], &bytes[cut..second], &bytes[second..]];
                let result = ingest(reads(&parts), &request(), Some(&mut callback))
                    .await
                    .unwrap();
                assert_eq!(seen, whole);
                let joined: String = seen.iter().map(|c| c.chunk.as_str()).collect();
                assert_eq!(result.text, joined);
            }
        }
    }

    #[tokio::test]
    async fn arrival_order_wins_over_index() {
        let body = concat!(
            "{\"chunk\":\"b\",\"is_complete\":false,\"chunk_index\":1}\n",
            "{\"chunk\":\"a\",\"is_complete\":false,\"chunk_index\":0}\n",
        );
        let result = ingest(reads(&[body.as_bytes()]), &request(), None)
            .await
            .unwrap();
        assert_eq!(result.text, "ba");
    }

    #[tokio::test]
    async fn malformed_frame_discards_everything() {
        let body = concat!(
            "{\"chunk\":\"A cat\",\"is_complete\":false,\"chunk_index\":0}\n",
            "{\"chunk\": oops}\n",
        );
        let err = ingest(reads(&[body.as_bytes()]), &request(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Frame(FrameError::Json { line: 2, .. })));
    }

    #[tokio::test]
    async fn streams_from_service() {
        init_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze-image/stream"))
            .and(body_string_contains("name=\"model_name\""))
            .and(body_string_contains("gemini-2.5-flash"))
            .and(body_string_contains("name=\"provider\""))
            .respond_with(ResponseTemplate::new(200).set_body_raw(BODY, "application/x-ndjson"))
            .expect(1)
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        let mut callback = |chunk: &StreamingChunk| seen.push(chunk.chunk_index);
        let result = client_for(&server)
            .analyze_stream(&request(), Some(&mut callback))
            .await
            .expect("stream");
        assert_eq!(result.text, "A cat sitting.");
        assert_eq!(seen, vec![0, 1]);
    }

    #[tokio::test]
    async fn streamed_chunks_feed_playback() {
        init_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze-image/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(BODY, "application/x-ndjson"))
            .mount(&server)
            .await;

        let mut config = ClientConfig::new(&server.uri()).unwrap();
        config.typing_interval = Duration::from_millis(1);
        let client = VisionClient::new(config);

        let feed = LiveFeed::new();
        let session = feed.begin();
        let playback = feed.play(client.config());
        let displayed = playback.displayed();

        let mut callback = |chunk: &StreamingChunk| {
            session.push(chunk);
        };
        let result = client
            .analyze_stream(&request(), Some(&mut callback))
            .await
            .expect("stream");
        assert_eq!(feed.snapshot().text, result.text);
        assert!(result.text.starts_with(displayed.borrow().as_str()));
        drop(session);

        assert_eq!(playback.wait().await.unwrap(), result.text.chars().count());
        assert_eq!(*displayed.borrow(), "A cat sitting.");
        assert!(!feed.snapshot().streaming);
    }

    #[tokio::test]
    async fn rejected_stream() {
        init_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze-image/stream"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut calls = 0;
        let mut callback = |_: &StreamingChunk| calls += 1;
        let err = client_for(&server)
            .analyze_stream(&request(), Some(&mut callback))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error: 503 Service Unavailable");
        assert_eq!(calls, 0);
    }
}
