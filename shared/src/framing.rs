//! Newline-delimited JSON framing for streamed analyses.
//!
//! Every frame is one JSON object terminated by `\n`. Reads from the
//! transport can split a frame anywhere, so bytes are buffered until a full
//! line is available. Splitting happens on raw bytes: `\n` never occurs inside
//! a multi-byte UTF-8 sequence, so a line is always decoded whole.

use crate::model::StreamingChunk;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame {line} is not valid UTF-8: {source}")]
    Utf8 {
        line: usize,
        source: std::str::Utf8Error,
    },
    #[error("Frame {line} is not a valid chunk: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}

impl FrameError {
    pub fn line(&self) -> usize {
        match self {
            FrameError::Utf8 { line, .. } | FrameError::Json { line, .. } => *line,
        }
    }
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    consumed: usize,
    line: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one read worth of bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.consumed = 0;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete frame, or `None` when only a partial line is buffered.
    /// Blank lines are skipped.
    pub fn next_frame(&mut self) -> Result<Option<StreamingChunk>, FrameError> {
        loop {
            let pending = &self.buffer[self.consumed..];
            let Some(offset) = pending.iter().position(|&b| b == b'\n') else {
                return Ok(None);
            };
            let start = self.consumed;
            self.consumed += offset + 1;
            self.line += 1;
            if let Some(chunk) = parse_frame(&self.buffer[start..start + offset], self.line)? {
                return Ok(Some(chunk));
            }
        }
    }

    /// Drains whatever follows the last newline once the stream has ended.
    pub fn finish(&mut self) -> Result<Option<StreamingChunk>, FrameError> {
        let rest = self.buffer.split_off(self.consumed);
        self.buffer.clear();
        self.consumed = 0;
        if rest.is_empty() {
            return Ok(None);
        }
        self.line += 1;
        parse_frame(&rest, self.line)
    }

    /// Bytes received but not yet consumed as a frame.
    pub fn pending_len(&self) -> usize {
        self.buffer.len() - self.consumed
    }
}

fn parse_frame(raw: &[u8], line: usize) -> Result<Option<StreamingChunk>, FrameError> {
    let text = std::str::from_utf8(raw).map_err(|source| FrameError::Utf8 { line, source })?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|source| FrameError::Json { line, source })
}

/// Decodes a complete body in one go.
pub fn decode_all(body: &[u8]) -> Result<Vec<StreamingChunk>, FrameError> {
    let mut decoder = FrameDecoder::new();
    decoder.push(body);
    let mut chunks = Vec::new();
    while let Some(chunk) = decoder.next_frame()? {
        chunks.push(chunk);
    }
    if let Some(chunk) = decoder.finish()? {
        chunks.push(chunk);
    }
    Ok(chunks)
}
