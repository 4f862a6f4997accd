//! Stream demultiplexer.
//!
//! An assistant response is a single byte stream framed as
//! `<answer bytes> "tokens-ended" <JSON array of source records>`, with no
//! length prefixes. The sentinel, like any multi-byte character, may be
//! split across chunk boundaries, so the demultiplexer holds back just
//! enough of the tail to classify every byte while still emitting answer
//! text incrementally for live display.
//!
//! Ordinary chat replies carry no sentinel at all; the whole stream is
//! answer text and the source list is empty.

use tracing::warn;

use crate::request::SourceRecord;

/// Marker separating streamed answer text from trailing metadata.
pub const SENTINEL: &str = "tokens-ended";

/// Final outcome of a demultiplexed stream.
#[derive(Debug, Clone)]
pub struct DemuxedResponse {
    pub answer: String,
    pub sources: Vec<SourceRecord>,
}

/// Incremental splitter for one assistant response stream.
#[derive(Debug, Default)]
pub struct StreamDemux {
    /// Bytes received but not yet classified as answer or metadata.
    pending: Vec<u8>,
    /// Answer text emitted so far.
    answer: String,
    /// Raw bytes received after the sentinel.
    metadata: Vec<u8>,
    sentinel_seen: bool,
}

impl StreamDemux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, in arrival order. Returns any newly available
    /// answer text for live display.
    pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
        if self.sentinel_seen {
            self.metadata.extend_from_slice(chunk);
            return None;
        }

        self.pending.extend_from_slice(chunk);

        if let Some(idx) = find(&self.pending, SENTINEL.as_bytes()) {
            self.sentinel_seen = true;
            let after = self.pending.split_off(idx + SENTINEL.len());
            self.pending.truncate(idx);
            self.metadata = after;
            let emitted = self.flush_pending();
            return (!emitted.is_empty()).then_some(emitted);
        }

        // Hold back any tail that could be the start of a sentinel
        // completed by the next chunk, then back off to a character
        // boundary so a split multi-byte character is never emitted
        // in halves.
        let mut safe = self.pending.len() - sentinel_overlap(&self.pending);
        safe = utf8_safe_len(&self.pending, safe);
        if safe == 0 {
            return None;
        }

        let head: Vec<u8> = self.pending.drain(..safe).collect();
        let text = String::from_utf8_lossy(&head).into_owned();
        self.answer.push_str(&text);
        Some(text)
    }

    /// Answer text emitted so far, for rendering the transient live
    /// message.
    pub fn answer_so_far(&self) -> &str {
        &self.answer
    }

    /// Finish the stream: flush held-back bytes into the answer and parse
    /// the metadata section. Empty or malformed metadata yields an empty
    /// source list; a half-received stream still produces a well-formed
    /// result.
    pub fn finish(mut self) -> DemuxedResponse {
        self.flush_pending();

        let sources = if self.metadata.iter().all(u8::is_ascii_whitespace) {
            Vec::new()
        } else {
            serde_json::from_slice(&self.metadata).unwrap_or_else(|e| {
                warn!(error = %e, "malformed source metadata, dropping");
                Vec::new()
            })
        };

        DemuxedResponse {
            answer: self.answer,
            sources,
        }
    }

    fn flush_pending(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let head = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&head).into_owned();
        self.answer.push_str(&text);
        text
    }
}

/// First occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of the longest suffix of `pending` that is a proper prefix of
/// the sentinel: bytes that must be held back because the next chunk
/// could complete a sentinel across the boundary.
fn sentinel_overlap(pending: &[u8]) -> usize {
    let sentinel = SENTINEL.as_bytes();
    let max = (sentinel.len() - 1).min(pending.len());
    (1..=max)
        .rev()
        .find(|&k| pending[pending.len() - k..] == sentinel[..k])
        .unwrap_or(0)
}

/// Largest `n <= end` such that `bytes[..n]` does not end inside a
/// multi-byte UTF-8 sequence still awaiting continuation bytes.
fn utf8_safe_len(bytes: &[u8], end: usize) -> usize {
    // Only the final few bytes can belong to an unfinished sequence.
    let start = end.saturating_sub(4);
    for i in (start..end).rev() {
        let b = bytes[i];
        if b & 0xC0 != 0x80 {
            let width = if b >= 0xF0 {
                4
            } else if b >= 0xE0 {
                3
            } else if b >= 0xC0 {
                2
            } else {
                1
            };
            return if i + width > end { i } else { end };
        }
    }
    // No lead byte in the window: malformed input, let the lossy decode
    // deal with it.
    end
}
