use margo_assistant::request::SourceRecord;

/// Progress events for a single assistant turn, consumed by the shell for
/// live rendering. Everything here is transient; nothing is persisted
/// until the exchange finalizes.
#[derive(Debug, Clone)]
pub enum TranscriptEvent {
    /// Mode-specific placeholder, emitted before the first byte arrives.
    Thinking { text: String },
    /// Newly streamed answer text.
    Delta { text: String },
    /// The stream resolved: the full answer and any source references.
    Completed {
        answer: String,
        sources: Vec<SourceRecord>,
    },
    /// The assistant didn't answer; nothing was recorded.
    Failed { notice: String },
}

pub type TranscriptSender = tokio::sync::mpsc::UnboundedSender<TranscriptEvent>;
