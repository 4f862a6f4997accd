use serde::{Deserialize, Serialize};

use super::highlight::Highlight;

/// One (question, answer) pair within a thread. Immutable once created.
///
/// Serialized as a two-element array, the shape the archive file and the
/// assistant's `chatHistory` request field both use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

impl Exchange {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

impl From<(String, String)> for Exchange {
    fn from((question, answer): (String, String)) -> Self {
        Self { question, answer }
    }
}

impl From<Exchange> for (String, String) {
    fn from(exchange: Exchange) -> Self {
        (exchange.question, exchange.answer)
    }
}

/// The ordered question/answer history scoped to one highlight.
///
/// The embedded `highlight` is a snapshot; it is refreshed from the live
/// registry entry whenever the thread is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationThread {
    pub highlight_id: String,
    pub highlight: Highlight,
    pub chat_history: Vec<Exchange>,
}

impl ConversationThread {
    /// An empty thread for a highlight.
    pub fn new(highlight: Highlight) -> Self {
        Self {
            highlight_id: highlight.id.clone(),
            highlight,
            chat_history: Vec::new(),
        }
    }

    /// Append an exchange. History is append-only and never reordered.
    pub fn append_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.chat_history.push(Exchange::new(question, answer));
    }
}

/// Look up the thread for a highlight id.
///
/// An absent thread is rendered as an empty history by callers, not
/// treated as an error.
pub fn thread_for<'a>(
    threads: &'a [ConversationThread],
    highlight_id: &str,
) -> Option<&'a ConversationThread> {
    threads.iter().find(|t| t.highlight_id == highlight_id)
}

/// Role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged message for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

/// Expand a thread's history into alternating user/assistant messages,
/// preserving exchange order. The session layer rebuilds this view in full
/// whenever the selection pointer changes.
pub fn messages_view(thread: &ConversationThread) -> Vec<TranscriptMessage> {
    let mut messages = Vec::with_capacity(thread.chat_history.len() * 2);
    for exchange in &thread.chat_history {
        messages.push(TranscriptMessage {
            role: Role::User,
            content: exchange.question.clone(),
        });
        messages.push(TranscriptMessage {
            role: Role::Assistant,
            content: exchange.answer.clone(),
        });
    }
    messages
}
