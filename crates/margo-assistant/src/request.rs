//! Assistant wire types.

use serde::{Deserialize, Serialize};

use margo_core::models::thread::Exchange;

/// Conversation mode. Chat is reader-driven; the other modes synthesize
/// their question from the active selection text and auto-submit once on
/// mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMode {
    Chat,
    Translate,
    Summarize,
    Explain,
}

impl AiMode {
    /// Endpoint path serving this mode.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            AiMode::Chat => "/api/chat",
            AiMode::Translate => "/api/translate",
            AiMode::Summarize => "/api/summarize",
            AiMode::Explain => "/api/explain",
        }
    }

    /// Transient placeholder shown while awaiting the first byte.
    pub fn action_text(self) -> &'static str {
        match self {
            AiMode::Chat => "Thinking...",
            AiMode::Translate => "Coming up with a translation...",
            AiMode::Summarize => "Producing a summary...",
            AiMode::Explain => "Thinking of an explanation...",
        }
    }

    /// Whether selecting this mode auto-submits from the active selection.
    pub fn is_auto(self) -> bool {
        !matches!(self, AiMode::Chat)
    }
}

impl std::str::FromStr for AiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(AiMode::Chat),
            "translate" => Ok(AiMode::Translate),
            "summarize" => Ok(AiMode::Summarize),
            "explain" => Ok(AiMode::Explain),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Request body for an assistant call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub question: String,
    /// The highlighted passage the question is anchored to. Absent for
    /// area highlights, which carry no text.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phrase: Option<String>,
    pub chat_history: Vec<Exchange>,
    pub index_key: String,
    /// Target language; only sent for translation requests.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
}

/// One document reference returned after the answer body.
///
/// The retrieval layer's shape is loose; every field is optional and
/// anything else it emits lands in `metadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page_content: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
