use serde::{Deserialize, Serialize};

use margo_core::models::thread::ConversationThread;

/// Current archive schema version. Bump this when the shape changes; each
/// bump requires a corresponding entry in [`crate::store::migrate`].
pub const CURRENT_VERSION: u32 = 1;

/// The whole on-disk archive: every document's highlights and threads.
///
/// Replaced as a single unit on each mutation; there are no partial
/// writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveDocument {
    /// Schema version. 0 marks the pre-versioned bare-array shape.
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub files: Vec<FileArchive>,
}

/// All persisted state for one document, keyed by file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileArchive {
    pub file_name: String,
    pub histories: Vec<StoredThread>,
}

/// A conversation thread at rest, with its write generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredThread {
    #[serde(flatten)]
    pub thread: ConversationThread,
    /// Bumped on every successful upsert. A save carrying a generation
    /// other than the one currently stored is stale and rejected.
    #[serde(default)]
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<jiff::Timestamp>,
}
