//! In-memory session state for one open document: the annotation
//! registry, the selection pointer, and the archive-derived thread cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use margo_archive::store::ArchiveStore;
use margo_assistant::request::AiMode;
use margo_core::address::{highlight_address, parse_highlight_address};
use margo_core::index_key::index_key;
use margo_core::models::highlight::{Highlight, HighlightPatch, NewHighlight};
use margo_core::models::thread::{self, ConversationThread, TranscriptMessage};

use crate::error::SessionError;

/// Phase of the session's single assistant turn. Only one run may be
/// active at a time; submissions while non-Idle are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingFirstByte,
    Streaming,
    Finalizing,
}

/// Session state behind a single async mutex. All in-memory mutations are
/// synchronous between lock acquisitions; suspension happens only at the
/// network round-trip and per-chunk reads, outside the lock.
pub type SharedSession = Arc<Mutex<DocumentSession>>;

pub struct DocumentSession {
    pub file_name: String,
    pub index_key: String,
    pub mode: AiMode,
    /// The annotation registry: unsaved in-session highlights first, then
    /// the archive-backed ones.
    pub highlights: Vec<Highlight>,
    /// Threads for this document, rebuilt from the archive on refresh.
    pub threads: Vec<ConversationThread>,
    /// Write generation per saved highlight id, captured at refresh time.
    pub generations: HashMap<String, u64>,
    /// The selection pointer: current highlight id, or none. Changing it
    /// is the sole trigger for swapping the rendered transcript.
    pub selection: Option<String>,
    pub phase: TurnPhase,
}

impl DocumentSession {
    /// Open a document: derive its index key and load its registry view
    /// from the archive.
    pub fn open(file_name: impl Into<String>, archive: &ArchiveStore) -> Self {
        let file_name = file_name.into();
        let mut session = Self {
            index_key: index_key(&file_name),
            file_name,
            mode: AiMode::Chat,
            highlights: Vec::new(),
            threads: Vec::new(),
            generations: HashMap::new(),
            selection: None,
            phase: TurnPhase::Idle,
        };
        session.refresh(archive);
        session
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Rebuild the registry view from the archive, the synchronization
    /// point after any write. Saved highlights are re-derived from the
    /// archive; highlights created this session but not yet persisted
    /// stay visible ahead of them. Idempotent: refreshing twice with no
    /// intervening mutation yields identical state.
    pub fn refresh(&mut self, archive: &ArchiveStore) {
        let files = archive.load();
        let entry = files.into_iter().find(|f| f.file_name == self.file_name);

        let mut saved: Vec<Highlight> = Vec::new();
        let mut threads = Vec::new();
        let mut generations = HashMap::new();
        if let Some(entry) = entry {
            for stored in entry.histories {
                generations.insert(stored.thread.highlight_id.clone(), stored.generation);
                saved.push(stored.thread.highlight.clone());
                threads.push(stored.thread);
            }
        }

        let mut highlights: Vec<Highlight> = self
            .highlights
            .iter()
            .filter(|h| !h.is_saved && !saved.iter().any(|s| s.id == h.id))
            .cloned()
            .collect();
        highlights.extend(saved);

        self.highlights = highlights;
        self.threads = threads;
        self.generations = generations;

        // Prune a dangling selection (the highlight was deleted, possibly
        // by a write that raced this refresh).
        if let Some(id) = self.selection.clone() {
            if !self.highlights.iter().any(|h| h.id == id) {
                self.selection = None;
            }
        }
    }

    /// Register a completed selection under a fresh id, prepend it to the
    /// registry, and move the selection pointer to it. The highlight is
    /// unsaved until its first exchange is archived.
    pub fn create_highlight(&mut self, draft: NewHighlight) -> &Highlight {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let highlight = Highlight::from_draft(id.clone(), draft);
        self.highlights.insert(0, highlight);
        self.selection = Some(id);
        &self.highlights[0]
    }

    /// Shallow-merge a partial position/content update into an existing
    /// highlight. An area highlight gains its screenshot after first
    /// render this way.
    pub fn update_highlight(
        &mut self,
        id: &str,
        patch: &HighlightPatch,
    ) -> Result<(), SessionError> {
        let highlight = self
            .highlights
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| SessionError::UnknownHighlight(id.to_string()))?;
        highlight.apply(patch);
        Ok(())
    }

    /// Delete a highlight and its thread, clear the selection pointer if
    /// it pointed at the deleted id, and resynchronize from the archive.
    pub fn delete_highlight(
        &mut self,
        id: &str,
        archive: &ArchiveStore,
    ) -> Result<(), SessionError> {
        let before = self.highlights.len();
        self.highlights.retain(|h| h.id != id);
        if self.highlights.len() == before {
            return Err(SessionError::UnknownHighlight(id.to_string()));
        }

        archive.delete_thread_for_highlight(&self.file_name, id)?;
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        self.refresh(archive);
        Ok(())
    }

    /// Point the conversation view at a highlight.
    pub fn select(&mut self, id: &str) -> Result<(), SessionError> {
        if !self.highlights.iter().any(|h| h.id == id) {
            return Err(SessionError::UnknownHighlight(id.to_string()));
        }
        self.selection = Some(id.to_string());
        Ok(())
    }

    /// Route the selection pointer from a navigable address. An empty or
    /// unrecognized address clears the selection.
    pub fn select_from_address(&mut self, address: &str) -> Result<(), SessionError> {
        match parse_highlight_address(address) {
            Some(id) => {
                let id = id.to_string();
                self.select(&id)
            }
            None => {
                self.clear_selection();
                Ok(())
            }
        }
    }

    /// Navigate away from any highlight.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The navigable address of the current selection, if any.
    pub fn selection_address(&self) -> Option<String> {
        self.selection.as_deref().map(highlight_address)
    }

    pub fn selected_highlight(&self) -> Option<&Highlight> {
        let id = self.selection.as_deref()?;
        self.highlights.iter().find(|h| h.id == id)
    }

    /// Thread for the current selection, if one has been persisted.
    pub fn selected_thread(&self) -> Option<&ConversationThread> {
        let id = self.selection.as_deref()?;
        thread::thread_for(&self.threads, id)
    }

    /// Role-tagged transcript for the current selection; empty when there
    /// is no selection or no history yet. Rebuilt in full on each pointer
    /// change.
    pub fn transcript(&self) -> Vec<TranscriptMessage> {
        self.selected_thread()
            .map(thread::messages_view)
            .unwrap_or_default()
    }
}
