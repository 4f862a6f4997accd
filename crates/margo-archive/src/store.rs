use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{info, warn};

use margo_core::models::thread::ConversationThread;

use crate::document::{ArchiveDocument, CURRENT_VERSION, FileArchive, StoredThread};
use crate::error::ArchiveError;
use crate::events::ArchiveEvent;

/// The injected archive service. All components receive it by reference;
/// nothing else reads or writes the backing file.
///
/// Every mutating operation re-reads the current archive from disk before
/// applying itself, so a write never trusts a caller-held snapshot of the
/// highlight list.
pub struct ArchiveStore {
    path: PathBuf,
    events: broadcast::Sender<ArchiveEvent>,
}

impl ArchiveStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            path: path.into(),
            events,
        }
    }

    /// Default archive location under the platform data directory.
    pub fn default_path() -> Result<PathBuf, ArchiveError> {
        let base = dirs::data_dir().ok_or(ArchiveError::NoDataDir)?;
        Ok(base.join("margo").join("archive.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to change notifications. An event is emitted after every
    /// successful mutating write.
    pub fn subscribe(&self) -> broadcast::Receiver<ArchiveEvent> {
        self.events.subscribe()
    }

    /// Load all document entries.
    ///
    /// A missing, unreadable, or corrupt archive degrades to an empty one
    /// with a warning; callers must tolerate total data loss gracefully.
    pub fn load(&self) -> Vec<FileArchive> {
        match self.try_load() {
            Ok(doc) => doc.files,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.path.display(),
                    "archive unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<ArchiveDocument, ArchiveError> {
        if !self.path.exists() {
            return Ok(ArchiveDocument::default());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| io_error(&self.path, e))?;

        // Parse as raw JSON so migrations can run before deserializing.
        let json: serde_json::Value = serde_json::from_str(&contents)?;
        let migrated = migrate(json)?;
        Ok(serde_json::from_value(migrated)?)
    }

    /// Atomically replace the whole archive, stamping the current schema
    /// version. Write to a temp file then rename, so a crash never leaves
    /// a partial archive behind.
    pub fn save(&self, files: Vec<FileArchive>) -> Result<(), ArchiveError> {
        let doc = ArchiveDocument {
            schema_version: CURRENT_VERSION,
            files,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }

        let json = serde_json::to_string_pretty(&doc)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json.as_bytes()).map_err(|e| io_error(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| io_error(&self.path, e))?;

        Ok(())
    }

    /// Insert or replace the thread for `thread.highlight.id` under the
    /// document entry for `file_name`, creating the entry if absent, then
    /// persist the whole archive.
    ///
    /// `expected_generation` is the generation the caller read before
    /// building the thread (`None` for a thread it believes is new). A
    /// mismatch (including a thread deleted underneath the caller) is
    /// rejected as [`ArchiveError::StaleWrite`]; deletion wins and threads
    /// are never resurrected. Returns the new generation.
    pub fn upsert_thread(
        &self,
        file_name: &str,
        mut thread: ConversationThread,
        expected_generation: Option<u64>,
    ) -> Result<u64, ArchiveError> {
        // A thread at rest always marks its highlight saved, and the
        // embedded snapshot's id is authoritative.
        thread.highlight.is_saved = true;
        thread.highlight_id = thread.highlight.id.clone();

        let mut files = self.load();
        let entry_index = match files.iter().position(|f| f.file_name == file_name) {
            Some(i) => i,
            None => {
                files.push(FileArchive {
                    file_name: file_name.to_string(),
                    histories: Vec::new(),
                });
                files.len() - 1
            }
        };
        let entry = &mut files[entry_index];

        let highlight_id = thread.highlight_id.clone();
        let now = jiff::Timestamp::now();

        let generation = match entry
            .histories
            .iter_mut()
            .find(|h| h.thread.highlight_id == highlight_id)
        {
            Some(stored) => {
                if expected_generation != Some(stored.generation) {
                    return Err(ArchiveError::StaleWrite {
                        highlight_id,
                        expected: expected_generation,
                        found: Some(stored.generation),
                    });
                }
                stored.thread = thread;
                stored.generation += 1;
                stored.updated_at = Some(now);
                stored.generation
            }
            None => {
                if expected_generation.is_some() {
                    return Err(ArchiveError::StaleWrite {
                        highlight_id,
                        expected: expected_generation,
                        found: None,
                    });
                }
                entry.histories.push(StoredThread {
                    thread,
                    generation: 1,
                    updated_at: Some(now),
                });
                1
            }
        };

        self.save(files)?;
        info!(file_name, highlight_id = %highlight_id, generation, "thread saved");
        let _ = self.events.send(ArchiveEvent::Changed {
            file_name: file_name.to_string(),
        });

        Ok(generation)
    }

    /// Remove the thread for a highlight id, filtering on id against the
    /// freshest archive state rather than any caller-held copy. A missing
    /// entry or thread is a no-op.
    pub fn delete_thread_for_highlight(
        &self,
        file_name: &str,
        highlight_id: &str,
    ) -> Result<(), ArchiveError> {
        let mut files = self.load();
        let Some(entry) = files.iter_mut().find(|f| f.file_name == file_name) else {
            return Ok(());
        };

        let before = entry.histories.len();
        entry
            .histories
            .retain(|h| h.thread.highlight_id != highlight_id);
        if entry.histories.len() == before {
            return Ok(());
        }

        self.save(files)?;
        info!(file_name, highlight_id, "thread deleted");
        let _ = self.events.send(ArchiveEvent::Changed {
            file_name: file_name.to_string(),
        });

        Ok(())
    }
}

/// Run migrations on the raw archive JSON up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the JSON value.
fn migrate(json: serde_json::Value) -> Result<serde_json::Value, ArchiveError> {
    // v0 -> v1: the pre-versioned archive was a bare array of file
    // entries with no generation counters. Wrap it in the versioned
    // envelope; generations default to 0 on deserialization.
    if json.is_array() {
        info!("migrating archive v0 -> v1");
        return Ok(serde_json::json!({
            "schemaVersion": 1,
            "files": json,
        }));
    }

    let version = json
        .get("schemaVersion")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    if version > CURRENT_VERSION {
        return Err(ArchiveError::UnsupportedVersion(version));
    }

    // Future migrations go here:
    // if version < 2 { ... }

    Ok(json)
}

fn io_error(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        source,
    }
}
