use tempfile::TempDir;

use margo_archive::store::ArchiveStore;
use margo_core::models::highlight::{
    Comment, HighlightContent, HighlightPosition, NewHighlight,
};
use margo_core::models::thread::ConversationThread;
use margo_session::error::SessionError;
use margo_session::session::DocumentSession;

fn scratch_archive() -> (TempDir, ArchiveStore) {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::open(dir.path().join("archive.json"));
    (dir, store)
}

fn text_draft(text: &str) -> NewHighlight {
    NewHighlight {
        content: HighlightContent {
            text: Some(text.to_string()),
            image: None,
        },
        position: HighlightPosition {
            page_number: 1,
            ..Default::default()
        },
        comment: Comment::default(),
    }
}

/// Seed the archive with a saved thread and return its highlight id.
fn seed_thread(archive: &ArchiveStore, file_name: &str, text: &str, q: &str, a: &str) -> String {
    let mut session = DocumentSession::open(file_name, archive);
    let id = session.create_highlight(text_draft(text)).id.clone();
    let mut thread = ConversationThread::new(session.selected_highlight().unwrap().clone());
    thread.append_exchange(q, a);
    archive.upsert_thread(file_name, thread, None).unwrap();
    id
}

#[test]
fn open_derives_index_key_and_loads_saved_highlights() {
    let (_dir, archive) = scratch_archive();
    let id = seed_thread(&archive, "My Paper.pdf", "a passage", "why?", "because");

    let session = DocumentSession::open("My Paper.pdf", &archive);
    assert_eq!(session.index_key, "mypaperpdf");
    assert_eq!(session.highlights.len(), 1);
    assert_eq!(session.highlights[0].id, id);
    assert!(session.highlights[0].is_saved);
    assert_eq!(session.generations.get(&id), Some(&1));
}

#[test]
fn create_prepends_and_moves_the_selection_pointer() {
    let (_dir, archive) = scratch_archive();
    let mut session = DocumentSession::open("paper.pdf", &archive);

    let first = session.create_highlight(text_draft("first")).id.clone();
    let second = session.create_highlight(text_draft("second")).id.clone();

    assert_ne!(first, second);
    assert_eq!(session.highlights[0].id, second);
    assert_eq!(session.selection.as_deref(), Some(second.as_str()));
    assert_eq!(
        session.selection_address(),
        Some(format!("highlight-{second}"))
    );
}

#[test]
fn refresh_is_idempotent() {
    let (_dir, archive) = scratch_archive();
    seed_thread(&archive, "paper.pdf", "saved passage", "q", "a");

    let mut session = DocumentSession::open("paper.pdf", &archive);
    session.create_highlight(text_draft("unsaved passage"));

    session.refresh(&archive);
    let highlights = session.highlights.clone();
    let threads = session.threads.clone();
    let generations = session.generations.clone();
    let selection = session.selection.clone();

    session.refresh(&archive);
    assert_eq!(session.highlights, highlights);
    assert_eq!(session.threads, threads);
    assert_eq!(session.generations, generations);
    assert_eq!(session.selection, selection);
}

#[test]
fn refresh_keeps_unsaved_highlights_visible() {
    let (_dir, archive) = scratch_archive();
    seed_thread(&archive, "paper.pdf", "saved passage", "q", "a");

    let mut session = DocumentSession::open("paper.pdf", &archive);
    let unsaved = session.create_highlight(text_draft("unsaved")).id.clone();

    session.refresh(&archive);
    assert_eq!(session.highlights.len(), 2);
    assert_eq!(session.highlights[0].id, unsaved);
    assert!(!session.highlights[0].is_saved);
}

#[test]
fn delete_removes_highlight_thread_and_selection() {
    let (_dir, archive) = scratch_archive();
    let id = seed_thread(&archive, "paper.pdf", "a passage", "why?", "because");

    let mut session = DocumentSession::open("paper.pdf", &archive);
    session.select(&id).unwrap();

    session.delete_highlight(&id, &archive).unwrap();
    assert!(session.highlights.is_empty());
    assert!(session.threads.is_empty());
    assert_eq!(session.selection, None);

    // Reloading the archive shows no trace of the highlight.
    let files = archive.load();
    let entry = files.iter().find(|f| f.file_name == "paper.pdf").unwrap();
    assert!(entry.histories.is_empty());
}

#[test]
fn delete_of_unknown_highlight_errors() {
    let (_dir, archive) = scratch_archive();
    let mut session = DocumentSession::open("paper.pdf", &archive);
    let err = session.delete_highlight("missing", &archive).unwrap_err();
    assert!(matches!(err, SessionError::UnknownHighlight(_)));
}

#[test]
fn update_merges_into_existing_highlight() {
    use margo_core::models::highlight::{ContentPatch, HighlightPatch};

    let (_dir, archive) = scratch_archive();
    let mut session = DocumentSession::open("paper.pdf", &archive);
    let id = session.create_highlight(text_draft("a passage")).id.clone();

    session
        .update_highlight(
            &id,
            &HighlightPatch {
                content: ContentPatch {
                    image: Some("c2NyZWVuc2hvdA==".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        session.highlights[0].content.image.as_deref(),
        Some("c2NyZWVuc2hvdA==")
    );

    let err = session
        .update_highlight("missing", &HighlightPatch::default())
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownHighlight(_)));
}

#[test]
fn selection_routes_through_addresses() {
    let (_dir, archive) = scratch_archive();
    let id = seed_thread(&archive, "paper.pdf", "a passage", "q", "a");

    let mut session = DocumentSession::open("paper.pdf", &archive);
    session
        .select_from_address(&format!("#highlight-{id}"))
        .unwrap();
    assert_eq!(session.selection.as_deref(), Some(id.as_str()));

    // Navigating away clears the pointer.
    session.select_from_address("").unwrap();
    assert_eq!(session.selection, None);

    let err = session.select("missing").unwrap_err();
    assert!(matches!(err, SessionError::UnknownHighlight(_)));
}

#[test]
fn transcript_swaps_entirely_with_the_pointer() {
    let (_dir, archive) = scratch_archive();
    let first = seed_thread(&archive, "paper.pdf", "passage one", "q1", "a1");
    let second = seed_thread(&archive, "paper.pdf", "passage two", "q2", "a2");

    let mut session = DocumentSession::open("paper.pdf", &archive);

    session.select(&first).unwrap();
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "q1");

    session.select(&second).unwrap();
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "q2");

    session.clear_selection();
    assert!(session.transcript().is_empty());
}

#[test]
fn documents_do_not_share_registries() {
    let (_dir, archive) = scratch_archive();
    seed_thread(&archive, "one.pdf", "a passage", "q", "a");

    let session = DocumentSession::open("two.pdf", &archive);
    assert!(session.highlights.is_empty());
}
