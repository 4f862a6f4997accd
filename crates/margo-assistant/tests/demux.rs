use margo_assistant::demux::{DemuxedResponse, StreamDemux};

fn run(chunks: &[&str]) -> (Vec<String>, DemuxedResponse) {
    let mut demux = StreamDemux::new();
    let mut emitted = Vec::new();
    for chunk in chunks {
        if let Some(text) = demux.push(chunk.as_bytes()) {
            emitted.push(text);
        }
    }
    (emitted, demux.finish())
}

#[test]
fn sentinel_split_across_chunks() {
    let (emitted, outcome) = run(&[
        "par",
        "tial-answertokens-end",
        "ed",
        r#"[{"title":"doc1"}]"#,
    ]);

    assert_eq!(outcome.answer, "partial-answer");
    assert_eq!(outcome.sources.len(), 1);
    assert_eq!(outcome.sources[0].title.as_deref(), Some("doc1"));
    assert_eq!(emitted.concat(), "partial-answer");
}

#[test]
fn no_sentinel_means_plain_answer() {
    let (emitted, outcome) = run(&["Hello, ", "world."]);
    assert_eq!(outcome.answer, "Hello, world.");
    assert!(outcome.sources.is_empty());
    assert_eq!(emitted, vec!["Hello, ".to_string(), "world.".to_string()]);
}

#[test]
fn sentinel_in_one_chunk_splits_it() {
    let (_, outcome) = run(&[r#"the answertokens-ended[{"title":"ref"}]"#]);
    assert_eq!(outcome.answer, "the answer");
    assert_eq!(outcome.sources[0].title.as_deref(), Some("ref"));
}

#[test]
fn metadata_split_across_chunks() {
    let (_, outcome) = run(&["anstokens-ended", r#"[{"ti"#, r#"tle":"doc"}]"#]);
    assert_eq!(outcome.answer, "ans");
    assert_eq!(outcome.sources[0].title.as_deref(), Some("doc"));
}

#[test]
fn sentinel_with_no_metadata_yields_empty_sources() {
    let (_, outcome) = run(&["answer body", "tokens-ended"]);
    assert_eq!(outcome.answer, "answer body");
    assert!(outcome.sources.is_empty());
}

#[test]
fn malformed_metadata_degrades_to_empty() {
    let (_, outcome) = run(&["anstokens-ended", "{ not a json array"]);
    assert_eq!(outcome.answer, "ans");
    assert!(outcome.sources.is_empty());
}

#[test]
fn chunk_boundary_invariance() {
    let full = r#"the quick answertokens-ended[{"title":"doc1"},{"title":"doc2"}]"#;

    // Every split of the same byte sequence must demultiplex identically.
    let splits: &[&[usize]] = &[
        &[],
        &[1],
        &[16],
        &[17],
        &[20],
        &[27],
        &[5, 18, 25, 40],
        &[15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28],
    ];

    for split in splits {
        let mut demux = StreamDemux::new();
        let mut start = 0;
        for &end in *split {
            demux.push(&full.as_bytes()[start..end]);
            start = end;
        }
        demux.push(&full.as_bytes()[start..]);

        let outcome = demux.finish();
        assert_eq!(outcome.answer, "the quick answer", "split {split:?}");
        assert_eq!(outcome.sources.len(), 2, "split {split:?}");
        assert_eq!(outcome.sources[1].title.as_deref(), Some("doc2"));
    }
}

#[test]
fn multibyte_character_split_across_chunks() {
    let bytes = "caf\u{e9} au lait".as_bytes();
    // Split inside the two-byte 'é'.
    let mut demux = StreamDemux::new();
    let first = demux.push(&bytes[..4]);
    let second = demux.push(&bytes[4..]);

    // The held-back half is not emitted as a replacement character. (The
    // final "t" is also held back — it could begin a sentinel — and is
    // flushed at finish.)
    assert_eq!(first.as_deref(), Some("caf"));
    assert_eq!(second.as_deref(), Some("\u{e9} au lai"));
    assert_eq!(demux.finish().answer, "caf\u{e9} au lait");
}

#[test]
fn empty_chunks_are_harmless() {
    let (_, outcome) = run(&["", "ans", "", "tokens-ended", ""]);
    assert_eq!(outcome.answer, "ans");
    assert!(outcome.sources.is_empty());
}

#[test]
fn sentinel_lookalike_tail_is_flushed_at_finish() {
    // "tok" and a lone trailing "t" look like sentinel starts and are
    // held back, but the sentinel never completes: finish() returns them
    // to the answer.
    let (emitted, outcome) = run(&["stream", "ing tok", "en text"]);
    assert_eq!(outcome.answer, "streaming token text");
    assert!(outcome.answer.starts_with(&emitted.concat()));
    assert!(outcome.sources.is_empty());
}

#[test]
fn answer_so_far_tracks_emissions() {
    let mut demux = StreamDemux::new();
    demux.push(b"partial ");
    assert_eq!(demux.answer_so_far(), "partial ");
    demux.push(b"answer");
    assert_eq!(demux.answer_so_far(), "partial answer");
}
