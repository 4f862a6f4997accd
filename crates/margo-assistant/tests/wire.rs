use margo_assistant::request::{AiMode, AssistantRequest, SourceRecord};
use margo_core::models::thread::Exchange;

#[test]
fn request_serializes_with_camel_case_keys() {
    let request = AssistantRequest {
        question: "why?".to_string(),
        phrase: Some("neural nets".to_string()),
        chat_history: vec![Exchange::new("earlier?", "indeed")],
        index_key: "paperpdf".to_string(),
        language: None,
    };

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["question"], serde_json::json!("why?"));
    assert_eq!(json["phrase"], serde_json::json!("neural nets"));
    assert_eq!(json["indexKey"], serde_json::json!("paperpdf"));
    assert_eq!(
        json["chatHistory"],
        serde_json::json!([["earlier?", "indeed"]])
    );
    // Optional fields are omitted, not null.
    assert!(json.get("language").is_none());
}

#[test]
fn translate_requests_carry_a_language() {
    let request = AssistantRequest {
        question: "bonjour".to_string(),
        phrase: None,
        chat_history: Vec::new(),
        index_key: "k".to_string(),
        language: Some("Chinese".to_string()),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["language"], serde_json::json!("Chinese"));
    assert!(json.get("phrase").is_none());
}

#[test]
fn source_record_accepts_minimal_shapes() {
    let record: SourceRecord = serde_json::from_str(r#"{"title":"doc1"}"#).unwrap();
    assert_eq!(record.title.as_deref(), Some("doc1"));
    assert!(record.page_content.is_none());

    let records: Vec<SourceRecord> = serde_json::from_str(
        r#"[{"pageContent":"text...","metadata":{"page":3}},{}]"#,
    )
    .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].page_content.as_deref(), Some("text..."));
    assert_eq!(records[0].metadata["page"], serde_json::json!(3));
}

#[test]
fn modes_map_to_their_endpoints() {
    assert_eq!(AiMode::Chat.endpoint_path(), "/api/chat");
    assert_eq!(AiMode::Translate.endpoint_path(), "/api/translate");
    assert_eq!(AiMode::Summarize.endpoint_path(), "/api/summarize");
    assert_eq!(AiMode::Explain.endpoint_path(), "/api/explain");
}

#[test]
fn only_chat_waits_for_the_reader() {
    assert!(!AiMode::Chat.is_auto());
    assert!(AiMode::Translate.is_auto());
    assert!(AiMode::Summarize.is_auto());
    assert!(AiMode::Explain.is_auto());
}

#[test]
fn mode_parses_from_user_input() {
    assert_eq!("summarize".parse::<AiMode>().unwrap(), AiMode::Summarize);
    assert!("haiku".parse::<AiMode>().is_err());
}
