use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use margo_archive::store::ArchiveStore;
use margo_assistant::request::AiMode;
use margo_assistant::transport::{AssistantTransport, HttpTransport};
use margo_core::address::highlight_address;
use margo_core::index_key::index_key;
use margo_core::models::highlight::{Comment, HighlightContent, HighlightPosition, NewHighlight};
use margo_core::models::thread::Role;
use margo_session::config;
use margo_session::events::TranscriptEvent;
use margo_session::orchestrator::Orchestrator;
use margo_session::session::{DocumentSession, SharedSession};

/// Annotate a document and hold an AI conversation on each highlight.
#[derive(Debug, Parser)]
#[command(name = "margo", version)]
struct Args {
    /// Document to open.
    document: PathBuf,

    /// Assistant service base URL (overrides the config file).
    #[arg(long)]
    endpoint: Option<String>,

    /// Skip uploading the document to the assistant's retrieval index.
    #[arg(long)]
    no_upload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = config::load_or_init()?;

    let file_name = args
        .document
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre::eyre!("document path has no usable file name"))?
        .to_string();

    let archive_path = match &config.archive_path {
        Some(path) => path.clone(),
        None => ArchiveStore::default_path()?,
    };
    let archive = Arc::new(ArchiveStore::open(archive_path));

    let endpoint = args
        .endpoint
        .unwrap_or_else(|| config.assistant_url.clone());
    let transport: Arc<dyn AssistantTransport> = Arc::new(HttpTransport::new(endpoint)?);

    if !args.no_upload {
        match std::fs::read(&args.document) {
            Ok(bytes) => {
                let key = index_key(&file_name);
                if let Err(e) = transport.upload(&file_name, bytes, &key).await {
                    warn!(error = %e, "upload failed, retrieval answers may be empty");
                }
            }
            Err(e) => warn!(error = %e, "could not read document for upload"),
        }
    }

    let session = DocumentSession::open(file_name.clone(), &archive).shared();
    let orchestrator = Orchestrator::new(
        archive.clone(),
        transport,
        config.translate_language.clone(),
    );

    let (events, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        use std::io::Write;
        while let Some(event) = event_rx.recv().await {
            match event {
                TranscriptEvent::Thinking { text } => println!("· {text}"),
                TranscriptEvent::Delta { text } => {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
                TranscriptEvent::Completed { sources, .. } => {
                    println!();
                    for source in sources {
                        if let Some(title) = source.title {
                            println!("  — source: {title}");
                        }
                    }
                }
                TranscriptEvent::Failed { notice } => println!("! {notice}"),
            }
        }
    });

    println!("{file_name} — type `help` for commands");
    repl(&session, &orchestrator, &archive, &events).await?;
    Ok(())
}

async fn repl(
    session: &SharedSession,
    orchestrator: &Orchestrator,
    archive: &ArchiveStore,
    events: &mpsc::UnboundedSender<TranscriptEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => print_help(),
            "list" => {
                let state = session.lock().await;
                if state.highlights.is_empty() {
                    println!("no highlights yet — `highlight <text>` to create one");
                }
                for h in &state.highlights {
                    let marker = if h.is_saved { " " } else { "*" };
                    let snippet = match &h.content.text {
                        Some(text) => excerpt(text),
                        None => "[area]".to_string(),
                    };
                    println!("{marker} {}  p{}  {snippet}", h.id, h.position.page_number);
                }
            }
            "highlight" if !rest.is_empty() => {
                let mut state = session.lock().await;
                let created = state.create_highlight(text_draft(rest));
                println!("created {}", highlight_address(&created.id));
            }
            "select" if !rest.is_empty() => {
                let mut state = session.lock().await;
                let result = if rest.starts_with('#') || rest.starts_with("highlight-") {
                    state.select_from_address(rest)
                } else {
                    state.select(rest)
                };
                match result {
                    Ok(()) => print_transcript(&state),
                    Err(e) => println!("! {e}"),
                }
            }
            "clear" => session.lock().await.clear_selection(),
            "thread" => print_transcript(&*session.lock().await),
            "mode" if !rest.is_empty() => match rest.parse::<AiMode>() {
                Ok(mode) => {
                    if let Err(e) = orchestrator.set_mode(session, mode, events).await {
                        println!("! {e}");
                    }
                }
                Err(e) => println!("! {e}"),
            },
            "ask" if !rest.is_empty() => {
                if let Err(e) = orchestrator.submit(session, rest.to_string(), events).await {
                    println!("! {e}");
                }
            }
            "delete" if !rest.is_empty() => {
                let mut state = session.lock().await;
                match state.delete_highlight(rest, archive) {
                    Ok(()) => println!("deleted {rest}"),
                    Err(e) => println!("! {e}"),
                }
            }
            other => println!("! unknown command: {other} (try `help`)"),
        }
    }

    Ok(())
}

fn print_help() {
    println!("  highlight <text>   register a text selection and select it");
    println!("  list               list highlights for this document");
    println!("  select <id>        point the conversation at a highlight");
    println!("  clear              drop the current selection");
    println!("  thread             show the selected highlight's conversation");
    println!("  ask <question>     ask the assistant about the selection");
    println!("  mode <m>           chat | translate | summarize | explain");
    println!("  delete <id>        remove a highlight and its conversation");
    println!("  quit               leave");
}

/// The rendering overlay normally supplies geometry with the selection;
/// the terminal shell has none, so the position is a zero region on
/// page 1.
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

fn print_transcript(state: &DocumentSession) {
    match state.selection_address() {
        Some(address) => println!("— {address} —"),
        None => {
            println!("no highlight selected");
            return;
        }
    }
    for message in state.transcript() {
        let tag = match message.role {
            Role::User => "you",
            Role::Assistant => " ai",
        };
        println!("[{tag}] {}", message.content);
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    let mut shortened: String = trimmed.chars().take(60).collect();
    if shortened.len() < trimmed.len() {
        shortened.push('…');
    }
    shortened
}
