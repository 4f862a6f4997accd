//! Conversation orchestrator.
//!
//! Composes the transport, the stream demultiplexer, the thread store,
//! and the archive into one assistant turn:
//! `Idle -> AwaitingFirstByte -> Streaming -> Finalizing -> Idle`,
//! aborting back to Idle on any transport failure.
//!
//! Pre-flight rejections (no selection, a turn already active) are
//! returned as errors; everything after submission is contained here and
//! surfaced only through the transcript event channel; the rendering
//! layer never sees an uncaught fault.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use margo_archive::error::ArchiveError;
use margo_archive::store::ArchiveStore;
use margo_assistant::demux::StreamDemux;
use margo_assistant::request::{AiMode, AssistantRequest};
use margo_assistant::transport::AssistantTransport;
use margo_core::models::thread::{self, ConversationThread};

use crate::error::SessionError;
use crate::events::{TranscriptEvent, TranscriptSender};
use crate::session::{SharedSession, TurnPhase};

pub struct Orchestrator {
    archive: Arc<ArchiveStore>,
    transport: Arc<dyn AssistantTransport>,
    /// Target language attached to translation requests.
    translate_language: String,
}

/// Everything captured under the lock at submission time. The stream is
/// consumed without the lock held, so the registry can change underneath;
/// finalization re-checks against live state.
struct TurnContext {
    mode: AiMode,
    request: AssistantRequest,
    file_name: String,
    highlight_id: String,
    generation: Option<u64>,
}

impl Orchestrator {
    pub fn new(
        archive: Arc<ArchiveStore>,
        transport: Arc<dyn AssistantTransport>,
        translate_language: impl Into<String>,
    ) -> Self {
        Self {
            archive,
            transport,
            translate_language: translate_language.into(),
        }
    }

    /// Switch conversation mode. Auto modes (translate / summarize /
    /// explain) synthesize their question from the active selection text
    /// and submit once; chat waits for the reader. Selecting an auto mode
    /// with no selection, or with an area highlight, does nothing.
    pub async fn set_mode(
        &self,
        session: &SharedSession,
        mode: AiMode,
        events: &TranscriptSender,
    ) -> Result<(), SessionError> {
        let question = {
            let mut state = session.lock().await;
            state.mode = mode;
            if !mode.is_auto() {
                return Ok(());
            }
            match state
                .selected_highlight()
                .and_then(|h| h.content.text.clone())
            {
                Some(text) if !text.is_empty() => text,
                _ => return Ok(()),
            }
        };
        self.submit(session, question, events).await
    }

    /// Run one assistant turn for the current selection.
    pub async fn submit(
        &self,
        session: &SharedSession,
        question: String,
        events: &TranscriptSender,
    ) -> Result<(), SessionError> {
        let ctx = self.begin_turn(session, question.clone()).await?;
        let _ = events.send(TranscriptEvent::Thinking {
            text: ctx.mode.action_text().to_string(),
        });

        let mut stream = match self.transport.ask(ctx.mode, &ctx.request).await {
            Ok(stream) => stream,
            Err(e) => {
                self.abort(session, events, &e).await;
                return Ok(());
            }
        };

        let mut demux = StreamDemux::new();
        let mut first_chunk = true;
        loop {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    if first_chunk {
                        first_chunk = false;
                        session.lock().await.phase = TurnPhase::Streaming;
                    }
                    if let Some(text) = demux.push(&chunk) {
                        let _ = events.send(TranscriptEvent::Delta { text });
                    }
                }
                Some(Err(e)) => {
                    self.abort(session, events, &e).await;
                    return Ok(());
                }
                None => break,
            }
        }

        self.finalize(session, events, ctx, question, demux).await;
        Ok(())
    }

    /// Idle -> AwaitingFirstByte: reject if a turn is already active,
    /// capture the request scope, and disable further submission.
    async fn begin_turn(
        &self,
        session: &SharedSession,
        question: String,
    ) -> Result<TurnContext, SessionError> {
        let mut state = session.lock().await;
        if state.phase != TurnPhase::Idle {
            return Err(SessionError::AssistantBusy);
        }

        let highlight = state.selected_highlight().ok_or(SessionError::NoSelection)?;
        let highlight_id = highlight.id.clone();
        let phrase = highlight.content.text.clone();
        let chat_history = state
            .selected_thread()
            .map(|t| t.chat_history.clone())
            .unwrap_or_default();
        let mode = state.mode;

        let ctx = TurnContext {
            mode,
            request: AssistantRequest {
                question,
                phrase,
                chat_history,
                index_key: state.index_key.clone(),
                language: (mode == AiMode::Translate).then(|| self.translate_language.clone()),
            },
            file_name: state.file_name.clone(),
            generation: state.generations.get(&highlight_id).copied(),
            highlight_id,
        };

        state.phase = TurnPhase::AwaitingFirstByte;
        Ok(ctx)
    }

    /// Any non-Idle state -> aborted: surface a user-visible notice,
    /// record nothing, re-enable submission.
    async fn abort(
        &self,
        session: &SharedSession,
        events: &TranscriptSender,
        error: &dyn std::fmt::Display,
    ) {
        warn!(error = %error, "assistant turn failed");
        let _ = events.send(TranscriptEvent::Failed {
            notice: "the assistant didn't answer, try again".to_string(),
        });
        session.lock().await.phase = TurnPhase::Idle;
    }

    /// Streaming -> Finalizing -> Idle: resolve the demultiplexer, append
    /// the exchange, persist, and resynchronize the registry.
    async fn finalize(
        &self,
        session: &SharedSession,
        events: &TranscriptSender,
        ctx: TurnContext,
        question: String,
        demux: StreamDemux,
    ) {
        session.lock().await.phase = TurnPhase::Finalizing;

        let outcome = demux.finish();
        let _ = events.send(TranscriptEvent::Completed {
            answer: outcome.answer.clone(),
            sources: outcome.sources.clone(),
        });

        let mut state = session.lock().await;

        // The exchange is appended only now that the stream has fully
        // resolved; a half-received stream never reaches the archive.
        let Some(live) = state
            .highlights
            .iter()
            .find(|h| h.id == ctx.highlight_id)
            .cloned()
        else {
            // Deleted while the stream was in flight: the delete wins and
            // the thread is not resurrected.
            warn!(
                highlight_id = %ctx.highlight_id,
                "highlight deleted mid-stream, dropping exchange"
            );
            state.phase = TurnPhase::Idle;
            return;
        };

        let mut thread = thread::thread_for(&state.threads, &ctx.highlight_id)
            .cloned()
            .unwrap_or_else(|| ConversationThread::new(live.clone()));
        // Keep the stored snapshot in sync with the live registry entry.
        thread.highlight = live;
        thread.append_exchange(question, outcome.answer);

        match self
            .archive
            .upsert_thread(&ctx.file_name, thread, ctx.generation)
        {
            Ok(generation) => {
                info!(highlight_id = %ctx.highlight_id, generation, "exchange persisted");
            }
            Err(e @ ArchiveError::StaleWrite { .. }) => {
                warn!(error = %e, "dropping stale save");
            }
            Err(e) => {
                // Storage trouble is contained: the transcript already
                // shows the answer, the write just didn't stick.
                warn!(error = %e, "failed to persist exchange");
            }
        }

        state.refresh(&self.archive);
        state.phase = TurnPhase::Idle;
    }
}
