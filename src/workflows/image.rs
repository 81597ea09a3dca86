//! Image generation workflow: ephemeral placeholder, one terminal message.
//!
//! Phases per correlation id:
//! `Requested → StreamingPlaceholder → { Complete | Error }`.
//! Both end states are terminal; later events for the same id are dropped,
//! as are terminal events for ids that were never started here.

use std::collections::HashMap;

use crate::model::{MediaAttachment, Message, LOADING_ID_PREFIX};
use crate::transcript::TranscriptStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePhase {
    /// Request dispatched, no backend acknowledgement yet.
    Requested,
    /// Placeholder visible in the transcript.
    StreamingPlaceholder,
    Complete,
    Error,
}

impl ImagePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImagePhase::Complete | ImagePhase::Error)
    }
}

/// Tracks image generations in flight for the active conversation.
#[derive(Default)]
pub struct ImageWorkflows {
    phases: HashMap<String, ImagePhase>,
}

impl ImageWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, mensaje_id: &str) -> Option<ImagePhase> {
        self.phases.get(mensaje_id).copied()
    }

    /// Backend acknowledged the request: show a transient placeholder.
    /// A repeated start for the same id is a duplicate delivery and is
    /// dropped, so the transcript never shows two placeholders at once.
    pub fn on_start(&mut self, store: &mut TranscriptStore, mensaje_id: &str) {
        match self.phases.entry(mensaje_id.to_string()).or_insert(ImagePhase::Requested) {
            phase @ ImagePhase::Requested => *phase = ImagePhase::StreamingPlaceholder,
            _ => {
                tracing::debug!(mensaje_id = %mensaje_id, "Dropping duplicate image start");
                return;
            }
        }
        let conversation_id = store.conversation_id().to_string();
        store.append(Message::placeholder(
            &conversation_id,
            mensaje_id,
            "Generating image…",
        ));
    }

    /// Terminal success: all placeholders for this workflow are removed and
    /// replaced by exactly one image message appended at the tail, so stale
    /// "in progress" text never coexists with the result.
    pub fn on_complete(
        &mut self,
        store: &mut TranscriptStore,
        mensaje_id: &str,
        media: MediaAttachment,
    ) {
        match self.phase(mensaje_id) {
            None => {
                tracing::warn!(mensaje_id = %mensaje_id, "Dropping image completion for unknown id");
                return;
            }
            Some(phase) if phase.is_terminal() => {
                tracing::debug!(mensaje_id = %mensaje_id, "Dropping duplicate image completion");
                return;
            }
            Some(_) => {}
        }
        self.phases
            .insert(mensaje_id.to_string(), ImagePhase::Complete);
        self.clear_placeholders(store, mensaje_id);
        let conversation_id = store.conversation_id().to_string();
        store.append(Message::image_final(&conversation_id, mensaje_id, media));
    }

    /// Terminal failure: placeholders removed, error surfaced as plain text.
    pub fn on_error(&mut self, store: &mut TranscriptStore, mensaje_id: &str, error: &str) {
        match self.phase(mensaje_id) {
            None => {
                tracing::warn!(mensaje_id = %mensaje_id, "Dropping image error for unknown id");
                return;
            }
            Some(phase) if phase.is_terminal() => {
                tracing::debug!(mensaje_id = %mensaje_id, "Dropping image error after terminal state");
                return;
            }
            Some(_) => {}
        }
        self.phases.insert(mensaje_id.to_string(), ImagePhase::Error);
        self.clear_placeholders(store, mensaje_id);
        let conversation_id = store.conversation_id().to_string();
        store.append(Message::error_text(&conversation_id, mensaje_id, error));
    }

    /// Forget all in-flight generations; late events then fall under the
    /// unknown-id drop rule. Called on conversation switch.
    pub fn reset(&mut self) {
        self.phases.clear();
    }

    fn clear_placeholders(&self, store: &mut TranscriptStore, mensaje_id: &str) {
        let removed = store.remove_where(|m| {
            m.id.starts_with(LOADING_ID_PREFIX) && m.correlation_id == mensaje_id
        });
        if removed > 0 {
            tracing::debug!(mensaje_id = %mensaje_id, removed, "Cleared image placeholders");
        }
    }
}
