//! AI video generation workflow, keyed by `mensaje_id` and independent of
//! the same message's publication state.
//!
//! `Generating(progress 0–100) → { Completed | Error }`. Progress is a
//! display hint with last-write-wins semantics — the producing collaborator
//! is the authority, so a regression is applied, not clamped. Completion
//! also flips the owning message's publication state to `Published` and may
//! carry platform results merged into the publishing results store.

use crate::model::{PublicationState, PublishResult, VideoState, VideoStatus};
use crate::transcript::TranscriptStore;

use super::publishing::PublishingWorkflows;

#[derive(Default)]
pub struct VideoWorkflows;

impl VideoWorkflows {
    pub fn new() -> Self {
        Self
    }

    /// Progress update while generating. Dropped for unknown messages and
    /// after a terminal status.
    pub fn on_status(
        &mut self,
        store: &mut TranscriptStore,
        mensaje_id: &str,
        progress: u8,
        message: Option<String>,
    ) {
        if self.is_terminal(store, mensaje_id) {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping video status after terminal state");
            return;
        }
        let patched = store.patch_by_id(mensaje_id, |m| {
            m.video_state = Some(VideoState {
                status: VideoStatus::Generating,
                message,
                progress: Some(progress),
            });
        });
        if !patched {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping video status for unknown message");
        }
    }

    /// Terminal success. The owning message is considered published; any
    /// reported platform results land in the publishing results store.
    pub fn on_complete(
        &mut self,
        store: &mut TranscriptStore,
        publishing: &mut PublishingWorkflows,
        mensaje_id: &str,
        results: Option<Vec<PublishResult>>,
        message: Option<String>,
    ) {
        if self.is_terminal(store, mensaje_id) {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping duplicate video completion");
            return;
        }
        let patched = store.patch_by_id(mensaje_id, |m| {
            m.video_state = Some(VideoState {
                status: VideoStatus::Completed,
                message,
                progress: Some(100),
            });
            m.publication_state = Some(PublicationState::Published);
        });
        if !patched {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping video completion for unknown message");
            return;
        }
        if let Some(results) = results {
            publishing.merge_results(mensaje_id, results);
        }
    }

    /// Terminal failure, surfaced on the message's video state only.
    pub fn on_error(&mut self, store: &mut TranscriptStore, mensaje_id: &str, error: &str) {
        if self.is_terminal(store, mensaje_id) {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping video error after terminal state");
            return;
        }
        let patched = store.patch_by_id(mensaje_id, |m| {
            m.video_state = Some(VideoState {
                status: VideoStatus::Error,
                message: Some(error.to_string()),
                progress: m.video_state.as_ref().and_then(|v| v.progress),
            });
        });
        if patched {
            tracing::warn!(mensaje_id = %mensaje_id, error = %error, "Video generation failed");
        } else {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping video error for unknown message");
        }
    }

    fn is_terminal(&self, store: &TranscriptStore, mensaje_id: &str) -> bool {
        store
            .find(mensaje_id)
            .and_then(|m| m.video_state.as_ref())
            .is_some_and(|v| matches!(v.status, VideoStatus::Completed | VideoStatus::Error))
    }
}
