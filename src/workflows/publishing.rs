//! Social publishing workflow, attached to a `SocialContent` message.
//!
//! `PendingConfirmation → [Confirmed →] Publishing → { Published | Error }`.
//! `Confirmed` is the local step recorded when the user issues the confirm
//! action; the backend's publish-start event transitions either of the first
//! two states into `Publishing`. Duplicate terminal deliveries must never
//! crash the client: a repeated `Publishing` is a no-op and a repeated
//! `Published` overwrites the results list (last write wins).

use std::collections::HashMap;

use crate::model::{Message, PublicationState, PublishResult, SocialContent};
use crate::transcript::TranscriptStore;

/// Tracks publication results per correlation id for the active conversation.
/// The state itself lives on the message (`publication_state`); this registry
/// only holds the per-platform results, which have no field on the message.
#[derive(Default)]
pub struct PublishingWorkflows {
    results: HashMap<String, Vec<PublishResult>>,
}

impl PublishingWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-platform outcomes reported for a publication, if any.
    pub fn results(&self, mensaje_id: &str) -> Option<&[PublishResult]> {
        self.results.get(mensaje_id).map(Vec::as_slice)
    }

    /// Entry point: backend generated the caption set. Creates the
    /// `SocialContent` message in `PendingConfirmation`. A duplicate delivery
    /// patches the existing message instead of appending a second one.
    pub fn on_content_generated(
        &mut self,
        store: &mut TranscriptStore,
        mensaje_id: &str,
        content: &str,
        social_content: SocialContent,
    ) {
        let patched = store.patch_by_id(mensaje_id, |m| {
            m.content = content.to_string();
            m.social_content = Some(social_content.clone());
        });
        if patched {
            tracing::debug!(mensaje_id = %mensaje_id, "Updated existing social content message");
            return;
        }
        let conversation_id = store.conversation_id().to_string();
        store.append(Message::social_pending(
            &conversation_id,
            mensaje_id,
            content,
            social_content,
        ));
    }

    /// Artwork for the publication is ready: patch media in place. No state
    /// change. Dropped when the message is gone (stale id).
    pub fn on_image_ready(&mut self, store: &mut TranscriptStore, mensaje_id: &str, url: &str) {
        let patched = store.patch_by_id(mensaje_id, |m| {
            m.media = Some(crate::model::MediaAttachment {
                url: url.to_string(),
                produced_by_model: None,
                revised_prompt: None,
            });
        });
        if !patched {
            tracing::debug!(mensaje_id = %mensaje_id, "Dropping social image for unknown message");
        }
    }

    /// Local confirm action: `PendingConfirmation → Confirmed`.
    pub fn mark_confirmed(&mut self, store: &mut TranscriptStore, mensaje_id: &str) {
        self.transition(store, mensaje_id, PublicationState::Confirmed, |current| {
            matches!(current, Some(PublicationState::PendingConfirmation))
        });
    }

    /// Backend started publishing. Accepted from `PendingConfirmation` (the
    /// local confirm step may never have been observed) or `Confirmed`;
    /// a repeat while already `Publishing` is a no-op.
    pub fn on_publish_start(&mut self, store: &mut TranscriptStore, mensaje_id: &str) {
        self.transition(store, mensaje_id, PublicationState::Publishing, |current| {
            matches!(
                current,
                Some(PublicationState::PendingConfirmation) | Some(PublicationState::Confirmed)
            )
        });
    }

    /// Terminal success with one result per target platform. Re-delivery
    /// overwrites the stored results rather than erroring.
    pub fn on_publish_complete(
        &mut self,
        store: &mut TranscriptStore,
        mensaje_id: &str,
        results: Vec<PublishResult>,
    ) {
        let accepted = self.transition(store, mensaje_id, PublicationState::Published, |current| {
            matches!(
                current,
                Some(PublicationState::Publishing) | Some(PublicationState::Published)
            )
        });
        if accepted {
            self.results.insert(mensaje_id.to_string(), results);
        }
    }

    /// Terminal failure; whatever results were last attached are kept as-is.
    pub fn on_publish_error(&mut self, store: &mut TranscriptStore, mensaje_id: &str, error: &str) {
        let accepted = self.transition(store, mensaje_id, PublicationState::Error, |current| {
            !matches!(
                current,
                Some(PublicationState::Published) | Some(PublicationState::Error) | None
            )
        });
        if accepted {
            tracing::warn!(mensaje_id = %mensaje_id, error = %error, "Publication failed");
        }
    }

    /// Merge results reported by another workflow (AI video completion also
    /// publishes) into this registry, last write wins per entry set.
    pub fn merge_results(&mut self, mensaje_id: &str, results: Vec<PublishResult>) {
        self.results.insert(mensaje_id.to_string(), results);
    }

    /// Forget everything for the previous conversation.
    pub fn reset(&mut self) {
        self.results.clear();
    }

    /// Apply `next` to the message's `publication_state` when `allowed` says
    /// the current state admits it. Returns whether the transition happened.
    fn transition<F>(
        &mut self,
        store: &mut TranscriptStore,
        mensaje_id: &str,
        next: PublicationState,
        allowed: F,
    ) -> bool
    where
        F: Fn(Option<PublicationState>) -> bool,
    {
        let current = match store.find(mensaje_id) {
            Some(msg) => msg.publication_state,
            None => {
                tracing::debug!(
                    mensaje_id = %mensaje_id,
                    state = ?next,
                    "Dropping publication event for unknown message",
                );
                return false;
            }
        };
        if current == Some(next) && next == PublicationState::Published {
            // Duplicate terminal success: state unchanged, caller refreshes results.
            return true;
        }
        if current == Some(next) {
            tracing::debug!(mensaje_id = %mensaje_id, state = ?next, "Duplicate publication state, no-op");
            return false;
        }
        if !allowed(current) {
            tracing::debug!(
                mensaje_id = %mensaje_id,
                current = ?current,
                rejected = ?next,
                "Dropping out-of-order publication transition",
            );
            return false;
        }
        store.patch_by_id(mensaje_id, |m| m.publication_state = Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_social_content() -> SocialContent {
        SocialContent {
            facebook: crate::model::CaptionPost { caption: "fb".into() },
            instagram: crate::model::CaptionPost { caption: "ig".into() },
            linkedin: crate::model::CaptionPost { caption: "li".into() },
            whatsapp: crate::model::TitledPost { title: "wa".into() },
            tiktok: crate::model::TiktokPost {
                title: "tt".into(),
                hashtags: vec!["#news".into()],
            },
        }
    }

    fn make_result(platform: &str, post_id: &str) -> PublishResult {
        PublishResult {
            platform: platform.into(),
            success: true,
            post_id: Some(post_id.into()),
            error: None,
            link: None,
        }
    }

    fn seeded() -> (TranscriptStore, PublishingWorkflows) {
        let mut store = TranscriptStore::new("chat-1");
        let mut wf = PublishingWorkflows::new();
        wf.on_content_generated(&mut store, "msg-1", "your post is ready", make_social_content());
        (store, wf)
    }

    #[test]
    fn test_content_generated_creates_pending_message() {
        let (store, _) = seeded();
        assert_eq!(store.len(), 1);
        let msg = store.last().unwrap();
        assert_eq!(msg.id, "msg-1");
        assert_eq!(msg.publication_state, Some(PublicationState::PendingConfirmation));
        assert!(msg.social_content.is_some());
        assert!(msg.media.is_none());
    }

    #[test]
    fn test_duplicate_content_generated_patches_instead_of_appending() {
        let (mut store, mut wf) = seeded();
        wf.on_content_generated(&mut store, "msg-1", "revised", make_social_content());
        assert_eq!(store.len(), 1);
        assert_eq!(store.last().unwrap().content, "revised");
    }

    #[test]
    fn test_image_ready_patches_media_without_state_change() {
        let (mut store, mut wf) = seeded();
        wf.on_image_ready(&mut store, "msg-1", "https://cdn/x.png");
        let msg = store.last().unwrap();
        assert_eq!(msg.media.as_ref().unwrap().url, "https://cdn/x.png");
        assert_eq!(msg.publication_state, Some(PublicationState::PendingConfirmation));
    }

    #[test]
    fn test_confirm_then_publish_flow() {
        let (mut store, mut wf) = seeded();
        wf.mark_confirmed(&mut store, "msg-1");
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Confirmed));

        wf.on_publish_start(&mut store, "msg-1");
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Publishing));

        wf.on_publish_complete(&mut store, "msg-1", vec![make_result("facebook", "fb-1")]);
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Published));
        assert_eq!(wf.results("msg-1").unwrap().len(), 1);
    }

    #[test]
    fn test_publish_start_accepted_without_local_confirm() {
        let (mut store, mut wf) = seeded();
        wf.on_publish_start(&mut store, "msg-1");
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Publishing));
    }

    #[test]
    fn test_duplicate_publishing_is_noop() {
        let (mut store, mut wf) = seeded();
        wf.on_publish_start(&mut store, "msg-1");
        let before = store.snapshot();
        wf.on_publish_start(&mut store, "msg-1");
        assert_eq!(*before, *store.snapshot());
    }

    #[test]
    fn test_duplicate_published_overwrites_results() {
        let (mut store, mut wf) = seeded();
        wf.on_publish_start(&mut store, "msg-1");
        wf.on_publish_complete(&mut store, "msg-1", vec![make_result("facebook", "fb-1")]);
        wf.on_publish_complete(
            &mut store,
            "msg-1",
            vec![make_result("facebook", "fb-1"), make_result("tiktok", "tt-9")],
        );
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Published));
        assert_eq!(wf.results("msg-1").unwrap().len(), 2);
    }

    #[test]
    fn test_error_is_terminal() {
        let (mut store, mut wf) = seeded();
        wf.on_publish_start(&mut store, "msg-1");
        wf.on_publish_error(&mut store, "msg-1", "token expired");
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Error));

        // Nothing moves an errored publication forward.
        wf.on_publish_start(&mut store, "msg-1");
        wf.on_publish_complete(&mut store, "msg-1", vec![make_result("facebook", "fb-1")]);
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Error));
        assert!(wf.results("msg-1").is_none());
    }

    #[test]
    fn test_events_for_unknown_message_are_dropped() {
        let mut store = TranscriptStore::new("chat-1");
        let mut wf = PublishingWorkflows::new();
        wf.on_publish_start(&mut store, "ghost");
        wf.on_publish_complete(&mut store, "ghost", vec![make_result("facebook", "fb-1")]);
        assert!(store.is_empty());
        assert!(wf.results("ghost").is_none());
    }

    #[test]
    fn test_confirm_only_from_pending() {
        let (mut store, mut wf) = seeded();
        wf.on_publish_start(&mut store, "msg-1");
        wf.mark_confirmed(&mut store, "msg-1");
        // Publishing is already past Confirmed; the late confirm is dropped.
        assert_eq!(store.last().unwrap().publication_state, Some(PublicationState::Publishing));
    }
}
