//! Event router: one tagged event in, one handler out.
//!
//! Dispatch is synchronous and total — every known tag maps to exactly one
//! handler, unknown tags are logged and ignored, and events for a different
//! conversation than the active one are dropped before any handler runs.

use crate::accumulator::StreamingAccumulator;
use crate::events::InboundEvent;
use crate::model::MediaAttachment;
use crate::transcript::TranscriptStore;
use crate::workflows::{ImageWorkflows, PublishingWorkflows, VideoWorkflows};

/// Everything a dispatch cycle may touch. Constructed by the engine once per
/// event; handlers never re-enter dispatch.
pub struct RouterContext<'a> {
    pub store: &'a mut TranscriptStore,
    pub accumulator: &'a mut StreamingAccumulator,
    pub image: &'a mut ImageWorkflows,
    pub publishing: &'a mut PublishingWorkflows,
    pub video: &'a mut VideoWorkflows,
}

/// Route a single inbound event to its handler.
///
/// Returns `true` when the event was handled (even as an internal no-op),
/// `false` when it was filtered out by conversation affinity or tag.
pub fn dispatch(ctx: &mut RouterContext<'_>, event: InboundEvent) -> bool {
    match event.chat_id() {
        Some(chat_id) if chat_id != ctx.store.conversation_id() => {
            tracing::debug!(
                chat_id = %chat_id,
                active = %ctx.store.conversation_id(),
                "Dropping event for inactive conversation",
            );
            return false;
        }
        None => {
            tracing::warn!("Ignoring event with unrecognized tag");
            return false;
        }
        Some(_) => {}
    }

    match event {
        InboundEvent::ReplyFragment { content, .. } => {
            ctx.accumulator.on_fragment(ctx.store, content);
        }

        InboundEvent::ImageGenerationStart { mensaje_id, .. } => {
            ctx.image.on_start(ctx.store, &mensaje_id);
        }
        InboundEvent::ImageGenerationComplete {
            mensaje_id,
            image_url,
            model_used,
            revised_prompt,
            ..
        } => {
            ctx.image.on_complete(
                ctx.store,
                &mensaje_id,
                MediaAttachment {
                    url: image_url,
                    produced_by_model: model_used,
                    revised_prompt,
                },
            );
        }
        InboundEvent::ImageGenerationError { mensaje_id, error, .. } => {
            ctx.image.on_error(ctx.store, &mensaje_id, &error);
        }

        InboundEvent::SocialContentGenerated {
            mensaje_id,
            content,
            social_content,
            ..
        } => {
            ctx.publishing
                .on_content_generated(ctx.store, &mensaje_id, &content, social_content);
        }
        InboundEvent::SocialImageReady { mensaje_id, image_url, .. } => {
            ctx.publishing.on_image_ready(ctx.store, &mensaje_id, &image_url);
        }
        InboundEvent::SocialPublishStart { mensaje_id, .. } => {
            ctx.publishing.on_publish_start(ctx.store, &mensaje_id);
        }
        InboundEvent::SocialPublishComplete { mensaje_id, results, .. } => {
            ctx.publishing.on_publish_complete(ctx.store, &mensaje_id, results);
        }
        InboundEvent::SocialPublishError { mensaje_id, error, .. } => {
            ctx.publishing.on_publish_error(ctx.store, &mensaje_id, &error);
        }

        InboundEvent::AiVideoStatus {
            mensaje_id,
            progress,
            message,
            ..
        } => {
            ctx.video.on_status(ctx.store, &mensaje_id, progress, message);
        }
        InboundEvent::AiVideoComplete {
            mensaje_id,
            results,
            message,
            ..
        } => {
            ctx.video
                .on_complete(ctx.store, ctx.publishing, &mensaje_id, results, message);
        }
        InboundEvent::AiVideoError { mensaje_id, error, .. } => {
            ctx.video.on_error(ctx.store, &mensaje_id, &error);
        }

        // Filtered above; unreachable here but kept for exhaustiveness.
        InboundEvent::Unknown => return false,
    }
    true
}
