//! Wire types: the inbound tagged event union and outbound action payloads.
//!
//! Every backend event is a closed sum over the known tags, so routing is an
//! exhaustive match and an unhandled tag is a compile-time gap, not a silent
//! runtime miss. Unrecognized tags deserialize into [`InboundEvent::Unknown`]
//! and are logged and ignored — never fatal.

use serde::{Deserialize, Serialize};

use crate::model::{PublishResult, SocialContent};

/// One event from the multiplexed backend stream. Each variant carries the
/// `chatId` it belongs to plus, for workflow events, the `mensajeId`
/// correlation id addressing one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    /// Full-replacement snapshot of the assistant's accumulated reply text.
    ReplyFragment {
        chat_id: String,
        content: String,
    },

    ImageGenerationStart {
        chat_id: String,
        mensaje_id: String,
    },
    ImageGenerationComplete {
        chat_id: String,
        mensaje_id: String,
        image_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_used: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        revised_prompt: Option<String>,
    },
    ImageGenerationError {
        chat_id: String,
        mensaje_id: String,
        error: String,
    },

    SocialContentGenerated {
        chat_id: String,
        mensaje_id: String,
        #[serde(default)]
        content: String,
        social_content: SocialContent,
    },
    SocialImageReady {
        chat_id: String,
        mensaje_id: String,
        image_url: String,
    },

    SocialPublishStart {
        chat_id: String,
        mensaje_id: String,
    },
    SocialPublishComplete {
        chat_id: String,
        mensaje_id: String,
        results: Vec<PublishResult>,
    },
    SocialPublishError {
        chat_id: String,
        mensaje_id: String,
        error: String,
    },

    AiVideoStatus {
        chat_id: String,
        mensaje_id: String,
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    AiVideoComplete {
        chat_id: String,
        mensaje_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        results: Option<Vec<PublishResult>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    AiVideoError {
        chat_id: String,
        mensaje_id: String,
        error: String,
    },

    /// Any tag this build does not know about.
    #[serde(other)]
    Unknown,
}

impl InboundEvent {
    /// Conversation this event belongs to; `None` for unknown tags.
    pub fn chat_id(&self) -> Option<&str> {
        match self {
            InboundEvent::ReplyFragment { chat_id, .. }
            | InboundEvent::ImageGenerationStart { chat_id, .. }
            | InboundEvent::ImageGenerationComplete { chat_id, .. }
            | InboundEvent::ImageGenerationError { chat_id, .. }
            | InboundEvent::SocialContentGenerated { chat_id, .. }
            | InboundEvent::SocialImageReady { chat_id, .. }
            | InboundEvent::SocialPublishStart { chat_id, .. }
            | InboundEvent::SocialPublishComplete { chat_id, .. }
            | InboundEvent::SocialPublishError { chat_id, .. }
            | InboundEvent::AiVideoStatus { chat_id, .. }
            | InboundEvent::AiVideoComplete { chat_id, .. }
            | InboundEvent::AiVideoError { chat_id, .. } => Some(chat_id),
            InboundEvent::Unknown => None,
        }
    }
}

/// Outbound "submit prompt" action payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPrompt {
    pub conversation_id: String,
    pub prompt_text: String,
}

/// Outbound "confirm publish" action payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPublish {
    pub conversation_id: String,
    pub mensaje_id: String,
}
