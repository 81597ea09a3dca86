//! Transcript entities and their sub-state types. Data only — all behavior
//! lives in the store, the accumulator, and the workflow trackers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Local id minting
// ============================================================================

/// Id prefixes for messages minted locally, before (or instead of) any
/// server-assigned id. The prefix encodes what the message stands for.
pub const USER_ID_PREFIX: &str = "user-";
pub const BOT_ID_PREFIX: &str = "bot-";
pub const IMAGE_FINAL_ID_PREFIX: &str = "image-final-";
pub const LOADING_ID_PREFIX: &str = "loading-";
pub const ERROR_ID_PREFIX: &str = "error-";

/// Mint a namespaced local message id.
pub fn local_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4())
}

// ============================================================================
// Sub-state types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Text,
    Image,
    SocialContent,
}

/// Lifecycle of a social post attached to a `SocialContent` message.
/// Transitions are monotonic; `Error` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicationState {
    PendingConfirmation,
    Confirmed,
    Publishing,
    Published,
    Error,
}

/// Generated media attached to an `Image` message or patched onto a
/// `SocialContent` message once its artwork is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produced_by_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionPost {
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledPost {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiktokPost {
    pub title: String,
    pub hashtags: Vec<String>,
}

/// Per-platform caption set generated for one social publication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialContent {
    pub facebook: CaptionPost,
    pub instagram: CaptionPost,
    pub linkedin: CaptionPost,
    pub whatsapp: TitledPost,
    pub tiktok: TiktokPost,
}

/// Outcome of publishing to one target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub platform: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    Generating,
    Completed,
    Error,
}

/// AI video generation progress, keyed by message id and independent of the
/// same message's publication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoState {
    pub status: VideoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Display hint 0–100. Last write wins; the producer is the authority,
    /// so a regression is applied as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

// ============================================================================
// Message
// ============================================================================

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique within a conversation; server-assigned for history rows,
    /// locally minted (prefixed) otherwise.
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub kind: ContentKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// True while further fragments may still replace `content`.
    #[serde(default)]
    pub streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_content: Option<SocialContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_state: Option<PublicationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_state: Option<VideoState>,
    /// Id used by backend events to address this message. Equals `id` once
    /// confirmed; transient placeholders carry a different id until replaced.
    #[serde(default)]
    pub correlation_id: String,
    /// History rows may be soft-deleted server-side; inactive rows are
    /// filtered out at seed time.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Message {
    /// Base constructor: a text message with the given locally minted id.
    fn local(id: String, conversation_id: &str, sender: Sender, content: String) -> Self {
        Self {
            correlation_id: id.clone(),
            id,
            conversation_id: conversation_id.to_string(),
            sender,
            kind: ContentKind::Text,
            content,
            created_at: Utc::now(),
            updated_at: None,
            streaming: false,
            media: None,
            social_content: None,
            publication_state: None,
            video_state: None,
            is_active: true,
        }
    }

    /// Optimistic user prompt, appended before any server ack.
    pub fn user(conversation_id: &str, content: impl Into<String>) -> Self {
        Self::local(
            local_id(USER_ID_PREFIX),
            conversation_id,
            Sender::User,
            content.into(),
        )
    }

    /// In-flight assistant reply; `content` is replaced by each fragment.
    pub fn assistant_streaming(conversation_id: &str, content: impl Into<String>) -> Self {
        let mut msg = Self::local(
            local_id(BOT_ID_PREFIX),
            conversation_id,
            Sender::Assistant,
            content.into(),
        );
        msg.streaming = true;
        msg
    }

    /// Transient status line shown until a terminal workflow event arrives.
    /// Keeps the workflow's correlation id so the terminal handler can find
    /// and remove it.
    pub fn placeholder(
        conversation_id: &str,
        correlation_id: &str,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::local(
            local_id(LOADING_ID_PREFIX),
            conversation_id,
            Sender::Assistant,
            content.into(),
        );
        msg.correlation_id = correlation_id.to_string();
        msg
    }

    /// Terminal image message carrying the generated artwork.
    pub fn image_final(conversation_id: &str, correlation_id: &str, media: MediaAttachment) -> Self {
        let mut msg = Self::local(
            local_id(IMAGE_FINAL_ID_PREFIX),
            conversation_id,
            Sender::Assistant,
            String::new(),
        );
        msg.kind = ContentKind::Image;
        msg.correlation_id = correlation_id.to_string();
        msg.media = Some(media);
        msg
    }

    /// Social content awaiting user confirmation. Addressed by the backend's
    /// own message id so follow-up events resolve to it directly.
    pub fn social_pending(
        conversation_id: &str,
        mensaje_id: &str,
        content: impl Into<String>,
        social_content: SocialContent,
    ) -> Self {
        let mut msg = Self::local(mensaje_id.to_string(), conversation_id, Sender::Assistant, content.into());
        msg.kind = ContentKind::SocialContent;
        msg.social_content = Some(social_content);
        msg.publication_state = Some(PublicationState::PendingConfirmation);
        msg
    }

    /// Terminal error surfaced as plain text.
    pub fn error_text(conversation_id: &str, correlation_id: &str, content: impl Into<String>) -> Self {
        let mut msg = Self::local(
            local_id(ERROR_ID_PREFIX),
            conversation_id,
            Sender::Assistant,
            content.into(),
        );
        msg.correlation_id = correlation_id.to_string();
        msg
    }

    /// Whether this is a transient `loading-` placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(LOADING_ID_PREFIX)
    }
}
