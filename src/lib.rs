//! Live conversation synchronization engine.
//!
//! Reconciles a point-in-time history fetch and a continuous multiplexed
//! event stream into one ordered per-conversation transcript, while tracking
//! independent per-message workflows: image generation, social publishing,
//! and AI video generation. The transport may drop, duplicate, or reorder;
//! the engine tolerates all three via correlation-id-gated, idempotent
//! handlers.

pub mod accumulator;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod router;
pub mod transcript;
pub mod workflows;

pub use config::EngineConfig;
pub use engine::{
    ConversationEngine, EngineCommand, EngineHandle, HistoryProvider, OutboundDispatcher,
};
pub use error::EngineError;
pub use events::{ConfirmPublish, InboundEvent, SubmitPrompt};
pub use model::{Message, PublicationState, PublishResult, Sender};
pub use transcript::{Snapshot, TranscriptStore};
