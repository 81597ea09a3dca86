//! Engine façade: owns the transcript, the streaming accumulator, and the
//! workflow trackers for one active conversation, and drives them from a
//! single task.
//!
//! All mutation happens inside [`ConversationEngine::run`]'s `select!` loop
//! (or in direct method calls when embedding the engine without the loop), so
//! no locking is needed. The loop suspends only at the channel boundary and
//! while awaiting the outbound dispatcher; the accumulator's finalize
//! deadline is the single delayed action it races against.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::accumulator::StreamingAccumulator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{ConfirmPublish, InboundEvent, SubmitPrompt};
use crate::model::{Message, PublishResult};
use crate::router::{self, RouterContext};
use crate::transcript::{Snapshot, SnapshotSubscriber, TranscriptStore};
use crate::workflows::{ImageWorkflows, PublishingWorkflows, VideoWorkflows};

// ============================================================================
// Collaborator traits
// ============================================================================

/// Point-in-time history fetch, used only to seed a transcript on
/// conversation activation. Credentials are whatever the implementation was
/// constructed with; the engine does not manage token lifecycle.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch(&self, conversation_id: &str) -> Result<Vec<Message>, EngineError>;
}

/// Outbound action dispatch. The engine appends optimistically before these
/// calls resolve; delivery is the transport's problem.
#[async_trait]
pub trait OutboundDispatcher: Send + Sync {
    async fn submit_prompt(&self, action: SubmitPrompt) -> Result<(), EngineError>;
    async fn confirm_publish(&self, action: ConfirmPublish) -> Result<(), EngineError>;
}

// ============================================================================
// Commands
// ============================================================================

/// Local user actions fed into the run loop alongside inbound events.
#[derive(Debug)]
pub enum EngineCommand {
    SubmitPrompt { text: String },
    ConfirmPublish { mensaje_id: String },
    SwitchConversation { conversation_id: String },
}

/// Cheap clonable handle for issuing commands to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn submit_prompt(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::SubmitPrompt { text: text.into() }).await
    }

    pub async fn confirm_publish(&self, mensaje_id: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::ConfirmPublish {
            mensaje_id: mensaje_id.into(),
        })
        .await
    }

    pub async fn switch_conversation(
        &self,
        conversation_id: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::SwitchConversation {
            conversation_id: conversation_id.into(),
        })
        .await
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Internal("engine loop has shut down".into()))
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct ConversationEngine {
    store: TranscriptStore,
    accumulator: StreamingAccumulator,
    image: ImageWorkflows,
    publishing: PublishingWorkflows,
    video: VideoWorkflows,
    /// Set when a prompt goes out, cleared by the first reply fragment.
    typing: bool,
    history: Arc<dyn HistoryProvider>,
    outbound: Arc<dyn OutboundDispatcher>,
}

impl ConversationEngine {
    pub fn new(
        config: EngineConfig,
        history: Arc<dyn HistoryProvider>,
        outbound: Arc<dyn OutboundDispatcher>,
    ) -> Self {
        Self {
            store: TranscriptStore::new(String::new()),
            accumulator: StreamingAccumulator::new(config.finalize_debounce()),
            image: ImageWorkflows::new(),
            publishing: PublishingWorkflows::new(),
            video: VideoWorkflows::new(),
            typing: false,
            history,
            outbound,
        }
    }

    // ------------------------------------------------------------------
    // Activation / switch coordination
    // ------------------------------------------------------------------

    /// Seed a fresh transcript for `conversation_id` from the history
    /// provider. A fetch failure activates an empty transcript instead of
    /// failing activation.
    pub async fn activate(&mut self, conversation_id: &str) {
        let mut messages = match self.history.fetch(conversation_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "History fetch failed, seeding empty transcript",
                );
                Vec::new()
            }
        };
        messages.retain(|m| m.is_active);
        for message in &mut messages {
            if message.correlation_id.is_empty() {
                message.correlation_id = message.id.clone();
            }
        }
        tracing::debug!(
            conversation_id = %conversation_id,
            count = messages.len(),
            "Activating conversation",
        );
        self.store.seed(conversation_id, messages);
    }

    /// Conversation switch: discard the current transcript, cancel the
    /// pending finalize deadline, and forget all in-flight correlation ids so
    /// late events for the old conversation are dropped as stale instead of
    /// mutating a transcript that is no longer displayed.
    pub async fn switch_conversation(&mut self, conversation_id: &str) {
        if conversation_id == self.store.conversation_id() {
            return;
        }
        self.accumulator.cancel();
        self.image.reset();
        self.publishing.reset();
        self.typing = false;
        self.activate(conversation_id).await;
    }

    // ------------------------------------------------------------------
    // Inbound / local actions
    // ------------------------------------------------------------------

    /// Handle one inbound event. Total over its input: never panics, never
    /// returns an error to the caller.
    pub fn handle_event(&mut self, event: InboundEvent) {
        let is_fragment = matches!(event, InboundEvent::ReplyFragment { .. });
        let mut ctx = RouterContext {
            store: &mut self.store,
            accumulator: &mut self.accumulator,
            image: &mut self.image,
            publishing: &mut self.publishing,
            video: &mut self.video,
        };
        let handled = router::dispatch(&mut ctx, event);
        if handled && is_fragment {
            self.typing = false;
        }
    }

    /// Optimistically append the user's prompt, then dispatch it outbound.
    /// The appended message stays even if dispatch fails: retry is a fresh
    /// user action, and the transcript reflects what the user said.
    pub async fn submit_prompt(&mut self, text: &str) -> Result<(), EngineError> {
        let conversation_id = self.store.conversation_id().to_string();
        self.store.append(Message::user(&conversation_id, text));
        self.typing = true;
        self.outbound
            .submit_prompt(SubmitPrompt {
                conversation_id,
                prompt_text: text.to_string(),
            })
            .await
    }

    /// Record the local Confirmed step and dispatch the confirm action; the
    /// backend is expected to answer with a publish-start event.
    pub async fn confirm_publish(&mut self, mensaje_id: &str) -> Result<(), EngineError> {
        self.publishing.mark_confirmed(&mut self.store, mensaje_id);
        self.outbound
            .confirm_publish(ConfirmPublish {
                conversation_id: self.store.conversation_id().to_string(),
                mensaje_id: mensaje_id.to_string(),
            })
            .await
    }

    /// Quiet period elapsed: mark the streaming tail final.
    pub fn finalize_stream(&mut self) {
        self.accumulator.finalize(&mut self.store);
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&mut self, subscriber: SnapshotSubscriber) {
        self.store.subscribe(subscriber);
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn publish_results(&self, mensaje_id: &str) -> Option<&[PublishResult]> {
        self.publishing.results(mensaje_id)
    }

    pub fn finalize_deadline(&self) -> Option<Instant> {
        self.accumulator.deadline()
    }

    pub fn active_conversation(&self) -> &str {
        self.store.conversation_id()
    }

    // ------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------

    /// Create a command channel for use with [`run`](Self::run).
    pub fn command_channel(buffer: usize) -> (EngineHandle, mpsc::Receiver<EngineCommand>) {
        let (tx, rx) = mpsc::channel(buffer);
        (EngineHandle { commands: tx }, rx)
    }

    /// Drive the engine until shutdown is requested or both channels close.
    ///
    /// Events and commands are processed strictly in arrival order; the only
    /// other wake-up source is the accumulator's finalize deadline. The
    /// deadline future is rebuilt each iteration, so cancellation is simply
    /// the deadline being `None` on the next pass.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<InboundEvent>,
        mut commands: mpsc::Receiver<EngineCommand>,
        shutdown: CancellationToken,
    ) {
        // A closed command channel alone doesn't stop the loop (inbound
        // events may still arrive), but it must stop being polled.
        let mut commands_open = true;
        loop {
            let deadline = self.accumulator.deadline();
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.accumulator.cancel();
                    tracing::info!("Engine loop stopped");
                    break;
                }
                maybe_event = inbound.recv() => match maybe_event {
                    Some(event) => self.handle_event(event),
                    None => {
                        self.accumulator.cancel();
                        tracing::info!("Inbound channel closed, stopping engine loop");
                        break;
                    }
                },
                maybe_command = commands.recv(), if commands_open => match maybe_command {
                    Some(command) => self.handle_command(command).await,
                    None => commands_open = false,
                },
                _ = sleep_until_deadline(deadline), if deadline.is_some() => {
                    self.finalize_stream();
                }
            }
        }
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SubmitPrompt { text } => {
                if let Err(e) = self.submit_prompt(&text).await {
                    tracing::error!(error = %e, "Prompt dispatch failed");
                }
            }
            EngineCommand::ConfirmPublish { mensaje_id } => {
                if let Err(e) = self.confirm_publish(&mensaje_id).await {
                    tracing::error!(mensaje_id = %mensaje_id, error = %e, "Confirm dispatch failed");
                }
            }
            EngineCommand::SwitchConversation { conversation_id } => {
                self.switch_conversation(&conversation_id).await;
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
