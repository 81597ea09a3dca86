//! Ordered message store for one active conversation.
//!
//! Every mutation rebuilds an immutable snapshot and hands it to subscribers
//! synchronously, so observers see each intermediate state in mutation order.
//! Mutation is confined to the engine's single task; no interior locking.

use std::sync::Arc;

use crate::model::Message;

/// Immutable view of the transcript after one mutation.
pub type Snapshot = Arc<Vec<Message>>;

/// Callback invoked with the fresh snapshot after every mutation.
pub type SnapshotSubscriber = Box<dyn Fn(Snapshot) + Send>;

pub struct TranscriptStore {
    conversation_id: String,
    messages: Vec<Message>,
    snapshot: Snapshot,
    subscribers: Vec<SnapshotSubscriber>,
}

impl TranscriptStore {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            snapshot: Arc::new(Vec::new()),
            subscribers: Vec::new(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Replace the whole sequence; used once per conversation activation.
    /// Also rebinds the store to `conversation_id`, so a switch yields a
    /// fresh transcript while subscribers stay registered.
    pub fn seed(&mut self, conversation_id: impl Into<String>, messages: Vec<Message>) {
        self.conversation_id = conversation_id.into();
        self.messages = messages;
        self.publish();
    }

    /// Push at the tail. Any message still marked `streaming` is settled
    /// first, so the streaming flag only ever lives on the last element.
    pub fn append(&mut self, message: Message) {
        self.settle_streaming();
        self.messages.push(message);
        self.publish();
    }

    /// Atomically update the tail if it satisfies `predicate`, otherwise
    /// append `updater(None)` as a new element.
    pub fn replace_tail<P, U>(&mut self, predicate: P, updater: U)
    where
        P: Fn(&Message) -> bool,
        U: FnOnce(Option<&Message>) -> Message,
    {
        match self.messages.last() {
            Some(last) if predicate(last) => {
                let replacement = updater(Some(last));
                let idx = self.messages.len() - 1;
                self.messages[idx] = replacement;
            }
            _ => {
                let appended = updater(None);
                self.settle_streaming();
                self.messages.push(appended);
            }
        }
        self.publish();
    }

    /// Patch the unique message whose `id` or `correlation_id` matches.
    /// Returns false (and publishes nothing) when no such message exists.
    pub fn patch_by_id<U>(&mut self, id: &str, updater: U) -> bool
    where
        U: FnOnce(&mut Message),
    {
        let found = self
            .messages
            .iter_mut()
            .find(|m| m.id == id || m.correlation_id == id);
        match found {
            Some(msg) => {
                updater(msg);
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Remove all messages satisfying `predicate`; returns how many were
    /// dropped. Publishes only when something changed.
    pub fn remove_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&Message) -> bool,
    {
        let before = self.messages.len();
        self.messages.retain(|m| !predicate(m));
        let removed = before - self.messages.len();
        if removed > 0 {
            self.publish();
        }
        removed
    }

    pub fn find(&self, id: &str) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.id == id || m.correlation_id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot)
    }

    /// Register a read-only observer. It immediately receives the current
    /// snapshot, then one call per subsequent mutation.
    pub fn subscribe(&mut self, subscriber: SnapshotSubscriber) {
        subscriber(Arc::clone(&self.snapshot));
        self.subscribers.push(subscriber);
    }

    fn settle_streaming(&mut self) {
        for msg in &mut self.messages {
            msg.streaming = false;
        }
    }

    fn publish(&mut self) {
        self.snapshot = Arc::new(self.messages.clone());
        for subscriber in &self.subscribers {
            subscriber(Arc::clone(&self.snapshot));
        }
    }
}
