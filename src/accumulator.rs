//! Collapses successive reply fragments into one streaming assistant message
//! and finalizes it after a quiet period.
//!
//! Fragments are full-replacement snapshots of the accumulated text, not
//! deltas: each one overwrites the tail's content. The finalize timer is a
//! debounce modeled as plain data (an optional deadline the engine's run
//! loop races against) rather than a captured closure, so cancellation on
//! new fragment, conversation switch, and teardown is explicit.

use std::time::Duration;

use tokio::time::Instant;

use crate::model::{ContentKind, Message, Sender};
use crate::transcript::TranscriptStore;

pub struct StreamingAccumulator {
    debounce: Duration,
    finalize_deadline: Option<Instant>,
}

impl StreamingAccumulator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            finalize_deadline: None,
        }
    }

    /// Deadline the run loop should wake at, if a stream is in flight.
    pub fn deadline(&self) -> Option<Instant> {
        self.finalize_deadline
    }

    /// Apply one reply fragment. Replaces the streaming tail's content, or
    /// appends a fresh streaming assistant message when there is none, and
    /// arms the finalize deadline.
    pub fn on_fragment(&mut self, store: &mut TranscriptStore, content: String) {
        let conversation_id = store.conversation_id().to_string();
        store.replace_tail(
            |tail| {
                tail.sender == Sender::Assistant
                    && tail.kind == ContentKind::Text
                    && tail.streaming
            },
            move |prev| match prev {
                Some(existing) => {
                    let mut updated = existing.clone();
                    updated.content = content;
                    updated
                }
                None => Message::assistant_streaming(&conversation_id, content),
            },
        );
        self.finalize_deadline = Some(Instant::now() + self.debounce);
    }

    /// Quiet period elapsed: mark the streaming tail final. The deadline is
    /// cleared regardless, so a stale wake-up never re-fires.
    pub fn finalize(&mut self, store: &mut TranscriptStore) {
        self.finalize_deadline = None;
        let tail_id = match store.last() {
            Some(tail) if tail.sender == Sender::Assistant && tail.streaming => tail.id.clone(),
            _ => return,
        };
        store.patch_by_id(&tail_id, |m| m.streaming = false);
    }

    /// Drop any pending deadline without touching the transcript. Called on
    /// conversation switch and teardown.
    pub fn cancel(&mut self) {
        if self.finalize_deadline.take().is_some() {
            tracing::debug!("Finalize deadline cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> TranscriptStore {
        TranscriptStore::new("chat-1")
    }

    #[tokio::test]
    async fn test_first_fragment_appends_streaming_message() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "¡Hola! ¿En qué".into());

        assert_eq!(store.len(), 1);
        let tail = store.last().unwrap();
        assert_eq!(tail.sender, Sender::Assistant);
        assert!(tail.streaming);
        assert_eq!(tail.content, "¡Hola! ¿En qué");
        assert!(acc.deadline().is_some());
    }

    #[tokio::test]
    async fn test_fragments_converge_to_single_message_with_last_content() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "¡Hola!".into());
        let first_id = store.last().unwrap().id.clone();
        acc.on_fragment(&mut store, "¡Hola! ¿En qué".into());
        acc.on_fragment(&mut store, "¡Hola! ¿En qué puedo ayudarte?".into());

        assert_eq!(store.len(), 1);
        let tail = store.last().unwrap();
        assert_eq!(tail.id, first_id);
        assert_eq!(tail.content, "¡Hola! ¿En qué puedo ayudarte?");
        assert!(tail.streaming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_fragment_resets_the_deadline() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "a".into());
        let first = acc.deadline().unwrap();

        tokio::time::advance(Duration::from_millis(600)).await;
        acc.on_fragment(&mut store, "ab".into());
        let second = acc.deadline().unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_finalize_marks_tail_non_streaming_without_new_message() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "done".into());
        acc.finalize(&mut store);

        assert_eq!(store.len(), 1);
        assert!(!store.last().unwrap().streaming);
        assert!(acc.deadline().is_none());
    }

    #[tokio::test]
    async fn test_finalize_with_no_streaming_tail_is_noop() {
        let mut store = make_store();
        store.append(Message::user("chat-1", "Hola"));
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.finalize(&mut store);
        assert_eq!(store.len(), 1);
        assert!(!store.last().unwrap().streaming);
    }

    #[tokio::test]
    async fn test_cancel_clears_pending_deadline() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "a".into());
        acc.cancel();
        assert!(acc.deadline().is_none());
        // Tail stays streaming: cancel must not finalize into the transcript.
        assert!(store.last().unwrap().streaming);
    }

    #[tokio::test]
    async fn test_interleaved_append_leaves_single_streaming_tail() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "part 1".into());
        // Another handler appends mid-stream; the stream resumes at the tail.
        store.append(Message::user("chat-1", "aside"));
        acc.on_fragment(&mut store, "part 1 part 2".into());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.iter().filter(|m| m.streaming).count(), 1);
        assert!(store.last().unwrap().streaming);
        assert_eq!(store.last().unwrap().content, "part 1 part 2");
    }

    #[tokio::test]
    async fn test_new_turn_after_finalize_creates_new_message() {
        let mut store = make_store();
        let mut acc = StreamingAccumulator::new(Duration::from_millis(1000));
        acc.on_fragment(&mut store, "first turn".into());
        acc.finalize(&mut store);
        acc.on_fragment(&mut store, "second turn".into());

        assert_eq!(store.len(), 2);
        assert!(store.last().unwrap().streaming);
        assert_eq!(store.last().unwrap().content, "second turn");
    }
}
