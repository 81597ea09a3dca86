//! Property tests for transcript ordering invariants.

use proptest::prelude::*;

use convosync::model::Message;
use convosync::TranscriptStore;

proptest! {
    /// For any sequence of appends, snapshot order equals arrival order.
    #[test]
    fn appended_order_equals_arrival_order(contents in prop::collection::vec(".{0,20}", 0..32)) {
        let mut store = TranscriptStore::new("chat-1");
        for content in &contents {
            store.append(Message::user("chat-1", content.clone()));
        }
        let observed: Vec<String> = store.snapshot().iter().map(|m| m.content.clone()).collect();
        prop_assert_eq!(observed, contents);
    }

    /// Removing placeholders preserves the relative order of what remains.
    #[test]
    fn remove_where_preserves_relative_order(
        entries in prop::collection::vec((any::<bool>(), ".{0,12}"), 0..32)
    ) {
        let mut store = TranscriptStore::new("chat-1");
        for (is_placeholder, content) in &entries {
            if *is_placeholder {
                store.append(Message::placeholder("chat-1", "wf-1", content.clone()));
            } else {
                store.append(Message::user("chat-1", content.clone()));
            }
        }
        store.remove_where(|m| m.is_placeholder());

        let expected: Vec<&str> = entries
            .iter()
            .filter(|(is_placeholder, _)| !is_placeholder)
            .map(|(_, content)| content.as_str())
            .collect();
        let observed: Vec<String> = store.snapshot().iter().map(|m| m.content.clone()).collect();
        prop_assert_eq!(observed, expected);
    }

    /// patch_by_id touches exactly the addressed message.
    #[test]
    fn patch_by_id_is_surgical(count in 1usize..16, target in 0usize..16) {
        let target = target % count;
        let mut store = TranscriptStore::new("chat-1");
        for i in 0..count {
            let mut msg = Message::user("chat-1", format!("original-{i}"));
            msg.id = format!("m{i}");
            msg.correlation_id = msg.id.clone();
            store.append(msg);
        }
        store.patch_by_id(&format!("m{target}"), |m| m.content = "patched".into());

        for (i, msg) in store.snapshot().iter().enumerate() {
            if i == target {
                prop_assert_eq!(&msg.content, "patched");
            } else {
                prop_assert_eq!(msg.content.clone(), format!("original-{i}"));
            }
        }
    }
}
