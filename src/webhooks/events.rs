//! Normalized Instagram webhook event types.
//!
//! The delivery envelope fans out into entries and field changes; the only
//! change kind the engine acts on is a comment on a post. Everything the
//! matcher and executor need is flattened into [`CommentEvent`].

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, MediaId};

/// A normalized comment event extracted from a webhook delivery.
///
/// Constructed per delivery, matched and executed, then discarded. Never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    /// The comment that was created.
    pub comment_id: CommentId,

    /// The post the comment was left on.
    pub media_id: MediaId,

    /// The comment text.
    pub text: String,

    /// The comment author's user ID.
    pub author_id: String,

    /// The comment author's username (DM recipient).
    pub author_username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_comment_event() -> impl Strategy<Value = CommentEvent> {
        (
            "[0-9]{10,17}",
            "[0-9]{10,17}",
            "[a-zA-Z0-9 !?]{0,80}",
            "[0-9]{10,17}",
            "[a-z][a-z0-9_.]{0,14}",
        )
            .prop_map(
                |(comment_id, media_id, text, author_id, author_username)| CommentEvent {
                    comment_id: CommentId::new(comment_id),
                    media_id: MediaId::new(media_id),
                    text,
                    author_id,
                    author_username,
                },
            )
    }

    proptest! {
        #[test]
        fn serde_roundtrip(event in arb_comment_event()) {
            let json = serde_json::to_string(&event).unwrap();
            let parsed: CommentEvent = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(event, parsed);
        }
    }
}
