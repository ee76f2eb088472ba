//! Shared test doubles.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::instagram::{ApiError, PlatformClient};
use crate::types::{CommentId, DmTemplate};

/// Platform client double that records calls instead of hitting the Graph
/// API.
///
/// Clones share the call log, so a test can hand one clone to the system
/// under test and assert on the other.
#[derive(Clone, Default)]
pub struct RecordingClient {
    calls: Arc<Mutex<Vec<String>>>,
    fail_replies: bool,
}

impl RecordingClient {
    /// A client whose reply calls fail with a transient API error. DM calls
    /// still succeed, which is what exercises per-action independence.
    pub fn failing() -> Self {
        RecordingClient {
            fail_replies: true,
            ..RecordingClient::default()
        }
    }

    /// Calls made so far, in order, as `"reply <id>: <msg>"` / `"dm <user>: <msg>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl PlatformClient for RecordingClient {
    fn reply_to_comment(
        &self,
        comment_id: &CommentId,
        message: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.calls
            .lock()
            .push(format!("reply {comment_id}: {message}"));
        let fail = self.fail_replies;
        async move {
            if fail {
                Err(ApiError::from_status(500, "reply failed"))
            } else {
                Ok(())
            }
        }
    }

    fn send_direct_message(
        &self,
        username: &str,
        message: &str,
        _template: Option<&DmTemplate>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.calls.lock().push(format!("dm {username}: {message}"));
        async { Ok(()) }
    }
}
