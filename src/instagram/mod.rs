//! Outbound Instagram Graph API surface.
//!
//! The automation executor talks to Instagram through the [`PlatformClient`]
//! trait. The real implementation is [`GraphClient`] (reqwest against the
//! Graph API); tests substitute recording or failing doubles.

pub mod client;
pub mod error;

pub use client::GraphClient;
pub use error::{ApiError, ApiErrorKind};

use std::future::Future;

use crate::types::{CommentId, DmTemplate};

/// Executes outbound Instagram actions.
///
/// Implementations are constructed with an access token, so every call
/// through a single client instance acts as that Instagram account.
///
/// # Example (recording double for testing)
///
/// ```ignore
/// #[derive(Clone, Default)]
/// struct RecordingClient {
///     calls: Arc<Mutex<Vec<String>>>,
/// }
///
/// impl PlatformClient for RecordingClient {
///     fn reply_to_comment(
///         &self,
///         comment_id: &CommentId,
///         message: &str,
///     ) -> impl Future<Output = Result<(), ApiError>> + Send {
///         self.calls.lock().push(format!("reply {comment_id}: {message}"));
///         async { Ok(()) }
///     }
///
///     fn send_direct_message(
///         &self,
///         username: &str,
///         message: &str,
///         _template: Option<&DmTemplate>,
///     ) -> impl Future<Output = Result<(), ApiError>> + Send {
///         self.calls.lock().push(format!("dm {username}: {message}"));
///         async { Ok(()) }
///     }
/// }
/// ```
pub trait PlatformClient {
    /// Posts a public reply beneath the given comment.
    fn reply_to_comment(
        &self,
        comment_id: &CommentId,
        message: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Sends a direct message to the given username, optionally carrying a
    /// button template alongside the text.
    fn send_direct_message(
        &self,
        username: &str,
        message: &str,
        template: Option<&DmTemplate>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
