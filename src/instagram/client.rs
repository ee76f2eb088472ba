//! Reqwest client for the Instagram Graph API.
//!
//! This module provides `GraphClient`, the real [`PlatformClient`]
//! implementation. The Graph API takes mutation arguments in the query
//! string, so every call here is a bodyless POST to an edge URL.

use std::time::Duration;

use serde::Deserialize;

use super::error::ApiError;
use super::PlatformClient;
use crate::types::{CommentId, DmTemplate};

/// Default Graph API endpoint, pinned to the API version the payload
/// shapes in this crate were written against.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v21.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error envelope the Graph API wraps failure responses in.
///
/// Only the message is consumed; `type` and `code` are ignored.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

/// A Graph API client acting as a single Instagram account.
///
/// All calls through one client instance authenticate with the same access
/// token, so the replies and direct messages they produce are attributed to
/// that account.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    /// Creates a client for the given Graph API endpoint and access token.
    ///
    /// Pass [`DEFAULT_BASE_URL`] outside of tests.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::from_reqwest)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// POSTs to a Graph edge with the given query parameters.
    async fn post<P>(&self, path: &str, params: &P) -> Result<(), ApiError>
    where
        P: serde::Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .query(params)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Prefer the message from the Graph error envelope; fall back to the
        // status text when the body is not that shape.
        let message = match response.json::<GraphErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(ApiError::from_status(status.as_u16(), message))
    }
}

impl PlatformClient for GraphClient {
    fn reply_to_comment(
        &self,
        comment_id: &CommentId,
        message: &str,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send {
        async move {
            let path = format!("{comment_id}/replies");
            self.post(&path, &[("message", message)]).await
        }
    }

    fn send_direct_message(
        &self,
        username: &str,
        message: &str,
        template: Option<&DmTemplate>,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send {
        async move {
            let mut params: Vec<(&str, String)> = vec![
                ("recipient_username", username.to_string()),
                ("message", message.to_string()),
            ];
            if let Some(template) = template {
                let encoded = serde_json::to_string(template).map_err(|err| {
                    ApiError::permanent_without_source(format!(
                        "failed to encode DM template: {err}"
                    ))
                })?;
                params.push(("template", encoded));
            }
            self.post("direct_messages", &params).await
        }
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
