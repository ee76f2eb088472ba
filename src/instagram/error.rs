//! Instagram Graph API error types.
//!
//! This module distinguishes transient from permanent Graph API failures.
//! The engine never retries on its own: a failed action surfaces as a
//! delivery-level error, and Meta's redelivery is what retries transient
//! conditions. The classification drives logging so operators can tell a
//! flaky network apart from a revoked token.

use std::fmt;
use thiserror::Error;

/// The kind of Graph API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Transient - likely to succeed on webhook redelivery.
    ///
    /// Examples:
    /// - HTTP 5xx (Graph API server errors)
    /// - HTTP 429 (rate limited)
    /// - Network timeouts and connection failures
    Transient,

    /// Permanent - redelivery will fail the same way.
    ///
    /// Examples:
    /// - HTTP 400 (malformed request)
    /// - HTTP 401/403 (invalid or expired access token, missing permission)
    /// - HTTP 404 (comment or recipient no longer exists)
    Permanent,
}

impl ApiErrorKind {
    /// Returns true if a redelivered webhook is likely to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiErrorKind::Transient)
    }
}

/// A Graph API call failure.
#[derive(Debug, Error)]
pub struct ApiError {
    /// The kind of error (transient or permanent).
    pub kind: ApiErrorKind,

    /// The HTTP status code, if the request got as far as a response.
    pub status_code: Option<u16>,

    /// A human-readable description, preferring the message from the Graph
    /// error body over the bare status text.
    pub message: String,

    /// The underlying transport error, if any.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Instagram API error (HTTP {}): {}", code, self.message),
            None => write!(f, "Instagram API error: {}", self.message),
        }
    }
}

impl ApiError {
    /// Categorizes an error response by its HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = if status == 429 || (500..600).contains(&status) {
            ApiErrorKind::Transient
        } else {
            ApiErrorKind::Permanent
        };
        Self {
            kind,
            status_code: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes a transport-level failure from reqwest.
    ///
    /// Timeouts and connection failures are transient; anything else without
    /// a status (TLS setup, malformed URL, body decoding) is permanent.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let message = err.to_string();
        let kind = match status_code {
            Some(429) => ApiErrorKind::Transient,
            Some(code) if (500..600).contains(&code) => ApiErrorKind::Transient,
            Some(_) => ApiErrorKind::Permanent,
            None => {
                if err.is_timeout() || err.is_connect() {
                    ApiErrorKind::Transient
                } else {
                    ApiErrorKind::Permanent
                }
            }
        };
        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }

    /// Creates a permanent error without a transport source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without a transport source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if a redelivered webhook is likely to succeed.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ApiError::from_status(429, "slow down").kind, ApiErrorKind::Transient);
        assert_eq!(ApiError::from_status(500, "boom").kind, ApiErrorKind::Transient);
        assert_eq!(ApiError::from_status(503, "busy").kind, ApiErrorKind::Transient);
        assert_eq!(ApiError::from_status(400, "bad").kind, ApiErrorKind::Permanent);
        assert_eq!(ApiError::from_status(401, "token").kind, ApiErrorKind::Permanent);
        assert_eq!(ApiError::from_status(404, "gone").kind, ApiErrorKind::Permanent);
    }

    #[test]
    fn display_includes_status_when_present() {
        let with_status = ApiError::from_status(400, "Invalid parameter");
        assert_eq!(
            with_status.to_string(),
            "Instagram API error (HTTP 400): Invalid parameter"
        );

        let without_status = ApiError::transient_without_source("connection reset");
        assert_eq!(
            without_status.to_string(),
            "Instagram API error: connection reset"
        );
    }

    #[test]
    fn transient_predicate_follows_kind() {
        assert!(ApiError::transient_without_source("x").is_transient());
        assert!(!ApiError::permanent_without_source("x").is_transient());
    }
}
