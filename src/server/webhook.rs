//! Webhook endpoint handlers.
//!
//! Two handlers share the `/webhook` route: Meta's one-time GET handshake
//! when a subscription is created, and the POST deliveries that carry
//! comment events afterwards. Deliveries are processed synchronously; the
//! response status tells the sender whether to redeliver.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{info, warn};

use super::AppState;
use crate::automation::{process_delivery, DeliveryError};
use crate::instagram::PlatformClient;
use crate::webhooks::{
    verify_signature, verify_subscription, InvalidVerification, SubscriptionParams,
    SIGNATURE_HEADER,
};

/// Errors that can occur at the webhook boundary.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Subscription handshake mode/token mismatch.
    #[error(transparent)]
    InvalidVerification(#[from] InvalidVerification),

    /// Delivery signature missing or wrong while signature auth is enabled.
    #[error("invalid signature")]
    InvalidSignature,

    /// The delivery could not be fully processed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::InvalidVerification(_) => {
                (StatusCode::FORBIDDEN, "Invalid verification token")
            }
            WebhookError::InvalidSignature => (StatusCode::UNAUTHORIZED, "Invalid signature"),
            // The sender only acts on the status; details stay in the logs.
            WebhookError::Delivery(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        (status, message).into_response()
    }
}

/// Subscription verification handler.
///
/// Meta calls this once when the webhook subscription is configured. The
/// response must be the literal `hub.challenge` value, echoed only when the
/// mode is `subscribe` and the token matches the configured one.
///
/// # Response
///
/// - 200 with the challenge text on success
/// - 403 `Invalid verification token` on any mismatch
pub async fn subscription_handler<C>(
    State(app_state): State<AppState<C>>,
    Query(params): Query<SubscriptionParams>,
) -> Result<String, WebhookError>
where
    C: PlatformClient + Send + Sync + 'static,
{
    match verify_subscription(&params, app_state.verify_token()) {
        Ok(challenge) => {
            info!("webhook subscription verified");
            Ok(challenge)
        }
        Err(err) => {
            warn!(mode = params.mode.as_deref(), "webhook verification rejected");
            Err(err.into())
        }
    }
}

/// Delivery handler.
///
/// Runs the full pipeline for one delivery: optional signature check,
/// normalization, rule matching, and action execution against the current
/// rule snapshot.
///
/// # Response
///
/// - 200 `OK`: every event was handled (including "nothing matched" and
///   "duplicate skipped")
/// - 401: signature auth is enabled and the delivery is not correctly signed
/// - 500 `Internal Server Error`: the payload was structurally invalid or
///   some action failed; the sender is expected to redeliver
pub async fn delivery_handler<C>(
    State(app_state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    C: PlatformClient + Send + Sync + 'static,
{
    // Signature auth runs before the body is even parsed.
    if let Some(secret) = app_state.app_secret() {
        let verified = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|header| verify_signature(secret, &body, header));
        if !verified {
            warn!("webhook delivery rejected: invalid signature");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let rules = app_state.store().snapshot();
    match process_delivery(app_state.client(), &rules, app_state.dedupe(), &body).await {
        Ok(summary) => {
            info!(
                events = summary.events,
                matched = summary.matched,
                actions = summary.actions,
                skipped_duplicates = summary.skipped_duplicates,
                "webhook delivery processed"
            );
            Ok((StatusCode::OK, "OK"))
        }
        Err(err) => {
            warn!(error = %err, "webhook delivery failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::NormalizeError;

    #[test]
    fn verification_failure_maps_to_403() {
        let response = WebhookError::from(InvalidVerification).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn signature_failure_maps_to_401() {
        let response = WebhookError::InvalidSignature.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn delivery_failure_maps_to_500() {
        let err = WebhookError::Delivery(DeliveryError::Normalize(
            NormalizeError::UnsupportedObject {
                object: "page".to_string(),
            },
        ));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
