//! Subscription handshake verification.
//!
//! Registering a webhook endpoint with Meta triggers a one-shot GET
//! challenge: the endpoint must echo `hub.challenge` back, and doing so only
//! after checking `hub.verify_token` proves the endpoint is the one that was
//! configured. There is no session and no retry; a failed handshake simply
//! leaves the subscription unconfirmed.

use serde::Deserialize;
use thiserror::Error;

/// Query parameters of the subscription verification GET request.
///
/// All parameters are optional at the wire level; missing ones fail
/// verification rather than producing a malformed-request error.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,

    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,

    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// The handshake did not prove knowledge of the verify token.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid verification token")]
pub struct InvalidVerification;

/// Checks a subscription handshake against the configured verify token.
///
/// Succeeds only if `hub.mode` is `"subscribe"` and `hub.verify_token`
/// equals the configured token exactly. On success, returns the
/// `hub.challenge` value to echo back verbatim (empty string if absent).
pub fn verify_subscription(
    params: &SubscriptionParams,
    expected_token: &str,
) -> Result<String, InvalidVerification> {
    let mode_ok = params.mode.as_deref() == Some("subscribe");
    let token_ok = params.verify_token.as_deref() == Some(expected_token);

    if mode_ok && token_ok {
        Ok(params.challenge.clone().unwrap_or_default())
    } else {
        Err(InvalidVerification)
    }
}
