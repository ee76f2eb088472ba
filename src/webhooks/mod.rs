//! Inbound webhook handling.
//!
//! This module provides:
//! - Subscription handshake verification (GET challenge/response)
//! - Delivery signature verification (HMAC-SHA256, optional)
//! - Delivery envelope parsing and normalization into comment events

pub mod events;
pub mod normalize;
pub mod signature;
pub mod verify;

pub use events::CommentEvent;
pub use normalize::{normalize_delivery, NormalizeError};
pub use signature::{
    compute_signature, signature_header_value, verify_signature, SIGNATURE_HEADER,
};
pub use verify::{verify_subscription, InvalidVerification, SubscriptionParams};
