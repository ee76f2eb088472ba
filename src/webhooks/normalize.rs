//! Webhook delivery envelope parsing.
//!
//! Meta delivers webhook payloads as an envelope of entries, each carrying a
//! list of field changes. This module validates the envelope and flattens it
//! into normalized [`CommentEvent`]s, in delivery order.
//!
//! # Skip policy
//!
//! A delivery batch is all-or-nothing at the envelope level: malformed JSON or
//! a non-Instagram `object` rejects the whole batch. Below the envelope the
//! policy is to skip, not fail: changes for fields other than `comments`, and
//! comment changes missing a parent `media_id` or `text`, are dropped so that
//! one incomplete sub-event cannot block its siblings.

use serde::Deserialize;
use thiserror::Error;

use super::events::CommentEvent;
use crate::types::{CommentId, MediaId};

/// Error from normalizing a webhook delivery.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload was not valid JSON or lacks a structurally required field.
    #[error("failed to parse webhook delivery: {0}")]
    Json(#[from] serde_json::Error),

    /// The delivery's `object` type is not `instagram`.
    #[error("unsupported webhook object type: {object}")]
    UnsupportedObject { object: String },
}

// ============================================================================
// Raw deserialization structs
// ============================================================================
// Only the fields the engine consumes are declared; serde ignores the rest of
// the envelope (entry ids, timestamps, extra change metadata).

#[derive(Debug, Deserialize)]
struct RawDelivery {
    object: String,
    entry: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    changes: Vec<RawChange>,
}

#[derive(Debug, Deserialize)]
struct RawChange {
    field: String,
    value: RawChangeValue,
}

#[derive(Debug, Deserialize)]
struct RawChangeValue {
    id: String,
    #[serde(default)]
    media_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    from: RawAuthor,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    id: String,
    username: String,
}

// ============================================================================
// Normalization
// ============================================================================

/// Parses a raw webhook delivery body into normalized comment events.
///
/// # Returns
///
/// The comment events in delivery order (entries in order, changes within an
/// entry in order). An empty vector is a valid outcome: a well-formed
/// delivery may carry no comment changes at all.
///
/// # Errors
///
/// - [`NormalizeError::Json`] if the body is not valid JSON or the envelope
///   lacks `entry`, `changes`, `value.id`, or `value.from`.
/// - [`NormalizeError::UnsupportedObject`] if `object` is not `"instagram"`.
pub fn normalize_delivery(payload: &[u8]) -> Result<Vec<CommentEvent>, NormalizeError> {
    let delivery: RawDelivery = serde_json::from_slice(payload)?;

    if delivery.object != "instagram" {
        return Err(NormalizeError::UnsupportedObject {
            object: delivery.object,
        });
    }

    let mut events = Vec::new();
    for entry in delivery.entry {
        for change in entry.changes {
            if change.field != "comments" {
                continue;
            }
            let value = change.value;
            // Empty strings count as missing, same as the upstream contract.
            let media_id = match value.media_id.filter(|m| !m.is_empty()) {
                Some(media_id) => media_id,
                None => continue,
            };
            let text = match value.text.filter(|t| !t.is_empty()) {
                Some(text) => text,
                None => continue,
            };
            events.push(CommentEvent {
                comment_id: CommentId::new(value.id),
                media_id: MediaId::new(media_id),
                text,
                author_id: value.from.id,
                author_username: value.from.username,
            });
        }
    }

    Ok(events)
}
