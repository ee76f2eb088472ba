//! Deduplication of webhook deliveries.
//!
//! Meta may redeliver a webhook for a comment the engine has already acted
//! on, most visibly after a transient Graph API failure made a previous
//! delivery return HTTP 500. Replying twice to the same comment is worse
//! than occasionally missing a redelivery, so the tracker remembers which
//! comments completed successfully and lets the pipeline skip them.
//!
//! Keys are held in memory only. A restart forgets them, which is
//! acceptable: the window where Meta redelivers is short compared to
//! process lifetime.
//!
//! # TTL-based expiration
//!
//! Seen keys carry timestamps and are pruned once older than the retention
//! period (default 24 hours) to prevent unbounded growth.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::types::CommentId;

/// Default TTL for dedupe keys (24 hours).
pub const DEFAULT_DEDUPE_TTL_HOURS: i64 = 24;

/// A deduplication key that identifies a logical webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// Creates a dedupe key for a comment event.
    ///
    /// Comment IDs are globally unique, so the ID alone identifies the
    /// logical event across redeliveries.
    pub fn comment(comment_id: &CommentId) -> Self {
        DedupeKey(format!("comment:{comment_id}"))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks which events have been fully processed.
///
/// The pipeline consults [`is_duplicate`](DedupeTracker::is_duplicate)
/// before acting on an event and calls
/// [`mark_seen`](DedupeTracker::mark_seen) only after every action for the
/// event succeeded. A partially failed event stays unmarked so the
/// redelivery runs it again.
#[derive(Debug)]
pub struct DedupeTracker {
    ttl: chrono::Duration,
    seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl DedupeTracker {
    /// Creates a tracker that forgets keys after `ttl_hours`.
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            ttl: chrono::Duration::hours(ttl_hours),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a tracker with the default 24 hour TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_DEDUPE_TTL_HOURS)
    }

    /// Returns true if the key was marked seen within the TTL.
    ///
    /// Expired keys are pruned on the way, so the map never outgrows the
    /// retention window.
    pub fn is_duplicate(&self, key: &DedupeKey) -> bool {
        let cutoff = Utc::now() - self.ttl;
        let mut seen = self.seen.lock();
        seen.retain(|_, timestamp| *timestamp > cutoff);
        seen.contains_key(key.as_str())
    }

    /// Records the key as seen with the current timestamp.
    pub fn mark_seen(&self, key: &DedupeKey) {
        self.seen.lock().insert(key.as_str().to_string(), Utc::now());
    }
}
