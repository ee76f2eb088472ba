//! End-to-end processing of a webhook delivery.
//!
//! One delivery can carry several comment events. Each event is handled
//! independently: normalize, dedupe check, rule match, execute. A failure
//! on one event never prevents later events from running; the delivery as
//! a whole fails afterwards so the sender redelivers.

use thiserror::Error;

use super::dedupe::{DedupeKey, DedupeTracker};
use super::executor::execute_rule;
use crate::instagram::{ApiError, PlatformClient};
use crate::rules::find_matching_rule;
use crate::types::AutomationRule;
use crate::webhooks::{normalize_delivery, NormalizeError};

/// Why a delivery could not be fully processed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The payload could not be turned into comment events.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// One or more automation actions failed.
    #[error("{failed} of {attempted} automation actions failed")]
    Execution {
        failed: usize,
        attempted: usize,
        #[source]
        first: ApiError,
    },
}

/// Counters describing what a fully successful delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliverySummary {
    /// Comment events the payload normalized to.
    pub events: usize,

    /// Events that matched an active rule.
    pub matched: usize,

    /// Actions attempted across all matched events.
    pub actions: usize,

    /// Events skipped because they were already processed.
    pub skipped_duplicates: usize,
}

/// Processes one webhook delivery payload against the current rules.
///
/// Events run in payload order. When a dedupe tracker is provided, events
/// whose actions all succeed are marked seen; an event with any failed
/// action stays unmarked so a redelivery retries it.
pub async fn process_delivery<C: PlatformClient>(
    client: &C,
    rules: &[AutomationRule],
    dedupe: Option<&DedupeTracker>,
    payload: &[u8],
) -> Result<DeliverySummary, DeliveryError> {
    let events = normalize_delivery(payload)?;
    tracing::debug!(events = events.len(), "normalized webhook delivery");

    let mut summary = DeliverySummary {
        events: events.len(),
        ..DeliverySummary::default()
    };
    let mut failed = 0;
    let mut first_error: Option<ApiError> = None;

    for event in &events {
        let key = DedupeKey::comment(&event.comment_id);
        if let Some(tracker) = dedupe {
            if tracker.is_duplicate(&key) {
                tracing::debug!(comment_id = %event.comment_id, "skipping duplicate comment");
                summary.skipped_duplicates += 1;
                continue;
            }
        }

        let Some(rule) = find_matching_rule(rules, event) else {
            tracing::debug!(comment_id = %event.comment_id, "no rule matched comment");
            continue;
        };
        tracing::info!(
            comment_id = %event.comment_id,
            rule_id = %rule.id,
            "rule matched comment"
        );
        summary.matched += 1;

        let report = execute_rule(client, rule, event).await;
        summary.actions += report.attempted();
        failed += report.failed();

        if report.succeeded() {
            if let Some(tracker) = dedupe {
                tracker.mark_seen(&key);
            }
        } else if first_error.is_none() {
            first_error = report.into_first_error();
        }
    }

    match first_error {
        Some(first) => Err(DeliveryError::Execution {
            failed,
            attempted: summary.actions,
            first,
        }),
        None => Ok(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingClient;
    use crate::types::RuleId;

    fn reply_rule(trigger: &str, response: &str) -> AutomationRule {
        AutomationRule {
            id: RuleId::generate(),
            post_id: None,
            trigger: trigger.to_string(),
            response: response.to_string(),
            dm_message: None,
            dm_template: None,
            action_url: None,
            is_active: true,
            send_dm: false,
            auto_reply: true,
        }
    }

    fn comment_payload(comment_id: &str, text: &str) -> String {
        format!(
            r#"{{
                "object": "instagram",
                "entry": [{{
                    "id": "17840000000000001",
                    "time": 1724140800,
                    "changes": [{{
                        "field": "comments",
                        "value": {{
                            "id": "{comment_id}",
                            "media_id": "17850000000000001",
                            "text": "{text}",
                            "from": {{"id": "17840000000000002", "username": "commenter"}}
                        }}
                    }}]
                }}]
            }}"#
        )
    }

    #[tokio::test]
    async fn matched_comment_triggers_the_rule() {
        let client = RecordingClient::default();
        let rules = vec![reply_rule("price", "Sent you the price!")];
        let payload = comment_payload("17900000000000001", "what is the price?");

        let summary = process_delivery(&client, &rules, None, payload.as_bytes())
            .await
            .unwrap();

        assert_eq!(
            summary,
            DeliverySummary {
                events: 1,
                matched: 1,
                actions: 1,
                skipped_duplicates: 0,
            }
        );
        assert_eq!(
            client.calls(),
            vec!["reply 17900000000000001: Sent you the price!"]
        );
    }

    #[tokio::test]
    async fn unmatched_comment_is_counted_but_not_acted_on() {
        let client = RecordingClient::default();
        let rules = vec![reply_rule("price", "Sent you the price!")];
        let payload = comment_payload("17900000000000001", "lovely photo");

        let summary = process_delivery(&client, &rules, None, payload.as_bytes())
            .await
            .unwrap();

        assert_eq!(summary.events, 1);
        assert_eq!(summary.matched, 0);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn every_event_in_the_delivery_is_processed() {
        let client = RecordingClient::default();
        let rules = vec![reply_rule("price", "On it!")];
        let payload = r#"{
            "object": "instagram",
            "entry": [
                {"changes": [{"field": "comments", "value": {
                    "id": "101", "media_id": "17850000000000001", "text": "price?",
                    "from": {"id": "1", "username": "first"}
                }}]},
                {"changes": [{"field": "comments", "value": {
                    "id": "102", "media_id": "17850000000000001", "text": "price please",
                    "from": {"id": "2", "username": "second"}
                }}]}
            ]
        }"#;

        let summary = process_delivery(&client, &rules, None, payload.as_bytes())
            .await
            .unwrap();

        assert_eq!(summary.events, 2);
        assert_eq!(summary.matched, 2);
        assert_eq!(client.calls(), vec!["reply 101: On it!", "reply 102: On it!"]);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_normalize_error() {
        let client = RecordingClient::default();
        let err = process_delivery(&client, &[], None, b"not json")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Normalize(_)));
    }

    #[tokio::test]
    async fn action_failure_fails_the_delivery_after_all_events_ran() {
        let client = RecordingClient::failing();
        let rules = vec![reply_rule("price", "On it!")];
        let payload = r#"{
            "object": "instagram",
            "entry": [
                {"changes": [{"field": "comments", "value": {
                    "id": "101", "media_id": "17850000000000001", "text": "price?",
                    "from": {"id": "1", "username": "first"}
                }}]},
                {"changes": [{"field": "comments", "value": {
                    "id": "102", "media_id": "17850000000000001", "text": "price please",
                    "from": {"id": "2", "username": "second"}
                }}]}
            ]
        }"#;

        let err = process_delivery(&client, &rules, None, payload.as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeliveryError::Execution {
                failed: 2,
                attempted: 2,
                ..
            }
        ));
        assert_eq!(client.calls().len(), 2, "second event should still run");
    }

    #[tokio::test]
    async fn successful_events_are_skipped_on_redelivery() {
        let client = RecordingClient::default();
        let tracker = DedupeTracker::with_default_ttl();
        let rules = vec![reply_rule("price", "On it!")];
        let payload = comment_payload("17900000000000001", "price?");

        let first = process_delivery(&client, &rules, Some(&tracker), payload.as_bytes())
            .await
            .unwrap();
        assert_eq!(first.matched, 1);

        let second = process_delivery(&client, &rules, Some(&tracker), payload.as_bytes())
            .await
            .unwrap();
        assert_eq!(second.matched, 0);
        assert_eq!(second.skipped_duplicates, 1);
        assert_eq!(client.calls().len(), 1, "no second reply");
    }

    #[tokio::test]
    async fn failed_events_are_retried_on_redelivery() {
        let tracker = DedupeTracker::with_default_ttl();
        let rules = vec![reply_rule("price", "On it!")];
        let payload = comment_payload("17900000000000001", "price?");

        let failing = RecordingClient::failing();
        process_delivery(&failing, &rules, Some(&tracker), payload.as_bytes())
            .await
            .unwrap_err();

        // The redelivery finds the comment unmarked and acts on it.
        let working = RecordingClient::default();
        let summary = process_delivery(&working, &rules, Some(&tracker), payload.as_bytes())
            .await
            .unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(working.calls().len(), 1);
    }

    #[tokio::test]
    async fn non_instagram_object_is_rejected() {
        let client = RecordingClient::default();
        let payload = br#"{"object": "page", "entry": []}"#;
        let err = process_delivery(&client, &[], None, payload)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Normalize(NormalizeError::UnsupportedObject { .. })
        ));
    }
}
