//! Planning and execution of rule actions.
//!
//! Matching and planning are pure: [`plan_actions`] turns a rule and the
//! comment it matched into a list of [`AutomationAction`]s without touching
//! the network. [`execute_rule`] then runs the plan against a
//! [`PlatformClient`], attempting every action even when an earlier one
//! fails, and reports the per-action outcomes.

use crate::instagram::{ApiError, PlatformClient};
use crate::types::{AutomationRule, CommentId, DmTemplate, RuleId};
use crate::webhooks::CommentEvent;

/// An outbound Instagram action, described as data before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationAction {
    /// Post a public reply beneath the comment.
    Reply {
        comment_id: CommentId,
        message: String,
    },

    /// Send a direct message to the comment author.
    DirectMessage {
        username: String,
        message: String,
        template: Option<DmTemplate>,
    },
}

impl AutomationAction {
    /// Returns a short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationAction::Reply { .. } => "reply",
            AutomationAction::DirectMessage { .. } => "direct_message",
        }
    }
}

/// The outcome of a single executed action.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: AutomationAction,
    pub result: Result<(), ApiError>,
}

/// Per-action results of executing one rule against one comment.
#[derive(Debug)]
pub struct ExecutionReport {
    /// The rule that was executed.
    pub rule_id: RuleId,

    /// Outcomes in execution order: the reply, if any, comes first.
    pub outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
    /// Returns true if every action succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    /// Number of actions attempted.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of actions that failed.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }

    /// Consumes the report and returns the first failure, if any.
    pub fn into_first_error(self) -> Option<ApiError> {
        self.outcomes
            .into_iter()
            .find_map(|outcome| outcome.result.err())
    }
}

/// Plans the actions a matched rule takes for a comment.
///
/// The reply is planned before the direct message. A rule configured to DM
/// without any message text sends an empty message rather than skipping the
/// send; the template, when present, still carries the content.
pub fn plan_actions(rule: &AutomationRule, event: &CommentEvent) -> Vec<AutomationAction> {
    let mut actions = Vec::new();
    if rule.auto_reply {
        actions.push(AutomationAction::Reply {
            comment_id: event.comment_id.clone(),
            message: rule.response.clone(),
        });
    }
    if rule.send_dm {
        actions.push(AutomationAction::DirectMessage {
            username: event.author_username.clone(),
            message: rule.dm_message.clone().unwrap_or_default(),
            template: rule.dm_template.clone(),
        });
    }
    actions
}

/// Executes every action a rule plans for a comment.
///
/// Actions run sequentially in plan order. A failure does not stop later
/// actions: a broken reply must not also swallow the DM, and vice versa.
pub async fn execute_rule<C: PlatformClient>(
    client: &C,
    rule: &AutomationRule,
    event: &CommentEvent,
) -> ExecutionReport {
    let mut outcomes = Vec::new();
    for action in plan_actions(rule, event) {
        let result = execute_action(client, &action).await;
        match &result {
            Ok(()) => {
                tracing::info!(
                    rule_id = %rule.id,
                    comment_id = %event.comment_id,
                    action = action.kind(),
                    "automation action succeeded"
                );
            }
            Err(err) => {
                tracing::error!(
                    rule_id = %rule.id,
                    comment_id = %event.comment_id,
                    action = action.kind(),
                    transient = err.is_transient(),
                    error = %err,
                    "automation action failed"
                );
            }
        }
        outcomes.push(ActionOutcome { action, result });
    }
    ExecutionReport {
        rule_id: rule.id.clone(),
        outcomes,
    }
}

async fn execute_action<C: PlatformClient>(
    client: &C,
    action: &AutomationAction,
) -> Result<(), ApiError> {
    match action {
        AutomationAction::Reply {
            comment_id,
            message,
        } => client.reply_to_comment(comment_id, message).await,
        AutomationAction::DirectMessage {
            username,
            message,
            template,
        } => {
            client
                .send_direct_message(username, message, template.as_ref())
                .await
        }
    }
}
