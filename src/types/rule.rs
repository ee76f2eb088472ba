//! Automation rule types.
//!
//! Rules are managed by the dashboard through the admin API and serialized in
//! camelCase to keep the wire format compatible with it. The engine reads
//! rules through immutable snapshots and never mutates them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{MediaId, RuleId};

/// Maximum number of buttons the Graph API accepts on a button template.
pub const MAX_TEMPLATE_BUTTONS: usize = 3;

/// A user-defined comment automation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRule {
    /// Unique rule identifier, assigned on create.
    pub id: RuleId,

    /// Scopes the rule to one post. Absent means global (applies to all posts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<MediaId>,

    /// Raw comma-separated keyword list, e.g. `"price, cost"`.
    pub trigger: String,

    /// Public reply text, posted when `auto_reply` is set.
    #[serde(default)]
    pub response: String,

    /// Direct-message text, sent when `send_dm` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_message: Option<String>,

    /// Structured button template attached to the direct message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_template: Option<DmTemplate>,

    /// Link surfaced in the dashboard. Stored and returned verbatim, never
    /// read by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,

    /// Inactive rules are never matched.
    pub is_active: bool,

    /// Send a direct message to the comment author.
    pub send_dm: bool,

    /// Post a public reply to the comment.
    pub auto_reply: bool,
}

impl AutomationRule {
    /// Derives the trigger keyword list from the raw `trigger` string.
    ///
    /// The whole string is lower-cased, split on `,`, and each fragment is
    /// trimmed. Empty fragments are kept: an empty keyword is a substring of
    /// every text, so a trailing comma makes the rule match any comment.
    pub fn trigger_keywords(&self) -> Vec<String> {
        trigger_keywords(&self.trigger)
    }

    /// Checks the rule against the write-time invariants enforced by the
    /// store. Matching and execution assume stored rules passed this.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.trigger_keywords().iter().all(|k| k.is_empty()) {
            return Err(RuleValidationError::EmptyTrigger);
        }
        if let Some(post_id) = &self.post_id {
            if post_id.as_str().is_empty() {
                return Err(RuleValidationError::EmptyPostId);
            }
        }
        if !self.auto_reply && !self.send_dm {
            return Err(RuleValidationError::NoActions);
        }
        if self.auto_reply && self.response.trim().is_empty() {
            return Err(RuleValidationError::MissingResponse);
        }
        if self.send_dm {
            let has_message = self
                .dm_message
                .as_deref()
                .is_some_and(|m| !m.trim().is_empty());
            let has_template_text = self
                .dm_template
                .as_ref()
                .is_some_and(|t| !t.text.trim().is_empty());
            if !has_message && !has_template_text {
                return Err(RuleValidationError::MissingDmContent);
            }
        }
        if let Some(template) = &self.dm_template {
            template.validate()?;
        }
        Ok(())
    }
}

/// Derives trigger keywords from a raw trigger string.
///
/// See [`AutomationRule::trigger_keywords`].
pub fn trigger_keywords(trigger: &str) -> Vec<String> {
    trigger
        .to_lowercase()
        .split(',')
        .map(|k| k.trim().to_string())
        .collect()
}

/// An automation rule as submitted to the admin API, before an ID is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<MediaId>,
    pub trigger: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_template: Option<DmTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    pub is_active: bool,
    pub send_dm: bool,
    pub auto_reply: bool,
}

impl RuleDraft {
    /// Combines the draft with an ID into a full rule (not yet validated).
    pub fn into_rule(self, id: RuleId) -> AutomationRule {
        AutomationRule {
            id,
            post_id: self.post_id,
            trigger: self.trigger,
            response: self.response,
            dm_message: self.dm_message,
            dm_template: self.dm_template,
            action_url: self.action_url,
            is_active: self.is_active,
            send_dm: self.send_dm,
            auto_reply: self.auto_reply,
        }
    }
}

/// Structured direct-message template, passed through to the Graph API
/// unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmTemplate {
    /// Template discriminator. The Graph API defines only button templates.
    pub template_type: TemplateType,

    /// Body text shown above the buttons.
    pub text: String,

    /// Call-to-action buttons, at most [`MAX_TEMPLATE_BUTTONS`].
    pub buttons: Vec<TemplateButton>,
}

impl DmTemplate {
    fn validate(&self) -> Result<(), RuleValidationError> {
        if self.buttons.is_empty() || self.buttons.len() > MAX_TEMPLATE_BUTTONS {
            return Err(RuleValidationError::BadButtonCount {
                got: self.buttons.len(),
            });
        }
        for button in &self.buttons {
            if button.title.trim().is_empty() || button.url.trim().is_empty() {
                return Err(RuleValidationError::EmptyButtonField);
            }
        }
        Ok(())
    }
}

/// Template kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Button,
}

/// A single call-to-action button on a [`DmTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateButton {
    /// Button kind. Only web links are supported.
    #[serde(rename = "type")]
    pub button_type: ButtonType,
    pub title: String,
    pub url: String,
}

/// Button kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    WebUrl,
}

/// A rule rejected by write-time validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleValidationError {
    #[error("trigger must contain at least one non-empty keyword")]
    EmptyTrigger,

    #[error("postId must not be empty")]
    EmptyPostId,

    #[error("rule must enable autoReply or sendDm")]
    NoActions,

    #[error("autoReply rules require a non-empty response")]
    MissingResponse,

    #[error("sendDm rules require a dmMessage or a template with text")]
    MissingDmContent,

    #[error("template must carry 1 to {MAX_TEMPLATE_BUTTONS} buttons, got {got}")]
    BadButtonCount { got: usize },

    #[error("template buttons require a non-empty title and url")]
    EmptyButtonField,
}
