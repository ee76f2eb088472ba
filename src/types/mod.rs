//! Core domain types for the automation engine.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod ids;
pub mod rule;

// Re-export commonly used types at the module level
pub use ids::{CommentId, MediaId, RuleId};
pub use rule::{
    AutomationRule, ButtonType, DmTemplate, RuleDraft, RuleValidationError, TemplateButton,
    TemplateType, MAX_TEMPLATE_BUTTONS,
};
