//! Automation rule storage and selection.

pub mod matcher;
pub mod store;

pub use matcher::find_matching_rule;
pub use store::{RuleStore, StoreError};
