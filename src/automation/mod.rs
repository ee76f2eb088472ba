//! Comment automation: what to do when a rule matches, and doing it.

pub mod dedupe;
pub mod executor;
pub mod pipeline;

pub use dedupe::{DedupeKey, DedupeTracker, DEFAULT_DEDUPE_TTL_HOURS};
pub use executor::{
    execute_rule, plan_actions, ActionOutcome, AutomationAction, ExecutionReport,
};
pub use pipeline::{process_delivery, DeliveryError, DeliverySummary};
