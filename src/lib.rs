//! Replygram - a webhook-driven comment automation engine for the Instagram
//! Graph API.
//!
//! The engine receives comment-creation events from Meta's webhook delivery
//! system, matches each comment against a user-defined rule set, and executes
//! the winning rule's actions (public reply, direct message) against the
//! Graph API. Rules are managed over a small JSON admin API and persisted to
//! a single file.

pub mod automation;
pub mod config;
pub mod instagram;
pub mod rules;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_support;
