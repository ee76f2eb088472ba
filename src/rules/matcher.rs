//! Rule selection for comment events.
//!
//! Precedence is fixed: the active rule scoped to the comment's post outranks
//! every global rule, and global rules keep store order among themselves.
//! Keyword matching is case-insensitive substring containment over the
//! comma-split trigger list, and the first matching candidate wins. At most
//! one rule is ever selected per event.

use crate::types::AutomationRule;
use crate::webhooks::CommentEvent;

/// Selects the rule to execute for a comment event, if any.
///
/// The candidate list is the first active rule whose `postId` equals the
/// comment's `media_id` (if one exists), followed by every active global
/// rule in store order. Candidates are filtered by keyword match against the
/// lower-cased comment text; the first survivor is returned.
///
/// Matching is substring containment, not word-boundary matching: `"hi"`
/// matches `"this"`, and an empty keyword (e.g. from a trailing comma in the
/// trigger) matches any text.
pub fn find_matching_rule<'a>(
    rules: &'a [AutomationRule],
    event: &CommentEvent,
) -> Option<&'a AutomationRule> {
    let post_rule = rules
        .iter()
        .find(|rule| rule.is_active && rule.post_id.as_ref() == Some(&event.media_id));
    let global_rules = rules.iter().filter(|rule| rule.is_active && is_global(rule));

    let text = event.text.to_lowercase();
    post_rule
        .into_iter()
        .chain(global_rules)
        .find(|rule| keywords_match(rule, &text))
}

/// A rule without a post scope applies to every post. An empty `postId` is
/// treated the same as an absent one.
fn is_global(rule: &AutomationRule) -> bool {
    rule.post_id
        .as_ref()
        .map_or(true, |post_id| post_id.as_str().is_empty())
}

fn keywords_match(rule: &AutomationRule, lowercased_text: &str) -> bool {
    rule.trigger_keywords()
        .iter()
        .any(|keyword| lowercased_text.contains(keyword.as_str()))
}
