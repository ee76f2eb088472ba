//! Persisted automation rule store.
//!
//! Rules live in memory behind a lock and are mirrored to a single
//! schema-versioned JSON file. The webhook path reads immutable snapshots;
//! the admin API performs validated mutations. A mutation validates first,
//! persists the updated list atomically, and only then makes it visible, so
//! a persistence failure leaves the previous state intact in memory and on
//! disk.
//!
//! # Atomic Writes
//!
//! The rule file is written with a write-to-temp-then-rename pattern:
//! 1. Write to `<path>.tmp`
//! 2. fsync the temp file
//! 3. Rename to `<path>`
//! 4. fsync the parent directory
//!
//! Readers (and crashes) therefore always see either the old or the new
//! file, never a partial write.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AutomationRule, MediaId, RuleDraft, RuleId, RuleValidationError};

/// Current rule-file schema version. Increment when making breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from rule store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rule file written by an incompatible version.
    #[error("rule file schema mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },

    /// The addressed rule does not exist.
    #[error("no rule with id {0}")]
    NotFound(RuleId),

    /// The submitted rule failed write-time validation.
    #[error(transparent)]
    Invalid(#[from] RuleValidationError),

    /// Another active rule already targets the same post.
    #[error("post {media_id} already has an active rule ({existing})")]
    PostRuleConflict { media_id: MediaId, existing: RuleId },
}

/// The JSON structure stored at the rule file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    /// Schema version for forward-compatible migrations.
    pub schema_version: u32,

    /// When the file was last written (ISO 8601).
    pub saved_at: DateTime<Utc>,

    /// Rules in insertion order. Order matters: it is the matcher's
    /// tie-break among global rules.
    pub rules: Vec<AutomationRule>,
}

/// The shared rule collection.
///
/// Cheap to share via `Arc`; interior locking keeps reads concurrent while
/// mutations serialize.
#[derive(Debug)]
pub struct RuleStore {
    path: PathBuf,
    rules: RwLock<Vec<AutomationRule>>,
}

impl RuleStore {
    /// Opens the store, loading the rule file at `path` if it exists.
    ///
    /// A missing file starts the store empty; a malformed or
    /// schema-incompatible file is an error so startup fails fast instead of
    /// silently dropping rules.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rules = match try_load_rules(&path)? {
            Some(file) => file.rules,
            None => Vec::new(),
        };
        Ok(RuleStore {
            path,
            rules: RwLock::new(rules),
        })
    }

    /// Clones the current rule list in insertion order.
    ///
    /// The webhook pipeline matches against this immutable copy, so a
    /// delivery sees one consistent rule set even if the admin API mutates
    /// the store mid-flight.
    pub fn snapshot(&self) -> Vec<AutomationRule> {
        self.rules.read().clone()
    }

    /// Looks up a single rule by ID.
    pub fn get(&self, id: &RuleId) -> Option<AutomationRule> {
        self.rules.read().iter().find(|r| &r.id == id).cloned()
    }

    /// Number of stored rules.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Validates a draft, assigns it a fresh ID, appends it, and persists.
    pub fn create(&self, draft: RuleDraft) -> Result<AutomationRule, StoreError> {
        let rule = draft.into_rule(RuleId::generate());
        rule.validate()?;

        let mut rules = self.rules.write();
        check_post_conflict(&rules, &rule, None)?;

        let mut next = rules.clone();
        next.push(rule.clone());
        self.persist(&next)?;
        *rules = next;
        Ok(rule)
    }

    /// Replaces the rule with the given ID by the draft, keeping its ID and
    /// position, and persists.
    pub fn replace(&self, id: &RuleId, draft: RuleDraft) -> Result<AutomationRule, StoreError> {
        let rule = draft.into_rule(id.clone());
        rule.validate()?;

        let mut rules = self.rules.write();
        let index = rules
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        check_post_conflict(&rules, &rule, Some(id))?;

        let mut next = rules.clone();
        next[index] = rule.clone();
        self.persist(&next)?;
        *rules = next;
        Ok(rule)
    }

    /// Deletes the rule with the given ID and persists.
    pub fn delete(&self, id: &RuleId) -> Result<(), StoreError> {
        let mut rules = self.rules.write();
        let index = rules
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut next = rules.clone();
        next.remove(index);
        self.persist(&next)?;
        *rules = next;
        Ok(())
    }

    fn persist(&self, rules: &[AutomationRule]) -> Result<(), StoreError> {
        let file = RuleFile {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            rules: rules.to_vec(),
        };
        save_rules_atomic(&self.path, &file)
    }
}

/// Rejects a candidate that would make a post carry two active rules.
///
/// `replacing` names the rule being updated, if any, so a rule can keep its
/// own post scope.
fn check_post_conflict(
    rules: &[AutomationRule],
    candidate: &AutomationRule,
    replacing: Option<&RuleId>,
) -> Result<(), StoreError> {
    if !candidate.is_active {
        return Ok(());
    }
    let media_id = match &candidate.post_id {
        Some(media_id) => media_id,
        None => return Ok(()),
    };
    let conflict = rules.iter().find(|r| {
        r.is_active && r.post_id.as_ref() == Some(media_id) && replacing != Some(&r.id)
    });
    match conflict {
        Some(existing) => Err(StoreError::PostRuleConflict {
            media_id: media_id.clone(),
            existing: existing.id.clone(),
        }),
        None => Ok(()),
    }
}

/// Saves the rule file atomically to disk.
pub fn save_rules_atomic(path: &Path, file: &RuleFile) -> Result<(), StoreError> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(file)?;

    {
        let mut tmp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(&bytes)?;
        fsync_file(&tmp)?;
    }

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fsync_dir(parent)?;
        }
    }

    Ok(())
}

/// Loads the rule file from disk.
///
/// # Errors
///
/// Fails if the file cannot be read, is not valid JSON, or carries an
/// incompatible schema version.
pub fn load_rules(path: &Path) -> Result<RuleFile, StoreError> {
    let bytes = std::fs::read(path)?;
    let file: RuleFile = serde_json::from_slice(&bytes)?;

    if file.schema_version != SCHEMA_VERSION {
        return Err(StoreError::SchemaMismatch {
            expected: SCHEMA_VERSION,
            got: file.schema_version,
        });
    }

    Ok(file)
}

/// Loads the rule file, returning `None` if it does not exist.
///
/// Other errors (malformed JSON, schema mismatch) are propagated.
pub fn try_load_rules(path: &Path) -> Result<Option<RuleFile>, StoreError> {
    match load_rules(path) {
        Ok(file) => Ok(Some(file)),
        Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Renames are durable only once the directory entry itself is synced.
fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}
