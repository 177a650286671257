use crate::classifier::{FileCategory, FileEntry};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    /// Deletable under the default rules.
    Safe,
    /// Only with an explicit override.
    Caution,
    /// Never deletable.
    Protected,
}

pub const LOG_MIN_AGE_DAYS: i64 = 7;
pub const TRANSCRIPT_MIN_AGE_DAYS: i64 = 30;
pub const BACKUP_MIN_AGE_DAYS: i64 = 30;

pub struct SafetyPolicy {
    protected_names: Vec<&'static str>,
    protected_dirs: Vec<&'static str>,
}

impl SafetyPolicy {
    pub fn new() -> Self {
        Self {
            protected_names: vec![
                "config.json",
                "settings.json",
                "mcp.json",
                "sessions.json",
                "state.vscdb",
                "workspace.json",
                "storage.json",
                ".continuerc.json",
            ],
            protected_dirs: vec!["index", ".migrations", "lancedb"],
        }
    }

    pub fn check(&self, entry: &FileEntry, now: DateTime<Utc>) -> SafetyLevel {
        if self.is_protected(entry) {
            return SafetyLevel::Protected;
        }

        if self.category_allows(entry, now) {
            SafetyLevel::Safe
        } else {
            SafetyLevel::Caution
        }
    }

    pub fn is_safe_to_delete(&self, entry: &FileEntry, now: DateTime<Utc>) -> bool {
        self.check(entry, now) == SafetyLevel::Safe
    }

    fn is_protected(&self, entry: &FileEntry) -> bool {
        let name = entry.name.to_lowercase();
        if self.protected_names.contains(&name.as_str()) {
            return true;
        }

        entry
            .ancestor_dirs()
            .iter()
            .any(|dir| self.protected_dirs.contains(&dir.as_str()))
    }

    fn category_allows(&self, entry: &FileEntry, now: DateTime<Utc>) -> bool {
        let older_than = |days: i64| entry.modified < now - Duration::days(days);

        match entry.category {
            FileCategory::Temp | FileCategory::Cache => true,
            FileCategory::Log => older_than(LOG_MIN_AGE_DAYS),
            FileCategory::Database => entry.is_transcript() && older_than(TRANSCRIPT_MIN_AGE_DAYS),
            FileCategory::Backup => older_than(BACKUP_MIN_AGE_DAYS),
            FileCategory::Config
            | FileCategory::Index
            | FileCategory::Image
            | FileCategory::Unknown => false,
        }
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::new()
    }
}
