use crate::chat::CleanableConversation;
use crate::classifier::{FileCategory, FileEntry};
use crate::safety::{SafetyLevel, SafetyPolicy};
use crate::utils::format_size;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

const LARGE_PLAN_BYTES: u64 = 100 * 1024 * 1024;
const BATCH_THRESHOLD: usize = 100;

/// User-chosen filters for one cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    pub keep_logs: bool,
    pub keep_cache: bool,
    pub keep_chats: bool,
    pub keep_index: bool,
    /// Files modified within this many days are left alone. Zero disables.
    pub keep_recent_days: u32,
}

impl PlanOptions {
    fn recency_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.keep_recent_days > 0).then(|| now - Duration::days(i64::from(self.keep_recent_days)))
    }
}

/// Why a file was selected. Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupReason {
    Log,
    Cache,
    Index,
    Chat,
    History,
    Temp,
}

impl CleanupReason {
    pub fn label(&self) -> &'static str {
        match self {
            CleanupReason::Log => "log",
            CleanupReason::Cache => "cache",
            CleanupReason::Index => "index",
            CleanupReason::Chat => "chat",
            CleanupReason::History => "history",
            CleanupReason::Temp => "temp",
        }
    }
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupCandidate {
    pub entry: FileEntry,
    pub reason: CleanupReason,
    pub size: u64,
    pub safety: SafetyLevel,
}

impl CleanupCandidate {
    pub fn path(&self) -> &Path {
        &self.entry.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReasonSummary {
    pub reason: CleanupReason,
    pub count: usize,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupPlan {
    pub candidates: Vec<CleanupCandidate>,
    pub total_size: u64,
    /// False when any candidate fails the default safety rules.
    pub safe_to_delete: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Count and size per reason, in display order, omitting empty reasons.
    pub fn by_reason(&self) -> Vec<ReasonSummary> {
        let mut summaries: Vec<ReasonSummary> = Vec::new();
        for candidate in &self.candidates {
            match summaries.iter_mut().find(|s| s.reason == candidate.reason) {
                Some(summary) => {
                    summary.count += 1;
                    summary.size += candidate.size;
                }
                None => summaries.push(ReasonSummary {
                    reason: candidate.reason,
                    count: 1,
                    size: candidate.size,
                }),
            }
        }
        summaries.sort_by_key(|s| s.reason);
        summaries
    }

    fn build_recommendations(&self) -> Vec<String> {
        let mut recs = Vec::new();

        if self.candidates.is_empty() {
            recs.push("Nothing to clean".to_string());
            return recs;
        }

        if self.total_size > LARGE_PLAN_BYTES {
            recs.push(format!(
                "This cleanup frees {}, a large amount of space",
                format_size(self.total_size)
            ));
        }

        if !self.safe_to_delete {
            recs.push("Some files are not safe to delete by default; back them up first".to_string());
        }

        if self.candidates.len() > BATCH_THRESHOLD {
            recs.push(format!(
                "{} files selected; consider cleaning in batches",
                self.candidates.len()
            ));
        }

        recs
    }
}

pub struct CleanupPlanner {
    policy: SafetyPolicy,
}

impl CleanupPlanner {
    pub fn new() -> Self {
        Self {
            policy: SafetyPolicy::new(),
        }
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// The reason `entry` would be cleaned under `options`, ignoring recency.
    pub fn select_reason(&self, entry: &FileEntry, options: &PlanOptions) -> Option<CleanupReason> {
        match entry.category {
            FileCategory::Temp => Some(CleanupReason::Temp),
            FileCategory::Backup => Some(CleanupReason::History),
            FileCategory::Log if !options.keep_logs => Some(CleanupReason::Log),
            FileCategory::Cache if !options.keep_cache => Some(CleanupReason::Cache),
            FileCategory::Index if !options.keep_index => Some(CleanupReason::Index),
            FileCategory::Database if entry.is_transcript() && !options.keep_chats => {
                Some(CleanupReason::Chat)
            }
            _ => None,
        }
    }

    /// Select cleanup candidates from a classified walk and, optionally, from
    /// scanned conversations. A path reached both ways is listed once.
    pub fn plan(
        &self,
        entries: &[FileEntry],
        conversations: &[CleanableConversation],
        options: &PlanOptions,
        now: DateTime<Utc>,
    ) -> CleanupPlan {
        let cutoff = options.recency_cutoff(now);
        let is_recent = |modified: DateTime<Utc>| cutoff.is_some_and(|c| modified > c);

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut plan = CleanupPlan {
            safe_to_delete: true,
            ..CleanupPlan::default()
        };

        for entry in entries {
            if is_recent(entry.modified) {
                continue;
            }
            if let Some(reason) = self.select_reason(entry, options) {
                self.push(&mut plan, &mut seen, entry.clone(), reason, now);
            }
        }

        if !options.keep_chats {
            for conv in conversations {
                if is_recent(conv.modified) {
                    continue;
                }
                self.push(&mut plan, &mut seen, conversation_entry(conv), CleanupReason::Chat, now);
            }
        }

        plan.recommendations = plan.build_recommendations();
        tracing::debug!(
            candidates = plan.candidates.len(),
            total_size = plan.total_size,
            safe = plan.safe_to_delete,
            "cleanup plan built"
        );
        plan
    }

    fn push(
        &self,
        plan: &mut CleanupPlan,
        seen: &mut HashSet<PathBuf>,
        entry: FileEntry,
        reason: CleanupReason,
        now: DateTime<Utc>,
    ) {
        if !seen.insert(entry.path.clone()) {
            return;
        }

        let safety = self.policy.check(&entry, now);
        if safety != SafetyLevel::Safe {
            plan.safe_to_delete = false;
            plan.warnings.push(format!(
                "{} ({}) is {}",
                entry.path.display(),
                entry.category,
                match safety {
                    SafetyLevel::Protected => "protected",
                    _ => "not safe to delete by default",
                }
            ));
        }

        plan.total_size += entry.size;
        plan.candidates.push(CleanupCandidate {
            size: entry.size,
            entry,
            reason,
            safety,
        });
    }
}

impl Default for CleanupPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Transcripts found by the conversation scanner are database entries named
/// relative to their workspace directory.
fn conversation_entry(conv: &CleanableConversation) -> FileEntry {
    let name = conv
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let relative = match conv.path.parent().and_then(|p| p.file_name()) {
        Some(workspace) => Path::new(workspace).join(&name),
        None => PathBuf::from(&name),
    };

    FileEntry {
        path: conv.path.clone(),
        relative,
        name,
        size: conv.size,
        modified: conv.modified,
        category: FileCategory::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::CleanReason;
    use crate::classifier::PathClassifier;

    fn entry(relative: &str, size: u64, age_days: i64, now: DateTime<Utc>) -> FileEntry {
        let root = Path::new("/kiro");
        PathClassifier::new().entry(root, root.join(relative), size, now - Duration::days(age_days))
    }

    fn conversation(path: &str, size: u64, age_days: i64, now: DateTime<Utc>) -> CleanableConversation {
        CleanableConversation {
            path: PathBuf::from(path),
            size,
            modified: now - Duration::days(age_days),
            reason: CleanReason::Old,
        }
    }

    #[test]
    fn test_default_plan() {
        let now = Utc::now();
        let entries = vec![
            entry("app.log", 100, 9, now),
            entry("data.tmp", 50, 0, now),
            entry("config.json", 16, 0, now),
            entry("cache/x", 200, 0, now),
        ];

        let plan = CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now);
        let names: Vec<_> = plan.candidates.iter().map(|c| c.entry.name.as_str()).collect();
        assert_eq!(names, vec!["app.log", "data.tmp", "x"]);
        assert_eq!(plan.total_size, 350);
        assert!(plan.safe_to_delete);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_keep_flags() {
        let now = Utc::now();
        let entries = vec![
            entry("app.log", 1, 30, now),
            entry("Cache/blob", 1, 30, now),
            entry("index/chunks.json", 1, 30, now),
            entry("ws/a.chat", 1, 60, now),
            entry("x.tmp", 1, 30, now),
            entry("History/abc/1.ts", 1, 60, now),
        ];
        let options = PlanOptions {
            keep_logs: true,
            keep_cache: true,
            keep_chats: true,
            keep_index: true,
            keep_recent_days: 0,
        };

        let plan = CleanupPlanner::new().plan(&entries, &[], &options, now);
        let reasons: Vec<_> = plan.candidates.iter().map(|c| c.reason).collect();
        assert_eq!(reasons, vec![CleanupReason::Temp, CleanupReason::History]);
    }

    #[test]
    fn test_recency_cutoff_skips_recent_files() {
        let now = Utc::now();
        let entries = vec![entry("old.tmp", 10, 10, now), entry("new.tmp", 10, 1, now)];
        let options = PlanOptions {
            keep_recent_days: 3,
            ..PlanOptions::default()
        };

        let plan = CleanupPlanner::new().plan(&entries, &[], &options, now);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.candidates[0].entry.name, "old.tmp");
    }

    #[test]
    fn test_recency_cutoff_skips_recent_conversations() {
        let now = Utc::now();
        let convs = vec![
            conversation("/agent/ws/old.chat", 10, 40, now),
            conversation("/agent/ws/new.chat", 10, 1, now),
        ];
        let options = PlanOptions {
            keep_recent_days: 7,
            ..PlanOptions::default()
        };

        let plan = CleanupPlanner::new().plan(&[], &convs, &options, now);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.candidates[0].entry.name, "old.chat");
        assert_eq!(plan.candidates[0].reason, CleanupReason::Chat);
    }

    #[test]
    fn test_non_transcript_database_is_never_selected() {
        let now = Utc::now();
        let entries = vec![
            entry("User/globalStorage/state.vscdb", 10, 400, now),
            entry("store.sqlite", 10, 400, now),
        ];
        let plan = CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now);
        assert!(plan.is_empty());
        assert_eq!(plan.recommendations, vec!["Nothing to clean".to_string()]);
    }

    #[test]
    fn test_unsafe_candidates_flag_the_plan() {
        let now = Utc::now();
        let entries = vec![entry("app.log", 10, 1, now), entry("index/vec.lance", 10, 90, now)];

        let plan = CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now);
        assert_eq!(plan.len(), 2);
        assert!(!plan.safe_to_delete);
        assert_eq!(plan.warnings.len(), 2);
        assert_eq!(plan.candidates[0].safety, SafetyLevel::Caution);
        assert_eq!(plan.candidates[1].safety, SafetyLevel::Protected);
        assert!(plan.recommendations.iter().any(|r| r.contains("back them up")));
    }

    #[test]
    fn test_conversations_are_added_once() {
        let now = Utc::now();
        let entries = vec![entry("ws/a.chat", 40, 45, now)];
        let convs = vec![
            conversation("/kiro/ws/a.chat", 40, 45, now),
            conversation("/kiro/ws/b.chat", 60, 45, now),
        ];

        let plan = CleanupPlanner::new().plan(&entries, &convs, &PlanOptions::default(), now);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.total_size, 100);
        assert!(plan.candidates.iter().all(|c| c.reason == CleanupReason::Chat));
        assert!(plan.safe_to_delete);
    }

    #[test]
    fn test_keep_chats_skips_conversations() {
        let now = Utc::now();
        let convs = vec![conversation("/kiro/ws/b.chat", 60, 45, now)];
        let options = PlanOptions {
            keep_chats: true,
            ..PlanOptions::default()
        };
        let plan = CleanupPlanner::new().plan(&[], &convs, &options, now);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_by_reason_uses_display_order() {
        let now = Utc::now();
        let entries = vec![
            entry("a.tmp", 5, 0, now),
            entry("b.tmp", 5, 0, now),
            entry("app.log", 7, 9, now),
            entry("Cache/c", 3, 0, now),
        ];
        let plan = CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now);

        let summary = plan.by_reason();
        let order: Vec<_> = summary.iter().map(|s| s.reason).collect();
        assert_eq!(
            order,
            vec![CleanupReason::Log, CleanupReason::Cache, CleanupReason::Temp]
        );
        assert_eq!(summary[2].count, 2);
        assert_eq!(summary[2].size, 10);
    }

    #[test]
    fn test_batch_recommendation() {
        let now = Utc::now();
        let entries: Vec<_> = (0..101).map(|i| entry(&format!("{i}.tmp"), 1, 0, now)).collect();
        let plan = CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now);
        assert!(plan.recommendations.iter().any(|r| r.contains("batches")));
    }
}
