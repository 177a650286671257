use super::{
    is_transcript_file, CleanReason, CleanableConversation, ConversationParser, ConversationStats,
    RoleCounts, WorkspaceAggregate,
};
use crate::error::{Error, Result};
use crate::scanner::progress::{ProgressCallback, ProgressTracker, ScanPhase, ScanProgress};
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Directories under the agent root that never hold workspace transcripts.
pub const SPECIAL_DIRS: &[&str] = &[
    "index",
    "dev_data",
    "workspace-sessions",
    ".migrations",
    ".diffs",
    ".utils",
    "default",
];

pub const CHAT_LABEL: &str = "chat";

/// Result of one pass over the agent root.
#[derive(Debug)]
pub struct WorkspaceScan {
    /// Non-empty workspaces, ordered by id.
    pub workspaces: Vec<WorkspaceAggregate>,
    pub skipped: Vec<Error>,
    pub progress: ScanProgress,
}

impl WorkspaceScan {
    pub fn stats(&self) -> ConversationStats {
        ConversationStats::from_workspaces(self.workspaces.clone())
    }
}

/// Estimated effect of deleting a set of transcripts.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct SpaceSavings {
    pub conversations: usize,
    pub bytes: u64,
    /// Share of all transcript bytes, 0-100.
    pub percent_of_total: f64,
}

pub struct ConversationScanner {
    base_path: PathBuf,
    parser: ConversationParser,
}

impl ConversationScanner {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            parser: ConversationParser::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Parse every transcript under every workspace directory.
    ///
    /// Unreadable or malformed transcripts are recorded in `skipped` and the
    /// scan continues. A missing agent root yields an empty scan.
    pub fn scan_workspaces(&self, callback: Option<ProgressCallback<'_>>) -> WorkspaceScan {
        let mut tracker = ProgressTracker::new(ScanPhase::Chats, callback);
        let mut skipped = Vec::new();
        let mut workspaces = Vec::new();

        for (id, dir) in self.workspace_dirs(&mut skipped) {
            tracker.visit_dir(&dir);
            let mut aggregate = WorkspaceAggregate::new(id, dir.clone());

            for path in transcript_files(&dir, &mut skipped) {
                match self.parser.parse_file(&path) {
                    Ok(record) => {
                        tracker.visit_file(&path, record.size, CHAT_LABEL);
                        aggregate.add(&record);
                    }
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "skipping transcript");
                        skipped.push(e);
                    }
                }
            }

            if aggregate.conversation_count > 0 {
                workspaces.push(aggregate);
            }
        }

        let progress = tracker.finish();
        tracing::info!(
            workspaces = workspaces.len(),
            transcripts = progress.scanned_files,
            skipped = skipped.len(),
            "conversation scan complete"
        );

        WorkspaceScan {
            workspaces,
            skipped,
            progress,
        }
    }

    pub fn conversation_stats(&self) -> ConversationStats {
        self.scan_workspaces(None).stats()
    }

    /// Recount message roles with a separate pass over the transcripts.
    ///
    /// Must agree with the totals folded into `scan_workspaces`.
    pub fn count_message_types(&self) -> RoleCounts {
        let mut skipped = Vec::new();
        let mut counts = RoleCounts::default();

        for (_, dir) in self.workspace_dirs(&mut skipped) {
            for path in transcript_files(&dir, &mut skipped) {
                if let Ok(record) = self.parser.parse_file(&path) {
                    counts.add(record.role_counts());
                }
            }
        }

        counts
    }

    /// Transcripts that are older than `age_days` or larger than `size_bytes`.
    ///
    /// `age_days == 0` selects every transcript. A `size_bytes` of zero turns
    /// off the size test.
    pub fn find_cleanable(
        &self,
        age_days: u32,
        size_bytes: u64,
        now: DateTime<Utc>,
    ) -> Vec<CleanableConversation> {
        let mut skipped = Vec::new();
        let mut cleanable = Vec::new();

        for (_, dir) in self.workspace_dirs(&mut skipped) {
            for path in transcript_files(&dir, &mut skipped) {
                let (size, modified) = match file_facts(&path) {
                    Ok(facts) => facts,
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "skipping transcript");
                        continue;
                    }
                };

                if let Some(reason) = cleanable_reason(size, modified, age_days, size_bytes, now) {
                    cleanable.push(CleanableConversation {
                        path,
                        size,
                        modified,
                        reason,
                    });
                }
            }
        }

        cleanable
    }

    /// Every transcript, regardless of age or size. Used for bulk cleaning.
    pub fn find_all(&self, now: DateTime<Utc>) -> Vec<CleanableConversation> {
        self.find_cleanable(0, 0, now)
    }

    fn workspace_dirs(&self, skipped: &mut Vec<Error>) -> Vec<(String, PathBuf)> {
        if !self.base_path.is_dir() {
            skipped.push(Error::MissingStorageRoot(self.base_path.clone()));
            return Vec::new();
        }

        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) => {
                skipped.push(Error::unreadable(&self.base_path, e));
                return Vec::new();
            }
        };

        let mut dirs: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if is_workspace_dir(&name) {
                    Some((name, entry.path()))
                } else {
                    None
                }
            })
            .collect();

        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        dirs
    }
}

pub fn is_workspace_dir(name: &str) -> bool {
    !name.starts_with('.') && !SPECIAL_DIRS.contains(&name)
}

/// Decide whether one transcript is a cleanup candidate.
///
/// Age is checked before size, and both comparisons are strict.
pub fn cleanable_reason(
    size: u64,
    modified: DateTime<Utc>,
    age_days: u32,
    size_bytes: u64,
    now: DateTime<Utc>,
) -> Option<CleanReason> {
    if age_days == 0 {
        return Some(CleanReason::All);
    }

    let cutoff = now - Duration::days(i64::from(age_days));
    if modified < cutoff {
        return Some(CleanReason::Old);
    }

    if size_bytes > 0 && size > size_bytes {
        return Some(CleanReason::Large);
    }

    None
}

pub fn space_savings(
    selected: &[CleanableConversation],
    stats: &ConversationStats,
) -> SpaceSavings {
    let bytes: u64 = selected.iter().map(|c| c.size).sum();
    let percent_of_total = if stats.total_size > 0 {
        (bytes as f64 / stats.total_size as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    SpaceSavings {
        conversations: selected.len(),
        bytes,
        percent_of_total,
    }
}

fn transcript_files(dir: &Path, skipped: &mut Vec<Error>) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            skipped.push(Error::unreadable(dir, e));
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| is_transcript_file(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();

    files.sort();
    files
}

fn file_facts(path: &Path) -> Result<(u64, DateTime<Utc>)> {
    let metadata = fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
    let modified = metadata
        .modified()
        .map_err(|e| Error::unreadable(path, e))?;
    Ok((metadata.len(), modified.into()))
}
