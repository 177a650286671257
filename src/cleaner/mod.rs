pub mod plan;

pub use plan::{CleanupCandidate, CleanupPlan, CleanupPlanner, CleanupReason, PlanOptions, ReasonSummary};

use crate::error::Error;
use crate::history::HistoryLogger;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    pub log_history: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            log_history: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum ItemOutcome {
    Deleted,
    AlreadyDeleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub path: PathBuf,
    pub size: u64,
    pub reason: CleanupReason,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    pub deleted_count: usize,
    /// Candidates that were already gone when deletion was attempted.
    pub skipped_count: usize,
    pub failed_items: Vec<FailedItem>,
    pub bytes_freed: u64,
    pub duration: Duration,
    pub dry_run: bool,
    pub items: Vec<ItemResult>,
}

impl CleanupResult {
    pub fn failed_count(&self) -> usize {
        self.failed_items.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed_items.is_empty()
    }
}

pub trait Cleaner {
    /// Delete every candidate in `plan`. Per-item failures never abort the run.
    fn execute(&self, plan: &CleanupPlan, options: &ExecuteOptions) -> CleanupResult;
}

pub struct DefaultCleaner {
    history_logger: HistoryLogger,
}

impl DefaultCleaner {
    pub fn new() -> Self {
        Self::with_history(HistoryLogger::new())
    }

    pub fn with_history(history_logger: HistoryLogger) -> Self {
        Self { history_logger }
    }

    fn delete_file(&self, path: &Path) -> ItemOutcome {
        match fs::remove_file(path) {
            Ok(()) => ItemOutcome::Deleted,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{}", Error::AlreadyDeleted(path.to_path_buf()));
                ItemOutcome::AlreadyDeleted
            }
            Err(source) => {
                let err = Error::DeletionFailure {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::warn!(error = %err, "deletion failed");
                ItemOutcome::Failed(err.to_string())
            }
        }
    }
}

impl Cleaner for DefaultCleaner {
    fn execute(&self, plan: &CleanupPlan, options: &ExecuteOptions) -> CleanupResult {
        let start = Instant::now();
        let mut result = CleanupResult {
            dry_run: options.dry_run,
            ..CleanupResult::default()
        };

        if options.dry_run {
            tracing::info!(candidates = plan.len(), "dry run, nothing deleted");
            result.duration = start.elapsed();
            return result;
        }

        for candidate in &plan.candidates {
            let path = candidate.path();
            let outcome = self.delete_file(path);

            match &outcome {
                ItemOutcome::Deleted => {
                    result.deleted_count += 1;
                    result.bytes_freed += candidate.size;

                    if options.log_history {
                        if let Err(e) = self.history_logger.log_delete(path, Some(candidate.size)) {
                            tracing::warn!(error = %e, "could not write deletion history");
                        }
                    }
                }
                ItemOutcome::AlreadyDeleted => result.skipped_count += 1,
                ItemOutcome::Failed(error) => result.failed_items.push(FailedItem {
                    path: path.to_path_buf(),
                    error: error.clone(),
                }),
            }

            result.items.push(ItemResult {
                path: path.to_path_buf(),
                size: candidate.size,
                reason: candidate.reason,
                outcome,
            });
        }

        result.duration = start.elapsed();
        tracing::info!(
            deleted = result.deleted_count,
            skipped = result.skipped_count,
            failed = result.failed_count(),
            bytes_freed = result.bytes_freed,
            "cleanup finished"
        );
        result
    }
}

impl Default for DefaultCleaner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PathClassifier;
    use crate::history::HistoryLogger;
    use chrono::Utc;
    use tempfile::TempDir;

    fn plan_for(root: &Path, names: &[&str]) -> CleanupPlan {
        let now = Utc::now();
        let classifier = PathClassifier::new();
        let entries: Vec<_> = names
            .iter()
            .map(|name| {
                let path = root.join(name);
                let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                classifier.entry(root, path, size, now)
            })
            .collect();
        CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now)
    }

    fn cleaner(tmp: &TempDir) -> DefaultCleaner {
        DefaultCleaner::with_history(HistoryLogger::with_path(tmp.path().join("history.log")))
    }

    #[test]
    fn test_dry_run_does_not_delete() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.tmp"), "aaaa").unwrap();

        let plan = plan_for(&root, &["a.tmp"]);
        let result = cleaner(&tmp).execute(&plan, &ExecuteOptions::default());

        assert!(result.dry_run);
        assert_eq!(result.deleted_count, 0);
        assert_eq!(result.bytes_freed, 0);
        assert!(root.join("a.tmp").exists());
        assert!(!tmp.path().join("history.log").exists());
    }

    #[test]
    fn test_execute_deletes_and_logs_history() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.tmp"), "aaaa").unwrap();
        fs::write(root.join("b.tmp"), "bb").unwrap();

        let plan = plan_for(&root, &["a.tmp", "b.tmp"]);
        let options = ExecuteOptions {
            dry_run: false,
            log_history: true,
        };
        let result = cleaner(&tmp).execute(&plan, &options);

        assert_eq!(result.deleted_count, 2);
        assert_eq!(result.bytes_freed, 6);
        assert!(result.is_success());
        assert!(!root.join("a.tmp").exists());

        let history = HistoryLogger::with_path(tmp.path().join("history.log"))
            .read_history(None)
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, "DELETE");
        assert_eq!(history[0].size, Some(4));
    }

    #[test]
    fn test_vanished_file_is_a_skip() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.tmp"), "aaaa").unwrap();
        fs::write(root.join("gone.tmp"), "gg").unwrap();

        let plan = plan_for(&root, &["a.tmp", "gone.tmp"]);
        fs::remove_file(root.join("gone.tmp")).unwrap();

        let options = ExecuteOptions {
            dry_run: false,
            log_history: false,
        };
        let result = cleaner(&tmp).execute(&plan, &options);

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.bytes_freed, 4);
        assert!(result.failed_items.is_empty());
        assert_eq!(result.items[1].outcome, ItemOutcome::AlreadyDeleted);
    }

    #[test]
    fn test_failure_does_not_abort_remaining() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        // a directory where a file is expected cannot be removed with remove_file
        fs::create_dir_all(root.join("stuck.tmp")).unwrap();
        fs::write(root.join("z.tmp"), "zzz").unwrap();

        let plan = plan_for(&root, &["stuck.tmp", "z.tmp"]);
        let options = ExecuteOptions {
            dry_run: false,
            log_history: false,
        };
        let result = cleaner(&tmp).execute(&plan, &options);

        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.failed_items[0].path, root.join("stuck.tmp"));
        assert_eq!(result.deleted_count, 1);
        assert!(!root.join("z.tmp").exists());
        assert!(root.join("stuck.tmp").exists());
    }
}
