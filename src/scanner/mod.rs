pub mod progress;
pub mod walk;

pub use progress::{ProgressCallback, ProgressTracker, ScanPhase, ScanProgress};
pub use walk::{DirectoryWalker, FsWalker, WalkEntry};

use crate::classifier::{FileCategory, FileEntry, PathClassifier};
use crate::error::Error;
use crate::utils::format_size;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MIB: u64 = 1024 * 1024;

/// Well-known storage subdirectories reported by `subdirectory_sizes`.
pub const KNOWN_SUBDIRS: &[&str] = &[
    "User/History",
    "User/globalStorage",
    "User/workspaceStorage",
    "logs",
    "Cache",
    "CachedData",
    "Crashpad",
    "WebStorage",
    "Local Storage",
    "GPUCache",
];

#[derive(Debug)]
pub struct FileScan {
    pub entries: Vec<FileEntry>,
    pub skipped: Vec<Error>,
    pub progress: ScanProgress,
}

pub struct FileScanner<W = FsWalker> {
    classifier: PathClassifier,
    walker: W,
}

impl FileScanner<FsWalker> {
    pub fn new() -> Self {
        Self::with_walker(FsWalker::new())
    }
}

impl Default for FileScanner<FsWalker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: DirectoryWalker> FileScanner<W> {
    pub fn with_walker(walker: W) -> Self {
        Self {
            classifier: PathClassifier::new(),
            walker,
        }
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    /// Walk every root in order and classify each file found.
    pub fn scan(&self, roots: &[PathBuf], callback: Option<ProgressCallback<'_>>) -> FileScan {
        let mut tracker = ProgressTracker::new(ScanPhase::Files, callback);
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for root in roots {
            if !root.is_dir() {
                tracing::debug!(root = %root.display(), "storage root missing");
                skipped.push(Error::MissingStorageRoot(root.clone()));
                continue;
            }

            for item in self.walker.walk(root) {
                let item = match item {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::debug!(path = %e.path().display(), error = %e, "skipping entry");
                        skipped.push(e);
                        continue;
                    }
                };

                if item.is_dir {
                    tracker.visit_dir(&item.path);
                    continue;
                }

                let entry = self
                    .classifier
                    .entry(root, item.path, item.size, item.modified);
                tracker.visit_file(&entry.path, entry.size, entry.category.label());
                entries.push(entry);
            }
        }

        let progress = tracker.finish();
        tracing::info!(
            files = entries.len(),
            dirs = progress.scanned_dirs,
            skipped = skipped.len(),
            "storage scan complete"
        );

        FileScan {
            entries,
            skipped,
            progress,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub count: usize,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageStats {
    pub total_files: usize,
    pub total_size: u64,
    pub by_category: BTreeMap<FileCategory, CategorySummary>,
}

impl StorageStats {
    pub fn from_entries(entries: &[FileEntry]) -> Self {
        let mut stats = StorageStats::default();
        for entry in entries {
            stats.total_files += 1;
            stats.total_size += entry.size;
            let summary = stats.by_category.entry(entry.category).or_default();
            summary.count += 1;
            summary.size += entry.size;
        }
        stats
    }

    pub fn size_of(&self, category: FileCategory) -> u64 {
        self.by_category.get(&category).map(|s| s.size).unwrap_or(0)
    }

    pub fn count_of(&self, category: FileCategory) -> usize {
        self.by_category.get(&category).map(|s| s.count).unwrap_or(0)
    }

    pub fn recommendations(&self) -> Vec<String> {
        let mut recs = Vec::new();

        let temp = self.size_of(FileCategory::Temp);
        if temp > 10 * MIB {
            recs.push(format!(
                "Temporary files use {}; they can be removed safely",
                format_size(temp)
            ));
        }

        let logs = self.size_of(FileCategory::Log);
        if logs > 50 * MIB {
            recs.push(format!(
                "Logs use {}; consider removing logs older than a week",
                format_size(logs)
            ));
        }

        let cache = self.size_of(FileCategory::Cache);
        if cache > 100 * MIB {
            recs.push(format!(
                "Caches use {}; clearing them frees space but may slow the next start",
                format_size(cache)
            ));
        }

        if self.total_size > 500 * MIB {
            recs.push(format!(
                "Total storage is {}; run a full cleanup",
                format_size(self.total_size)
            ));
        }

        recs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubdirectorySize {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Sizes of the well-known subdirectories present under `root`.
pub fn subdirectory_sizes(root: &Path) -> Vec<SubdirectorySize> {
    KNOWN_SUBDIRS
        .iter()
        .map(|name| (name, root.join(name)))
        .filter(|(_, path)| path.is_dir())
        .map(|(name, path)| SubdirectorySize {
            name: name.to_string(),
            size: calculate_dir_size(&path),
            path,
        })
        .collect()
}

fn calculate_dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}
