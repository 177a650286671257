use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Files,
    Chats,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPhase::Files => write!(f, "files"),
            ScanPhase::Chats => write!(f, "chats"),
        }
    }
}

/// Snapshot handed to progress observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanProgress {
    pub scanned_files: u64,
    pub scanned_dirs: u64,
    pub total_size: u64,
    pub current_path: String,
    pub category_counts: BTreeMap<String, u64>,
    pub category_sizes: BTreeMap<String, u64>,
    pub phase: ScanPhase,
    pub is_complete: bool,
}

impl ScanProgress {
    pub fn new(phase: ScanPhase) -> Self {
        Self {
            scanned_files: 0,
            scanned_dirs: 0,
            total_size: 0,
            current_path: String::new(),
            category_counts: BTreeMap::new(),
            category_sizes: BTreeMap::new(),
            phase,
            is_complete: false,
        }
    }
}

pub type ProgressCallback<'a> = &'a mut dyn FnMut(&ScanProgress);

/// Owns the progress snapshot of one scan and pushes it to the observer.
///
/// Counters only ever grow, and once `finish` has run the tracker ignores any
/// further updates, so observers see exactly one snapshot with `is_complete`
/// and it is the last one.
pub struct ProgressTracker<'a> {
    progress: ScanProgress,
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(phase: ScanPhase, callback: Option<ProgressCallback<'a>>) -> Self {
        Self {
            progress: ScanProgress::new(phase),
            callback,
        }
    }

    pub fn visit_dir(&mut self, path: &Path) {
        if self.progress.is_complete {
            return;
        }
        self.progress.scanned_dirs += 1;
        self.progress.current_path = path.display().to_string();
        self.emit();
    }

    pub fn visit_file(&mut self, path: &Path, size: u64, label: &str) {
        if self.progress.is_complete {
            return;
        }
        self.progress.scanned_files += 1;
        self.progress.total_size += size;
        self.progress.current_path = path.display().to_string();
        *self
            .progress
            .category_counts
            .entry(label.to_string())
            .or_insert(0) += 1;
        *self
            .progress
            .category_sizes
            .entry(label.to_string())
            .or_insert(0) += size;
        self.emit();
    }

    pub fn finish(&mut self) -> ScanProgress {
        if !self.progress.is_complete {
            self.progress.is_complete = true;
            self.emit();
        }
        self.progress.clone()
    }

    pub fn snapshot(&self) -> &ScanProgress {
        &self.progress
    }

    fn emit(&mut self) {
        if let Some(cb) = self.callback.as_deref_mut() {
            cb(&self.progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_progress_is_empty() {
        let progress = ScanProgress::new(ScanPhase::Files);
        assert_eq!(progress.scanned_files, 0);
        assert_eq!(progress.scanned_dirs, 0);
        assert_eq!(progress.total_size, 0);
        assert!(progress.category_counts.is_empty());
        assert!(!progress.is_complete);
    }

    #[test]
    fn test_tracker_accumulates_per_label() {
        let mut tracker = ProgressTracker::new(ScanPhase::Files, None);
        tracker.visit_file(Path::new("a.log"), 10, "log");
        tracker.visit_file(Path::new("b.log"), 5, "log");
        tracker.visit_file(Path::new("c.tmp"), 1, "temp");

        let snap = tracker.snapshot();
        assert_eq!(snap.scanned_files, 3);
        assert_eq!(snap.total_size, 16);
        assert_eq!(snap.category_counts["log"], 2);
        assert_eq!(snap.category_sizes["log"], 15);
        assert_eq!(snap.category_sizes["temp"], 1);
    }

    #[test]
    fn test_finish_emits_once_and_freezes() {
        let mut seen = Vec::new();
        let mut cb = |p: &ScanProgress| seen.push(p.clone());
        {
            let mut tracker = ProgressTracker::new(ScanPhase::Chats, Some(&mut cb));
            tracker.visit_dir(Path::new("ws"));
            tracker.finish();
            tracker.visit_file(Path::new("ws/late.chat"), 99, "chat");
            tracker.finish();
        }

        assert_eq!(seen.len(), 2);
        assert!(!seen[0].is_complete);
        assert!(seen[1].is_complete);
        assert_eq!(seen[1].scanned_files, 0);
    }
}
