use crate::config::Config;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub path: PathBuf,
    pub size: Option<u64>,
}

impl HistoryEntry {
    pub fn new(action: impl Into<String>, path: PathBuf) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            path,
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// `<rfc3339> <ACTION> <path>[ size=<bytes>]`; the size goes last so
    /// paths containing spaces survive a round trip.
    pub fn to_log_line(&self) -> String {
        let size_str = self
            .size
            .map(|s| format!(" size={}", s))
            .unwrap_or_default();
        format!(
            "{} {} {}{}\n",
            self.timestamp.to_rfc3339(),
            self.action,
            self.path.display(),
            size_str
        )
    }

    pub fn parse_line(line: &str) -> Option<HistoryEntry> {
        let mut parts = line.splitn(3, ' ');
        let timestamp = DateTime::parse_from_rfc3339(parts.next()?)
            .ok()?
            .with_timezone(&Utc);
        let action = parts.next()?.to_string();
        let rest = parts.next()?;

        let (path, size) = match rest.rsplit_once(" size=") {
            Some((path, size)) => match size.parse::<u64>() {
                Ok(size) => (path, Some(size)),
                Err(_) => (rest, None),
            },
            None => (rest, None),
        };

        Some(HistoryEntry {
            timestamp,
            action,
            path: PathBuf::from(path),
            size,
        })
    }
}

/// Append-only log of deletions performed by `clean`.
pub struct HistoryLogger {
    log_path: PathBuf,
}

impl HistoryLogger {
    pub fn new() -> Self {
        Self::with_path(Config::data_dir().join("history.log"))
    }

    pub fn with_path(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    pub fn log(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        write!(file, "{}", entry.to_log_line())?;
        Ok(())
    }

    pub fn log_delete(&self, path: &Path, size: Option<u64>) -> Result<()> {
        let mut entry = HistoryEntry::new("DELETE", path.to_path_buf());
        if let Some(s) = size {
            entry = entry.with_size(s);
        }
        self.log(&entry)
    }

    /// Entries oldest first, or the newest `limit` entries newest first.
    pub fn read_history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)?;
        let entries: Vec<HistoryEntry> = content.lines().filter_map(HistoryEntry::parse_line).collect();

        let result = match limit {
            Some(n) => entries.into_iter().rev().take(n).collect(),
            None => entries,
        };

        Ok(result)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl Default for HistoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_line_round_trip_with_spaces() {
        let entry = HistoryEntry::new("DELETE", PathBuf::from("/a/Local Storage/x.log")).with_size(42);
        let parsed = HistoryEntry::parse_line(entry.to_log_line().trim_end()).unwrap();
        assert_eq!(parsed.path, PathBuf::from("/a/Local Storage/x.log"));
        assert_eq!(parsed.size, Some(42));
        assert_eq!(parsed.action, "DELETE");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(HistoryEntry::parse_line("").is_none());
        assert!(HistoryEntry::parse_line("not-a-date DELETE /x").is_none());
        let no_size = HistoryEntry::parse_line("2024-01-01T00:00:00+00:00 DELETE /x").unwrap();
        assert_eq!(no_size.size, None);
    }

    #[test]
    fn test_read_history_limit_is_newest_first() {
        let tmp = TempDir::new().unwrap();
        let logger = HistoryLogger::with_path(tmp.path().join("nested/history.log"));
        assert!(logger.read_history(None).unwrap().is_empty());

        for i in 0..5 {
            logger
                .log_delete(Path::new(&format!("/f{i}")), Some(i))
                .unwrap();
        }

        let all = logger.read_history(None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].path, PathBuf::from("/f0"));

        let latest = logger.read_history(Some(2)).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].path, PathBuf::from("/f4"));
        assert_eq!(latest[1].path, PathBuf::from("/f3"));
    }
}
