use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

pub trait DirectoryWalker {
    /// Every entry under `root`, including `root` itself.
    fn walk(&self, root: &Path) -> Box<dyn Iterator<Item = Result<WalkEntry>> + '_>;
}

/// An excluded path is either a plain prefix or a glob pattern.
#[derive(Debug, Clone)]
enum Exclusion {
    Prefix(PathBuf),
    Glob(Pattern),
}

impl Exclusion {
    fn parse(raw: &str) -> Option<Self> {
        if raw.contains(['*', '?', '[']) {
            match Pattern::new(raw) {
                Ok(pattern) => Some(Exclusion::Glob(pattern)),
                Err(e) => {
                    tracing::warn!(pattern = raw, error = %e, "ignoring invalid exclusion pattern");
                    None
                }
            }
        } else {
            Some(Exclusion::Prefix(PathBuf::from(raw)))
        }
    }

    fn matches(&self, path: &Path) -> bool {
        match self {
            Exclusion::Prefix(prefix) => path.starts_with(prefix),
            Exclusion::Glob(pattern) => pattern.matches_path(path),
        }
    }
}

/// Walks the real filesystem in file-name order without following symlinks.
#[derive(Debug, Clone, Default)]
pub struct FsWalker {
    exclusions: Vec<Exclusion>,
}

impl FsWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded(excluded: &[String]) -> Self {
        Self {
            exclusions: excluded.iter().filter_map(|raw| Exclusion::parse(raw)).collect(),
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclusions.iter().any(|ex| ex.matches(path))
    }
}

impl DirectoryWalker for FsWalker {
    fn walk(&self, root: &Path) -> Box<dyn Iterator<Item = Result<WalkEntry>> + '_> {
        let fallback = root.to_path_buf();

        let iter = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry.path()))
            .map(move |res| {
                let entry = res.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| fallback.clone());
                    Error::unreadable(path, e.into())
                })?;

                let path = entry.path().to_path_buf();
                let metadata = entry
                    .metadata()
                    .map_err(|e| Error::unreadable(&path, e.into()))?;
                let modified = metadata
                    .modified()
                    .map_err(|e| Error::unreadable(&path, e))?;

                Ok(WalkEntry {
                    is_dir: metadata.is_dir(),
                    size: if metadata.is_file() { metadata.len() } else { 0 },
                    modified: modified.into(),
                    path,
                })
            });

        Box::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn files(walker: &FsWalker, root: &Path) -> Vec<PathBuf> {
        walker
            .walk(root)
            .filter_map(|e| e.ok())
            .filter(|e| !e.is_dir)
            .map(|e| e.path.strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn test_walk_is_sorted_and_sized() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("b/z.txt"), "zz").unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::write(tmp.path().join("c.txt"), "ccc").unwrap();

        let walker = FsWalker::new();
        assert_eq!(
            files(&walker, tmp.path()),
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b/z.txt"),
                PathBuf::from("c.txt")
            ]
        );

        let total: u64 = walker
            .walk(tmp.path())
            .filter_map(|e| e.ok())
            .map(|e| e.size)
            .sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_root_is_yielded_as_directory() {
        let tmp = TempDir::new().unwrap();
        let first = FsWalker::new().walk(tmp.path()).next().unwrap().unwrap();
        assert!(first.is_dir);
        assert_eq!(first.size, 0);
    }

    #[test]
    fn test_prefix_exclusion_prunes_subtree() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("skip/deep")).unwrap();
        fs::write(tmp.path().join("skip/deep/x.log"), "x").unwrap();
        fs::write(tmp.path().join("keep.log"), "x").unwrap();

        let excluded = vec![tmp.path().join("skip").to_string_lossy().to_string()];
        let walker = FsWalker::with_excluded(&excluded);
        assert_eq!(files(&walker, tmp.path()), vec![PathBuf::from("keep.log")]);
    }

    #[test]
    fn test_glob_exclusion() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.log"), "x").unwrap();
        fs::write(tmp.path().join("b.tmp"), "x").unwrap();

        let excluded = vec![format!("{}/*.log", tmp.path().display())];
        let walker = FsWalker::with_excluded(&excluded);
        assert_eq!(files(&walker, tmp.path()), vec![PathBuf::from("b.tmp")]);
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let walker = FsWalker::with_excluded(&["[unclosed".to_string()]);
        assert!(!walker.is_excluded(Path::new("/anything")));
    }

    #[test]
    fn test_missing_root_yields_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone");
        let results: Vec<_> = FsWalker::new().walk(&missing).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::UnreadablePath { .. })));
    }
}
