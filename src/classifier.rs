//! Ordered path heuristics that assign every storage file exactly one category.
//!
//! The rule table is evaluated top to bottom and the first match wins, so the
//! order encodes precedence between overlapping signals: a `.db` file inside an
//! index directory is index data, a `.log` file inside `Local Storage` is a log.

use crate::chat::is_transcript_file;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Database,
    Config,
    Cache,
    Log,
    Temp,
    Image,
    Backup,
    Index,
    Unknown,
}

impl FileCategory {
    pub const ALL: [FileCategory; 9] = [
        FileCategory::Database,
        FileCategory::Config,
        FileCategory::Cache,
        FileCategory::Log,
        FileCategory::Temp,
        FileCategory::Image,
        FileCategory::Backup,
        FileCategory::Index,
        FileCategory::Unknown,
    ];

    /// Short label used for progress counters and plan grouping.
    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Database => "database",
            FileCategory::Config => "config",
            FileCategory::Cache => "cache",
            FileCategory::Log => "log",
            FileCategory::Temp => "temp",
            FileCategory::Image => "image",
            FileCategory::Backup => "history",
            FileCategory::Index => "index",
            FileCategory::Unknown => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileCategory::Database => write!(f, "Database"),
            FileCategory::Config => write!(f, "Config"),
            FileCategory::Cache => write!(f, "Cache"),
            FileCategory::Log => write!(f, "Log"),
            FileCategory::Temp => write!(f, "Temp"),
            FileCategory::Image => write!(f, "Image"),
            FileCategory::Backup => write!(f, "History"),
            FileCategory::Index => write!(f, "Index"),
            FileCategory::Unknown => write!(f, "Other"),
        }
    }
}

/// One classified file from a storage walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Path relative to the storage root it was found under.
    pub relative: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub category: FileCategory,
}

impl FileEntry {
    pub fn is_transcript(&self) -> bool {
        is_transcript_file(&self.name)
    }

    /// Lower-cased names of the directories between the storage root and the file.
    pub fn ancestor_dirs(&self) -> Vec<String> {
        ancestor_dirs(&self.relative)
    }
}

const DATABASE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3", "vscdb"];
const INDEX_DIRS: &[&str] = &["index", "lancedb"];
const INDEX_EXTENSIONS: &[&str] = &["lance", "idx"];
const CONFIG_NAMES: &[&str] = &[
    "config.json",
    "settings.json",
    "mcp.json",
    "machineid",
    "languagepacks.json",
    "argv.json",
    "code.lock",
];
const TEMP_EXTENSIONS: &[&str] = &["tmp", "temp"];
const CRASH_DIRS: &[&str] = &["crashpad", "crashes", "crash reports"];
const LOCK_ARTIFACTS: &[&str] = &["singletonlock", "singletonsocket", "singletoncookie"];
const SESSION_STATE_FILES: &[&str] = &[
    "cookies",
    "cookies-journal",
    "trust tokens",
    "trust tokens-journal",
    "transportsecurity",
    "network persistent state",
];
const CACHE_DIRS: &[&str] = &["local storage", "session storage", "webstorage"];
const KV_SEGMENT_EXTENSIONS: &[&str] = &["ldb"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "7z"];
const STRUCTURED_EXTENSIONS: &[&str] = &["json", "xml", "yaml", "yml"];

/// The normalised view of a path that every rule predicate reads.
#[derive(Debug, Clone)]
pub struct EntryFacts {
    pub name: String,
    pub extension: String,
    pub ancestors: Vec<String>,
    transcript: bool,
}

impl EntryFacts {
    pub fn from_relative(relative: &Path) -> Self {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = relative
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            transcript: is_transcript_file(&name),
            name: name.to_lowercase(),
            extension,
            ancestors: ancestor_dirs(relative),
        }
    }

    fn has_extension(&self, set: &[&str]) -> bool {
        set.contains(&self.extension.as_str())
    }

    fn has_ancestor(&self, set: &[&str]) -> bool {
        self.ancestors.iter().any(|a| set.contains(&a.as_str()))
    }

    fn under_index(&self) -> bool {
        self.has_ancestor(INDEX_DIRS)
    }

    fn is_database_like(&self) -> bool {
        self.has_extension(DATABASE_EXTENSIONS) || self.transcript
    }
}

pub struct Rule {
    pub name: &'static str,
    pub category: FileCategory,
    matches: fn(&EntryFacts) -> bool,
}

impl Rule {
    pub fn matches(&self, facts: &EntryFacts) -> bool {
        (self.matches)(facts)
    }
}

fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "database_under_index",
            category: FileCategory::Index,
            matches: |f| f.is_database_like() && f.under_index(),
        },
        Rule {
            name: "database",
            category: FileCategory::Database,
            matches: |f| f.is_database_like(),
        },
        Rule {
            name: "index",
            category: FileCategory::Index,
            matches: |f| f.under_index() || f.has_extension(INDEX_EXTENSIONS),
        },
        Rule {
            name: "protected_config",
            category: FileCategory::Config,
            matches: |f| CONFIG_NAMES.contains(&f.name.as_str()),
        },
        Rule {
            name: "log",
            category: FileCategory::Log,
            matches: |f| {
                f.extension == "log" || f.has_ancestor(&["logs"]) || f.name.contains(".log")
            },
        },
        Rule {
            name: "temp",
            category: FileCategory::Temp,
            matches: |f| {
                f.has_extension(TEMP_EXTENSIONS)
                    || f.has_ancestor(CRASH_DIRS)
                    || LOCK_ARTIFACTS.contains(&f.name.as_str())
            },
        },
        Rule {
            name: "session_state",
            category: FileCategory::Cache,
            matches: |f| SESSION_STATE_FILES.contains(&f.name.as_str()),
        },
        Rule {
            name: "cache",
            category: FileCategory::Cache,
            matches: |f| {
                f.ancestors.iter().any(|a| a.contains("cache"))
                    || f.has_ancestor(CACHE_DIRS)
                    || f.name.contains("cache")
                    || f.has_extension(KV_SEGMENT_EXTENSIONS)
            },
        },
        Rule {
            name: "history",
            category: FileCategory::Backup,
            matches: |f| f.has_ancestor(&["history"]),
        },
        Rule {
            name: "image",
            category: FileCategory::Image,
            matches: |f| f.has_extension(IMAGE_EXTENSIONS),
        },
        Rule {
            name: "archive",
            category: FileCategory::Backup,
            matches: |f| f.has_extension(ARCHIVE_EXTENSIONS) || f.name.contains("backup"),
        },
        Rule {
            name: "session_data",
            category: FileCategory::Database,
            matches: |f| f.has_extension(STRUCTURED_EXTENSIONS) && f.name.contains("session"),
        },
        Rule {
            name: "structured_config",
            category: FileCategory::Config,
            matches: |f| f.has_extension(STRUCTURED_EXTENSIONS),
        },
    ]
}

pub struct PathClassifier {
    rules: Vec<Rule>,
}

impl PathClassifier {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify a file by its path relative to the storage root.
    pub fn classify(&self, relative: &Path) -> FileCategory {
        self.matching_rule(relative)
            .map(|rule| rule.category)
            .unwrap_or(FileCategory::Unknown)
    }

    pub fn matching_rule(&self, relative: &Path) -> Option<&Rule> {
        let facts = EntryFacts::from_relative(relative);
        self.rules.iter().find(|rule| rule.matches(&facts))
    }

    /// Build a classified entry for `path`, found while walking `root`.
    pub fn entry(
        &self,
        root: &Path,
        path: PathBuf,
        size: u64,
        modified: DateTime<Utc>,
    ) -> FileEntry {
        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let category = self.classify(&relative);

        FileEntry {
            path,
            relative,
            name,
            size,
            modified,
            category,
        }
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn ancestor_dirs(relative: &Path) -> Vec<String> {
    let mut dirs: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect();
    dirs.pop();
    dirs
}
