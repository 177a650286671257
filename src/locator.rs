//! Where the IDE keeps its storage on this machine.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAMES: &[&str] = &["kiro", "Kiro"];
const AGENT_SUBPATH: &str = "User/globalStorage/kiro.kiroagent";

pub fn candidate_roots() -> Vec<PathBuf> {
    match dirs::config_dir() {
        Some(base) => candidate_roots_in(&base),
        None => Vec::new(),
    }
}

pub fn candidate_roots_in(base: &Path) -> Vec<PathBuf> {
    APP_DIR_NAMES.iter().map(|name| base.join(name)).collect()
}

/// Candidates that exist, with duplicates collapsed by canonical path.
pub fn existing_roots() -> Vec<PathBuf> {
    filter_existing(candidate_roots())
}

pub fn filter_existing(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|p| p.is_dir())
        .filter(|p| {
            let key = fs::canonicalize(p).unwrap_or_else(|_| p.clone());
            seen.insert(key)
        })
        .collect()
}

pub fn agent_root(storage_root: &Path) -> PathBuf {
    storage_root.join(AGENT_SUBPATH)
}

pub fn find_agent_root() -> Option<PathBuf> {
    first_agent_root(&existing_roots())
}

pub fn first_agent_root(roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().map(|r| agent_root(r)).find(|p| p.is_dir())
}
