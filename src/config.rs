use crate::cleaner::PlanOptions;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub chats: ChatConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Replaces the located storage roots when non-empty.
    #[serde(default)]
    pub storage_roots: Vec<String>,
    #[serde(default)]
    pub agent_root: Option<String>,
    /// Path prefixes or glob patterns never scanned.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

impl ScanConfig {
    pub fn storage_root_paths(&self) -> Vec<PathBuf> {
        self.storage_roots.iter().map(PathBuf::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanConfig {
    #[serde(default)]
    pub keep_logs: bool,
    #[serde(default)]
    pub keep_cache: bool,
    #[serde(default)]
    pub keep_chats: bool,
    #[serde(default)]
    pub keep_index: bool,
    #[serde(default)]
    pub keep_recent_days: u32,
    #[serde(default = "default_true")]
    pub log_history: bool,
    #[serde(default = "default_true")]
    pub confirm_before_clean: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            keep_logs: false,
            keep_cache: false,
            keep_chats: false,
            keep_index: false,
            keep_recent_days: 0,
            log_history: true,
            confirm_before_clean: true,
        }
    }
}

impl CleanConfig {
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            keep_logs: self.keep_logs,
            keep_cache: self.keep_cache,
            keep_chats: self.keep_chats,
            keep_index: self.keep_index,
            keep_recent_days: self.keep_recent_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

fn default_max_age_days() -> u32 {
    30
}

fn default_max_size_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

pub const SETTABLE_KEYS: &[&str] = &[
    "keep_logs",
    "keep_cache",
    "keep_chats",
    "keep_index",
    "keep_recent_days",
    "log_history",
    "confirm_before_clean",
    "max_age_days",
    "max_size_bytes",
];

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read the config at `path`, writing the defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cleankiro")
            .join("config.toml")
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cleankiro")
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn flag(key: &str, value: &str) -> Result<bool> {
            value
                .parse()
                .with_context(|| format!("{key} expects true or false, got {value:?}"))
        }
        fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value
                .parse()
                .with_context(|| format!("{key} expects a number, got {value:?}"))
        }

        match key {
            "keep_logs" => self.clean.keep_logs = flag(key, value)?,
            "keep_cache" => self.clean.keep_cache = flag(key, value)?,
            "keep_chats" => self.clean.keep_chats = flag(key, value)?,
            "keep_index" => self.clean.keep_index = flag(key, value)?,
            "keep_recent_days" => self.clean.keep_recent_days = number(key, value)?,
            "log_history" => self.clean.log_history = flag(key, value)?,
            "confirm_before_clean" => self.clean.confirm_before_clean = flag(key, value)?,
            "max_age_days" => self.chats.max_age_days = number(key, value)?,
            "max_size_bytes" => self.chats.max_size_bytes = number(key, value)?,
            _ => bail!(
                "unknown config key {key:?} (expected one of: {})",
                SETTABLE_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    pub fn add_excluded_path(&mut self, path: String) {
        if !self.scan.excluded_paths.contains(&path) {
            self.scan.excluded_paths.push(path);
        }
    }
}
