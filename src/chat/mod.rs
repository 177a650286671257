//! Agent conversation transcripts: parsing, per-workspace aggregation and
//! age/size based cleanup candidates.

pub mod parser;
pub mod scanner;

pub use parser::ConversationParser;
pub use scanner::{ConversationScanner, SpaceSavings, WorkspaceScan};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const TRANSCRIPT_EXTENSION: &str = ".chat";

/// True when `name` ends with the transcript extension, ignoring case.
pub fn is_transcript_file(name: &str) -> bool {
    name.to_lowercase().ends_with(TRANSCRIPT_EXTENSION)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRole {
    Human,
    Bot,
    Tool,
    Other(String),
}

impl From<&str> for MessageRole {
    fn from(role: &str) -> Self {
        match role {
            "human" => MessageRole::Human,
            "bot" => MessageRole::Bot,
            "tool" => MessageRole::Tool,
            other => MessageRole::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationMessage {
    /// `None` when the key is missing or null.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ConversationMessage {
    pub fn role(&self) -> MessageRole {
        MessageRole::from(self.role.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub human: usize,
    pub bot: usize,
    pub tool: usize,
}

impl RoleCounts {
    pub fn total(&self) -> usize {
        self.human + self.bot + self.tool
    }

    pub fn add(&mut self, other: RoleCounts) {
        self.human += other.human;
        self.bot += other.bot;
        self.tool += other.tool;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationMetadata {
    pub execution_id: String,
    pub action_id: String,
    pub model_id: String,
    pub model_provider: String,
    pub workflow: String,
    pub workflow_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// One successfully parsed transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub message_count: usize,
    pub human_count: usize,
    pub bot_count: usize,
    pub tool_count: usize,
    pub metadata: ConversationMetadata,
}

impl ConversationRecord {
    pub fn role_counts(&self) -> RoleCounts {
        RoleCounts {
            human: self.human_count,
            bot: self.bot_count,
            tool: self.tool_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceAggregate {
    pub workspace_id: String,
    pub path: PathBuf,
    pub conversation_count: usize,
    pub total_messages: usize,
    pub total_size: u64,
    pub human_messages: usize,
    pub bot_messages: usize,
    pub tool_messages: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

impl WorkspaceAggregate {
    pub fn new(workspace_id: impl Into<String>, path: PathBuf) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            path,
            conversation_count: 0,
            total_messages: 0,
            total_size: 0,
            human_messages: 0,
            bot_messages: 0,
            tool_messages: 0,
            last_activity: None,
        }
    }

    pub fn add(&mut self, record: &ConversationRecord) {
        self.conversation_count += 1;
        self.total_messages += record.message_count;
        self.total_size += record.size;
        self.human_messages += record.human_count;
        self.bot_messages += record.bot_count;
        self.tool_messages += record.tool_count;
        self.last_activity = self.last_activity.max(Some(record.modified));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationStats {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub total_size: u64,
    pub human_messages: usize,
    pub bot_messages: usize,
    pub tool_messages: usize,
    pub avg_messages_per_conversation: f64,
    pub workspace_breakdown: Vec<WorkspaceAggregate>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl ConversationStats {
    pub fn from_workspaces(workspaces: Vec<WorkspaceAggregate>) -> Self {
        let mut stats = ConversationStats::default();

        for ws in &workspaces {
            stats.total_conversations += ws.conversation_count;
            stats.total_messages += ws.total_messages;
            stats.total_size += ws.total_size;
            stats.human_messages += ws.human_messages;
            stats.bot_messages += ws.bot_messages;
            stats.tool_messages += ws.tool_messages;
            stats.last_activity = stats.last_activity.max(ws.last_activity);
        }

        if stats.total_conversations > 0 {
            stats.avg_messages_per_conversation =
                stats.total_messages as f64 / stats.total_conversations as f64;
        }

        stats.workspace_breakdown = workspaces;
        stats
    }

    pub fn role_counts(&self) -> RoleCounts {
        RoleCounts {
            human: self.human_messages,
            bot: self.bot_messages,
            tool: self.tool_messages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanReason {
    Old,
    Large,
    All,
}

impl fmt::Display for CleanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanReason::Old => write!(f, "old"),
            CleanReason::Large => write!(f, "large"),
            CleanReason::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanableConversation {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub reason: CleanReason,
}
