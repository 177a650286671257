use super::{ConversationMessage, ConversationMetadata, ConversationRecord, MessageRole, RoleCounts};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptFile {
    #[serde(default)]
    execution_id: Option<String>,
    #[serde(default)]
    action_id: Option<String>,
    #[serde(default)]
    chat: Option<Vec<ConversationMessage>>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMetadata {
    model_id: Option<String>,
    model_provider: Option<String>,
    workflow: Option<String>,
    workflow_id: Option<String>,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

/// Turns the raw bytes of one `.chat` transcript into a [`ConversationRecord`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConversationParser;

impl ConversationParser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a transcript from disk.
    pub fn parse_file(&self, path: &Path) -> Result<ConversationRecord> {
        let metadata = fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
        let data = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| Error::unreadable(path, e))?;

        self.parse_bytes(&data, path, metadata.len(), modified)
    }

    pub fn parse_bytes(
        &self,
        data: &[u8],
        path: &Path,
        size: u64,
        modified: DateTime<Utc>,
    ) -> Result<ConversationRecord> {
        let malformed = |reason: String| Error::MalformedArchive {
            path: path.to_path_buf(),
            reason,
        };

        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(|e| malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(malformed("top-level value is not an object".to_string()));
        }
        let file: TranscriptFile =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;

        let chat = file.chat.unwrap_or_default();
        let counts = count_roles(&chat);
        let raw = file.metadata.unwrap_or_default();

        Ok(ConversationRecord {
            path: path.to_path_buf(),
            size,
            modified,
            message_count: chat.len(),
            human_count: counts.human,
            bot_count: counts.bot,
            tool_count: counts.tool,
            metadata: ConversationMetadata {
                execution_id: file.execution_id.unwrap_or_default(),
                action_id: file.action_id.unwrap_or_default(),
                model_id: raw.model_id.unwrap_or_default(),
                model_provider: raw.model_provider.unwrap_or_default(),
                workflow: raw.workflow.unwrap_or_default(),
                workflow_id: raw.workflow_id.unwrap_or_default(),
                started_at: raw.start_time.and_then(from_epoch_millis),
                ended_at: raw.end_time.and_then(from_epoch_millis),
            },
        })
    }
}

/// Messages with an unrecognised role count toward none of the buckets.
pub fn count_roles(messages: &[ConversationMessage]) -> RoleCounts {
    let mut counts = RoleCounts::default();
    for msg in messages {
        match msg.role() {
            MessageRole::Human => counts.human += 1,
            MessageRole::Bot => counts.bot += 1,
            MessageRole::Tool => counts.tool += 1,
            MessageRole::Other(_) => {}
        }
    }
    counts
}

/// Zero or negative means the timestamp was never recorded.
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
}
