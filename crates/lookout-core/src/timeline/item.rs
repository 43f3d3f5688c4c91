use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::time::Duration;

use super::types::{ItemId, ItemKindTag, Timestamp};

/// How a run ended up, as shown in the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleStatus {
    Started,
    Ended,
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompactionStatus {
    Started,
    Ended,
    WillRetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolStatus {
    Running,
    Completed,
    Failed,
}

/// Text that arrives in pieces and is closed once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingText {
    pub text: String,
    /// Only ever populated for assistant items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
    pub is_streaming: bool,
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Option<Duration>,
}

impl StreamingText {
    pub fn open(text: String) -> Self {
        Self {
            text,
            media_urls: Vec::new(),
            is_streaming: true,
            duration: None,
        }
    }

    /// Close the text. Returns false when it was already closed.
    pub fn finalize(&mut self, duration: Duration) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.is_streaming = false;
        self.duration = Some(duration);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallItem {
    pub tool_call_id: String,
    pub name: String,
    pub args: Map<String, Value>,
    pub status: ToolStatus,
    pub is_error: bool,
    pub partial_result: Option<String>,
    pub result: Option<String>,
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Option<Duration>,
}

impl ToolCallItem {
    pub fn is_running(&self) -> bool {
        self.status == ToolStatus::Running
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityKind {
    Lifecycle { phase: LifecycleStatus },
    Thinking(StreamingText),
    Assistant(StreamingText),
    ToolCall(ToolCallItem),
    Compaction { phase: CompactionStatus },
}

impl ActivityKind {
    pub fn tag(&self) -> ItemKindTag {
        match self {
            ActivityKind::Lifecycle { .. } => ItemKindTag::Lifecycle,
            ActivityKind::Thinking(_) => ItemKindTag::Thinking,
            ActivityKind::Assistant(_) => ItemKindTag::Assistant,
            ActivityKind::ToolCall(_) => ItemKindTag::ToolCall,
            ActivityKind::Compaction { .. } => ItemKindTag::Compaction,
        }
    }
}

/// One row of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: ItemId,
    pub run_id: String,
    pub kind: ActivityKind,
    pub created_at: Timestamp,
}

impl ActivityItem {
    pub fn tag(&self) -> ItemKindTag {
        self.kind.tag()
    }

    /// Streamed text of a thinking or assistant item.
    pub fn streaming_text(&self) -> Option<&StreamingText> {
        match &self.kind {
            ActivityKind::Thinking(text) | ActivityKind::Assistant(text) => Some(text),
            _ => None,
        }
    }

    pub fn streaming_text_mut(&mut self) -> Option<&mut StreamingText> {
        match &mut self.kind {
            ActivityKind::Thinking(text) | ActivityKind::Assistant(text) => Some(text),
            _ => None,
        }
    }

    pub fn tool_call(&self) -> Option<&ToolCallItem> {
        match &self.kind {
            ActivityKind::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn tool_call_mut(&mut self) -> Option<&mut ToolCallItem> {
        match &mut self.kind {
            ActivityKind::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match &self.kind {
            ActivityKind::Thinking(text) | ActivityKind::Assistant(text) => text.duration,
            ActivityKind::ToolCall(call) => call.duration,
            ActivityKind::Lifecycle { .. } | ActivityKind::Compaction { .. } => None,
        }
    }

    /// Short human readable description, used by text renderers and logs.
    pub fn summary(&self) -> String {
        match &self.kind {
            ActivityKind::Lifecycle { phase } => match phase {
                LifecycleStatus::Started => "run started".to_string(),
                LifecycleStatus::Ended => "run ended".to_string(),
                LifecycleStatus::Error { message } if message.is_empty() => "run failed".to_string(),
                LifecycleStatus::Error { message } => format!("run failed: {message}"),
            },
            ActivityKind::Thinking(text) | ActivityKind::Assistant(text) => {
                let mut summary = text.text.clone();
                if !text.media_urls.is_empty() {
                    summary.push_str(&format!(" [{} media]", text.media_urls.len()));
                }
                summary
            }
            ActivityKind::ToolCall(call) => format!("{} ({})", call.name, call.status),
            ActivityKind::Compaction { phase } => match phase {
                CompactionStatus::Started => "compacting context".to_string(),
                CompactionStatus::Ended => "context compacted".to_string(),
                CompactionStatus::WillRetry => "context compacted, retrying".to_string(),
            },
        }
    }
}

fn serialize_duration_ms<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match duration {
        Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}
