//! Why a frame was dropped.
//!
//! Rejections are values, not errors: the reducer records and logs them and
//! moves on to the next frame.

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// The shape problem that made a frame malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum MalformedReason {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("envelope is not a JSON object")]
    EnvelopeNotObject,
    #[error("payload is missing or not an object")]
    MissingPayload,
    #[error("payload.stream is missing or empty")]
    MissingStream,
    #[error("payload.runId is missing or empty")]
    MissingRunId,
    #[error("payload.ts is missing or not a finite number")]
    InvalidTimestamp,
    #[error("payload.data is missing or not an object")]
    MissingData,
    #[error("{stream} data has the wrong shape: {message}")]
    InvalidData { stream: String, message: String },
    #[error("tool event has no toolCallId")]
    MissingToolCallId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    #[error("malformed frame: {0}")]
    Malformed(MalformedReason),
    #[error("unrecognized stream '{0}'")]
    UnrecognizedStream(String),
    #[error("unknown {stream} phase '{phase}'")]
    UnknownPhase { stream: String, phase: String },
    #[error("tool {phase} for '{tool_call_id}' has no running tool call")]
    OrphanedToolEvent { tool_call_id: String, phase: String },
    #[error("tool call '{0}' is already running")]
    DuplicateToolStart(String),
    #[error("{0} event carries no text and no item is open")]
    EmptyTextEvent(String),
}

/// The four buckets rejections are counted and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    MalformedEvent,
    UnrecognizedStream,
    UnknownPhase,
    OrphanedToolEvent,
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::Malformed(_) | Rejection::EmptyTextEvent(_) => RejectionKind::MalformedEvent,
            Rejection::UnrecognizedStream(_) => RejectionKind::UnrecognizedStream,
            Rejection::UnknownPhase { .. } => RejectionKind::UnknownPhase,
            Rejection::OrphanedToolEvent { .. } | Rejection::DuplicateToolStart(_) => {
                RejectionKind::OrphanedToolEvent
            }
        }
    }

    pub(crate) fn unknown_phase(stream: impl Into<String>, phase: Option<&str>) -> Self {
        Rejection::UnknownPhase {
            stream: stream.into(),
            phase: phase.unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refinements_map_to_taxonomy() {
        assert_eq!(
            Rejection::DuplicateToolStart("t1".into()).kind(),
            RejectionKind::OrphanedToolEvent
        );
        assert_eq!(
            Rejection::EmptyTextEvent("thinking".into()).kind(),
            RejectionKind::MalformedEvent
        );
        assert_eq!(
            Rejection::Malformed(MalformedReason::MissingStream).kind(),
            RejectionKind::MalformedEvent
        );
    }

    #[test]
    fn test_display_names_the_problem() {
        let rejection = Rejection::OrphanedToolEvent {
            tool_call_id: "t1".into(),
            phase: "update".into(),
        };
        assert_eq!(
            rejection.to_string(),
            "tool update for 't1' has no running tool call"
        );
        assert_eq!(
            Rejection::unknown_phase("lifecycle", None).to_string(),
            "unknown lifecycle phase ''"
        );
    }
}
