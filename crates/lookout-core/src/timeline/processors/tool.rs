//! ToolCallProcessor - handles the tool call lifecycle.
//!
//! `start` opens a running item and indexes it by tool call id. `update`
//! records partial output. `result` and `error` close the item exactly once.
//! Phases for an id without a running item are dropped.

use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::timeline::frame::{AgentEvent, EventBody, ToolData};
use crate::timeline::item::{ActivityKind, ToolCallItem, ToolStatus};
use crate::timeline::processor::{EventProcessor, ProcessingContext, ProcessingResult};
use crate::timeline::rejection::{MalformedReason, Rejection};
use crate::timeline::types::{ItemId, TextStream, elapsed};

const DEFAULT_TOOL_NAME: &str = "tool";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
enum ToolPhase {
    Start,
    Update,
    Result,
    Error,
}

pub struct ToolCallProcessor;

impl ToolCallProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl EventProcessor for ToolCallProcessor {
    fn priority(&self) -> usize {
        75 // After text streams
    }

    fn can_handle(&self, event: &AgentEvent) -> bool {
        matches!(event.body, EventBody::Tool(_))
    }

    fn process(&mut self, event: &AgentEvent, ctx: &mut ProcessingContext<'_>) -> ProcessingResult {
        let EventBody::Tool(data) = &event.body else {
            return ProcessingResult::NotHandled;
        };

        let Ok(phase) = data.phase.as_deref().unwrap_or_default().parse::<ToolPhase>() else {
            return ProcessingResult::Rejected(Rejection::unknown_phase(
                "tool",
                data.phase.as_deref(),
            ));
        };

        let Some(tool_call_id) = data.tool_call_id.as_deref().filter(|id| !id.is_empty()) else {
            return ProcessingResult::Rejected(Rejection::Malformed(
                MalformedReason::MissingToolCallId,
            ));
        };

        match phase {
            ToolPhase::Start => Self::handle_start(&event.run_id, tool_call_id, data, ctx),
            ToolPhase::Update => Self::handle_update(tool_call_id, data, ctx),
            ToolPhase::Result | ToolPhase::Error => {
                Self::handle_finish(tool_call_id, phase, data, ctx)
            }
        }
    }

    fn name(&self) -> &'static str {
        "ToolCallProcessor"
    }
}

impl ToolCallProcessor {
    fn handle_start(
        run_id: &str,
        tool_call_id: &str,
        data: &ToolData,
        ctx: &mut ProcessingContext<'_>,
    ) -> ProcessingResult {
        if Self::running_position(tool_call_id, ctx).is_some() {
            return ProcessingResult::Rejected(Rejection::DuplicateToolStart(
                tool_call_id.to_string(),
            ));
        }

        // A tool call interrupts any reasoning in progress.
        ctx.finalize_stream(TextStream::Thinking);

        let name = data
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());
        let args = match &data.args {
            Some(Value::Object(args)) => args.clone(),
            _ => Map::new(),
        };

        tracing::debug!(
            target: "lookout::tool",
            run_id,
            tool_call_id,
            %name,
            "Tool call started"
        );

        let id = ItemId::derive_for_tool(run_id, tool_call_id, ctx.timeline.next_position());
        let position = ctx.append_with_id(
            id,
            run_id,
            ActivityKind::ToolCall(ToolCallItem {
                tool_call_id: tool_call_id.to_string(),
                name,
                args,
                status: ToolStatus::Running,
                is_error: false,
                partial_result: None,
                result: None,
                duration: None,
            }),
        );
        ctx.tool_index.insert(tool_call_id, position);
        ProcessingResult::Handled
    }

    fn handle_update(
        tool_call_id: &str,
        data: &ToolData,
        ctx: &mut ProcessingContext<'_>,
    ) -> ProcessingResult {
        let Some(position) = Self::running_position(tool_call_id, ctx) else {
            return Self::orphaned(tool_call_id, ToolPhase::Update);
        };

        let Some(partial) = data.partial_result.as_ref().and_then(render_value) else {
            return ProcessingResult::Handled;
        };

        ctx.update(position, |item| {
            if let Some(call) = item.tool_call_mut() {
                call.partial_result = Some(partial);
            }
        });
        ProcessingResult::Handled
    }

    fn handle_finish(
        tool_call_id: &str,
        phase: ToolPhase,
        data: &ToolData,
        ctx: &mut ProcessingContext<'_>,
    ) -> ProcessingResult {
        let Some(position) = Self::running_position(tool_call_id, ctx) else {
            return Self::orphaned(tool_call_id, phase);
        };

        let failed = phase == ToolPhase::Error || data.is_error == Some(true);
        let result = data
            .result
            .as_ref()
            .or(data.meta.as_ref())
            .and_then(render_value);
        let now = ctx.clock.now();

        ctx.update(position, |item| {
            let duration = elapsed(item.created_at, now);
            if let Some(call) = item.tool_call_mut() {
                call.status = if failed {
                    ToolStatus::Failed
                } else {
                    ToolStatus::Completed
                };
                call.is_error = failed;
                call.result = result;
                call.duration = Some(duration);
            }
        });

        tracing::debug!(
            target: "lookout::tool",
            tool_call_id,
            failed,
            "Tool call finished"
        );
        ProcessingResult::Handled
    }

    /// Position of the item for `tool_call_id`, only while it is still running.
    fn running_position(tool_call_id: &str, ctx: &ProcessingContext<'_>) -> Option<usize> {
        let position = ctx.tool_index.get(tool_call_id)?;
        ctx.timeline
            .get(position)
            .and_then(|item| item.tool_call())
            .filter(|call| call.is_running())
            .map(|_| position)
    }

    fn orphaned(tool_call_id: &str, phase: ToolPhase) -> ProcessingResult {
        ProcessingResult::Rejected(Rejection::OrphanedToolEvent {
            tool_call_id: tool_call_id.to_string(),
            phase: phase.to_string(),
        })
    }
}

impl Default for ToolCallProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool output as display text. Strings pass through, other JSON is serialized.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
