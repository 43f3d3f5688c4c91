use serde::Serialize;

use super::frame::AgentEvent;
use super::item::{ActivityItem, ActivityKind};
use super::rejection::Rejection;
use super::state::{OpenStreams, RunState, ToolCallIndex};
use super::store::Timeline;
use super::types::{Clock, ItemId, TextStream, elapsed};

/// A single visible timeline change caused by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "position", rename_all = "snake_case")]
pub enum Change {
    Appended(usize),
    Updated(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    /// The event was consumed. Visible changes are collected on the context.
    Handled,
    NotHandled,
    Rejected(Rejection),
}

/// Mutable view of reducer state handed to processors for one event.
pub struct ProcessingContext<'a> {
    pub timeline: &'a mut Timeline,
    pub run_state: &'a mut RunState,
    pub tool_index: &'a mut ToolCallIndex,
    pub open_streams: &'a mut OpenStreams,
    pub clock: &'a dyn Clock,
    pub changes: Vec<Change>,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(
        timeline: &'a mut Timeline,
        run_state: &'a mut RunState,
        tool_index: &'a mut ToolCallIndex,
        open_streams: &'a mut OpenStreams,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            timeline,
            run_state,
            tool_index,
            open_streams,
            clock,
            changes: Vec::new(),
        }
    }

    /// Append a new item owned by `run_id`, stamped with the current time.
    pub fn append(&mut self, run_id: &str, kind: ActivityKind) -> usize {
        let id = ItemId::derive(run_id, kind.tag(), self.timeline.next_position());
        self.append_with_id(id, run_id, kind)
    }

    pub fn append_with_id(&mut self, id: ItemId, run_id: &str, kind: ActivityKind) -> usize {
        let position = self.timeline.push(ActivityItem {
            id,
            run_id: run_id.to_string(),
            kind,
            created_at: self.clock.now(),
        });
        self.changes.push(Change::Appended(position));
        position
    }

    /// Mutate an existing item in place.
    pub fn update<R>(
        &mut self,
        position: usize,
        f: impl FnOnce(&mut ActivityItem) -> R,
    ) -> Option<R> {
        let result = self.timeline.update(position, f)?;
        self.record_update(position);
        Some(result)
    }

    /// Close the open item of `stream`, if there is one.
    pub fn finalize_stream(&mut self, stream: TextStream) -> bool {
        let Some(position) = self.open_streams.take(stream) else {
            return false;
        };
        let now = self.clock.now();
        let closed = self
            .timeline
            .update(position, |item| {
                let duration = elapsed(item.created_at, now);
                item.streaming_text_mut()
                    .is_some_and(|text| text.finalize(duration))
            })
            .unwrap_or(false);
        if closed {
            tracing::trace!(target: "lookout::timeline", %stream, position, "Finalized streaming item");
            self.record_update(position);
        }
        closed
    }

    pub fn finalize_all_streams(&mut self) {
        self.finalize_stream(TextStream::Thinking);
        self.finalize_stream(TextStream::Assistant);
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    fn record_update(&mut self, position: usize) {
        // Appends already imply the latest content.
        let change = Change::Updated(position);
        if !self.changes.contains(&Change::Appended(position)) && !self.changes.contains(&change) {
            self.changes.push(change);
        }
    }
}

pub trait EventProcessor: Send + Sync {
    fn priority(&self) -> usize {
        100
    }

    fn can_handle(&self, event: &AgentEvent) -> bool;

    fn process(&mut self, event: &AgentEvent, ctx: &mut ProcessingContext<'_>) -> ProcessingResult;

    fn name(&self) -> &'static str;
}
