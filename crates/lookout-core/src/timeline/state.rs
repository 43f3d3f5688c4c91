use serde::Serialize;
use std::collections::HashMap;

use super::types::TextStream;

/// Which run is current and whether it is still going.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub active_run_id: Option<String>,
    pub is_run_active: bool,
}

impl RunState {
    pub fn start(&mut self, run_id: &str) {
        self.active_run_id = Some(run_id.to_string());
        self.is_run_active = true;
    }

    pub fn stop(&mut self) {
        self.is_run_active = false;
    }

    pub fn is_active_run(&self, run_id: &str) -> bool {
        self.is_run_active && self.active_run_id.as_deref() == Some(run_id)
    }

    pub fn clear(&mut self) {
        self.active_run_id = None;
        self.is_run_active = false;
    }
}

/// Tool call id -> timeline position.
///
/// Entries outlive the running phase so terminal items can still be found;
/// a new `start` for the same id repoints the entry at the new item.
#[derive(Debug, Clone, Default)]
pub struct ToolCallIndex {
    positions: HashMap<String, usize>,
}

impl ToolCallIndex {
    pub fn get(&self, tool_call_id: &str) -> Option<usize> {
        self.positions.get(tool_call_id).copied()
    }

    pub fn insert(&mut self, tool_call_id: &str, position: usize) {
        self.positions.insert(tool_call_id.to_string(), position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.values().copied()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Positions of the currently open thinking and assistant items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenStreams {
    thinking: Option<usize>,
    assistant: Option<usize>,
}

impl OpenStreams {
    pub fn get(&self, stream: TextStream) -> Option<usize> {
        match stream {
            TextStream::Thinking => self.thinking,
            TextStream::Assistant => self.assistant,
        }
    }

    pub fn set(&mut self, stream: TextStream, position: usize) {
        *self.slot(stream) = Some(position);
    }

    pub fn take(&mut self, stream: TextStream) -> Option<usize> {
        self.slot(stream).take()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn slot(&mut self, stream: TextStream) -> &mut Option<usize> {
        match stream {
            TextStream::Thinking => &mut self.thinking,
            TextStream::Assistant => &mut self.assistant,
        }
    }
}
