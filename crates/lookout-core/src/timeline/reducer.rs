use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::frame::{self, AgentEvent};
use super::item::ActivityItem;
use super::pipeline::EventPipeline;
use super::processor::{Change, ProcessingContext, ProcessingResult};
use super::rejection::{Rejection, RejectionKind};
use super::state::{OpenStreams, RunState, ToolCallIndex};
use super::store::Timeline;
use super::types::{Clock, SystemClock, TextStream};

/// What ingesting one frame did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Applied(Vec<Change>),
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected(rejection) => Some(rejection),
            Outcome::Applied(_) => None,
        }
    }
}

/// Per-bucket frame counters since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReducerStats {
    pub accepted: u64,
    pub malformed: u64,
    pub unrecognized_stream: u64,
    pub unknown_phase: u64,
    pub orphaned_tool_event: u64,
}

impl ReducerStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied(_) => self.accepted += 1,
            Outcome::Rejected(rejection) => match rejection.kind() {
                RejectionKind::MalformedEvent => self.malformed += 1,
                RejectionKind::UnrecognizedStream => self.unrecognized_stream += 1,
                RejectionKind::UnknownPhase => self.unknown_phase += 1,
                RejectionKind::OrphanedToolEvent => self.orphaned_tool_event += 1,
            },
        }
    }

    pub fn rejected(&self) -> u64 {
        self.malformed + self.unrecognized_stream + self.unknown_phase + self.orphaned_tool_event
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.rejected()
    }
}

/// A consistent copy of everything consumers may observe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub items: Vec<ActivityItem>,
    pub run_state: RunState,
    pub revision: u64,
    pub stats: ReducerStats,
}

/// Reduces agent event frames into a timeline plus run state.
///
/// Every ingest either applies completely or is rejected without touching
/// any state; nothing here returns an error to the caller.
#[derive(Debug)]
pub struct TimelineReducer {
    timeline: Timeline,
    run_state: RunState,
    tool_index: ToolCallIndex,
    open_streams: OpenStreams,
    stats: ReducerStats,
    pipeline: EventPipeline,
    clock: Arc<dyn Clock>,
}

impl TimelineReducer {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            timeline: Timeline::new(),
            run_state: RunState::default(),
            tool_index: ToolCallIndex::default(),
            open_streams: OpenStreams::default(),
            stats: ReducerStats::default(),
            pipeline: EventPipeline::standard(),
            clock,
        }
    }

    /// Ingest one envelope as delivered by the transport.
    pub fn ingest(&mut self, frame: &Value) -> Outcome {
        let outcome = match frame::decode_frame(frame) {
            Ok(event) => self.dispatch(&event),
            Err(rejection) => Outcome::Rejected(rejection),
        };
        self.finish(outcome, frame_hint(frame))
    }

    /// Ingest one envelope still in its serialized form.
    pub fn ingest_str(&mut self, raw: &str) -> Outcome {
        match frame::parse_str(raw) {
            Ok(value) => self.ingest(&value),
            Err(rejection) => self.finish(Outcome::Rejected(rejection), (None, None)),
        }
    }

    /// Apply an already decoded event.
    pub fn apply(&mut self, event: &AgentEvent) -> Outcome {
        let outcome = self.dispatch(event);
        self.finish(
            outcome,
            (Some(event.run_id.clone()), Some(event.stream().to_string())),
        )
    }

    /// Discard timeline, tool index, run state and counters.
    ///
    /// Open items are dropped as they are; nothing is finalized.
    pub fn reset(&mut self) {
        tracing::debug!(
            target: "lookout::timeline",
            items = self.timeline.len(),
            "Resetting timeline"
        );
        self.timeline.clear();
        self.tool_index.clear();
        self.open_streams.clear();
        self.run_state.clear();
        self.stats = ReducerStats::default();
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn items(&self) -> impl Iterator<Item = &ActivityItem> + '_ {
        self.timeline.iter()
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    pub fn active_run_id(&self) -> Option<&str> {
        self.run_state.active_run_id.as_deref()
    }

    pub fn is_run_active(&self) -> bool {
        self.run_state.is_run_active
    }

    pub fn stats(&self) -> ReducerStats {
        self.stats
    }

    pub fn revision(&self) -> u64 {
        self.timeline.revision()
    }

    /// The item currently streaming for `stream`, if any.
    pub fn open_stream(&self, stream: TextStream) -> Option<&ActivityItem> {
        self.open_streams
            .get(stream)
            .and_then(|position| self.timeline.get(position))
    }

    pub fn running_tool_count(&self) -> usize {
        self.tool_index
            .positions()
            .filter_map(|position| self.timeline.get(position))
            .filter_map(ActivityItem::tool_call)
            .filter(|call| call.is_running())
            .count()
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            items: self.timeline.to_vec(),
            run_state: self.run_state.clone(),
            revision: self.timeline.revision(),
            stats: self.stats,
        }
    }

    fn dispatch(&mut self, event: &AgentEvent) -> Outcome {
        let mut ctx = ProcessingContext::new(
            &mut self.timeline,
            &mut self.run_state,
            &mut self.tool_index,
            &mut self.open_streams,
            self.clock.as_ref(),
        );
        match self.pipeline.process_event(event, &mut ctx) {
            ProcessingResult::Handled => Outcome::Applied(ctx.into_changes()),
            ProcessingResult::Rejected(rejection) => Outcome::Rejected(rejection),
            ProcessingResult::NotHandled => {
                Outcome::Rejected(Rejection::UnrecognizedStream(event.stream().to_string()))
            }
        }
    }

    fn finish(&mut self, outcome: Outcome, hint: (Option<String>, Option<String>)) -> Outcome {
        self.stats.record(&outcome);
        let (run_id, stream) = hint;
        match &outcome {
            Outcome::Applied(changes) => tracing::trace!(
                target: "lookout::timeline",
                run_id = run_id.as_deref().unwrap_or_default(),
                stream = stream.as_deref().unwrap_or_default(),
                changes = changes.len(),
                revision = self.timeline.revision(),
                "Applied frame"
            ),
            Outcome::Rejected(rejection) => tracing::debug!(
                target: "lookout::timeline",
                run_id = run_id.as_deref().unwrap_or_default(),
                stream = stream.as_deref().unwrap_or_default(),
                kind = %rejection.kind(),
                reason = %rejection,
                "Dropped frame"
            ),
        }
        outcome
    }
}

impl Default for TimelineReducer {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort run id and stream of a raw frame, for log fields only.
fn frame_hint(frame: &Value) -> (Option<String>, Option<String>) {
    let payload = frame.get("payload");
    let field = |key: &str| {
        payload
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    (field("runId"), field("stream"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::types::ManualClock;
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;

    /// Collects formatted log lines written by a scoped subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn frame(stream: &str, data: Value) -> Value {
        json!({
            "type": "event",
            "event": "agent",
            "seq": 1,
            "payload": { "runId": "run-1", "stream": stream, "seq": 1, "ts": 1_700_000_000_000_i64, "data": data }
        })
    }

    #[test]
    fn test_stats_count_each_bucket() {
        let mut reducer = TimelineReducer::with_clock(Arc::new(ManualClock::default()));
        reducer.ingest(&frame("lifecycle", json!({"phase": "start"})));
        reducer.ingest(&json!({"payload": {}}));
        reducer.ingest(&frame("metrics", json!({})));
        reducer.ingest(&frame("compaction", json!({"phase": "maybe"})));
        reducer.ingest(&frame("tool", json!({"phase": "result", "toolCallId": "x"})));

        assert_eq!(
            reducer.stats(),
            ReducerStats {
                accepted: 1,
                malformed: 1,
                unrecognized_stream: 1,
                unknown_phase: 1,
                orphaned_tool_event: 1,
            }
        );
        assert_eq!(reducer.stats().rejected(), 4);
        assert_eq!(reducer.stats().total(), 5);
    }

    #[test]
    fn test_ingest_str_matches_ingest() {
        let value = frame("thinking", json!({"delta": "abc"}));
        let mut from_value = TimelineReducer::with_clock(Arc::new(ManualClock::default()));
        let mut from_str = TimelineReducer::with_clock(Arc::new(ManualClock::default()));

        from_value.ingest(&value);
        from_str.ingest_str(&value.to_string());

        assert_eq!(from_value.snapshot(), from_str.snapshot());
    }

    #[test]
    fn test_open_stream_and_running_tools() {
        let mut reducer = TimelineReducer::with_clock(Arc::new(ManualClock::default()));
        reducer.ingest(&frame("assistant", json!({"delta": "hi"})));
        reducer.ingest(&frame("tool", json!({"phase": "start", "toolCallId": "a"})));
        reducer.ingest(&frame("tool", json!({"phase": "start", "toolCallId": "b"})));
        reducer.ingest(&frame("tool", json!({"phase": "result", "toolCallId": "a"})));

        assert!(reducer.open_stream(TextStream::Assistant).is_some());
        assert!(reducer.open_stream(TextStream::Thinking).is_none());
        assert_eq!(reducer.running_tool_count(), 1);
    }

    #[test]
    fn test_reset_clears_stats_and_keeps_revision_monotonic() {
        let mut reducer = TimelineReducer::new();
        reducer.ingest(&frame("lifecycle", json!({"phase": "start"})));
        let revision = reducer.revision();

        reducer.reset();

        assert!(reducer.revision() > revision);
        assert_eq!(reducer.stats(), ReducerStats::default());
        assert!(reducer.timeline().is_empty());
    }

    #[test]
    fn test_outcome_helpers() {
        let mut reducer = TimelineReducer::new();
        let applied = reducer.ingest(&frame("compaction", json!({"phase": "start"})));
        assert!(applied.is_applied());
        assert_eq!(applied.rejection(), None);

        let rejected = reducer.ingest(&json!(42));
        assert!(!rejected.is_applied());
        assert!(rejected.rejection().is_some());
    }

    #[test]
    fn test_raw_frames_log_run_and_stream() {
        let mut reducer = TimelineReducer::with_clock(Arc::new(ManualClock::default()));
        let rejected = json!({
            "payload": { "runId": "run-9", "stream": "metrics", "ts": 1, "data": {} }
        });
        let applied = frame("thinking", json!({"delta": "abc"}));

        let logs = capture_logs(|| {
            reducer.ingest_str(&rejected.to_string());
            reducer.ingest_str(&applied.to_string());
        });

        let dropped = logs.lines().find(|line| line.contains("Dropped frame")).unwrap();
        assert!(dropped.contains(r#"run_id="run-9""#), "{dropped}");
        assert!(dropped.contains(r#"stream="metrics""#), "{dropped}");

        let applied = logs.lines().find(|line| line.contains("Applied frame")).unwrap();
        assert!(applied.contains(r#"run_id="run-1""#), "{applied}");
        assert!(applied.contains(r#"stream="thinking""#), "{applied}");
    }

    #[test]
    fn test_invalid_json_is_logged_without_hint() {
        let mut reducer = TimelineReducer::new();
        let logs = capture_logs(|| {
            let outcome = reducer.ingest_str("{not json");
            assert_eq!(
                outcome.rejection().map(Rejection::kind),
                Some(RejectionKind::MalformedEvent)
            );
        });
        assert_eq!(logs.matches("Dropped frame").count(), 1);
    }

    #[test]
    fn test_processor_rejection_is_logged_once() {
        let mut reducer = TimelineReducer::new();
        let logs = capture_logs(|| {
            reducer.ingest(&frame("compaction", json!({"phase": "maybe"})));
        });

        assert_eq!(logs.matches("Dropped frame").count(), 1);
        assert!(!logs.contains("lookout::pipeline"));
        assert!(logs.contains("lookout::timeline"));
    }
}
