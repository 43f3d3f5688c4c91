//! LifecycleProcessor - tracks which run is active.
//!
//! `start` opens a run, `end` and `error` close it. Closing a run also closes
//! any thinking or assistant text still streaming.

use strum::EnumString;

use crate::timeline::frame::{AgentEvent, EventBody, LifecycleData};
use crate::timeline::item::{ActivityKind, LifecycleStatus};
use crate::timeline::processor::{EventProcessor, ProcessingContext, ProcessingResult};
use crate::timeline::rejection::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
enum LifecyclePhase {
    Start,
    End,
    Error,
}

pub struct LifecycleProcessor;

impl LifecycleProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl EventProcessor for LifecycleProcessor {
    fn priority(&self) -> usize {
        10 // Run state changes first
    }

    fn can_handle(&self, event: &AgentEvent) -> bool {
        matches!(event.body, EventBody::Lifecycle(_))
    }

    fn process(&mut self, event: &AgentEvent, ctx: &mut ProcessingContext<'_>) -> ProcessingResult {
        let EventBody::Lifecycle(data) = &event.body else {
            return ProcessingResult::NotHandled;
        };

        let Ok(phase) = data.phase.as_deref().unwrap_or_default().parse::<LifecyclePhase>() else {
            return ProcessingResult::Rejected(Rejection::unknown_phase(
                "lifecycle",
                data.phase.as_deref(),
            ));
        };

        match phase {
            LifecyclePhase::Start => Self::handle_start(&event.run_id, ctx),
            LifecyclePhase::End | LifecyclePhase::Error => {
                Self::handle_stop(&event.run_id, phase, data, ctx);
            }
        }
        ProcessingResult::Handled
    }

    fn name(&self) -> &'static str {
        "LifecycleProcessor"
    }
}

impl LifecycleProcessor {
    fn handle_start(run_id: &str, ctx: &mut ProcessingContext<'_>) {
        tracing::debug!(target: "lookout::lifecycle", run_id, "Run started");

        // Starting a run never closes open text.
        ctx.run_state.start(run_id);
        ctx.append(
            run_id,
            ActivityKind::Lifecycle {
                phase: LifecycleStatus::Started,
            },
        );
    }

    fn handle_stop(
        run_id: &str,
        phase: LifecyclePhase,
        data: &LifecycleData,
        ctx: &mut ProcessingContext<'_>,
    ) {
        ctx.run_state.stop();
        ctx.finalize_all_streams();

        let status = if phase == LifecyclePhase::Error {
            let message = data.error.clone().unwrap_or_default();
            tracing::debug!(target: "lookout::lifecycle", run_id, %message, "Run failed");
            LifecycleStatus::Error { message }
        } else {
            tracing::debug!(target: "lookout::lifecycle", run_id, "Run ended");
            LifecycleStatus::Ended
        };

        ctx.append(run_id, ActivityKind::Lifecycle { phase: status });
    }
}

impl Default for LifecycleProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::frame::TextData;
    use crate::timeline::processor::Change;
    use crate::timeline::processors::StreamingTextProcessor;
    use crate::timeline::processors::test_support::Harness;
    use crate::timeline::types::TextStream;
    use std::time::Duration;

    fn lifecycle(phase: &str) -> EventBody {
        EventBody::Lifecycle(LifecycleData {
            phase: Some(phase.to_string()),
            error: None,
        })
    }

    fn thinking(delta: &str) -> EventBody {
        EventBody::Text(
            TextStream::Thinking,
            TextData {
                delta: Some(delta.to_string()),
                ..TextData::default()
            },
        )
    }

    fn assistant(delta: &str) -> EventBody {
        EventBody::Text(
            TextStream::Assistant,
            TextData {
                delta: Some(delta.to_string()),
                ..TextData::default()
            },
        )
    }

    #[test]
    fn test_start_then_end() {
        let mut harness = Harness::default();
        let mut processor = LifecycleProcessor::new();

        let (result, changes) = harness.run(&mut processor, "run-1", lifecycle("start"));
        assert_eq!(result, ProcessingResult::Handled);
        assert_eq!(changes, vec![Change::Appended(0)]);
        assert!(harness.run_state.is_active_run("run-1"));

        harness.run(&mut processor, "run-1", lifecycle("end"));
        assert_eq!(harness.timeline.len(), 2);
        assert!(!harness.run_state.is_run_active);
        assert_eq!(harness.run_state.active_run_id.as_deref(), Some("run-1"));
        assert_eq!(
            harness.timeline.get(1).map(|item| item.kind.clone()),
            Some(ActivityKind::Lifecycle {
                phase: LifecycleStatus::Ended
            })
        );
    }

    #[test]
    fn test_error_records_message() {
        let mut harness = Harness::default();
        let mut processor = LifecycleProcessor::new();
        harness.run(&mut processor, "run-1", lifecycle("start"));
        harness.run(
            &mut processor,
            "run-1",
            EventBody::Lifecycle(LifecycleData {
                phase: Some("error".to_string()),
                error: Some("rate limited".to_string()),
            }),
        );

        assert!(!harness.run_state.is_run_active);
        assert_eq!(
            harness.timeline.last().map(|item| item.kind.clone()),
            Some(ActivityKind::Lifecycle {
                phase: LifecycleStatus::Error {
                    message: "rate limited".to_string()
                }
            })
        );
    }

    #[test]
    fn test_error_without_message_uses_empty_string() {
        let mut harness = Harness::default();
        let mut processor = LifecycleProcessor::new();
        harness.run(&mut processor, "run-1", lifecycle("error"));
        assert_eq!(
            harness.timeline.last().map(|item| item.kind.clone()),
            Some(ActivityKind::Lifecycle {
                phase: LifecycleStatus::Error {
                    message: String::new()
                }
            })
        );
    }

    #[test]
    fn test_unknown_and_missing_phase_are_rejected() {
        let mut harness = Harness::default();
        let mut processor = LifecycleProcessor::new();

        let (result, changes) = harness.run(&mut processor, "run-1", lifecycle("pause"));
        assert_eq!(
            result,
            ProcessingResult::Rejected(Rejection::UnknownPhase {
                stream: "lifecycle".to_string(),
                phase: "pause".to_string()
            })
        );
        assert!(changes.is_empty());

        let (result, _) = harness.run(
            &mut processor,
            "run-1",
            EventBody::Lifecycle(LifecycleData::default()),
        );
        assert!(matches!(result, ProcessingResult::Rejected(_)));
        assert!(harness.timeline.is_empty());
        assert_eq!(harness.run_state.active_run_id, None);
    }

    #[test]
    fn test_end_finalizes_open_text_before_appending() {
        let mut harness = Harness::default();
        let mut lifecycle_proc = LifecycleProcessor::new();
        let mut thinking_proc = StreamingTextProcessor::new(TextStream::Thinking);

        harness.run(&mut lifecycle_proc, "run-1", lifecycle("start"));
        harness.run(&mut thinking_proc, "run-1", thinking("hmm"));
        harness.clock.advance(Duration::from_millis(40));

        let (_, changes) = harness.run(&mut lifecycle_proc, "run-1", lifecycle("end"));
        assert_eq!(changes, vec![Change::Updated(1), Change::Appended(2)]);

        let text = harness
            .timeline
            .get(1)
            .and_then(|item| item.streaming_text().cloned())
            .unwrap();
        assert!(!text.is_streaming);
        assert_eq!(text.duration, Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_start_of_another_run_keeps_assistant_open() {
        let mut harness = Harness::default();
        let mut lifecycle_proc = LifecycleProcessor::new();
        let mut assistant_proc = StreamingTextProcessor::new(TextStream::Assistant);

        harness.run(&mut lifecycle_proc, "run-1", lifecycle("start"));
        harness.run(&mut assistant_proc, "run-1", assistant("Hel"));
        let (_, changes) = harness.run(&mut lifecycle_proc, "run-2", lifecycle("start"));
        assert_eq!(changes, vec![Change::Appended(2)]);
        harness.run(&mut assistant_proc, "run-2", assistant("lo"));

        assert_eq!(harness.timeline.len(), 3);
        assert_eq!(harness.open_streams.get(TextStream::Assistant), Some(1));
        let text = harness
            .timeline
            .get(1)
            .and_then(|item| item.streaming_text().cloned())
            .unwrap();
        assert_eq!(text.text, "Hello");
        assert!(text.is_streaming);
        assert_eq!(text.duration, None);
        assert_eq!(harness.run_state.active_run_id.as_deref(), Some("run-2"));
    }

    #[test]
    fn test_restart_of_same_run_keeps_text_open() {
        let mut harness = Harness::default();
        let mut lifecycle_proc = LifecycleProcessor::new();
        let mut thinking_proc = StreamingTextProcessor::new(TextStream::Thinking);

        harness.run(&mut thinking_proc, "run-1", thinking("a"));
        harness.run(&mut lifecycle_proc, "run-1", lifecycle("start"));
        assert_eq!(harness.open_streams.get(TextStream::Thinking), Some(0));
    }
}
