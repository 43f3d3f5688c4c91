//! CompactionProcessor - records context compaction events.
//!
//! Independent of run state: it neither reads nor writes the active run.

use strum::EnumString;

use crate::timeline::frame::{AgentEvent, EventBody};
use crate::timeline::item::{ActivityKind, CompactionStatus};
use crate::timeline::processor::{EventProcessor, ProcessingContext, ProcessingResult};
use crate::timeline::rejection::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
enum CompactionPhase {
    Start,
    End,
}

pub struct CompactionProcessor;

impl CompactionProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl EventProcessor for CompactionProcessor {
    fn priority(&self) -> usize {
        90
    }

    fn can_handle(&self, event: &AgentEvent) -> bool {
        matches!(event.body, EventBody::Compaction(_))
    }

    fn process(&mut self, event: &AgentEvent, ctx: &mut ProcessingContext<'_>) -> ProcessingResult {
        let EventBody::Compaction(data) = &event.body else {
            return ProcessingResult::NotHandled;
        };

        let phase = match data.phase.as_deref().unwrap_or_default().parse() {
            Ok(CompactionPhase::Start) => CompactionStatus::Started,
            Ok(CompactionPhase::End) if data.will_retry == Some(true) => CompactionStatus::WillRetry,
            Ok(CompactionPhase::End) => CompactionStatus::Ended,
            Err(_) => {
                return ProcessingResult::Rejected(Rejection::unknown_phase(
                    "compaction",
                    data.phase.as_deref(),
                ));
            }
        };

        tracing::debug!(target: "lookout::compaction", run_id = %event.run_id, ?phase, "Compaction event");
        ctx.append(&event.run_id, ActivityKind::Compaction { phase });
        ProcessingResult::Handled
    }

    fn name(&self) -> &'static str {
        "CompactionProcessor"
    }
}

impl Default for CompactionProcessor {
    fn default() -> Self {
        Self::new()
    }
}
