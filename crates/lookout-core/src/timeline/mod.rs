//! Agent event timeline.
//!
//! Frames from the gateway are validated, routed by stream to a processor
//! and folded into an ordered list of [`ActivityItem`]s plus [`RunState`].

pub mod frame;
pub mod item;
pub mod pipeline;
pub mod processor;
pub mod processors;
pub mod reducer;
pub mod rejection;
pub mod state;
pub mod store;
pub mod types;

pub use frame::{AgentEvent, EventBody, StreamName};
pub use item::{
    ActivityItem, ActivityKind, CompactionStatus, LifecycleStatus, StreamingText, ToolCallItem,
    ToolStatus,
};
pub use pipeline::EventPipeline;
pub use processor::{Change, EventProcessor, ProcessingContext, ProcessingResult};
pub use reducer::{Outcome, ReducerStats, TimelineReducer, TimelineSnapshot};
pub use rejection::{MalformedReason, Rejection, RejectionKind};
pub use state::RunState;
pub use store::Timeline;
pub use types::{Clock, ItemId, ItemKindTag, ManualClock, SystemClock, TextStream, Timestamp};

#[cfg(test)]
mod tests;
