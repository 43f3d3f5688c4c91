pub mod compaction;
pub mod lifecycle;
pub mod stream_text;
pub mod tool;

pub use compaction::CompactionProcessor;
pub use lifecycle::LifecycleProcessor;
pub use stream_text::StreamingTextProcessor;
pub use tool::ToolCallProcessor;
