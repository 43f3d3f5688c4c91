use super::frame::AgentEvent;
use super::processor::{EventProcessor, ProcessingContext, ProcessingResult};
use super::processors::{
    CompactionProcessor, LifecycleProcessor, StreamingTextProcessor, ToolCallProcessor,
};
use super::rejection::Rejection;
use super::types::TextStream;

/// Routes each event to the single processor that claims its stream.
pub struct EventPipeline {
    processors: Vec<Box<dyn EventProcessor>>,
}

impl EventPipeline {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// The processor set for every stream this reducer understands.
    pub fn standard() -> Self {
        Self::new()
            .add_processor(Box::new(LifecycleProcessor::new()))
            .add_processor(Box::new(StreamingTextProcessor::new(TextStream::Thinking)))
            .add_processor(Box::new(StreamingTextProcessor::new(TextStream::Assistant)))
            .add_processor(Box::new(ToolCallProcessor::new()))
            .add_processor(Box::new(CompactionProcessor::new()))
    }

    pub fn add_processor(mut self, processor: Box<dyn EventProcessor>) -> Self {
        self.processors.push(processor);
        self.processors.sort_by_key(|p| p.priority());
        self
    }

    pub fn process_event(
        &mut self,
        event: &AgentEvent,
        ctx: &mut ProcessingContext<'_>,
    ) -> ProcessingResult {
        for processor in &mut self.processors {
            if !processor.can_handle(event) {
                continue;
            }

            // Rejections are logged once, by the reducer.
            match processor.process(event, ctx) {
                ProcessingResult::NotHandled => continue,
                result => return result,
            }
        }

        ProcessingResult::Rejected(Rejection::UnrecognizedStream(event.stream().to_string()))
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn processor_names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }
}

impl Default for EventPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for EventPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPipeline")
            .field("processor_count", &self.processor_count())
            .field("processors", &self.processor_names())
            .finish()
    }
}
