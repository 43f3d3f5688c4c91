//! StreamingTextProcessor - merges streamed thinking or assistant text.
//!
//! One instance per text stream. The first event of a window opens an item;
//! later events grow it in place until something finalizes it.

use crate::timeline::frame::{AgentEvent, EventBody, TextData};
use crate::timeline::item::{ActivityKind, StreamingText};
use crate::timeline::processor::{EventProcessor, ProcessingContext, ProcessingResult};
use crate::timeline::rejection::Rejection;
use crate::timeline::types::TextStream;

pub struct StreamingTextProcessor {
    stream: TextStream,
}

impl StreamingTextProcessor {
    pub fn new(stream: TextStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> TextStream {
        self.stream
    }
}

impl EventProcessor for StreamingTextProcessor {
    fn priority(&self) -> usize {
        50
    }

    fn can_handle(&self, event: &AgentEvent) -> bool {
        matches!(event.body, EventBody::Text(stream, _) if stream == self.stream)
    }

    fn process(&mut self, event: &AgentEvent, ctx: &mut ProcessingContext<'_>) -> ProcessingResult {
        let EventBody::Text(_, data) = &event.body else {
            return ProcessingResult::NotHandled;
        };

        match ctx.open_streams.get(self.stream) {
            Some(position) => self.handle_continue(position, data, ctx),
            None => return self.handle_open(&event.run_id, data, ctx),
        }
        ProcessingResult::Handled
    }

    fn name(&self) -> &'static str {
        match self.stream {
            TextStream::Thinking => "ThinkingProcessor",
            TextStream::Assistant => "AssistantProcessor",
        }
    }
}

impl StreamingTextProcessor {
    fn handle_open(
        &self,
        run_id: &str,
        data: &TextData,
        ctx: &mut ProcessingContext<'_>,
    ) -> ProcessingResult {
        let Some(initial) = data.text.as_ref().or(data.delta.as_ref()) else {
            return ProcessingResult::Rejected(Rejection::EmptyTextEvent(self.stream.to_string()));
        };

        let mut text = StreamingText::open(initial.clone());
        if self.stream == TextStream::Assistant
            && let Some(urls) = &data.media_urls
        {
            text.media_urls.clone_from(urls);
        }

        let kind = match self.stream {
            TextStream::Thinking => ActivityKind::Thinking(text),
            TextStream::Assistant => ActivityKind::Assistant(text),
        };
        let position = ctx.append(run_id, kind);
        ctx.open_streams.set(self.stream, position);

        tracing::trace!(
            target: "lookout::stream_text",
            stream = %self.stream,
            run_id,
            position,
            "Opened streaming item"
        );
        ProcessingResult::Handled
    }

    fn handle_continue(&self, position: usize, data: &TextData, ctx: &mut ProcessingContext<'_>) {
        let takes_media = self.stream == TextStream::Assistant && data.media_urls.is_some();
        if !data.has_text() && !takes_media {
            return;
        }

        ctx.update(position, |item| {
            let Some(text) = item.streaming_text_mut() else {
                return;
            };
            if let Some(delta) = &data.delta {
                text.text.push_str(delta);
            } else if let Some(snapshot) = &data.text {
                text.text.clone_from(snapshot);
            }
            if takes_media && let Some(urls) = &data.media_urls {
                text.media_urls.clone_from(urls);
            }
        });
    }
}
