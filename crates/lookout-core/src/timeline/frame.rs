//! Frame validation: raw envelopes in, typed agent events (or a rejection) out.
//!
//! Validation runs to completion before any state is touched. Checks run in a
//! fixed order (envelope object, payload object, stream, run id, timestamp,
//! data) and the first failure decides the rejection.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::rejection::{MalformedReason, Rejection};
use super::types::TextStream;

/// The stream categories this reducer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StreamName {
    Lifecycle,
    Thinking,
    Assistant,
    Tool,
    Compaction,
}

/// Validated payload of an `event` frame, before stream-specific decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEventPayload {
    pub run_id: String,
    pub stream: String,
    /// Informational only; never used for ordering.
    pub seq: Option<i64>,
    /// Producer timestamp in epoch milliseconds.
    pub ts: f64,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleData {
    pub phase: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub text: Option<String>,
    pub delta: Option<String>,
    pub media_urls: Option<Vec<String>>,
}

impl TextData {
    pub fn has_text(&self) -> bool {
        self.text.is_some() || self.delta.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolData {
    pub phase: Option<String>,
    pub tool_call_id: Option<String>,
    pub name: Option<String>,
    pub args: Option<Value>,
    pub partial_result: Option<Value>,
    pub result: Option<Value>,
    pub meta: Option<Value>,
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionData {
    pub phase: Option<String>,
    pub will_retry: Option<bool>,
}

/// Stream-specific body of an accepted event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    Lifecycle(LifecycleData),
    Text(TextStream, TextData),
    Tool(ToolData),
    Compaction(CompactionData),
}

/// A frame that passed validation and was decoded for its stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEvent {
    pub run_id: String,
    pub seq: Option<i64>,
    pub ts: f64,
    pub body: EventBody,
}

impl AgentEvent {
    pub fn stream(&self) -> StreamName {
        match &self.body {
            EventBody::Lifecycle(_) => StreamName::Lifecycle,
            EventBody::Text(TextStream::Thinking, _) => StreamName::Thinking,
            EventBody::Text(TextStream::Assistant, _) => StreamName::Assistant,
            EventBody::Tool(_) => StreamName::Tool,
            EventBody::Compaction(_) => StreamName::Compaction,
        }
    }
}

/// Parse a raw text frame. Invalid JSON is a malformed frame like any other.
pub fn decode_str(raw: &str) -> Result<AgentEvent, Rejection> {
    decode_frame(&parse_str(raw)?)
}

/// Parse a serialized envelope without validating it.
pub fn parse_str(raw: &str) -> Result<Value, Rejection> {
    serde_json::from_str(raw)
        .map_err(|e| Rejection::Malformed(MalformedReason::InvalidJson(e.to_string())))
}

/// Validate an envelope and decode its payload for the stream it names.
pub fn decode_frame(frame: &Value) -> Result<AgentEvent, Rejection> {
    let payload = validate_envelope(frame)?;
    decode_payload(payload)
}

/// Envelope and payload checks shared by every stream.
pub fn validate_envelope(frame: &Value) -> Result<AgentEventPayload, Rejection> {
    let envelope = frame
        .as_object()
        .ok_or(Rejection::Malformed(MalformedReason::EnvelopeNotObject))?;

    let payload = envelope
        .get("payload")
        .and_then(Value::as_object)
        .ok_or(Rejection::Malformed(MalformedReason::MissingPayload))?;

    let stream = non_empty_str(payload, "stream")
        .ok_or(Rejection::Malformed(MalformedReason::MissingStream))?;

    let run_id = non_empty_str(payload, "runId")
        .ok_or(Rejection::Malformed(MalformedReason::MissingRunId))?;

    let ts = payload
        .get("ts")
        .or_else(|| payload.get("timestamp"))
        .and_then(Value::as_f64)
        .filter(|ts| ts.is_finite())
        .ok_or(Rejection::Malformed(MalformedReason::InvalidTimestamp))?;

    let data = payload
        .get("data")
        .and_then(Value::as_object)
        .ok_or(Rejection::Malformed(MalformedReason::MissingData))?;

    Ok(AgentEventPayload {
        run_id: run_id.to_string(),
        stream: stream.to_string(),
        seq: payload.get("seq").and_then(Value::as_i64),
        ts,
        data: data.clone(),
    })
}

/// Route a validated payload by its `stream` and decode the stream's data.
pub fn decode_payload(payload: AgentEventPayload) -> Result<AgentEvent, Rejection> {
    let stream: StreamName = payload
        .stream
        .parse()
        .map_err(|_| Rejection::UnrecognizedStream(payload.stream.clone()))?;

    let body = match stream {
        StreamName::Lifecycle => EventBody::Lifecycle(decode_data(stream, &payload.data)?),
        StreamName::Thinking => {
            EventBody::Text(TextStream::Thinking, decode_data(stream, &payload.data)?)
        }
        StreamName::Assistant => {
            EventBody::Text(TextStream::Assistant, decode_data(stream, &payload.data)?)
        }
        StreamName::Tool => EventBody::Tool(decode_data(stream, &payload.data)?),
        StreamName::Compaction => EventBody::Compaction(decode_data(stream, &payload.data)?),
    };

    Ok(AgentEvent {
        run_id: payload.run_id,
        seq: payload.seq,
        ts: payload.ts,
        body,
    })
}

fn decode_data<T: DeserializeOwned>(
    stream: StreamName,
    data: &Map<String, Value>,
) -> Result<T, Rejection> {
    serde_json::from_value(Value::Object(data.clone())).map_err(|e| {
        Rejection::Malformed(MalformedReason::InvalidData {
            stream: stream.to_string(),
            message: e.to_string(),
        })
    })
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
