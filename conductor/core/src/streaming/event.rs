//! Event Parsing
//!
//! Classifies a single frame. Only frames starting with the literal
//! `data: ` prefix carry events; their payload is a JSON object:
//!
//! - `{"text": "..."}` (optionally with `"done": false`) is a delta
//! - `{"done": true}` (optionally with an empty `"text"`) completes the reply
//!
//! Anything else that parses is an unrecognized event and is ignored
//! downstream. Malformed JSON is reported as a [`FrameParseError`] so the
//! caller can skip the frame and keep going.

use serde_json::Value;
use thiserror::Error;

/// Prefix marking a data-carrying frame
pub const DATA_PREFIX: &str = "data: ";

/// A classified unit of meaning extracted from a frame
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// A text fragment to append to the reply
    Delta(String),
    /// The reply is complete
    Complete,
    /// Well-formed payload of a shape this client does not know
    Unrecognized(Value),
}

/// Result of looking at one frame
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedFrame {
    /// The frame carried an event
    Event(StreamEvent),
    /// The frame carried no event (blank line, comment, other field)
    Noise,
}

/// A `data: ` frame whose payload is not valid JSON
#[derive(Debug, Error)]
#[error("malformed frame payload {payload:?}: {source}")]
pub struct FrameParseError {
    /// The raw payload after the prefix
    pub payload: String,
    /// The JSON error
    #[source]
    pub source: serde_json::Error,
}

/// Parse a single frame
///
/// A trailing `\r` is stripped so CRLF-framed streams parse the same.
///
/// # Errors
///
/// Returns [`FrameParseError`] if the frame has the data prefix but its
/// payload is not valid JSON.
pub fn parse_frame(frame: &str) -> Result<ParsedFrame, FrameParseError> {
    let frame = frame.strip_suffix('\r').unwrap_or(frame);

    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        return Ok(ParsedFrame::Noise);
    };

    let data: Value = serde_json::from_str(payload).map_err(|source| FrameParseError {
        payload: payload.to_string(),
        source,
    })?;

    Ok(ParsedFrame::Event(classify(data)))
}

fn classify(data: Value) -> StreamEvent {
    if data.get("done").and_then(Value::as_bool).unwrap_or(false) {
        return StreamEvent::Complete;
    }

    match data.get("text").and_then(Value::as_str) {
        Some(text) => StreamEvent::Delta(text.to_string()),
        None => StreamEvent::Unrecognized(data),
    }
}
