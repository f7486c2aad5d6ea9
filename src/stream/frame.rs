use super::consumer::StreamMode;
use crate::{RagChatError, Result};
use serde::Deserialize;

const DATA_PREFIX: &str = "data:";

/// One decoded `data:` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Reply text on the chat endpoint
    Text(String),
    /// Part of the transcription of the user's recording
    Transcription(String),
    /// Reply text on the audio endpoint
    Assistant(String),
    /// The backend reported a failure inside the stream
    BackendError(String),
    /// Valid JSON that carries nothing for the current mode
    Unrecognized,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    response: Option<String>,
    error: Option<String>,
}

/// Parse one line of the stream.
///
/// Returns `None` for lines that are not `data:` frames (blank separators,
/// `event:` fields, comments).
pub fn parse_line(line: &str, mode: StreamMode) -> Option<Result<Fragment>> {
    let payload = line.trim().strip_prefix(DATA_PREFIX)?;
    Some(parse_payload(payload, mode))
}

fn parse_payload(payload: &str, mode: StreamMode) -> Result<Fragment> {
    let raw: RawFrame = serde_json::from_str(payload)
        .map_err(|e| RagChatError::JsonParse(format!("{}: {}", e, payload.trim())))?;

    if let Some(error) = raw.error {
        return Ok(Fragment::BackendError(error));
    }

    let fragment = match (mode, raw.kind.as_deref(), raw.response) {
        (_, _, None) => Fragment::Unrecognized,
        (StreamMode::Text, _, Some(text)) if text.is_empty() => Fragment::Unrecognized,
        (StreamMode::Text, _, Some(text)) => Fragment::Text(text),
        (StreamMode::Audio, Some("transcription"), Some(text)) => Fragment::Transcription(text),
        (StreamMode::Audio, Some("assistant"), Some(text)) => Fragment::Assistant(text),
        (StreamMode::Audio, _, Some(_)) => Fragment::Unrecognized,
    };

    Ok(fragment)
}
