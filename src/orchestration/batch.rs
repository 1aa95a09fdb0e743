// Batch files - JSON request lists parsed entry by entry at the input boundary

use super::types::{ContentRequest, ContentType};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request {index}: unknown content type '{value}'")]
    UnknownContentType { index: usize, value: String },

    #[error("Request {index}: {message}")]
    Malformed { index: usize, message: String },

    #[error("Batch must be a JSON array or an object with a \"requests\" array")]
    NotABatch,

    #[error("Invalid batch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Requests accepted from a batch file, plus every rejected entry
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub requests: Vec<ContentRequest>,
    /// Position of each accepted request in the original file
    pub positions: Vec<usize>,
    pub rejected: Vec<RequestError>,
}

/// Parse a batch from `[...]` or `{"requests": [...]}`
pub fn parse_batch(json: &str) -> Result<ParsedBatch, RequestError> {
    let root: Value = serde_json::from_str(json)?;
    let entries = match root {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => match fields.remove("requests") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(RequestError::NotABatch),
        },
        _ => return Err(RequestError::NotABatch),
    };

    let mut batch = ParsedBatch::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match parse_entry(index, entry) {
            Ok(request) => {
                batch.requests.push(request);
                batch.positions.push(index);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                batch.rejected.push(e);
            }
        }
    }

    Ok(batch)
}

fn parse_entry(index: usize, mut entry: Value) -> Result<ContentRequest, RequestError> {
    let kind = entry
        .get("content_type")
        .and_then(Value::as_str)
        .ok_or_else(|| RequestError::Malformed {
            index,
            message: "missing string field 'content_type'".to_string(),
        })?;

    let content_type = kind
        .parse::<ContentType>()
        .map_err(|_| RequestError::UnknownContentType {
            index,
            value: kind.to_string(),
        })?;

    // Same spellings as the CLI: "Image" and " audio " are accepted
    entry["content_type"] = Value::String(content_type.as_str().to_string());

    serde_json::from_value(entry).map_err(|e| RequestError::Malformed {
        index,
        message: e.to_string(),
    })
}
