//! Newline-delimited JSON post records
//!
//! Two shapes are accepted, the listing wrapper and a bare post object:
//!
//! ```json
//! {"kind": "t3", "data": {"name": "t3_abc", "title": "...", "subreddit": "rust"}}
//! {"name": "t3_abc", "title": "...", "subreddit": "rust"}
//! ```

use crate::schema::PostRecord;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a line did not yield a post
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Wrapped record has no data object")]
    MissingData,

    #[error("Record has no post id")]
    MissingId,
}

impl RecordError {
    /// Parse errors are malformed input; the rest are structurally valid JSON
    /// that fails validation.
    pub fn is_parse(&self) -> bool {
        matches!(self, RecordError::Parse(_) | RecordError::NotAnObject)
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<PostRecord>, RecordError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(line)?;
    let object = value.as_object().ok_or(RecordError::NotAnObject)?;
    parse_object(object).map(Some)
}

/// Normalize a decoded record, unwrapping `{kind, data}` if present
pub fn parse_object(object: &Map<String, Value>) -> Result<PostRecord, RecordError> {
    let data = if object.contains_key("kind") {
        object
            .get("data")
            .and_then(Value::as_object)
            .ok_or(RecordError::MissingData)?
    } else {
        object
    };

    let id = non_empty(data, "name")
        .or_else(|| non_empty(data, "id"))
        .ok_or(RecordError::MissingId)?;

    Ok(PostRecord {
        id,
        title: string_field(data, "title"),
        selftext: string_field(data, "selftext"),
        created_utc: number_field(data, "created_utc") as i64,
        score: number_field(data, "score") as i64,
        num_comments: number_field(data, "num_comments") as i64,
        upvote_ratio: number_field(data, "upvote_ratio"),
        subreddit: non_empty(data, "subreddit"),
        author: non_empty(data, "author"),
    })
}

fn string_field(data: &Map<String, Value>, field: &str) -> String {
    match data.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn non_empty(data: &Map<String, Value>, field: &str) -> Option<String> {
    let value = string_field(data, field);
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Numbers may arrive as JSON numbers or numeric strings; anything else is zero
fn number_field(data: &Map<String, Value>, field: &str) -> f64 {
    match data.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
