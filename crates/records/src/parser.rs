//! Parser for saved candidate batches.
//!
//! Two document shapes are accepted:
//! - a bare JSON array of candidate records
//! - a search-provider response object carrying an `image_results` array
//!
//! A response object without `image_results` is a valid, empty batch; the
//! provider omits the key when it found nothing.

use crate::error::{RecordError, Result};
use crate::types::CandidateRecord;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Key under which the search provider returns its hits
pub const RESULTS_KEY: &str = "image_results";

/// Load a candidate batch from a JSON file.
pub fn load_candidates(path: &Path) -> Result<Vec<CandidateRecord>> {
    if !path.exists() {
        return Err(RecordError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_candidates(&content)
}

/// Parse a candidate batch from a JSON string.
pub fn parse_candidates(json: &str) -> Result<Vec<CandidateRecord>> {
    let document: Value = serde_json::from_str(json)?;
    candidates_from_value(document)
}

/// Extract the candidate batch from an already-decoded JSON document.
pub fn candidates_from_value(document: Value) -> Result<Vec<CandidateRecord>> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(RESULTS_KEY) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(RecordError::UnrecognizedShape(format!(
                    "`{}` is {}, expected an array",
                    RESULTS_KEY,
                    type_name(&other)
                )));
            }
            None => Vec::new(),
        },
        other => {
            return Err(RecordError::UnrecognizedShape(format!(
                "top level is {}, expected an array or object",
                type_name(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| RecordError::InvalidRecord {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
