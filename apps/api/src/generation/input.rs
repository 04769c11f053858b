//! Parsing of structured resume input (request bodies and offline input files).

use serde_json::{Map, Value};
use thiserror::Error;

use crate::errors::AppError;
use crate::models::section::ResumeInput;

/// Sections that must hold a list of structured entries.
const ENTRY_SECTIONS: [&str; 2] = ["experience", "education"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object describing the resume")]
    NotAnObject,

    #[error("'{field}': expected a JSON array or object, got {found}")]
    ExpectedEntries { field: String, found: &'static str },

    #[error("'{field}': each item must be a JSON object")]
    NonObjectItem { field: String },
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Parses raw JSON text into a `ResumeInput`.
pub fn parse_resume_input(raw: &str) -> Result<ResumeInput, InputError> {
    let value: Value = serde_json::from_str(raw)?;
    resume_input_from_value(value)
}

/// Validates entry sections, then deserializes the rest of the document.
///
/// An entry section given as a single object is wrapped into a one-element
/// list. Blank strings, `null` and `[]` count as absent.
pub fn resume_input_from_value(value: Value) -> Result<ResumeInput, InputError> {
    let Value::Object(mut map) = value else {
        return Err(InputError::NotAnObject);
    };

    for field in ENTRY_SECTIONS {
        let Some(raw) = map.remove(field) else {
            continue;
        };
        if let Some(entries) = entry_list(field, raw)? {
            map.insert(
                field.to_string(),
                Value::Array(entries.into_iter().map(Value::Object).collect()),
            );
        }
    }

    Ok(serde_json::from_value(Value::Object(map))?)
}

fn entry_list(field: &str, value: Value) -> Result<Option<Vec<Map<String, Value>>>, InputError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Object(entry) => Ok(Some(vec![entry])),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(entry) => Ok(entry),
                _ => Err(InputError::NonObjectItem {
                    field: field.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        other => Err(InputError::ExpectedEntries {
            field: field.to_string(),
            found: type_name(&other),
        }),
    }
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
