use crate::domain::{normalize_fields, RawRecord, VesselReport};
use crate::garde::validate_struct;
use serde_json::Value;
use thiserror::Error;

/// Why a single record was rejected by the schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// A record that cannot become a [`VesselReport`]. Always recoverable:
/// the caller skips the record and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("undecodable record: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Builds a [`VesselReport`] from an already normalized record.
///
/// Type checking and constraint checking happen together: a value is
/// returned only if both pass.
pub fn validate_record(record: RawRecord) -> Result<VesselReport, ValidationError> {
    let report: VesselReport =
        serde_json::from_value(Value::Object(record)).map_err(classify_serde_error)?;
    validate_struct(&report)?;
    Ok(report)
}

/// Normalizes and validates one decoded JSON value.
pub fn parse_record(value: Value) -> Result<VesselReport, RecordError> {
    match value {
        Value::Object(raw) => Ok(validate_record(normalize_fields(raw))?),
        other => Err(RecordError::Decode(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Decodes one line of newline-delimited JSON and validates it.
pub fn parse_line(line: &str) -> Result<VesselReport, RecordError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| RecordError::Decode(e.to_string()))?;
    parse_record(value)
}

fn classify_serde_error(err: serde_json::Error) -> ValidationError {
    let message = err.to_string();
    match message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        Some(field) => ValidationError::MissingField(field.to_string()),
        None => ValidationError::TypeMismatch(message),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
