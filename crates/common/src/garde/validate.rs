//! Garde validation utilities.

use crate::domain::ValidationError;
use garde::{Report, Validate};

/// Run garde rules and convert a failed report into a constraint violation
pub fn validate_struct<T>(value: &T) -> Result<(), ValidationError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| ValidationError::ConstraintViolation(format_validation_errors(&report)))
}

/// Format validation errors from garde Report into a human-readable string
pub fn format_validation_errors(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            if path.to_string().is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
