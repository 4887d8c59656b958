//! Field-level validation built on the `validator` derive.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// A single violated constraint, addressed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Run the declared constraints of `value` and flatten any violations.
///
/// Errors are ordered by field name, then message, so responses are stable.
pub fn validate<T: Validate>(value: &T) -> Result<(), Vec<FieldError>> {
    value.validate().map_err(flatten)
}

fn flatten(errors: ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(field.to_string(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

/// Builds a "not empty" check carrying `message`.
pub(crate) fn require_non_empty(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("not_empty");
        err.message = Some(Cow::Borrowed(message));
        return Err(err);
    }
    Ok(())
}
