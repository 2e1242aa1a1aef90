//! Field validation for the post form.
//!
//! Both text fields share one rule: after trimming, the value must be
//! non-empty and at least `MIN_FIELD_LEN` characters long. Failures are
//! reported per field so the form can show them next to the input.

use std::fmt;

use thiserror::Error;

/// Minimum trimmed length, in characters, of a title or description.
pub const MIN_FIELD_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => f.write_str("title"),
            Field::Description => f.write_str("description"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: Field },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: Field, min: usize },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required { field } | ValidationError::TooShort { field, .. } => *field,
        }
    }
}

/// Field-level errors collected from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field() == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Replace the error for `field` with the result of a fresh check.
    pub(crate) fn set(&mut self, field: Field, result: Result<(), ValidationError>) {
        self.errors.retain(|e| e.field() != field);
        if let Err(err) = result {
            self.errors.push(err);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_field(field: Field, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if trimmed.chars().count() < MIN_FIELD_LEN {
        return Err(ValidationError::TooShort {
            field,
            min: MIN_FIELD_LEN,
        });
    }
    Ok(())
}

/// Validate both fields, collecting every failure.
pub fn validate(title: &str, description: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.set(Field::Title, validate_field(Field::Title, title));
    errors.set(Field::Description, validate_field(Field::Description, description));
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_three_characters() {
        assert!(validate_field(Field::Title, "abc").is_ok());
    }

    #[test]
    fn two_characters_are_too_short() {
        assert_eq!(
            validate_field(Field::Title, "Hi"),
            Err(ValidationError::TooShort {
                field: Field::Title,
                min: 3
            })
        );
    }

    #[test]
    fn whitespace_does_not_count() {
        assert!(matches!(
            validate_field(Field::Description, "  ab  "),
            Err(ValidationError::TooShort { .. })
        ));
        assert_eq!(
            validate_field(Field::Description, "   "),
            Err(ValidationError::Required {
                field: Field::Description
            })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_field(Field::Title, "ñá").is_err());
        assert!(validate_field(Field::Title, "ñáé").is_ok());
    }

    #[test]
    fn validate_collects_both_fields() {
        let errors = validate("", "x").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors.get(Field::Title),
            Some(ValidationError::Required { .. })
        ));
        assert!(matches!(
            errors.get(Field::Description),
            Some(ValidationError::TooShort { .. })
        ));
    }

    #[test]
    fn set_replaces_previous_error() {
        let mut errors = validate("", "valid").unwrap_err();
        errors.set(Field::Title, validate_field(Field::Title, "fixed"));
        assert!(errors.is_empty());
    }

    #[test]
    fn display_joins_messages() {
        let errors = validate("a", "").unwrap_err();
        assert_eq!(
            errors.to_string(),
            "title must be at least 3 characters; description is required"
        );
    }
}
