//! Validation Error Types

use thiserror::Error;

/// Reasons a poll draft is rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title missing or blank.
    #[error("Please provide a title and at least two options.")]
    TitleRequired,

    /// Title longer than the allowed maximum.
    #[error("Title must not exceed {max} characters")]
    TitleTooLong { max: usize },

    /// Description longer than the allowed maximum.
    #[error("Description must not exceed {max} characters")]
    DescriptionTooLong { max: usize },

    /// Fewer non-blank options than required.
    #[error("Please provide a title and at least two options.")]
    TooFewOptions { min: usize, got: usize },

    /// More options than allowed.
    #[error("A poll can have at most {max} options")]
    TooManyOptions { max: usize },

    /// A single option text is too long.
    #[error("Option {position} must not exceed {max} characters")]
    OptionTooLong { position: usize, max: usize },
}

impl ValidationError {
    /// Machine-readable code for API responses.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TitleRequired => "title_required",
            Self::TitleTooLong { .. } => "title_too_long",
            Self::DescriptionTooLong { .. } => "description_too_long",
            Self::TooFewOptions { .. } => "too_few_options",
            Self::TooManyOptions { .. } => "too_many_options",
            Self::OptionTooLong { .. } => "option_too_long",
        }
    }
}

/// Every problem found in one poll draft, in the order they were checked.
///
/// Holds at least one error; the first one names the response code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{first}")]
pub struct DraftErrors {
    first: ValidationError,
    rest: Vec<ValidationError>,
}

impl DraftErrors {
    /// Collect errors, returning `None` when there are none.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        Some(Self {
            first,
            rest: errors.collect(),
        })
    }

    pub fn first(&self) -> &ValidationError {
        &self.first
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        std::iter::once(&self.first).chain(&self.rest)
    }

    /// Distinct messages, for a response's `details` list.
    pub fn messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = Vec::new();
        for message in self.iter().map(ToString::to_string) {
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
        messages
    }
}

impl From<ValidationError> for DraftErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            first: error,
            rest: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_is_not_an_error() {
        assert!(DraftErrors::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_messages_are_distinct_and_ordered() {
        let errors = DraftErrors::from_vec(vec![
            ValidationError::TitleRequired,
            ValidationError::TooFewOptions { min: 2, got: 0 },
            ValidationError::DescriptionTooLong { max: 2000 },
        ])
        .unwrap();

        assert_eq!(errors.first().code(), "title_required");
        assert_eq!(errors.to_string(), "Please provide a title and at least two options.");
        assert_eq!(
            errors.messages(),
            [
                "Please provide a title and at least two options.",
                "Description must not exceed 2000 characters",
            ]
        );
    }
}
