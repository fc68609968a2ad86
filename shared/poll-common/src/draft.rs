//! Poll draft validation.
//!
//! A [`PollDraft`] is the validated form of user input for creating or
//! updating a poll. Building one performs every local check, so storage is
//! never reached with a poll that violates the minimum-option invariant.

use crate::error::{DraftErrors, ValidationError};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 20;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_OPTION_LENGTH: usize = 200;

/// Validated poll input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    title: String,
    description: Option<String>,
    options: Vec<String>,
}

impl PollDraft {
    /// Validate raw input, reporting every problem found.
    ///
    /// Title and options are trimmed; blank options are dropped before the
    /// minimum-option check; a blank description becomes `None`.
    pub fn new<I, S>(title: &str, description: Option<&str>, options: I) -> Result<Self, DraftErrors>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut errors = Vec::new();

        let title = title.trim();
        if title.is_empty() {
            errors.push(ValidationError::TitleRequired);
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(ValidationError::TitleTooLong {
                max: MAX_TITLE_LENGTH,
            });
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty());
        if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH) {
            errors.push(ValidationError::DescriptionTooLong {
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        let options: Vec<String> = options
            .into_iter()
            .map(|o| o.as_ref().trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if options.len() < MIN_OPTIONS {
            errors.push(ValidationError::TooFewOptions {
                min: MIN_OPTIONS,
                got: options.len(),
            });
        } else if options.len() > MAX_OPTIONS {
            errors.push(ValidationError::TooManyOptions { max: MAX_OPTIONS });
        }
        errors.extend(
            options
                .iter()
                .enumerate()
                .filter(|(_, o)| o.chars().count() > MAX_OPTION_LENGTH)
                .map(|(i, _)| ValidationError::OptionTooLong {
                    position: i + 1,
                    max: MAX_OPTION_LENGTH,
                }),
        );

        if let Some(errors) = DraftErrors::from_vec(errors) {
            return Err(errors);
        }

        Ok(Self {
            title: title.to_string(),
            description: description.map(str::to_string),
            options,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Option texts in display order.
    pub fn options(&self) -> &[String] {
        &self.options
    }
}
