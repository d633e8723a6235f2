//! Field validation rules and error messages

use crate::config::ValidationConfig;
use crate::types::{Field, SubmissionDraft};
use once_cell::sync::Lazy;
use regex::Regex;

// Letters, whitespace, hyphens, apostrophes and periods
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-'.]+$").expect("name pattern"));

// local@domain.tld, no whitespace, a dot somewhere after the @
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Check a name with the default limits
pub fn validate_name(name: &str) -> bool {
    Validator::default().is_valid(Field::Name, name)
}

/// Check an email address
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Check a subject with the default limit
pub fn validate_subject(subject: &str) -> bool {
    Validator::default().is_valid(Field::Subject, subject)
}

/// Check a message with the default limit
pub fn validate_message(message: &str) -> bool {
    Validator::default().is_valid(Field::Message, message)
}

/// Field validator.
///
/// `is_valid` is the single rule set; [`Validator::live_error`] and
/// [`Validator::submit_errors`] only differ in how they treat empty values.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check an already-sanitized value against its field's rule
    pub fn is_valid(&self, field: Field, value: &str) -> bool {
        let len = value.chars().count();
        match field {
            Field::Name => {
                NAME_PATTERN.is_match(value)
                    && len >= self.config.name_min_len
                    && len <= self.config.name_max_len
            }
            Field::Email => EMAIL_PATTERN.is_match(value),
            Field::Subject => len <= self.config.subject_max_len,
            Field::Message => len <= self.config.message_max_len,
        }
    }

    /// Message shown under a field that fails its rule
    pub fn message_for(&self, field: Field) -> String {
        match field {
            Field::Name => {
                "Please enter a valid name (letters, spaces, hyphens, apostrophes only)".to_string()
            }
            Field::Email => "Please enter a valid email address".to_string(),
            Field::Subject => format!(
                "Subject must be {} characters or less",
                self.config.subject_max_len
            ),
            Field::Message => format!(
                "Message must be {} characters or less",
                self.config.message_max_len
            ),
        }
    }

    /// Per-keystroke feedback. An empty field is not flagged yet.
    pub fn live_error(&self, field: Field, value: &str) -> Option<String> {
        if !value.is_empty() && !self.is_valid(field, value) {
            Some(self.message_for(field))
        } else {
            None
        }
    }

    /// Submit-time check of every field, in form order
    pub fn submit_errors(&self, draft: &SubmissionDraft) -> Vec<(Field, String)> {
        Field::ALL
            .iter()
            .filter_map(|&field| {
                let value = draft.get(field);
                if value.is_empty() && self.config.require_all_fields {
                    Some((field, required_message(field)))
                } else if !self.is_valid(field, value) {
                    Some((field, self.message_for(field)))
                } else {
                    None
                }
            })
            .collect()
    }
}

fn required_message(field: Field) -> String {
    let label = match field {
        Field::Name => "Name",
        Field::Email => "Email",
        Field::Subject => "Subject",
        Field::Message => "Message",
    };
    format!("{label} is required")
}
