//! Core types for Contact Guard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A contact form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    /// All fields, in form order
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    /// The field's key as used in the form and the email template
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Subject => "subject",
            Field::Message => "message",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "subject" => Ok(Field::Subject),
            "message" => Ok(Field::Message),
            other => Err(format!("unknown contact field: {other}")),
        }
    }
}

/// The in-progress form state.
///
/// Values are always post-sanitization; [`crate::form::ContactForm`] is the
/// only writer and sanitizes before storing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl SubmissionDraft {
    /// Get the value of a field
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    pub(crate) fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Subject => self.subject = value,
            Field::Message => self.message = value,
        }
    }

    /// Check if every field is empty
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// Build the email payload for this draft
    pub fn to_payload(&self) -> EmailPayload {
        EmailPayload {
            name: self.name.clone(),
            email: self.email.clone(),
            subject: self.subject.clone(),
            message: self.message.clone(),
        }
    }
}

/// Per-field error messages. A field with no entry is valid (or untouched).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    errors: BTreeMap<Field, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error message for a field, if it currently has one
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Set or clear the error for a field
    pub fn set(&mut self, field: Field, error: Option<String>) {
        match error {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over fields that have an error, in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Template parameters handed to the email service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// The three opaque identifiers the email service needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTarget {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

/// What the email service returned for a delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// HTTP status (or 200 for non-HTTP senders)
    pub status: u16,
    /// Response body text
    pub text: String,
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing message for the notification sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where a submission attempt currently is.
///
/// A guard sits in `Idle` between attempts. Terminal outcomes
/// (`Ok`, `RateLimited`, `ValidationFailed`, `DeliveryFailed`) always
/// return it to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptState {
    Idle,
    CheckingRateLimit,
    Validating,
    Dispatching,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trip_names() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
        assert!("phone".parse::<Field>().is_err());
    }

    #[test]
    fn test_field_errors_set_and_clear() {
        let mut errors = FieldErrors::new();
        errors.set(Field::Email, Some("bad".to_string()));
        errors.set(Field::Name, Some("worse".to_string()));
        assert_eq!(errors.get(Field::Email), Some("bad"));

        let order: Vec<Field> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(order, vec![Field::Name, Field::Email]);

        errors.set(Field::Email, None);
        assert_eq!(errors.get(Field::Email), None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_payload_serializes_template_keys() {
        let draft = SubmissionDraft {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hi".to_string(),
            message: "Hello".to_string(),
        };
        let json = serde_json::to_value(draft.to_payload()).unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["subject"], "Hi");
        assert_eq!(json["message"], "Hello");
    }
}
