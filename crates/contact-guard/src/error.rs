//! Error types for Contact Guard

use crate::types::Field;
use thiserror::Error;

/// Result type alias for submission attempts
pub type SubmitResult<T> = std::result::Result<T, SubmitError>;

/// Why a submission attempt did not go through.
///
/// None of these are fatal; the guard stays usable after any of them.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// One or more fields failed validation
    #[error("Validation failed for: {}", join_fields(.fields))]
    ValidationFailed { fields: Vec<Field> },

    /// A submission was accepted too recently
    #[error("Rate limited: retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The email service did not accept the message
    #[error("Delivery failed: {0}")]
    DeliveryFailed(#[from] DeliveryError),

    /// Another submission on this guard is still being dispatched
    #[error("A submission is already in flight")]
    AlreadyInFlight,

    /// The rate-limit store could not be read
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SubmitError {
    /// Plain message for the notification sink
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::ValidationFailed { .. } => {
                "Please fix the errors in the form before submitting."
            }
            SubmitError::RateLimited { .. } => {
                "Please wait a moment before submitting another message."
            }
            SubmitError::DeliveryFailed(_) => "Error! Please try again.",
            SubmitError::AlreadyInFlight => "Your previous message is still sending. Please wait.",
            SubmitError::Storage(_) => "Something went wrong. Please try again later.",
        }
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::ValidationFailed { .. } => "validation_failed",
            SubmitError::RateLimited { .. } => "rate_limited",
            SubmitError::DeliveryFailed(_) => "delivery_failed",
            SubmitError::AlreadyInFlight => "already_in_flight",
            SubmitError::Storage(_) => "storage",
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Email delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A dispatch identifier was not configured
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    /// The service answered with a non-success status
    #[error("Rejected by email service (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The request never got a response
    #[error("Transport error: {0}")]
    Transport(String),
}

#[cfg(feature = "emailjs")]
impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transport(err.to_string())
    }
}

/// Durable storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override had an unusable value
    #[error("Invalid environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_fields() {
        let err = SubmitError::ValidationFailed {
            fields: vec![Field::Email, Field::Subject],
        };
        assert_eq!(err.to_string(), "Validation failed for: email, subject");
        assert_eq!(err.kind(), "validation_failed");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            SubmitError::RateLimited { retry_after_ms: 10 }.user_message(),
            "Please wait a moment before submitting another message."
        );
        let delivery = SubmitError::from(DeliveryError::Transport("timeout".to_string()));
        assert_eq!(delivery.user_message(), "Error! Please try again.");
    }
}
