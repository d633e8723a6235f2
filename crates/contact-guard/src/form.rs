//! Contact form state: the sanitized draft and its field errors

use crate::sanitize::sanitize;
use crate::types::{Field, FieldErrors, SubmissionDraft};
use crate::validate::Validator;

/// Form state owned by one guard.
///
/// Every write goes through [`ContactForm::handle_change`], so the draft only
/// ever holds sanitized text and the errors always match the draft.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    draft: SubmissionDraft,
    errors: FieldErrors,
    validator: Validator,
}

impl ContactForm {
    pub fn new(validator: Validator) -> Self {
        Self {
            draft: SubmissionDraft::default(),
            errors: FieldErrors::new(),
            validator,
        }
    }

    /// Handle a change event: sanitize, store, then recompute the field's error.
    ///
    /// Returns the field's error after the change.
    pub fn handle_change(&mut self, field: Field, raw: &str) -> Option<String> {
        let sanitized = sanitize(raw);
        let error = self.validator.live_error(field, &sanitized);
        self.draft.set(field, sanitized);
        self.errors.set(field, error.clone());
        error
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Run the submit-time check and mirror any failures into the error map.
    ///
    /// Returns the failing fields in form order.
    pub fn validate_for_submit(&mut self) -> Vec<Field> {
        let failures = self.validator.submit_errors(&self.draft);
        let fields = failures.iter().map(|(field, _)| *field).collect();
        for (field, message) in failures {
            self.errors.set(field, Some(message));
        }
        fields
    }

    /// Clear the draft and every error
    pub fn reset(&mut self) {
        self.draft = SubmissionDraft::default();
        self.errors.clear();
    }
}
