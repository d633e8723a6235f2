//! Main ContactGuard implementation

use crate::config::{DispatchConfig, GuardConfig, RateLimitConfig, ValidationConfig};
use crate::dispatch::EmailSender;
use crate::error::{StoreError, SubmitError, SubmitResult};
use crate::form::ContactForm;
use crate::notify::{Notifier, TracingNotifier};
use crate::rate_limit::{RateLimitStatus, SubmissionThrottle};
use crate::store::{FileStore, KeyValueStore};
use crate::types::{AttemptState, EmailPayload, Field, FieldErrors, Notice, SubmissionDraft};
use crate::validate::Validator;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const SUCCESS_MESSAGE: &str = "Success! Please check your email.";

/// Main guard for one contact form.
///
/// Owns the form's draft and errors, checks the shared rate limit, and hands
/// accepted submissions to the email sender.
pub struct ContactGuard {
    config: GuardConfig,
    form: Mutex<ContactForm>,
    state: Mutex<AttemptState>,
    throttle: SubmissionThrottle,
    sender: Arc<dyn EmailSender>,
    notifier: Arc<dyn Notifier>,
}

impl ContactGuard {
    /// Create a new guard from its collaborators
    pub fn new(
        config: GuardConfig,
        sender: Arc<dyn EmailSender>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            form: Mutex::new(ContactForm::new(Validator::new(config.validation.clone()))),
            state: Mutex::new(AttemptState::Idle),
            throttle: SubmissionThrottle::new(config.rate_limit.clone(), store),
            sender,
            notifier,
            config,
        }
    }

    /// Create a builder for ContactGuard
    pub fn builder() -> GuardBuilder {
        GuardBuilder::new()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Handle a change event on one field.
    ///
    /// The raw value is sanitized before it is stored or validated. Returns
    /// the error now shown for the field, if any.
    pub fn handle_change(&self, field: Field, raw: &str) -> Option<String> {
        let error = self.lock_form().handle_change(field, raw);
        debug!(field = %field, valid = error.is_none(), "Field changed");
        error
    }

    /// Snapshot of the current draft
    pub fn draft(&self) -> SubmissionDraft {
        self.lock_form().draft().clone()
    }

    /// Snapshot of the current field errors
    pub fn errors(&self) -> FieldErrors {
        self.lock_form().errors().clone()
    }

    /// Where the current submission attempt is
    pub fn state(&self) -> AttemptState {
        *lock(&self.state)
    }

    /// Whether a submit at `now_ms` would pass the rate limit
    pub async fn rate_limit_status(&self, now_ms: i64) -> Result<RateLimitStatus, StoreError> {
        self.throttle.status(now_ms).await
    }

    /// Submit using the wall clock
    pub async fn submit_now(&self) -> SubmitResult<EmailPayload> {
        self.submit(chrono::Utc::now().timestamp_millis()).await
    }

    /// Submit the current draft as of `now_ms` (epoch milliseconds).
    ///
    /// This method:
    /// 1. Rejects the call if another submit is still in flight
    /// 2. Checks the rate limit
    /// 3. Re-validates every field
    /// 4. Dispatches the payload
    /// 5. On success resets the form and records the submission time
    ///
    /// Every outcome is also reported to the notifier. A failed delivery
    /// leaves the draft untouched so the user can retry.
    pub async fn submit(&self, now_ms: i64) -> SubmitResult<EmailPayload> {
        let Some(attempt) = Attempt::begin(&self.state) else {
            return Err(self.reject(SubmitError::AlreadyInFlight));
        };

        // Step 1: Rate limiting
        if let Err(err) = self.throttle.check(now_ms).await {
            return Err(self.reject(err));
        }

        // Step 2: Full validation against the current draft
        attempt.advance(AttemptState::Validating);
        let (failed, payload) = {
            let mut form = self.lock_form();
            let failed = form.validate_for_submit();
            (failed, form.draft().to_payload())
        };
        if !failed.is_empty() {
            return Err(self.reject(SubmitError::ValidationFailed { fields: failed }));
        }

        // Step 3: Dispatch
        attempt.advance(AttemptState::Dispatching);
        let submission = payload_hash(&payload);
        let target = self.config.dispatch.target();

        match self.sender.send(&target, &payload).await {
            Ok(receipt) => {
                self.lock_form().reset();

                if let Err(err) = self.throttle.record(now_ms).await {
                    // The message is already delivered; report success anyway
                    warn!(error = %err, "Failed to record submission time");
                }

                info!(
                    submission = %submission,
                    status = receipt.status,
                    response = %receipt.text,
                    "Contact submission delivered"
                );
                self.notifier.notify(Notice::success(SUCCESS_MESSAGE));
                Ok(payload)
            }
            Err(err) => {
                warn!(submission = %submission, error = %err, "Contact submission not delivered");
                Err(self.reject(SubmitError::DeliveryFailed(err)))
            }
        }
    }

    /// Log and notify a rejected attempt
    fn reject(&self, err: SubmitError) -> SubmitError {
        match &err {
            SubmitError::RateLimited { retry_after_ms } => {
                warn!(outcome = err.kind(), retry_after_ms, "Contact submission rejected");
            }
            SubmitError::ValidationFailed { fields } => {
                warn!(outcome = err.kind(), fields = ?fields, "Contact submission rejected");
            }
            SubmitError::DeliveryFailed(_) => {}
            _ => warn!(outcome = err.kind(), error = %err, "Contact submission rejected"),
        }
        self.notifier.notify(Notice::error(err.user_message()));
        err
    }

    fn lock_form(&self) -> MutexGuard<'_, ContactForm> {
        lock(&self.form)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hash a payload for logs (message content is never logged)
fn payload_hash(payload: &EmailPayload) -> String {
    let mut hasher = DefaultHasher::new();
    payload.email.hash(&mut hasher);
    payload.subject.hash(&mut hasher);
    payload.message.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// One submission attempt. Dropping it returns the guard to `Idle`,
/// including when the submit future is cancelled mid-dispatch.
struct Attempt<'a> {
    state: &'a Mutex<AttemptState>,
}

impl<'a> Attempt<'a> {
    fn begin(state: &'a Mutex<AttemptState>) -> Option<Self> {
        let mut current = lock(state);
        if *current != AttemptState::Idle {
            return None;
        }
        *current = AttemptState::CheckingRateLimit;
        Some(Self { state })
    }

    fn advance(&self, next: AttemptState) {
        *lock(self.state) = next;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        *lock(self.state) = AttemptState::Idle;
    }
}

/// Builder for ContactGuard
pub struct GuardBuilder {
    config: GuardConfig,
    sender: Option<Arc<dyn EmailSender>>,
    store: Option<Arc<dyn KeyValueStore>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl GuardBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: GuardConfig::default(),
            sender: None,
            store: None,
            notifier: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure email dispatch
    pub fn with_dispatch(mut self, config: DispatchConfig) -> Self {
        self.config.dispatch = config;
        self
    }

    /// Configure rate limiting
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Configure field validation
    pub fn with_validation(mut self, config: ValidationConfig) -> Self {
        self.config.validation = config;
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the guard.
    ///
    /// Unset collaborators default to the EmailJS sender (or the log sender
    /// without the `emailjs` feature), a file store at the configured path,
    /// and the tracing notifier.
    pub fn build(self) -> ContactGuard {
        let config = self.config;
        let sender = self.sender.unwrap_or_else(|| default_sender(&config.dispatch));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(FileStore::new(config.storage.resolved_path())));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        ContactGuard::new(config, sender, store, notifier)
    }
}

impl Default for GuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "emailjs")]
fn default_sender(config: &DispatchConfig) -> Arc<dyn EmailSender> {
    Arc::new(crate::dispatch::EmailJsSender::new(config))
}

#[cfg(not(feature = "emailjs"))]
fn default_sender(_config: &DispatchConfig) -> Arc<dyn EmailSender> {
    Arc::new(crate::dispatch::LogSender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::LogSender;
    use crate::store::MemoryStore;

    fn guard() -> ContactGuard {
        ContactGuard::builder()
            .with_dispatch(DispatchConfig {
                service_id: "service".to_string(),
                template_id: "template".to_string(),
                public_key: "key".to_string(),
                ..Default::default()
            })
            .with_sender(Arc::new(LogSender))
            .with_store(Arc::new(MemoryStore::new()))
            .build()
    }

    fn fill(guard: &ContactGuard) {
        guard.handle_change(Field::Name, "Ada Lovelace");
        guard.handle_change(Field::Email, "ada@example.com");
        guard.handle_change(Field::Subject, "Hello");
        guard.handle_change(Field::Message, "Loved the portfolio");
    }

    #[tokio::test]
    async fn test_submit_success_resets_form() {
        let guard = guard();
        fill(&guard);

        let payload = guard.submit(1_000_000).await.unwrap();
        assert_eq!(payload.name, "Ada Lovelace");
        assert!(guard.draft().is_empty());
        assert!(guard.errors().is_empty());
        assert_eq!(guard.state(), AttemptState::Idle);

        let status = guard.rate_limit_status(1_000_001).await.unwrap();
        assert_eq!(status.last_submission_at, Some(1_000_000));
        assert!(!status.allowed);
    }

    #[tokio::test]
    async fn test_attempt_returns_to_idle_after_rejection() {
        let guard = guard();
        let err = guard.submit(1).await.unwrap_err();
        assert!(matches!(err, SubmitError::ValidationFailed { .. }));
        assert_eq!(guard.state(), AttemptState::Idle);
    }

    #[test]
    fn test_attempt_is_exclusive() {
        let state = Mutex::new(AttemptState::Idle);
        let first = Attempt::begin(&state).unwrap();
        assert!(Attempt::begin(&state).is_none());
        first.advance(AttemptState::Dispatching);
        assert_eq!(*lock(&state), AttemptState::Dispatching);

        drop(first);
        assert_eq!(*lock(&state), AttemptState::Idle);
        assert!(Attempt::begin(&state).is_some());
    }

    #[test]
    fn test_payload_hash_stable() {
        let payload = EmailPayload {
            name: "a".to_string(),
            email: "b@c.de".to_string(),
            subject: "s".to_string(),
            message: "m".to_string(),
        };
        assert_eq!(payload_hash(&payload), payload_hash(&payload.clone()));
    }

    #[test]
    fn test_builder_applies_validation_limits() {
        let guard = ContactGuard::builder()
            .with_validation(ValidationConfig {
                subject_max_len: 5,
                ..Default::default()
            })
            .with_sender(Arc::new(LogSender))
            .with_store(Arc::new(MemoryStore::new()))
            .build();

        assert!(guard.handle_change(Field::Subject, "toolong").is_some());
        assert!(guard.handle_change(Field::Subject, "short").is_none());
    }
}
