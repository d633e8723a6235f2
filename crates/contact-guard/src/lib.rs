//! # Contact Guard
//!
//! Sanitization, validation and rate limiting for the portfolio contact form.
//!
//! Contact Guard sits between the contact form and the email delivery
//! service, making sure that:
//!
//! - **Injection**: HTML tags, `javascript:` URIs and inline event handlers
//!   never reach the stored draft
//! - **Bad input**: names, addresses, subjects and messages are checked on
//!   every keystroke and again at submit time
//! - **Spam**: one accepted submission per client every 30 seconds, tracked
//!   in durable storage so a reload does not reset it
//! - **Double submits**: a second submit while one is sending is rejected
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contact_guard::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GuardConfig::from_env()?;
//!     let guard = ContactGuard::builder()
//!         .with_config(config)
//!         .with_sender(Arc::new(LogSender))
//!         .with_store(Arc::new(MemoryStore::new()))
//!         .build();
//!
//!     guard.handle_change(Field::Name, "Ada Lovelace");
//!     guard.handle_change(Field::Email, "ada@example.com");
//!     guard.handle_change(Field::Subject, "Hello");
//!     guard.handle_change(Field::Message, "<b>Nice</b> portfolio!");
//!
//!     match guard.submit_now().await {
//!         Ok(payload) => println!("sent: {}", payload.subject),
//!         Err(err) => println!("rejected: {}", err.user_message()),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ Contact form │ ──► │ Contact Guard │ ──► │ EmailSender  │
//! └──────────────┘     │               │     └──────────────┘
//!                      │ ┌───────────┐ │
//!                      │ │ Sanitizer │ │
//!                      │ └───────────┘ │     ┌──────────────┐
//!                      │ ┌───────────┐ │ ──► │ Notifier     │
//!                      │ │ Validator │ │     └──────────────┘
//!                      │ └───────────┘ │
//!                      │ ┌───────────┐ │     ┌──────────────┐
//!                      │ │ Throttle  │ │ ◄─► │ KeyValueStore│
//!                      │ └───────────┘ │     └──────────────┘
//!                      └───────────────┘
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod guard;
pub mod notify;
pub mod rate_limit;
pub mod sanitize;
pub mod store;
pub mod types;
pub mod validate;

pub use config::GuardConfig;
pub use error::{ConfigError, DeliveryError, StoreError, SubmitError, SubmitResult};
pub use guard::{ContactGuard, GuardBuilder};
pub use sanitize::{sanitize, sanitize_value};
pub use types::*;
pub use validate::{validate_email, validate_message, validate_name, validate_subject};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::GuardConfig;
    #[cfg(feature = "emailjs")]
    pub use crate::dispatch::EmailJsSender;
    pub use crate::dispatch::{EmailSender, LogSender};
    pub use crate::error::{DeliveryError, StoreError, SubmitError, SubmitResult};
    pub use crate::guard::ContactGuard;
    pub use crate::notify::{ConsoleNotifier, Notifier, TracingNotifier};
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore};
    pub use crate::types::*;
}
