//! User-facing notifications

use crate::types::{Notice, NoticeLevel};
use tracing::{info, warn};

/// Fire-and-forget sink for success and error messages
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message, "Contact form notice"),
            NoticeLevel::Error => warn!(notice = %notice.message, "Contact form notice"),
        }
    }
}

/// Notifier that prints successes to stdout and errors to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("{}", notice.message),
        }
    }
}
