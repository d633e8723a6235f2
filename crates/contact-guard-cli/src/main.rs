//! Command-line front end for the portfolio contact form
//!
//! Runs one submission through the same sanitize / validate / rate-limit
//! path the web form uses, then delivers it via EmailJS:
//!
//! ```text
//! EMAILJS_SERVICE_ID=service_x EMAILJS_TEMPLATE_ID=template_y EMAILJS_PUBLIC_KEY=key \
//!     contact-send --name "Ada Lovelace" --email ada@example.com \
//!                  --subject "Hello" --message "Nice portfolio!"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use contact_guard::dispatch::LogSender;
use contact_guard::notify::ConsoleNotifier;
use contact_guard::store::FileStore;
use contact_guard::{ContactGuard, Field, GuardConfig};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

/// Contact form CLI arguments
#[derive(Parser, Debug)]
#[command(name = "contact-send")]
#[command(about = "Send a contact-form message through the guard")]
struct Args {
    /// Sender name
    #[arg(long)]
    name: String,

    /// Sender email address
    #[arg(long)]
    email: String,

    /// Message subject
    #[arg(long)]
    subject: String,

    /// Message body (read from stdin when omitted)
    #[arg(long)]
    message: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Key-value store file holding the last submission time
    #[arg(long)]
    store: Option<PathBuf>,

    /// Validate and rate-limit, but log instead of sending
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GuardConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GuardConfig::from_env().context("reading configuration from environment")?,
    };
    if let Some(store) = &args.store {
        config.storage.path = Some(store.clone());
    }

    let store_path = config.storage.resolved_path();
    debug!(store = %store_path.display(), dry_run = args.dry_run, "Starting contact-send");

    let mut builder = ContactGuard::builder()
        .with_store(Arc::new(FileStore::new(store_path)))
        .with_notifier(Arc::new(ConsoleNotifier));
    if args.dry_run {
        builder = builder.with_sender(Arc::new(LogSender));
    }
    let guard = builder.with_config(config).build();

    let message = match args.message {
        Some(message) => message,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading message from stdin")?;
            buf
        }
    };

    guard.handle_change(Field::Name, &args.name);
    guard.handle_change(Field::Email, &args.email);
    guard.handle_change(Field::Subject, &args.subject);
    guard.handle_change(Field::Message, &message);

    match guard.submit_now().await {
        Ok(payload) => {
            info!(subject = %payload.subject, "Message sent");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            for (field, error) in guard.errors().iter() {
                eprintln!("  {field}: {error}");
            }
            debug!(error = %err, "Submission rejected");
            Ok(ExitCode::FAILURE)
        }
    }
}
