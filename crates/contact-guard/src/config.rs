//! Configuration for Contact Guard

use crate::error::ConfigError;
use crate::types::DispatchTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables for the dispatch identifiers. The first name of each
/// pair wins; the second is the name the Vite front end uses.
const SERVICE_ID_VARS: &[&str] = &["EMAILJS_SERVICE_ID", "VITE_SERVICE_KEY"];
const TEMPLATE_ID_VARS: &[&str] = &["EMAILJS_TEMPLATE_ID", "VITE_TEMPLATE_CONTACT_KEY"];
const PUBLIC_KEY_VARS: &[&str] = &["EMAILJS_PUBLIC_KEY", "VITE_PUBLIC_KEY"];
const MIN_INTERVAL_VAR: &str = "CONTACT_GUARD_MIN_INTERVAL_MS";
const STORE_PATH_VAR: &str = "CONTACT_GUARD_STORE_PATH";

/// Main configuration for the guard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Email delivery configuration
    pub dispatch: DispatchConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// Field validation configuration
    pub validation: ValidationConfig,
    /// Durable storage configuration
    pub storage: StorageConfig,
}

impl GuardConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = toml::from_str(&contents)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(value) = first(SERVICE_ID_VARS) {
            self.dispatch.service_id = value;
        }
        if let Some(value) = first(TEMPLATE_ID_VARS) {
            self.dispatch.template_id = value;
        }
        if let Some(value) = first(PUBLIC_KEY_VARS) {
            self.dispatch.public_key = value;
        }
        if let Some(value) = first(&[MIN_INTERVAL_VAR][..]) {
            self.rate_limit.min_interval_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: MIN_INTERVAL_VAR,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = first(&[STORE_PATH_VAR][..]) {
            self.storage.path = Some(PathBuf::from(value));
        }

        Ok(())
    }
}

/// Email delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// EmailJS service id
    pub service_id: String,
    /// EmailJS template id
    pub template_id: String,
    /// EmailJS public key (sent as `user_id`)
    pub public_key: String,
    /// EmailJS send endpoint
    pub api_endpoint: String,
    /// Timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            api_endpoint: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl DispatchConfig {
    /// The identifiers handed to the sender with each payload
    pub fn target(&self) -> DispatchTarget {
        DispatchTarget {
            service_id: self.service_id.clone(),
            template_id: self.template_id.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Minimum time between accepted submissions
    pub min_interval_ms: u64,
    /// Storage key for the last accepted submission time
    pub storage_key: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: 30_000,
            storage_key: "lastContactSubmission".to_string(),
        }
    }
}

/// Field validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Shortest accepted name
    pub name_min_len: usize,
    /// Longest accepted name
    pub name_max_len: usize,
    /// Longest accepted subject
    pub subject_max_len: usize,
    /// Longest accepted message
    pub message_max_len: usize,
    /// Reject empty fields at submit time
    pub require_all_fields: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_len: 2,
            name_max_len: 50,
            subject_max_len: 100,
            message_max_len: 1000,
            require_all_fields: true,
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File backing the key-value store. `None` uses the platform data dir.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved store location
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("contact-guard")
                .join("storage.json")
        })
    }
}
