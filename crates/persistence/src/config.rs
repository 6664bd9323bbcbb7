//! Database configuration.
//!
//! [`DatabaseConfig`] carries every input of a bootstrap run: the store URI and
//! TLS material, the supported languages, the TTL durations, and the
//! provisioning retry policy. It deserializes from any serde format with
//! defaults for every field.
//!
//! ```
//! use movinin_persistence::DatabaseConfig;
//!
//! let config: DatabaseConfig = serde_json::from_str(
//!     r#"{"uri": "mongodb://127.0.0.1:27017/movinin", "languages": ["en", "fr"],
//!         "provision_base_delay": "250ms"}"#,
//! ).unwrap();
//!
//! assert_eq!(config.languages, vec!["en", "fr"]);
//! assert_eq!(config.provision_base_delay.as_millis(), 250);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::provision::RetryPolicy;
use crate::schema::{CANONICAL_LANGUAGE, ExpirySettings};

/// Configuration for connecting to and initializing the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store connection URI, including the database name.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Connect over TLS.
    #[serde(default)]
    pub ssl: bool,

    /// Client certificate and key file used when `ssl` is set.
    #[serde(default)]
    pub ssl_cert: Option<PathBuf>,

    /// Certificate authority file used when `ssl` is set.
    #[serde(default)]
    pub ssl_ca: Option<PathBuf>,

    /// Trace every store operation.
    #[serde(default)]
    pub debug: bool,

    /// Supported language codes. Must contain `en`.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Seconds before an unpaid booking expires.
    #[serde(default = "default_booking_expire_at")]
    pub booking_expire_at: u64,

    /// Seconds before an unverified user expires.
    #[serde(default = "default_user_expire_at")]
    pub user_expire_at: u64,

    /// Seconds before an auth token expires.
    #[serde(default = "default_token_expire_at")]
    pub token_expire_at: u64,

    /// Attempts per collection before provisioning fails.
    #[serde(default = "default_provision_retries")]
    pub provision_retries: u32,

    /// Delay before the second provisioning attempt; doubles afterwards.
    #[serde(with = "humantime_serde", default = "default_provision_base_delay")]
    pub provision_base_delay: Duration,

    /// Delete location values no location or country references.
    #[serde(default = "default_true")]
    pub reclaim_orphan_values: bool,
}

fn default_uri() -> String {
    "mongodb://127.0.0.1:27017/movinin?authSource=admin&appName=movinin".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "fr".to_string(), "es".to_string()]
}

fn default_booking_expire_at() -> u64 {
    86_400 // 1 day
}

fn default_user_expire_at() -> u64 {
    345_600 // 4 days
}

fn default_token_expire_at() -> u64 {
    86_400
}

fn default_provision_retries() -> u32 {
    3
}

fn default_provision_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            ssl: false,
            ssl_cert: None,
            ssl_ca: None,
            debug: false,
            languages: default_languages(),
            booking_expire_at: default_booking_expire_at(),
            user_expire_at: default_user_expire_at(),
            token_expire_at: default_token_expire_at(),
            provision_retries: default_provision_retries(),
            provision_base_delay: default_provision_base_delay(),
            reclaim_orphan_values: true,
        }
    }
}

impl DatabaseConfig {
    /// Creates a configuration for the given URI with default settings.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Sets the supported languages.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the provisioning retry policy.
    pub fn with_provisioning(mut self, retries: u32, base_delay: Duration) -> Self {
        self.provision_retries = retries;
        self.provision_base_delay = base_delay;
        self
    }

    /// Returns the TTL durations.
    pub fn expiry(&self) -> ExpirySettings {
        ExpirySettings {
            booking: self.booking_expire_at,
            user: self.user_expire_at,
            token: self.token_expire_at,
        }
    }

    /// Returns the provisioning retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.provision_retries,
            base_delay: self.provision_base_delay,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.uri.trim().is_empty() {
            errors.push("Database URI cannot be empty".to_string());
        }

        if self.languages.is_empty() {
            errors.push("At least one language must be configured".to_string());
        } else if !self.languages.iter().any(|l| l == CANONICAL_LANGUAGE) {
            errors.push(format!(
                "Languages must include '{}', the source for missing translations",
                CANONICAL_LANGUAGE
            ));
        }

        let mut seen = HashSet::new();
        for language in &self.languages {
            if !is_language_code(language) {
                errors.push(format!("Invalid language code '{}'", language));
            } else if !seen.insert(language.as_str()) {
                errors.push(format!("Duplicate language '{}'", language));
            }
        }

        if self.booking_expire_at == 0 {
            errors.push("Booking expiry cannot be 0".to_string());
        }

        if self.user_expire_at == 0 {
            errors.push("User expiry cannot be 0".to_string());
        }

        if self.token_expire_at == 0 {
            errors.push("Token expiry cannot be 0".to_string());
        }

        if self.provision_retries == 0 {
            errors.push("Provisioning retries cannot be 0".to_string());
        }

        if self.ssl {
            match &self.ssl_cert {
                None => errors.push("TLS is enabled but no certificate file is set".to_string()),
                Some(path) if !path.is_file() => {
                    errors.push(format!("TLS certificate file not found: {}", path.display()))
                }
                Some(_) => {}
            }
            match &self.ssl_ca {
                None => errors.push("TLS is enabled but no CA file is set".to_string()),
                Some(path) if !path.is_file() => {
                    errors.push(format!("TLS CA file not found: {}", path.display()))
                }
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_language_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 8
        && code.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        && !code.starts_with('-')
        && !code.ends_with('-')
}

/// Serde module for Duration with humantime format.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
