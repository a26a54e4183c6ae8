//! Configuration for the upload pipeline and the remote removal client

use crate::error::{CutoutError, Result};
use crate::messages::Locale;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public remove.bg endpoint
pub const REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Value shipped in sample env files; treated as "no key"
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "REMOVE_BG_API_KEY";

/// Largest accepted upload (10 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Simulated processing time of the mock path
pub const DEFAULT_MOCK_DELAY_MS: u64 = 1500;

/// Configuration for background removal uploads
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoutConfig {
    /// API key for the removal service (never serialized)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Endpoint receiving the multipart POST
    pub endpoint: String,

    /// Value of the `size` form field
    pub size_hint: String,

    /// Delay of the mock path in milliseconds
    pub mock_delay_ms: u64,

    /// Timeout for the whole remote request in seconds
    pub request_timeout_secs: u64,

    /// Largest accepted file size in bytes
    pub max_upload_bytes: u64,

    /// Language of alerts and prompts
    pub locale: Locale,
}

impl Default for CutoutConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: REMOVE_BG_ENDPOINT.to_string(),
            size_hint: "auto".to_string(),
            mock_delay_ms: DEFAULT_MOCK_DELAY_MS,
            request_timeout_secs: 60,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            locale: Locale::default(),
        }
    }
}

impl std::fmt::Debug for CutoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CutoutConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("size_hint", &self.size_hint)
            .field("mock_delay_ms", &self.mock_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("locale", &self.locale)
            .finish()
    }
}

impl CutoutConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bgcutout::CutoutConfig;
    ///
    /// let config = CutoutConfig::builder()
    ///     .api_key("secret")
    ///     .mock_delay_ms(250)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.credential(), Some("secret"));
    /// ```
    #[must_use]
    pub fn builder() -> CutoutConfigBuilder {
        CutoutConfigBuilder::default()
    }

    /// Default configuration with the API key taken from `REMOVE_BG_API_KEY`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        }
    }

    /// The usable credential, if any
    ///
    /// Absent, blank and placeholder keys all count as missing.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != API_KEY_PLACEHOLDER)
    }

    #[must_use]
    pub fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock_delay_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Endpoint is not an http(s) URL
    /// - Empty size hint
    /// - Zero request timeout or upload limit
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(CutoutError::invalid_config(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        if self.size_hint.trim().is_empty() {
            return Err(CutoutError::invalid_config("Size hint cannot be empty"));
        }

        if self.request_timeout_secs == 0 {
            return Err(CutoutError::config_value_error(
                "request timeout",
                self.request_timeout_secs,
                "1 or more seconds",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(CutoutError::config_value_error(
                "upload limit",
                self.max_upload_bytes,
                "1 or more bytes",
            ));
        }

        Ok(())
    }
}

/// Builder for [`CutoutConfig`]
#[derive(Debug, Default)]
pub struct CutoutConfigBuilder {
    config: CutoutConfig,
}

impl CutoutConfigBuilder {
    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn maybe_api_key(mut self, key: Option<String>) -> Self {
        self.config.api_key = key;
        self
    }

    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn size_hint<S: Into<String>>(mut self, size_hint: S) -> Self {
        self.config.size_hint = size_hint.into();
        self
    }

    #[must_use]
    pub fn mock_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.mock_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    /// Build the configuration, validating it first
    pub fn build(self) -> Result<CutoutConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
