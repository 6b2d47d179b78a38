use crate::advisory::AdvisoryError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const TIMEOUT_ENV: &str = "GEMINI_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Extra attempts after a rate-limited or transport failure
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub temperature: Option<f32>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 500,
            temperature: None,
        }
    }
}

impl AdvisorConfig {
    /// Defaults overlaid with `GEMINI_API_KEY`, `GEMINI_MODEL` and
    /// `GEMINI_TIMEOUT_SECS`. A missing key is only reported once a client is built.
    pub fn from_env() -> Self {
        let mut config = Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        };

        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }

        if let Some(secs) = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.timeout_secs = secs;
        }

        config
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_key(&self) -> Result<&str, AdvisoryError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AdvisoryError::MissingCredential)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt) + 1))
    }
}
