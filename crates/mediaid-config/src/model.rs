use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const API_BASE_URL_ENV: &str = "MEDIAID_API_BASE_URL";

/// Client-side settings for the intake wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "IntakeConfig::default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "IntakeConfig::default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "IntakeConfig::default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "IntakeConfig::default_remember_session")]
    pub remember_session: bool,
    #[serde(default)]
    pub accessibility: AccessibilitySettings,
    #[serde(default = "IntakeConfig::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::default_api_base_url(),
            search_limit: Self::default_search_limit(),
            search_debounce_ms: Self::default_search_debounce_ms(),
            request_timeout_secs: None,
            remember_session: Self::default_remember_session(),
            accessibility: AccessibilitySettings::default(),
            ui_color_enabled: Self::default_ui_color_enabled(),
        }
    }
}

impl IntakeConfig {
    pub fn default_api_base_url() -> String {
        DEFAULT_API_BASE_URL.into()
    }

    pub fn default_search_limit() -> usize {
        10
    }

    pub fn default_search_debounce_ms() -> u64 {
        300
    }

    pub fn default_remember_session() -> bool {
        true
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Validates and stores a new base URL.
    pub fn set_api_base_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let host = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "API base URL must start with http:// or https:// (got `{}`)",
                    raw.trim()
                ))
            })?;
        if host.is_empty() {
            return Err(ConfigError::Invalid("API base URL has no host".into()));
        }
        self.api_base_url = trimmed.to_string();
        Ok(())
    }

    /// Applies `MEDIAID_API_BASE_URL` when it is set to a usable value.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                let _ = self.set_api_base_url(&url);
            }
        }
        self
    }

    pub fn use_color(&self) -> bool {
        self.ui_color_enabled && !self.accessibility.plain_output
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilitySettings {
    #[serde(default)]
    pub plain_output: bool,
    #[serde(default)]
    pub high_contrast: bool,
}
