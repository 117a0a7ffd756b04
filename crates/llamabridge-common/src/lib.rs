use std::time::Duration;

use llamabridge_protocol::claude::types::{DEFAULT_ANTHROPIC_VERSION, DEFAULT_MESSAGES_ENDPOINT};
use serde::{Deserialize, Deserializer};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Claude, an AI assistant by Anthropic.";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: i64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key is required")]
    MissingApiKey,
    #[error("request timeout must be positive, got {0}s")]
    NonPositiveTimeout(i64),
    #[error("invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Final settings used by the running process. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub api_key: String,
    pub api_version: String,
    /// Full URL of the provider's messages endpoint.
    pub api_endpoint: String,
    /// Sent as `system` on every translated request; empty means omitted.
    pub system_prompt: String,
    pub default_model: String,
    pub request_timeout: Duration,
}

/// One layer of optional settings.
///
/// Merge order: defaults < config file < ENV/CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    #[serde(deserialize_with = "port_from_string_or_number")]
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub api_endpoint: Option<String>,
    pub system_prompt: Option<String>,
    pub default_model: Option<String>,
    pub request_timeout_secs: Option<i64>,
}

impl SettingsPatch {
    /// Built-in defaults. The API key has none.
    pub fn defaults() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            api_key: None,
            api_version: Some(DEFAULT_ANTHROPIC_VERSION.to_string()),
            api_endpoint: Some(DEFAULT_MESSAGES_ENDPOINT.to_string()),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            default_model: Some(DEFAULT_MODEL.to_string()),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn overlay(&mut self, other: SettingsPatch) {
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.api_version.is_some() {
            self.api_version = other.api_version;
        }
        if other.api_endpoint.is_some() {
            self.api_endpoint = other.api_endpoint;
        }
        if other.system_prompt.is_some() {
            self.system_prompt = other.system_prompt;
        }
        if other.default_model.is_some() {
            self.default_model = other.default_model;
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
    }

    /// Validates and freezes the merged layers. Fields left unset fall back
    /// to the built-in defaults.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let api_key = self
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let timeout_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs <= 0 {
            return Err(ConfigError::NonPositiveTimeout(timeout_secs));
        }

        Ok(Settings {
            port: self.port.unwrap_or(DEFAULT_PORT),
            api_key,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
            api_endpoint: self
                .api_endpoint
                .unwrap_or_else(|| DEFAULT_MESSAGES_ENDPOINT.to_string()),
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            default_model: self
                .default_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs.unsigned_abs()),
        })
    }
}

// Config files written for older builds carry the port as a string.
fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    match Option::<PortValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PortValue::Number(port)) => Ok(Some(port)),
        Some(PortValue::Text(raw)) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<u16>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid port value: {raw}")))
        }
    }
}
