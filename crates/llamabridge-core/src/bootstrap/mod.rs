use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use llamabridge_common::{ConfigError, Settings, SettingsPatch};

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "llamabridge",
    version,
    about = "Ollama-compatible gateway for the Anthropic Messages API"
)]
pub struct CliArgs {
    /// JSON config file. Values in it override the built-in defaults.
    #[arg(long, env = "LLAMABRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen port.
    #[arg(long, env = "PORT")]
    pub port: Option<String>,

    /// Provider API key (required).
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Value of the `anthropic-version` header.
    #[arg(long, env = "CLAUDE_API_VERSION")]
    pub api_version: Option<String>,

    /// Full URL of the provider messages endpoint.
    #[arg(long, env = "CLAUDE_API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// System prompt attached to every translated request.
    #[arg(long, env = "CLAUDE_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Provider model used for unknown aliases.
    #[arg(long, env = "CLAUDE_DEFAULT_MODEL")]
    pub default_model: Option<String>,

    /// Upper bound for one provider call, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<String>,
}

pub fn settings_from_env() -> anyhow::Result<Settings> {
    load_settings(CliArgs::parse())
}

/// Merges defaults < config file < ENV/CLI and validates the result.
/// clap already applies CLI > ENV for each field.
pub fn load_settings(args: CliArgs) -> anyhow::Result<Settings> {
    let mut merged = SettingsPatch::defaults();

    if let Some(path) = args.config.as_deref() {
        merged.overlay(read_config_file(path)?);
    }
    merged.overlay(args_patch(&args)?);

    let settings = merged
        .into_settings()
        .context("finalize merged settings")?;
    Ok(settings)
}

pub fn read_config_file(path: &Path) -> anyhow::Result<SettingsPatch> {
    let raw = std::fs::read(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let patch = serde_json::from_slice(&raw)
        .with_context(|| format!("parse config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "config file loaded");
    Ok(patch)
}

fn args_patch(args: &CliArgs) -> Result<SettingsPatch, ConfigError> {
    Ok(SettingsPatch {
        port: parse_env_value::<u16>(args.port.clone(), "port")?,
        api_key: sanitize_optional_env_value(args.api_key.clone()),
        api_version: sanitize_optional_env_value(args.api_version.clone()),
        api_endpoint: sanitize_optional_env_value(args.api_endpoint.clone()),
        system_prompt: untrimmed_optional_env_value(args.system_prompt.clone()),
        default_model: sanitize_optional_env_value(args.default_model.clone()),
        request_timeout_secs: parse_env_value::<i64>(
            args.request_timeout_secs.clone(),
            "request_timeout_secs",
        )?,
    })
}

fn sanitize_optional_env_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Some PaaS systems inject unresolved placeholders like `${VAR}`.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

// Prompt whitespace is content; only blanks and placeholders are dropped.
fn untrimmed_optional_env_value(value: Option<String>) -> Option<String> {
    sanitize_optional_env_value(value.clone())?;
    value
}

fn parse_env_value<T: std::str::FromStr>(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { field, value: raw })
}
