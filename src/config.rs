//! Incubator configuration.
//!
//! The config file is optional. It names the model transport, where saved
//! ideas live, and whether full prompts are logged.
use crate::lm::{CommandClient, HttpClient, HttpModelConfig, ModelClient};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const LM_COMMAND_ENV: &str = "INCUBATOR_LM_COMMAND";
const APP_DIR: &str = "idea-incubator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncubatorConfig {
    pub schema_version: u32,

    /// Shell-style command that reads a prompt on stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpModelConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Store full prompts and responses next to the invocation log.
    #[serde(default)]
    pub verbose_log: bool,
}

pub fn default_config() -> IncubatorConfig {
    IncubatorConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        lm_command: None,
        http: None,
        store_path: None,
        verbose_log: false,
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}

pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("ideas.json")
}

/// Load and validate the config.
///
/// An explicit path must exist; the default location may be absent, in which
/// case the defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<IncubatorConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(default_config()),
        },
    };
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: IncubatorConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config {}", path.display()))?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub fn write_config(path: &Path, config: &IncubatorConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &IncubatorConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if let Some(command) = config.lm_command.as_deref() {
        if command.trim().is_empty() {
            return Err(anyhow!("lm_command must be non-empty when set"));
        }
    }
    if let Some(http) = &config.http {
        if http.endpoint.trim().is_empty() {
            return Err(anyhow!("http.endpoint must be non-empty"));
        }
        if http.model.trim().is_empty() {
            return Err(anyhow!("http.model must be non-empty"));
        }
        if http.api_key_env.trim().is_empty() {
            return Err(anyhow!("http.api_key_env must be non-empty"));
        }
        if http.timeout_secs == 0 {
            return Err(anyhow!("http.timeout_secs must be greater than zero"));
        }
    }
    Ok(())
}

/// Where the model client comes from, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Flag(String),
    ConfigCommand(String),
    ConfigHttp(HttpModelConfig),
    Env(String),
}

/// Pick the model source: `--lm`, then `lm_command`, then `http`, then the env var.
pub fn resolve_model_source(
    flag: Option<&str>,
    config: &IncubatorConfig,
    env_command: Option<String>,
) -> Result<ModelSource> {
    if let Some(command) = flag.filter(|command| !command.trim().is_empty()) {
        return Ok(ModelSource::Flag(command.to_string()));
    }
    if let Some(command) = config.lm_command.as_deref() {
        return Ok(ModelSource::ConfigCommand(command.to_string()));
    }
    if let Some(http) = &config.http {
        return Ok(ModelSource::ConfigHttp(http.clone()));
    }
    if let Some(command) = env_command.filter(|command| !command.trim().is_empty()) {
        return Ok(ModelSource::Env(command));
    }
    Err(anyhow!(
        "no model configured: pass --lm <command>, set lm_command or http in the config file, \
         or set {LM_COMMAND_ENV}"
    ))
}

pub fn build_model_client(source: &ModelSource) -> Result<Box<dyn ModelClient>> {
    let client: Box<dyn ModelClient> = match source {
        ModelSource::Flag(command) => {
            Box::new(CommandClient::new(command).context("resolve --lm command")?)
        }
        ModelSource::ConfigCommand(command) => {
            Box::new(CommandClient::new(command).context("resolve config lm_command")?)
        }
        ModelSource::Env(command) => Box::new(
            CommandClient::new(command).with_context(|| format!("resolve {LM_COMMAND_ENV}"))?,
        ),
        ModelSource::ConfigHttp(http) => {
            Box::new(HttpClient::new(http).context("configure http model client")?)
        }
    };
    Ok(client)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
