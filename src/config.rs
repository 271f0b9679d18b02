//! Launcher configuration.
//!
//! A single JSON file names the engine commands and the working area. Relative
//! paths inside it are resolved against the directory holding the file, so a
//! config can travel together with its data directory.
use crate::engine::process::CommandSet;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Overrides the default config location.
pub const CONFIG_ENV: &str = "MLAUNCH_CONFIG";
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 2000;
pub const DEFAULT_ACTION_LABEL: &str = "Start media center";

const CONFIG_DIR_NAME: &str = "mlaunch";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    pub schema_version: u32,
    pub data_dir: String,
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    #[serde(default = "default_action_label")]
    pub action_label: String,
    pub engine: EngineCommandConfig,
}

/// Command lines for each engine operation, split with shell quoting rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineCommandConfig {
    pub compatibility: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditioning: Option<String>,
    pub configuration: String,
    pub service: String,
}

fn default_startup_delay_ms() -> u64 {
    DEFAULT_STARTUP_DELAY_MS
}

fn default_action_label() -> String {
    DEFAULT_ACTION_LABEL.to_string()
}

/// Build the config written by `init`.
///
/// The commands are placeholders that always succeed; operators replace them
/// with the real engine entry points.
pub fn default_config() -> LauncherConfig {
    LauncherConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        data_dir: DEFAULT_DATA_DIR.to_string(),
        startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
        action_label: DEFAULT_ACTION_LABEL.to_string(),
        engine: EngineCommandConfig {
            compatibility: "sh -c 'exit 0'".to_string(),
            conditioning: Some("true".to_string()),
            configuration: "sh -c 'echo default media configuration'".to_string(),
            service: "sh -c 'echo media service placeholder'".to_string(),
        },
    }
}

/// `$MLAUNCH_CONFIG`, else `<config_dir>/mlaunch/config.json`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow!("no config directory for this platform; pass --config"))?;
    Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config(path: &Path) -> Result<LauncherConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: LauncherConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse launcher config JSON {}", path.display()))?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &LauncherConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let mut text = serde_json::to_string_pretty(config).context("serialize launcher config")?;
    text.push('\n');
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &LauncherConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported launcher config schema_version {}",
            config.schema_version
        ));
    }
    if config.data_dir.trim().is_empty() {
        return Err(anyhow!("data_dir must be non-empty"));
    }
    if config.action_label.trim().is_empty() {
        return Err(anyhow!("action_label must be non-empty"));
    }
    command_set(&config.engine)?;
    Ok(())
}

/// Split every configured command line into argv form.
pub fn command_set(engine: &EngineCommandConfig) -> Result<CommandSet> {
    Ok(CommandSet {
        compatibility: split_command(&engine.compatibility, "engine.compatibility")?,
        conditioning: engine
            .conditioning
            .as_deref()
            .map(|line| split_command(line, "engine.conditioning"))
            .transpose()?,
        configuration: split_command(&engine.configuration, "engine.configuration")?,
        service: split_command(&engine.service, "engine.service")?,
    })
}

/// The data directory, with relative values anchored at the config file.
pub fn resolve_data_dir(config: &LauncherConfig, config_path: &Path) -> PathBuf {
    let data_dir = Path::new(&config.data_dir);
    if data_dir.is_absolute() {
        return data_dir.to_path_buf();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(data_dir)
}

fn split_command(line: &str, label: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(line).with_context(|| format!("parse {label} {line:?}"))?;
    if argv.is_empty() {
        return Err(anyhow!("{label} must name a command"));
    }
    Ok(argv)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
