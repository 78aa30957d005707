use crate::engine::ProcessingOptions;
use crate::github::milestones::StateFilter;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Configuration keys enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Repository,
    MinIssues,
    ReopenActive,
    DebugOnly,
    State,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Repository => "repository",
            ConfigKey::MinIssues => "min_issues",
            ConfigKey::ReopenActive => "reopen_active",
            ConfigKey::DebugOnly => "debug_only",
            ConfigKey::State => "state",
        }
    }

    /// Environment variable that overrides this key, if any.
    pub fn env_var(&self) -> &'static str {
        match self {
            ConfigKey::Repository => "GITHUB_REPOSITORY",
            ConfigKey::MinIssues => "MILESTONE_CLOSER_MIN_ISSUES",
            ConfigKey::ReopenActive => "MILESTONE_CLOSER_REOPEN_ACTIVE",
            ConfigKey::DebugOnly => "MILESTONE_CLOSER_DEBUG_ONLY",
            ConfigKey::State => "MILESTONE_CLOSER_STATE",
        }
    }

    /// Get all config keys
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::Repository,
            ConfigKey::MinIssues,
            ConfigKey::ReopenActive,
            ConfigKey::DebugOnly,
            ConfigKey::State,
        ]
    }
}

/// Filename for the project-specific configuration within the config directory.
pub const PROJECT_CONFIG_FILENAME: &str = "config.json";
/// Directory name for project-specific configuration.
pub const PROJECT_CONFIG_DIR: &str = ".milestone-closer";

/// Parses a JSON configuration file content into a map of configuration values.
///
/// - Returns an empty map if `content` is empty or whitespace only.
/// - Keys that are not a [`ConfigKey`] are skipped.
/// - Returns an `Err` if the JSON is invalid or is not an object.
pub fn parse_config(content: &[u8]) -> Result<HashMap<ConfigKey, Value>> {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(HashMap::new());
    }

    let value: Value = serde_json::from_slice(content).context("Failed to parse config JSON")?;

    let mut config_map = HashMap::new();

    if let Value::Object(map) = &value {
        for key in ConfigKey::all() {
            if let Some(val) = map.get(key.as_str()) {
                config_map.insert(*key, val.clone());
            }
        }
        return Ok(config_map);
    }

    Err(anyhow::anyhow!("Config must be a JSON object"))
}

/// Reads the project config file under `dir`. A missing file yields an empty map.
pub fn load_project_config(dir: &std::path::Path) -> Result<HashMap<ConfigKey, Value>> {
    let path = dir.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILENAME);
    let content = match std::fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    parse_config(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Collects overrides from environment variables.
///
/// Values are kept as strings; [`resolve`] accepts both JSON and string forms.
pub fn env_config(env: &HashMap<String, String>) -> HashMap<ConfigKey, Value> {
    ConfigKey::all()
        .iter()
        .filter_map(|key| {
            env.get(key.env_var())
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*key, Value::String(v.trim().to_string())))
        })
        .collect()
}

/// Merges `updates` into `base_config` and returns a new configuration map.
///
/// If a key exists in both, the value from `updates` wins.
pub fn update_config(
    base_config: &HashMap<ConfigKey, Value>,
    updates: &HashMap<ConfigKey, Value>,
) -> HashMap<ConfigKey, Value> {
    let mut new_config = base_config.clone();
    for (key, value) in updates {
        new_config.insert(*key, value.clone());
    }
    new_config
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repository: Option<String>,
    pub options: ProcessingOptions,
    pub state: StateFilter,
}

/// Turns a merged configuration map into [`Settings`], applying defaults.
pub fn resolve(config: &HashMap<ConfigKey, Value>) -> Result<Settings> {
    let defaults = ProcessingOptions::default();

    let repository = match config.get(&ConfigKey::Repository) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => return Err(anyhow::anyhow!("Invalid repository value: {other}")),
        None => None,
    };
    let min_issues = config
        .get(&ConfigKey::MinIssues)
        .map(|v| as_u64(ConfigKey::MinIssues, v))
        .transpose()?
        .unwrap_or(defaults.min_issues);
    let reopen_active = config
        .get(&ConfigKey::ReopenActive)
        .map(|v| as_bool(ConfigKey::ReopenActive, v))
        .transpose()?
        .unwrap_or(defaults.reopen_active);
    let debug_only = config
        .get(&ConfigKey::DebugOnly)
        .map(|v| as_bool(ConfigKey::DebugOnly, v))
        .transpose()?
        .unwrap_or(defaults.debug_only);
    let state = config
        .get(&ConfigKey::State)
        .map(as_state)
        .transpose()?
        .unwrap_or_default();

    Ok(Settings {
        repository,
        options: ProcessingOptions {
            min_issues,
            reopen_active,
            debug_only,
        },
        state,
    })
}

fn as_u64(key: ConfigKey, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid {} value: {value}. Expected a non-negative integer",
            key.as_str()
        )
    })
}

fn as_bool(key: ConfigKey, value: &Value) -> Result<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid {} value: {value}. Expected a boolean",
            key.as_str()
        )
    })
}

fn as_state(value: &Value) -> Result<StateFilter> {
    value
        .as_str()
        .and_then(StateFilter::parse)
        .with_context(|| format!("Invalid state value: {value}. Expected open, closed or all"))
}
