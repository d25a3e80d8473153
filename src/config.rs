use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::chain::provider::Provider;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub embedding_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub dimensions: Option<u32>,
    pub window: Option<usize>,
    pub show_usage: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let (path, profiles) = read_profiles()?;
    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Checks that the config file parses and, when a profile is named, that
/// the profile exists and carries a supported provider. Returns the path
/// that was checked.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let (path, profiles) = read_profiles()?;
    if let Some(name) = profile {
        let profile = profiles.get(name).ok_or_else(|| {
            format!(
                "Profile '{}' not found in config file '{}'.",
                name,
                path.display()
            )
        })?;
        if let Some(provider) = &profile.provider {
            Provider::parse(provider).ok_or_else(|| {
                format!(
                    "Invalid profile provider '{provider}'. Supported values: openai, fireworks."
                )
            })?;
        }
    }
    Ok(path)
}

fn read_profiles() -> Result<(PathBuf, HashMap<String, ProfileConfig>), String> {
    let path = config_path()?;
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;

    let config: ConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    let profiles = config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })?;

    Ok((path, profiles))
}

pub fn config_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var("MG_CONFIG") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed).join("menugen").join("config.toml"));
        }
    }

    let home = env::var("HOME").map_err(|_| {
        "Cannot resolve config path: set MG_CONFIG or HOME/XDG_CONFIG_HOME.".to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("menugen")
        .join("config.toml"))
}
