use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::speech::DEFAULT_LANGUAGE;
use crate::view::{DEFAULT_ASSET_DIR, DEFAULT_PLACEHOLDER};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "slidecast";

pub const KEYS: [&str; 4] = [
    "defaults.asset_dir",
    "defaults.placeholder",
    "defaults.language",
    "defaults.start_slide",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory next to the deck that holds its assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<String>,

    /// Image shown when a slide's hero image cannot be loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Narration language tag, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Slide to open on (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_slide: Option<usize>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `slidecast config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# slidecast configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn asset_dir(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.asset_dir.as_deref())
            .unwrap_or(DEFAULT_ASSET_DIR)
    }

    pub fn placeholder(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.placeholder.as_deref())
            .unwrap_or(DEFAULT_PLACEHOLDER)
    }

    pub fn language(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.language.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Zero-based start slide from the config, if set.
    pub fn start_slide(&self) -> Option<usize> {
        self.defaults
            .as_ref()
            .and_then(|d| d.start_slide)
            .map(|s| s.saturating_sub(1))
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.asset_dir" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Invalid asset_dir: must not be empty.");
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .asset_dir = Some(value.to_string());
            }
            "defaults.placeholder" => {
                if value.trim().is_empty() || value.contains(['/', '\\']) {
                    anyhow::bail!(
                        "Invalid placeholder: {value}. Must be a file name inside the asset directory."
                    );
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .placeholder = Some(value.to_string());
            }
            "defaults.language" => {
                let valid = !value.is_empty()
                    && value
                        .split('-')
                        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
                if !valid {
                    anyhow::bail!("Invalid language: {value}. Must be a tag such as 'en-US'.");
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .language = Some(value.to_string());
            }
            "defaults.start_slide" => {
                let slide = match value.parse::<usize>() {
                    Ok(n) if n >= 1 => n,
                    _ => anyhow::bail!(
                        "Invalid start_slide: {value}. Must be a slide number starting at 1."
                    ),
                };
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .start_slide = Some(slide);
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {}", KEYS.join(", ")),
        }
        Ok(())
    }
}
