//! Configuration management for the input pad model.
//!
//! This module handles loading, validating, and saving configuration in TOML
//! format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_CONFIG_DIR_NAME, DEFAULT_LAYOUT_DESCRIPTION, DEFAULT_MAX_GROUPS, DEFAULT_PART_START_ROWS,
    DEFAULT_REGISTRY_FILE,
};
use crate::parser::{system_pad_dir, user_pad_dir};
use crate::services::{KeyInsertionRule, TEXT_BACKEND};

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// System-wide pad definition directory
    #[serde(default = "system_pad_dir")]
    pub system_pad_dir: PathBuf,
    /// Per-user pad directory (defaults to `$HOME/.config/input-pad/pad`)
    #[serde(default)]
    pub user_pad_dir: Option<PathBuf>,
    /// xkeyboard-config registry file
    #[serde(default = "default_registry_file")]
    pub registry_file: PathBuf,
    /// Geometry dump to load instead of querying the host
    #[serde(default)]
    pub geometry_file: Option<PathBuf>,
}

fn default_registry_file() -> PathBuf {
    PathBuf::from(DEFAULT_REGISTRY_FILE)
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            system_pad_dir: system_pad_dir(),
            user_pad_dir: None,
            registry_file: default_registry_file(),
            geometry_file: None,
        }
    }
}

/// Pad loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadConfig {
    /// Message domain for translating pad labels
    #[serde(default = "default_translation_domain")]
    pub translation_domain: Option<String>,
    /// Also load pads from the per-user directory
    #[serde(default = "default_true")]
    pub load_user_pads: bool,
}

fn default_translation_domain() -> Option<String> {
    Some(APP_CONFIG_DIR_NAME.to_string())
}

const fn default_true() -> bool {
    true
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            translation_domain: default_translation_domain(),
            load_user_pads: true,
        }
    }
}

/// Keyboard model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Row indices where keyboard parts start
    #[serde(default = "default_part_start_rows")]
    pub part_start_rows: Vec<usize>,
    /// Drawing backend name
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Keys spliced in after traversal
    #[serde(default = "KeyInsertionRule::defaults")]
    pub insertion_rules: Vec<KeyInsertionRule>,
}

fn default_part_start_rows() -> Vec<usize> {
    DEFAULT_PART_START_ROWS.to_vec()
}

fn default_backend() -> String {
    TEXT_BACKEND.to_string()
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            part_start_rows: default_part_start_rows(),
            backend: default_backend(),
            insertion_rules: KeyInsertionRule::defaults(),
        }
    }
}

/// Layout registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Layout description listed first in the chooser
    #[serde(default = "default_layout_description")]
    pub default_layout_description: String,
    /// Maximum simultaneously active layout groups
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,
}

fn default_layout_description() -> String {
    DEFAULT_LAYOUT_DESCRIPTION.to_string()
}

const fn default_max_groups() -> usize {
    DEFAULT_MAX_GROUPS
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_layout_description: default_layout_description(),
            max_groups: default_max_groups(),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/input-pad/config.toml`
/// - macOS: `~/Library/Application Support/input-pad/config.toml`
/// - Windows: `%APPDATA%\input-pad\config.toml`
///
/// Every section and field is optional in the file; missing values take
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Pad loading
    #[serde(default)]
    pub pad: PadConfig,
    /// Keyboard model
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    /// Layout registry
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to `path` using temp file + rename.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .context(format!("Failed to create config directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, path).context(format!(
            "Failed to rename temp config file to: {}",
            path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    ///
    /// Checks:
    /// - `max_groups` is at least 1
    /// - insertion rules name two different, non-empty keys
    /// - the default layout description and backend name are not empty
    pub fn validate(&self) -> Result<()> {
        if self.registry.max_groups == 0 {
            anyhow::bail!("registry.max_groups must be at least 1");
        }

        if self.registry.default_layout_description.trim().is_empty() {
            anyhow::bail!("registry.default_layout_description must not be empty");
        }

        for rule in &self.keyboard.insertion_rules {
            if rule.new_key.is_empty() || rule.anchor.is_empty() {
                anyhow::bail!("Insertion rule has an empty key name: {:?}", rule);
            }
            if rule.new_key == rule.anchor {
                anyhow::bail!("Insertion rule anchors {} on itself", rule.new_key);
            }
        }

        if self.keyboard.backend.trim().is_empty() {
            anyhow::bail!("keyboard.backend must not be empty");
        }

        Ok(())
    }

    /// Per-user pad directory, or `None` when user pads are disabled.
    #[must_use]
    pub fn resolved_user_pad_dir(&self) -> Option<PathBuf> {
        if !self.pad.load_user_pads {
            return None;
        }
        Some(self.paths.user_pad_dir.clone().unwrap_or_else(user_pad_dir))
    }
}
