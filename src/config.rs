//! Editor configuration.
//!
//! Precedence is fixed: built-in defaults, then the TOML file, then
//! environment overrides, then validation.
//!
//! ```toml
//! [editor]
//! slot_label = "DROP A STEP HERE"
//! catalog_path = "catalog.yaml"
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::ConfigError;
use crate::projector::DEFAULT_SLOT_LABEL;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

const DEFAULT_LEVEL: &str = "info";

pub const ENV_LOG_LEVEL: &str = "STEPGRAPH_LOG";
pub const ENV_SLOT_LABEL: &str = "STEPGRAPH_SLOT_LABEL";

/// Resolved editor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Label rendered on placeholder slots.
    pub slot_label: String,
    /// Default tracing level for the bundled tools.
    pub log_level: String,
    /// Descriptor catalog to load, if any.
    pub catalog_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            slot_label: DEFAULT_SLOT_LABEL.to_string(),
            log_level: DEFAULT_LEVEL.to_string(),
            catalog_path: None,
        }
    }
}

impl EditorConfig {
    /// Loads `path` (skipped when absent) and applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// Like [`EditorConfig::load`], reading overrides through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EditorConfig::default();
        if let Some(path) = path {
            if let Some(file) = Self::load_from_file(path)? {
                config.apply(file);
            }
        }
        config.apply_env_overrides(lookup);
        config.validate()?;
        tracing::debug!(
            slot_label = %config.slot_label,
            log_level = %config.log_level,
            "editor config resolved"
        );
        Ok(config)
    }

    /// Parses a TOML document over the defaults, without environment overrides.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = EditorConfig::default();
        config.apply(parsed);
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Option<TomlConfig>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let parsed: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Ok(Some(parsed))
    }

    fn apply(&mut self, toml: TomlConfig) {
        if let Some(editor) = toml.editor {
            if let Some(label) = editor.slot_label {
                self.slot_label = label;
            }
            if let Some(catalog) = editor.catalog_path {
                self.catalog_path = Some(PathBuf::from(catalog));
            }
        }
        if let Some(level) = toml.logging.and_then(|logging| logging.level) {
            self.log_level = level;
        }
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
        if let Some(label) = lookup(ENV_SLOT_LABEL).filter(|v| !v.trim().is_empty()) {
            self.slot_label = label;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        LevelFilter::from_str(&self.log_level).map_err(|_| ConfigError::Invalid {
            key: "logging.level".to_string(),
            message: format!(
                "'{}' is not one of off, error, warn, info, debug, trace",
                self.log_level
            ),
        })?;
        if self.slot_label.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "editor.slot_label".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TomlConfig {
    editor: Option<TomlEditor>,
    logging: Option<TomlLogging>,
}

#[derive(Debug, Deserialize)]
struct TomlEditor {
    slot_label: Option<String>,
    catalog_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlLogging {
    level: Option<String>,
}
