//! Editor configuration.
//!
//! ## Learning: Serde Defaults
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! keys it changes and older files keep loading when new keys appear.
//!
//! ```toml
//! [editor]
//! undo_limit = 500
//! coalesce_window_ms = 1500
//!
//! [search]
//! enabled_searchers = ["hex", "text"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Undo, caret and layout settings
    pub editor: EditorConfig,

    /// Searcher selection
    pub search: SearchConfig,

    /// Clipboard decoding
    pub clipboard: ClipboardConfig,

    /// Extra metadata sidecar files
    pub metadata: MetadataConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("using default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("omnivore").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Editing behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo history limit (0 = unbounded)
    pub undo_limit: usize,

    /// Caret history limit (0 = unbounded)
    pub caret_history_limit: usize,

    /// Only coalesce edits this close together (0 = no time bound)
    pub coalesce_window_ms: u64,

    /// Byte written by the NOP fill
    pub nop_byte: u8,

    /// Grid width for rectangular selections and pastes
    pub bytes_per_row: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_limit: 1000,
            caret_history_limit: 100,
            coalesce_window_ms: 0,
            // 6502 NOP
            nop_byte: 0xea,
            bytes_per_row: 16,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Searcher names run by find, in order
    pub enabled_searchers: Vec<String>,

    /// Match text searches case-sensitively
    pub case_sensitive_text: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled_searchers: vec!["hex".to_string(), "text".to_string(), "comments".to_string()],
            case_sensitive_text: false,
        }
    }
}

/// Clipboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Accept the comma-prefixed formats of older releases
    pub accept_legacy: bool,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self { accept_legacy: true }
    }
}

/// Sidecar file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Extension appended to the data file name
    pub sidecar_extension: String,

    /// Indent the JSON body
    pub pretty_print: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            sidecar_extension: "omnivore".to_string(),
            pretty_print: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
