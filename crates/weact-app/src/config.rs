//! `config.toml` shared by weactcli and weactterm
//!
//! Every section falls back to its defaults when missing, and command-line
//! flags override what is read here.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use weact_core::{Color, Orientation};

use crate::fonts::FontFamily;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No configuration directory for this user")]
    NoConfigDir,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Device settings
    pub display: DisplayConfig,
    /// weactcli settings
    pub text: TextConfig,
    /// weactterm settings
    pub terminal: TerminalConfig,
}

/// Device settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Serial port, e.g. /dev/ttyACM0
    pub port: Option<String>,
    /// Orientation applied by weactcli
    pub orientation: Orientation,
    /// Backlight level 0-255
    pub brightness: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            port: None,
            orientation: Orientation::Landscape,
            brightness: 255,
        }
    }
}

/// Text display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub color: Color,
    /// Snapped to 8, 12 or 16
    pub font_size: u32,
    /// Explicit font file (None = first installed sans font)
    pub font_path: Option<PathBuf>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            font_size: 12,
            font_path: None,
        }
    }
}

/// Terminal console settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerminalConfig {
    pub font: FontFamily,
    /// 8, 10 or 12
    pub font_size: u32,
    /// Shell to spawn (None = $SHELL)
    pub shell: Option<String>,
    /// TERM for the child
    pub term: String,
    /// Lines kept in scrollback
    pub scrollback_lines: usize,
    /// Mount the panel upside down (reverse landscape)
    pub flip: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            font: FontFamily::Mono,
            font_size: 10,
            shell: None,
            term: "vt100".into(),
            scrollback_lines: 100,
            flip: false,
        }
    }
}

/// Per-user config directory, e.g. ~/.config/weact on Linux
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "weact", "weact").map(|p| p.config_dir().to_path_buf())
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Defaults when no file exists yet
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;

    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    load_config_from(&path)
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    if let Some(ref font) = config.text.font_path {
        config.text.font_path = Some(expand_home(font));
    }

    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Expand a leading `~` to $HOME
fn expand_home(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    let home = || std::env::var_os("HOME").map(PathBuf::from);

    if s == "~" {
        home().unwrap_or_else(|| path.to_path_buf())
    } else if let Some(rest) = s.strip_prefix("~/") {
        home()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| path.to_path_buf())
    } else {
        path.to_path_buf()
    }
}
