//! weact-app: Shared application layer for the weact tools
//!
//! Configuration file handling and system font discovery used by both
//! `weactcli` and `weactterm`.

pub mod config;
pub mod fonts;

pub use config::{load_config, load_config_from, Config, ConfigError};
pub use fonts::{default_font, find_font, FontFamily};
