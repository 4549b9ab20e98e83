//! CLI argument parsing for weactterm

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use weact_app::{Config, FontFamily};

use crate::engine::EngineConfig;

/// Font sizes with a tested cell layout
pub const FONT_SIZES: [u32; 3] = [8, 10, 12];
const DEFAULT_FONT_SIZE: u32 = 10;

/// weactterm - Terminal console on the WeAct Display FS
#[derive(Parser, Debug)]
#[command(name = "weactterm")]
#[command(about = "Run a shell on the WeAct Display FS 0.96\" panel")]
#[command(version)]
pub struct Cli {
    /// Serial port of the display, e.g. /dev/ttyACM0
    #[arg(short = 'p', long = "port")]
    pub port: Option<String>,

    /// Font family: mono, sans or serif
    #[arg(short = 'f', long = "font")]
    pub font: Option<FontFamily>,

    /// Font size: 8, 10 or 12
    #[arg(short = 'z', long = "size")]
    pub size: Option<u32>,

    /// Rotate 180 degrees for an upside-down mount
    #[arg(short = 'l', long = "flip")]
    pub flip: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Command line merged over the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSettings {
    pub port: String,
    pub font: FontFamily,
    pub font_size: u32,
    pub flip: bool,
    pub shell: Option<String>,
    pub term: String,
    pub scrollback_lines: usize,
}

impl TermSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            shell: self.shell.clone(),
            args: Vec::new(),
            term: Some(self.term.clone()),
            scrollback_lines: self.scrollback_lines,
        }
    }
}

impl Cli {
    /// Merge flags over `config`; flags win
    pub fn resolve(&self, config: &Config) -> Result<TermSettings> {
        let Some(port) = self.port.clone().or_else(|| config.display.port.clone()) else {
            bail!("Port not specified. Use -p /dev/ttyACM0 or set display.port in the config file");
        };

        let requested = self.size.unwrap_or(config.terminal.font_size);
        let font_size = if FONT_SIZES.contains(&requested) {
            requested
        } else {
            log::warn!(
                "Invalid font size {}, using default ({})",
                requested,
                DEFAULT_FONT_SIZE
            );
            DEFAULT_FONT_SIZE
        };

        Ok(TermSettings {
            port,
            font: self.font.unwrap_or(config.terminal.font),
            font_size,
            flip: self.flip || config.terminal.flip,
            shell: config.terminal.shell.clone(),
            term: config.terminal.term.clone(),
            scrollback_lines: config.terminal.scrollback_lines,
        })
    }
}
