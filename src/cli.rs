//! CLI argument parsing for weactcli

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use weact_app::Config;
use weact_core::{Color, Orientation};

/// Longest text accepted from a file or stdin, in bytes
pub const MAX_TEXT_LEN: u64 = 4096;

const DEFAULT_SCROLL_SPEED: f32 = 30.0;
const MAX_SCROLL_SPEED: f32 = 100.0;

/// weactcli - Show text on the WeAct Display FS
#[derive(Parser, Debug)]
#[command(name = "weactcli")]
#[command(about = "Show static or scrolling text on the WeAct Display FS 0.96\" panel")]
#[command(version)]
pub struct Cli {
    /// Serial port of the display, e.g. /dev/ttyACM0
    #[arg(short = 'p', long = "port")]
    pub port: Option<String>,

    /// Text color: a name, #RRGGBB, or a raw 0xNNNN value
    #[arg(short = 'c', long = "color")]
    pub color: Option<String>,

    /// Scroll vertically at SPEED px/s; append :u or :d for the direction
    #[arg(short = 's', long = "scroll", value_name = "SPEED[:DIR]")]
    pub scroll: Option<String>,

    /// Font size, snapped to 8, 12 or 16
    #[arg(short = 'z', long = "size", allow_negative_numbers = true)]
    pub size: Option<i32>,

    /// Read the text from a file
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Read the text from standard input
    #[arg(short = 'i', long = "stdin")]
    pub stdin: bool,

    /// Center the text
    #[arg(long = "center")]
    pub center: bool,

    /// Clear the screen and exit
    #[arg(long = "cls")]
    pub cls: bool,

    /// TrueType font to render with
    #[arg(long = "font")]
    pub font: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Text to show; words are joined with single spaces
    #[arg(value_name = "TEXT")]
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    /// Enter at the bottom, leave at the top
    #[default]
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSpec {
    /// Pixels per second
    pub speed: f32,
    pub direction: ScrollDirection,
}

impl ScrollSpec {
    /// Lenient parse of `SPEED[:DIR]`; bad values fall back with a warning
    pub fn parse(arg: &str) -> Self {
        let (speed_str, dir_str) = match arg.split_once(':') {
            Some((speed, dir)) => (speed, Some(dir)),
            None => (arg, None),
        };

        let speed = match speed_str.trim().parse::<f32>() {
            Ok(speed) if speed > 0.0 && speed <= MAX_SCROLL_SPEED => speed,
            _ => {
                log::warn!(
                    "Scroll speed '{}' out of range, using {:.1}",
                    speed_str,
                    DEFAULT_SCROLL_SPEED
                );
                DEFAULT_SCROLL_SPEED
            }
        };

        let direction = match dir_str.map(|d| d.chars().next().map(|c| c.to_ascii_lowercase())) {
            None => ScrollDirection::Up,
            Some(Some('u')) => ScrollDirection::Up,
            Some(Some('d')) => ScrollDirection::Down,
            Some(other) => {
                log::warn!("Unknown scroll direction {:?}, using up", other);
                ScrollDirection::Up
            }
        };

        Self { speed, direction }
    }
}

/// Where the text comes from, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    File(PathBuf),
    Stdin,
    Args(String),
}

/// Command line merged over the config file
#[derive(Debug, Clone, PartialEq)]
pub struct ShowSettings {
    pub port: String,
    pub color: Color,
    pub font_size: u32,
    pub font_path: Option<PathBuf>,
    pub center: bool,
    pub scroll: Option<ScrollSpec>,
    pub orientation: Orientation,
    pub brightness: u8,
}

impl Cli {
    /// Merge flags over `config`; flags win
    pub fn resolve(&self, config: &Config) -> Result<ShowSettings> {
        let Some(port) = self.port.clone().or_else(|| config.display.port.clone()) else {
            bail!("Port not specified. Use -p /dev/ttyACM0 or set display.port in the config file");
        };

        let color = match &self.color {
            Some(name) => parse_color(name),
            None => config.text.color,
        };

        let font_size = match self.size {
            Some(size) => snap_font_size(size),
            None => snap_font_size(config.text.font_size as i32),
        };

        Ok(ShowSettings {
            port,
            color,
            font_size,
            font_path: self.font.clone().or_else(|| config.text.font_path.clone()),
            center: self.center,
            scroll: self.scroll.as_deref().map(ScrollSpec::parse),
            orientation: config.display.orientation,
            brightness: config.display.brightness,
        })
    }

    /// Pick the text source. Arguments are only used when neither a file nor
    /// stdin applies; stdin counts when `-i` is given or it is not a terminal.
    pub fn source(&self, stdin_is_tty: bool) -> TextSource {
        if let Some(path) = &self.file {
            TextSource::File(path.clone())
        } else if self.stdin || !stdin_is_tty {
            TextSource::Stdin
        } else {
            TextSource::Args(self.text.join(" "))
        }
    }
}

/// Read the text for `source`, failing when there is nothing to show
pub fn load_text<R: Read>(source: &TextSource, stdin: R) -> Result<String> {
    let text = match source {
        TextSource::File(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Cannot open file '{}'", path.display()))?;
            let text = read_limited(file)
                .with_context(|| format!("Cannot read file '{}'", path.display()))?;
            log::debug!("Loaded {} bytes from {}", text.len(), path.display());
            text
        }
        TextSource::Stdin => {
            let text = read_limited(stdin).context("Cannot read stdin")?;
            if text.is_empty() {
                bail!("No input from stdin");
            }
            text
        }
        TextSource::Args(text) => text.clone(),
    };

    let text = text.trim_end_matches(['\n', '\r']).to_string();
    if text.is_empty() {
        bail!("No text specified");
    }
    Ok(text)
}

fn read_limited<R: Read>(reader: R) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    reader.take(MAX_TEXT_LEN).read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse a color, falling back to white
pub fn parse_color(name: &str) -> Color {
    name.parse().unwrap_or_else(|e| {
        log::warn!("{}, using white", e);
        Color::WHITE
    })
}

/// Snap a requested size onto one of the three supported sizes
pub fn snap_font_size(size: i32) -> u32 {
    if size <= 8 {
        8
    } else if size <= 12 {
        12
    } else {
        16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["weactcli", "-p", "/dev/ttyACM0", "Hello", "World"]);
        let settings = cli.resolve(&Config::default()).unwrap();
        assert_eq!(settings.port, "/dev/ttyACM0");
        assert_eq!(settings.color, Color::WHITE);
        assert_eq!(settings.font_size, 12);
        assert_eq!(settings.scroll, None);
        assert!(!settings.center);
        assert_eq!(cli.source(true), TextSource::Args("Hello World".into()));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::parse_from([
            "weactcli", "--port", "/dev/ttyUSB0", "-c", "red", "-s", "50:d", "-z", "14",
            "--center", "--font", "/tmp/f.ttf", "-v", "hi",
        ]);
        assert!(cli.verbose);
        let settings = cli.resolve(&Config::default()).unwrap();
        assert_eq!(settings.color, Color::RED);
        assert_eq!(settings.font_size, 16);
        assert!(settings.center);
        assert_eq!(settings.font_path, Some(PathBuf::from("/tmp/f.ttf")));
        assert_eq!(
            settings.scroll,
            Some(ScrollSpec {
                speed: 50.0,
                direction: ScrollDirection::Down
            })
        );
    }

    #[test]
    fn test_missing_port() {
        let cli = Cli::parse_from(["weactcli", "text"]);
        assert!(cli.resolve(&Config::default()).is_err());
    }

    #[test]
    fn test_config_fills_gaps() {
        let mut config = Config::default();
        config.display.port = Some("/dev/ttyACM1".into());
        config.display.brightness = 40;
        config.text.color = Color::CYAN;
        let settings = Cli::parse_from(["weactcli"]).resolve(&config).unwrap();
        assert_eq!(settings.port, "/dev/ttyACM1");
        assert_eq!(settings.color, Color::CYAN);
        assert_eq!(settings.brightness, 40);
    }

    #[test]
    fn test_unknown_color_is_white() {
        assert_eq!(parse_color("mauve"), Color::WHITE);
        assert_eq!(parse_color("Yellow"), Color::YELLOW);
    }

    #[test]
    fn test_snap_font_size() {
        assert_eq!(snap_font_size(-3), 8);
        assert_eq!(snap_font_size(8), 8);
        assert_eq!(snap_font_size(9), 12);
        assert_eq!(snap_font_size(12), 12);
        assert_eq!(snap_font_size(13), 16);
        assert_eq!(snap_font_size(72), 16);
    }

    #[test]
    fn test_scroll_spec() {
        let spec = ScrollSpec::parse("20");
        assert_eq!(spec.speed, 20.0);
        assert_eq!(spec.direction, ScrollDirection::Up);

        assert_eq!(ScrollSpec::parse("0").speed, 30.0);
        assert_eq!(ScrollSpec::parse("101").speed, 30.0);
        assert_eq!(ScrollSpec::parse("fast").speed, 30.0);
        assert_eq!(ScrollSpec::parse("100:D").direction, ScrollDirection::Down);
        assert_eq!(ScrollSpec::parse("10:x").direction, ScrollDirection::Up);
    }

    #[test]
    fn test_source_priority() {
        let cli = Cli::parse_from(["weactcli", "-f", "notes.txt", "-i", "ignored"]);
        assert_eq!(cli.source(true), TextSource::File("notes.txt".into()));

        let cli = Cli::parse_from(["weactcli", "-i", "ignored"]);
        assert_eq!(cli.source(true), TextSource::Stdin);

        // A pipe on stdin wins over arguments
        let cli = Cli::parse_from(["weactcli", "words"]);
        assert_eq!(cli.source(false), TextSource::Stdin);
    }

    #[test]
    fn test_load_text_from_stdin() {
        let text = load_text(&TextSource::Stdin, Cursor::new("line one\nline two\n")).unwrap();
        assert_eq!(text, "line one\nline two");
        assert!(load_text(&TextSource::Stdin, Cursor::new("")).is_err());
    }

    #[test]
    fn test_load_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg.txt");
        std::fs::write(&path, "from a file\n").unwrap();

        let text = load_text(&TextSource::File(path), std::io::empty()).unwrap();
        assert_eq!(text, "from a file");

        let missing = TextSource::File(dir.path().join("nope.txt"));
        assert!(load_text(&missing, std::io::empty()).is_err());
    }

    #[test]
    fn test_load_text_is_capped() {
        let long = "x".repeat(10_000);
        let text = load_text(&TextSource::Stdin, Cursor::new(long)).unwrap();
        assert_eq!(text.len(), MAX_TEXT_LEN as usize);
    }

    #[test]
    fn test_empty_args_rejected() {
        assert!(load_text(&TextSource::Args(String::new()), std::io::empty()).is_err());
    }
}
