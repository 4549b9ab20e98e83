//! System font discovery

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Font style family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    /// Monospace, best for the terminal
    #[default]
    Mono,
    Sans,
    Serif,
}

const MONO_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
];

const SANS_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
];

const SERIF_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
];

impl FontFamily {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mono => "Mono",
            Self::Sans => "Sans",
            Self::Serif => "Serif",
        }
    }

    /// Well-known install locations, most preferred first
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Mono => MONO_PATHS,
            Self::Sans => SANS_PATHS,
            Self::Serif => SERIF_PATHS,
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown font family '{0}' (use mono, sans or serif)")]
pub struct ParseFontFamilyError(pub String);

impl FromStr for FontFamily {
    type Err = ParseFontFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mono" | "monospace" => Ok(Self::Mono),
            "sans" => Ok(Self::Sans),
            "serif" => Ok(Self::Serif),
            _ => Err(ParseFontFamilyError(s.to_string())),
        }
    }
}

/// First installed font of `family`
pub fn find_font(family: FontFamily) -> Option<PathBuf> {
    first_existing(family.candidates(), |p| p.is_file())
}

/// Font used when nothing else is configured
pub fn default_font() -> Option<PathBuf> {
    find_font(FontFamily::Sans).or_else(|| find_font(FontFamily::Mono))
}

fn first_existing<F>(candidates: &[&str], exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let found = candidates
        .iter()
        .map(Path::new)
        .find(|p| exists(p))
        .map(Path::to_path_buf);

    match &found {
        Some(path) => log::debug!("Using font {}", path.display()),
        None => log::debug!("None of {} candidate fonts installed", candidates.len()),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_family() {
        assert_eq!("mono".parse::<FontFamily>().unwrap(), FontFamily::Mono);
        assert_eq!("Serif".parse::<FontFamily>().unwrap(), FontFamily::Serif);
        assert!("gothic".parse::<FontFamily>().is_err());
    }

    #[test]
    fn test_first_existing_respects_order() {
        let found = first_existing(SANS_PATHS, |p| p.to_string_lossy().contains("Liberation"));
        assert_eq!(
            found,
            Some(PathBuf::from(
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"
            ))
        );
    }

    #[test]
    fn test_first_existing_none() {
        assert_eq!(first_existing(MONO_PATHS, |_| false), None);
    }

    #[test]
    fn test_find_font_returns_real_file() {
        if let Some(path) = find_font(FontFamily::Mono) {
            assert!(path.is_file());
        }
    }
}
