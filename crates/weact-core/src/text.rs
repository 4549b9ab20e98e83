//! Text measurement and rendering
//!
//! Glyphs are rasterized with `ab_glyph` and written through a [`PixelSink`]
//! with a hard two-level coverage cutoff. The panel has no alpha channel, so
//! partially covered pixels are either drawn solid or left alone.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, PxScale, PxScaleFont, ScaleFont};

use crate::color::Color;
use crate::error::FontError;

pub const MIN_FONT_SIZE: u32 = 6;
pub const MAX_FONT_SIZE: u32 = 32;

/// Coverage below this is transparent
const TRANSPARENT_BELOW: u8 = 30;
/// Coverage above this is drawn
const OPAQUE_ABOVE: u8 = 128;

/// Extra pixels between lines in wrapped text
pub const WRAP_LINE_SPACING: i32 = 2;

/// Anything text can be drawn onto
pub trait PixelSink {
    /// Set one pixel; implementations ignore out-of-range coordinates
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);
    fn width(&self) -> usize;
    fn height(&self) -> usize;
}

/// Horizontal anchor for `TextService::draw`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Measuring and drawing text in a single font at a single size
pub trait TextService {
    /// Width in pixels of `text`; newlines contribute nothing
    fn measure(&self, text: &str) -> i32;

    /// Rounded ascent plus descent
    fn line_height(&self) -> i32;

    /// Horizontal advance of one character
    fn advance(&self, ch: char) -> i32;

    /// Draw `text` with its top edge at `y`
    fn draw(&self, sink: &mut dyn PixelSink, x: i32, y: i32, text: &str, color: Color, align: Align);

    fn word_wrap(&self, text: &str, max_width: i32) -> Vec<String> {
        wrap_words(text, max_width, |line| self.measure(line))
    }

    /// Draw word-wrapped text inside a box. Returns the number of lines drawn.
    #[allow(clippy::too_many_arguments)]
    fn draw_wrapped(
        &self,
        sink: &mut dyn PixelSink,
        x: i32,
        y: i32,
        max_width: i32,
        max_height: i32,
        text: &str,
        color: Color,
    ) -> usize {
        let line_height = self.line_height();
        let pitch = line_height + WRAP_LINE_SPACING;
        let mut current_y = y;
        let mut drawn = 0;

        for line in self.word_wrap(text, max_width) {
            if current_y + line_height > y + max_height {
                break;
            }
            self.draw(sink, x, current_y, &line, color, Align::Left);
            current_y += pitch;
            drawn += 1;
        }

        drawn
    }
}

/// Greedy word wrap.
///
/// Explicit newlines always break. Words are joined with a single space while
/// the line still fits in `max_width`; a word wider than `max_width` gets a
/// line of its own.
pub fn wrap_words<F>(text: &str, max_width: i32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> i32,
{
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{} {}", current, word);
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        lines.push(current);
    }

    lines
}

/// Outline font renderer
pub struct TextRenderer {
    font: FontVec,
    path: PathBuf,
    size: u32,
}

impl TextRenderer {
    /// Load a TrueType/OpenType font at an em size in pixels
    pub fn load(path: &Path, size: u32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let renderer = Self::from_bytes(data, path, size)?;
        log::debug!("Loaded font {} at {}px", path.display(), size);
        Ok(renderer)
    }

    /// Build a renderer from font data already in memory
    pub fn from_bytes(data: Vec<u8>, path: &Path, size: u32) -> Result<Self, FontError> {
        check_size(size)?;
        let font = FontVec::try_from_vec(data).map_err(|_| FontError::Invalid(path.to_path_buf()))?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
            size,
        })
    }

    pub fn set_size(&mut self, size: u32) -> Result<(), FontError> {
        check_size(size)?;
        self.size = size;
        Ok(())
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ab_glyph scales by line height; convert the em size to that
    fn scaled(&self) -> PxScaleFont<&FontVec> {
        let em = self.size as f32;
        let height = match self.font.units_per_em() {
            Some(units) if units > 0.0 => em * self.font.height_unscaled() / units,
            _ => em,
        };
        self.font.as_scaled(PxScale::from(height))
    }
}

fn check_size(size: u32) -> Result<(), FontError> {
    if (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(FontError::InvalidSize(size))
    }
}

impl TextService for TextRenderer {
    fn measure(&self, text: &str) -> i32 {
        let font = self.scaled();
        text.chars()
            .filter(|&ch| ch != '\n')
            .map(|ch| font.h_advance(font.glyph_id(ch)).round() as i32)
            .sum()
    }

    fn line_height(&self) -> i32 {
        let font = self.scaled();
        font.ascent().round() as i32 + (-font.descent()).round() as i32
    }

    fn advance(&self, ch: char) -> i32 {
        let font = self.scaled();
        font.h_advance(font.glyph_id(ch)).round() as i32
    }

    fn draw(&self, sink: &mut dyn PixelSink, x: i32, y: i32, text: &str, color: Color, align: Align) {
        let font = self.scaled();
        let line_height = self.line_height();

        let mut pen_x = match align {
            Align::Left => x,
            Align::Center => x - self.measure(text) / 2,
            Align::Right => x - self.measure(text),
        }
        .max(0);
        let mut baseline = y + font.ascent().round() as i32;

        for ch in text.chars() {
            if ch == '\n' {
                pen_x = x;
                baseline += line_height;
                continue;
            }

            let id = font.glyph_id(ch);
            let glyph = id.with_scale_and_position(font.scale(), point(pen_x as f32, baseline as f32));

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let (left, top) = (bounds.min.x as i32, bounds.min.y as i32);
                outlined.draw(|px, py, coverage| {
                    let value = (coverage * 255.0) as u8;
                    if value < TRANSPARENT_BELOW {
                        return;
                    }
                    if value > OPAQUE_ABOVE {
                        sink.set_pixel(left + px as i32, top + py as i32, color);
                    }
                });
            }

            pen_x += font.h_advance(id).round() as i32;
        }
    }
}
