//! Static and scrolling text on the panel

use std::time::{Duration, Instant};

use weact_core::{Align, Color, Display, DisplayError, TextService, Transport};

use crate::cli::{ScrollDirection, ScrollSpec};

/// Gap kept between text and the panel edge
const EDGE: i32 = 5;

/// How long static text stays up
pub const STATIC_HOLD: Duration = Duration::from_secs(2);

/// Pause between scroll frames (~30 fps)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Draw `text` once and hold it.
///
/// Text that fits on one line goes at the top-left margin, or in the middle
/// of the panel when `center` is set. Anything wider is word-wrapped into the
/// margin box, left-aligned.
pub fn show_static<T, S>(
    display: &mut Display<T>,
    font: &S,
    text: &str,
    color: Color,
    center: bool,
) -> Result<(), DisplayError>
where
    T: Transport,
    S: TextService + ?Sized,
{
    let (width, height) = (display.width() as i32, display.height() as i32);
    let text_width = font.measure(text);
    let text_height = font.line_height();
    log::debug!(
        "Text {}x{} px on a {}x{} panel",
        text_width,
        text_height,
        width,
        height
    );

    display.clear(Color::BLACK);

    if text_width <= width - 2 * EDGE {
        let (x, y) = if center {
            (((width - text_width) / 2).max(0), (height - text_height) / 2)
        } else {
            (EDGE, EDGE)
        };
        font.draw(display, x, y, text, color, Align::Left);
    } else {
        let lines = font.draw_wrapped(
            display,
            EDGE,
            EDGE,
            width - 2 * EDGE,
            height - 2 * EDGE,
            text,
            color,
        );
        log::debug!("Word-wrapped into {} lines", lines);
    }

    display.update()?;
    display.transport_mut().delay(STATIC_HOLD);
    Ok(())
}

/// Vertical scroll position with sub-pixel accumulation
#[derive(Debug, Clone, PartialEq)]
pub struct Scroller {
    direction: ScrollDirection,
    speed: f32,
    position: i32,
    end: i32,
    pending: f32,
}

impl Scroller {
    /// Text starts just off one edge and travels until it has left the other
    pub fn new(spec: ScrollSpec, panel_height: i32, text_height: i32) -> Self {
        let (position, end) = match spec.direction {
            ScrollDirection::Up => (panel_height, -text_height),
            ScrollDirection::Down => (-text_height, panel_height),
        };
        Self {
            direction: spec.direction,
            speed: spec.speed,
            position,
            end,
            pending: 0.0,
        }
    }

    /// Top edge of the text
    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn is_done(&self) -> bool {
        match self.direction {
            ScrollDirection::Up => self.position <= self.end,
            ScrollDirection::Down => self.position >= self.end,
        }
    }

    /// Move by whole pixels only; the fraction carries over
    pub fn advance(&mut self, elapsed: Duration) {
        self.pending += self.speed * elapsed.as_secs_f32();
        let whole = self.pending.trunc();
        if whole < 1.0 {
            return;
        }
        self.pending -= whole;
        match self.direction {
            ScrollDirection::Up => self.position -= whole as i32,
            ScrollDirection::Down => self.position += whole as i32,
        }
    }
}

/// Scroll `text` across the panel once, then blank it
pub fn show_scrolling<T, S>(
    display: &mut Display<T>,
    font: &S,
    text: &str,
    color: Color,
    spec: ScrollSpec,
    center: bool,
) -> Result<(), DisplayError>
where
    T: Transport,
    S: TextService + ?Sized,
{
    let width = display.width() as i32;
    let x = if center {
        (width - font.measure(text)) / 2
    } else {
        EDGE
    };
    let mut scroller = Scroller::new(spec, display.height() as i32, font.line_height());
    log::debug!(
        "Scrolling {:?} at {:.1} px/s from y={}",
        spec.direction,
        spec.speed,
        scroller.position()
    );

    let mut last = Instant::now();
    let mut frames = 0usize;
    while !scroller.is_done() {
        display.clear(Color::BLACK);
        font.draw(display, x, scroller.position(), text, color, Align::Left);
        display.update()?;
        frames += 1;

        display.transport_mut().delay(FRAME_INTERVAL);
        // A frame never counts for less than its pause
        let elapsed = last.elapsed().max(FRAME_INTERVAL);
        last = Instant::now();
        scroller.advance(elapsed);
    }
    log::debug!("Scroll finished after {} frames", frames);

    display.clear(Color::BLACK);
    display.update()
}
