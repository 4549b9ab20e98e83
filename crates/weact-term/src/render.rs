//! Drawing the session onto the panel

use weact_core::{Align, Color, Display, DisplayError, TextService, Transport};

use crate::session::{Session, TermGeometry, MARGIN};

/// Top edge of the startup banner
const BANNER_TOP: i32 = 5;

/// Scrollback indicator in the top-right corner
const INDICATOR_WIDTH: i32 = 8;
const INDICATOR_HEIGHT: i32 = 6;
const INDICATOR_RIGHT_INSET: i32 = 10;

/// Startup information shown before the shell takes over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub font_name: String,
    pub font_size: u32,
    pub flip: bool,
}

impl Banner {
    /// Text lines paired with the character row they are drawn on
    pub fn lines(&self, geometry: TermGeometry) -> Vec<(i32, String)> {
        let flip = if self.flip { " flip" } else { "" };
        vec![
            (0, format!("{} {}pt{}", self.font_name, self.font_size, flip)),
            (1, format!("{}x{} chars", geometry.cols, geometry.rows)),
            (3, "PgUp=Scroll".to_string()),
            (4, "Ctrl+C=Exit".to_string()),
        ]
    }
}

/// Draw the visible window, the cursor or the scroll indicator, then update
pub fn render_session<T, S>(
    display: &mut Display<T>,
    text: &S,
    session: &Session,
) -> Result<(), DisplayError>
where
    T: Transport,
    S: TextService + ?Sized,
{
    display.clear(Color::BLACK);
    let geometry = session.geometry();

    for (i, row) in session.visible_window().enumerate() {
        let Some(line) = session.scrollback().line(row) else {
            continue;
        };
        if line.is_empty() {
            continue;
        }
        let y = MARGIN + i as i32 * geometry.char_height;
        text.draw(display, MARGIN, y, &line.text(), Color::WHITE, Align::Left);
    }

    if session.is_scrolling() {
        let x = display.width() as i32 - INDICATOR_RIGHT_INSET;
        display.draw_rect(x, MARGIN, INDICATOR_WIDTH, INDICATOR_HEIGHT, Color::YELLOW, true);
    } else {
        let col = session.scrollback().cursor_col() as i32;
        let row = session.cursor_screen_row() as i32;
        display.draw_rect(
            MARGIN + col * geometry.char_width,
            MARGIN + row * geometry.char_height,
            geometry.char_width,
            geometry.char_height,
            Color::GREEN,
            true,
        );
    }

    display.update()
}

/// Draw the startup banner and update
pub fn render_banner<T, S>(
    display: &mut Display<T>,
    text: &S,
    banner: &Banner,
    geometry: TermGeometry,
) -> Result<(), DisplayError>
where
    T: Transport,
    S: TextService + ?Sized,
{
    display.clear(Color::BLACK);
    for (row, line) in banner.lines(geometry) {
        let y = BANNER_TOP + row * geometry.char_height;
        text.draw(display, MARGIN, y, &line, Color::WHITE, Align::Left);
    }
    display.update()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weact_core::{MemoryTransport, PixelSink};

    use crate::session::SessionState;

    /// Draws every non-space character as a 2x2 block at the pen position
    struct BlockText;

    impl TextService for BlockText {
        fn measure(&self, text: &str) -> i32 {
            text.chars().filter(|&c| c != '\n').count() as i32 * 6
        }

        fn line_height(&self) -> i32 {
            10
        }

        fn advance(&self, _ch: char) -> i32 {
            6
        }

        fn draw(&self, sink: &mut dyn PixelSink, x: i32, y: i32, text: &str, color: Color, _align: Align) {
            for (i, ch) in text.chars().enumerate() {
                if ch != ' ' {
                    let px = x + i as i32 * 6;
                    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        sink.set_pixel(px + dx, y + dy, color);
                    }
                }
            }
        }
    }

    fn geometry() -> TermGeometry {
        TermGeometry::fit(6, 10, 160, 80)
    }

    fn display() -> Display<MemoryTransport> {
        let mut display = Display::with_transport(MemoryTransport::new(), "mem");
        display.transport_mut().clear();
        display
    }

    /// Pixel from the frame most recently sent
    fn sent_pixel(display: &Display<MemoryTransport>, x: usize, y: usize) -> Color {
        let payload = display.transport().last().unwrap();
        let offset = (y * 160 + x) * 2;
        Color(u16::from_be_bytes([payload[offset], payload[offset + 1]]))
    }

    #[test]
    fn test_cursor_and_text() {
        let mut display = display();
        let mut session = Session::new(geometry(), 100);
        session.set_state(SessionState::Running);
        session.feed(b"ab\ncd");

        render_session(&mut display, &BlockText, &session).unwrap();

        // Text rows start at the margin
        assert_eq!(sent_pixel(&display, 2, 2), Color::WHITE);
        assert_eq!(sent_pixel(&display, 2, 12), Color::WHITE);
        // Cursor after "cd" on the second row
        assert_eq!(sent_pixel(&display, 2 + 2 * 6, 12), Color::GREEN);
        assert_eq!(sent_pixel(&display, 2 + 2 * 6 + 5, 12 + 9), Color::GREEN);
        assert_eq!(sent_pixel(&display, 150, 2), Color::BLACK);
    }

    #[test]
    fn test_scroll_indicator_replaces_cursor() {
        let mut display = display();
        let mut session = Session::new(geometry(), 100);
        session.set_state(SessionState::Running);
        session.feed(&b"x\n".repeat(30));
        session.page_up();

        render_session(&mut display, &BlockText, &session).unwrap();

        assert_eq!(sent_pixel(&display, 150, 2), Color::YELLOW);
        assert_eq!(sent_pixel(&display, 157, 7), Color::YELLOW);
        let cursor_y = 2 + session.cursor_screen_row() * 10;
        assert_ne!(sent_pixel(&display, 2, cursor_y + 5), Color::GREEN);
    }

    #[test]
    fn test_render_flips_buffers() {
        let mut display = display();
        let session = Session::new(geometry(), 100);
        render_session(&mut display, &BlockText, &session).unwrap();
        assert_eq!(display.transport().sent.len(), 2);
        assert!(display.back_buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_banner_lines() {
        let banner = Banner {
            font_name: "Mono".into(),
            font_size: 10,
            flip: true,
        };
        let lines = banner.lines(geometry());
        assert_eq!(lines[0], (0, "Mono 10pt flip".to_string()));
        assert_eq!(lines[1], (1, "26x7 chars".to_string()));
        assert_eq!(lines[3], (4, "Ctrl+C=Exit".to_string()));

        let mut display = display();
        render_banner(&mut display, &BlockText, &banner, geometry()).unwrap();
        assert_eq!(sent_pixel(&display, 2, 5), Color::WHITE);
        assert_eq!(sent_pixel(&display, 2, 5 + 40), Color::WHITE);
    }
}
