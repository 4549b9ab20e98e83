//! Terminal session state
//!
//! Everything the event loop mutates lives here: the scrollback, the output
//! parser, the scroll position and the live/scrollback mode. Keeping it free
//! of I/O lets key handling and windowing be tested directly.

use std::ops::RangeInclusive;

use crate::parser::Parser;
use crate::scrollback::{ScrollbackBuffer, LINE_CAPACITY};

/// Margin in pixels around the text area
pub const MARGIN: i32 = 2;

const MIN_COLS: usize = 10;
const MAX_COLS: usize = LINE_CAPACITY;
const MIN_ROWS: usize = 4;
const MAX_ROWS: usize = 20;

const CTRL_C: u8 = 0x03;
const PAGE_UP: &[u8] = b"\x1b[5~";
const PAGE_DOWN: &[u8] = b"\x1b[6~";

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    /// Live view following the cursor
    Running,
    /// Browsing history; keyboard input is not forwarded
    Scrollback,
    Exiting,
}

/// Character grid derived from the font and the panel size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermGeometry {
    pub cols: usize,
    pub rows: usize,
    pub char_width: i32,
    pub char_height: i32,
}

impl TermGeometry {
    /// Fit character cells into the panel, leaving a margin on every side
    pub fn fit(char_width: i32, char_height: i32, display_width: usize, display_height: usize) -> Self {
        let char_width = char_width.max(1);
        let char_height = char_height.max(1);
        let usable_w = (display_width as i32 - 2 * MARGIN).max(0) as usize;
        let usable_h = (display_height as i32 - 2 * MARGIN).max(0) as usize;

        Self {
            cols: (usable_w / char_width as usize).clamp(MIN_COLS, MAX_COLS),
            rows: (usable_h / char_height as usize).clamp(MIN_ROWS, MAX_ROWS),
            char_width,
            char_height,
        }
    }
}

/// What the engine should do after a key read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// End the session
    Quit,
    /// Scroll state changed; render again
    Redraw,
    /// Write the input to the child
    Forward,
    /// Drop the input
    Ignore,
}

/// A terminal session
pub struct Session {
    scrollback: ScrollbackBuffer,
    parser: Parser,
    geometry: TermGeometry,
    view_offset: usize,
    state: SessionState,
}

impl Session {
    pub fn new(mut geometry: TermGeometry, scrollback_lines: usize) -> Self {
        // A grid needs at least one cell
        geometry.rows = geometry.rows.max(1);
        geometry.cols = geometry.cols.max(1);
        Self {
            scrollback: ScrollbackBuffer::new(scrollback_lines, geometry.cols),
            parser: Parser::new(),
            geometry,
            view_offset: 0,
            state: SessionState::Starting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::debug!("Session state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn geometry(&self) -> TermGeometry {
        self.geometry
    }

    pub fn scrollback(&self) -> &ScrollbackBuffer {
        &self.scrollback
    }

    pub fn view_offset(&self) -> usize {
        self.view_offset
    }

    pub fn is_scrolling(&self) -> bool {
        self.state == SessionState::Scrollback
    }

    /// Apply output read from the child
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.parse(&mut self.scrollback, bytes);
    }

    /// Classify one keyboard read
    pub fn handle_key(&mut self, input: &[u8]) -> KeyAction {
        if input.first() == Some(&CTRL_C) {
            self.set_state(SessionState::Exiting);
            return KeyAction::Quit;
        }

        if input.starts_with(PAGE_UP) {
            self.page_up();
            return KeyAction::Redraw;
        }

        if input.starts_with(PAGE_DOWN) && self.is_scrolling() {
            self.page_down();
            return KeyAction::Redraw;
        }

        if input.first() == Some(&b'q') && self.is_scrolling() {
            self.exit_scrollback();
            return KeyAction::Redraw;
        }

        if self.is_scrolling() {
            KeyAction::Ignore
        } else {
            KeyAction::Forward
        }
    }

    /// Scroll back one page, entering scrollback mode if needed
    pub fn page_up(&mut self) {
        if !self.is_scrolling() {
            self.set_state(SessionState::Scrollback);
            self.view_offset = 0;
        }
        self.view_offset = (self.view_offset + self.geometry.rows).min(self.scrollback.cursor_row());
    }

    /// Scroll forward one page; reaching the live view leaves scrollback mode
    pub fn page_down(&mut self) {
        if !self.is_scrolling() {
            return;
        }
        if self.view_offset <= self.geometry.rows {
            self.exit_scrollback();
        } else {
            self.view_offset -= self.geometry.rows;
        }
    }

    pub fn exit_scrollback(&mut self) {
        self.view_offset = 0;
        self.set_state(SessionState::Running);
    }

    /// Stored line indices shown on screen, top to bottom
    pub fn visible_window(&self) -> RangeInclusive<usize> {
        let cursor = self.scrollback.cursor_row();
        let rows = self.geometry.rows;
        let offset = if self.is_scrolling() { self.view_offset } else { 0 };

        let start = (cursor + 1).saturating_sub(rows + offset);
        let end = (start + rows - 1).min(cursor);
        start..=end
    }

    /// Screen row of the cursor in the live view
    pub fn cursor_screen_row(&self) -> usize {
        self.scrollback.cursor_row().min(self.geometry.rows - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(rows: usize) -> TermGeometry {
        TermGeometry {
            cols: 26,
            rows,
            char_width: 6,
            char_height: 10,
        }
    }

    fn session_with_lines(rows: usize, newlines: usize) -> Session {
        let mut session = Session::new(geometry(rows), 100);
        session.set_state(SessionState::Running);
        session.feed(&b"x\n".repeat(newlines));
        session
    }

    #[test]
    fn test_empty_grid_clamped_to_one_row() {
        let mut session = Session::new(
            TermGeometry {
                cols: 26,
                rows: 0,
                char_width: 6,
                char_height: 10,
            },
            100,
        );
        assert_eq!(session.geometry().rows, 1);

        session.set_state(SessionState::Running);
        session.feed(b"a\nb\nc");
        assert_eq!(session.visible_window(), 2..=2);
        assert_eq!(session.cursor_screen_row(), 0);

        session.page_up();
        assert_eq!(session.visible_window(), 1..=1);
    }

    #[test]
    fn test_fit_geometry() {
        // 6x12 cells on 160x80
        let g = TermGeometry::fit(6, 12, 160, 80);
        assert_eq!((g.cols, g.rows), (26, 6));

        // Tiny cells clamp to the maximum grid
        let g = TermGeometry::fit(1, 1, 160, 80);
        assert_eq!((g.cols, g.rows), (80, 20));

        // Huge cells clamp to the minimum grid
        let g = TermGeometry::fit(40, 40, 160, 80);
        assert_eq!((g.cols, g.rows), (10, 4));
    }

    #[test]
    fn test_single_page_up_window() {
        let mut session = session_with_lines(7, 50);
        assert_eq!(session.scrollback().cursor_row(), 50);

        session.page_up();
        assert_eq!(session.state(), SessionState::Scrollback);
        assert_eq!(session.view_offset(), 7);
        assert_eq!(session.visible_window(), 37..=43);
    }

    #[test]
    fn test_page_up_then_down_restores_live_view() {
        for k in 1..=10 {
            let mut session = session_with_lines(7, 30);
            let live = session.visible_window();

            for _ in 0..k {
                session.page_up();
            }
            for _ in 0..k {
                session.page_down();
            }

            assert_eq!(session.view_offset(), 0, "k={k}");
            assert_eq!(session.state(), SessionState::Running, "k={k}");
            assert_eq!(session.visible_window(), live, "k={k}");
        }
    }

    #[test]
    fn test_page_up_clamps_to_cursor_row() {
        let mut session = session_with_lines(7, 10);
        session.page_up();
        session.page_up();
        session.page_up();
        assert_eq!(session.view_offset(), 10);
        assert_eq!(session.visible_window(), 0..=6);
    }

    #[test]
    fn test_window_short_history() {
        let session = session_with_lines(7, 3);
        assert_eq!(session.visible_window(), 0..=3);
        assert_eq!(session.cursor_screen_row(), 3);
    }

    #[test]
    fn test_live_window_follows_cursor() {
        let session = session_with_lines(7, 20);
        assert_eq!(session.visible_window(), 14..=20);
        assert_eq!(session.cursor_screen_row(), 6);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut session = session_with_lines(7, 0);
        assert_eq!(session.handle_key(b"\x03"), KeyAction::Quit);
        assert_eq!(session.state(), SessionState::Exiting);
    }

    #[test]
    fn test_ctrl_c_only_as_first_byte() {
        let mut session = session_with_lines(7, 0);
        assert_eq!(session.handle_key(b"a\x03"), KeyAction::Forward);
    }

    #[test]
    fn test_page_down_forwarded_when_live() {
        let mut session = session_with_lines(7, 30);
        assert_eq!(session.handle_key(b"\x1b[6~"), KeyAction::Forward);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_scrollback_swallows_input() {
        let mut session = session_with_lines(7, 30);
        assert_eq!(session.handle_key(b"\x1b[5~"), KeyAction::Redraw);
        assert_eq!(session.handle_key(b"ls\r"), KeyAction::Ignore);
        assert_eq!(session.handle_key(b"q"), KeyAction::Redraw);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.view_offset(), 0);
        assert_eq!(session.handle_key(b"q"), KeyAction::Forward);
    }
}
