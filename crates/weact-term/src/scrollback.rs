//! Scrollback - bounded line history with a write cursor
//!
//! The cursor always sits on the newest line. Moving past the last line
//! appends a fresh one, evicting the oldest once the buffer is full.

use std::collections::VecDeque;

/// Hard column limit of a stored line, independent of the wrap width
pub const LINE_CAPACITY: usize = 80;

/// Default number of retained lines
pub const DEFAULT_CAPACITY: usize = 100;

/// One line of terminal text (printable ASCII only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    cells: Vec<u8>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns written so far
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Write `byte` at `col`, padding any gap with spaces
    fn put(&mut self, col: usize, byte: u8) {
        if col >= LINE_CAPACITY {
            return;
        }
        if col >= self.cells.len() {
            self.cells.resize(col, b' ');
            self.cells.push(byte);
        } else {
            self.cells[col] = byte;
        }
    }

    /// Get the text content of this line
    pub fn text(&self) -> String {
        self.cells.iter().map(|&b| b as char).collect()
    }
}

/// Bounded, oldest-first line history
#[derive(Debug, Clone)]
pub struct ScrollbackBuffer {
    lines: VecDeque<Line>,
    capacity: usize,
    wrap_cols: usize,
    cursor_col: usize,
    /// Lines started since creation, evicted ones included
    lines_started: u64,
}

impl ScrollbackBuffer {
    /// Create a buffer holding `capacity` lines that wraps at `wrap_cols`
    pub fn new(capacity: usize, wrap_cols: usize) -> Self {
        let capacity = capacity.max(1);
        let mut lines = VecDeque::with_capacity(capacity);
        lines.push_back(Line::new());

        Self {
            lines,
            capacity,
            wrap_cols: wrap_cols.clamp(1, LINE_CAPACITY),
            cursor_col: 0,
            lines_started: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn wrap_cols(&self) -> usize {
        self.wrap_cols
    }

    /// Lines currently stored
    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// Lines ever started, including evicted ones
    pub fn lines_started(&self) -> u64 {
        self.lines_started
    }

    pub fn cursor_col(&self) -> usize {
        self.cursor_col
    }

    /// Row of the cursor, always the newest stored line
    pub fn cursor_row(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// Write a printable character and advance, wrapping at the wrap width
    pub fn put_char(&mut self, byte: u8) {
        if self.cursor_col >= self.wrap_cols {
            return;
        }

        let col = self.cursor_col;
        if let Some(line) = self.lines.back_mut() {
            line.put(col, byte);
        }
        self.cursor_col += 1;

        if self.cursor_col >= self.wrap_cols {
            self.new_line();
        }
    }

    /// Start a new line at column zero
    pub fn new_line(&mut self) {
        self.cursor_col = 0;
        self.lines.push_back(Line::new());
        self.lines_started += 1;
        if self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// Move back one column and blank that cell
    pub fn backspace(&mut self) {
        if self.cursor_col == 0 {
            return;
        }
        self.cursor_col -= 1;
        let col = self.cursor_col;
        if let Some(line) = self.lines.back_mut() {
            if col < line.len() {
                line.put(col, b' ');
            }
        }
    }
}

impl Default for ScrollbackBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, LINE_CAPACITY)
    }
}
