//! Child output parser
//!
//! A two-state machine. Plain bytes go to the scrollback; escape sequences
//! are collected up to their final letter and then dropped. Colors and cursor
//! addressing are not interpreted.

use crate::scrollback::ScrollbackBuffer;

const ESC: u8 = 0x1B;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// Longest escape sequence buffered before it is forcibly terminated
pub const MAX_ESCAPE_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Normal,
    Escape,
}

/// Parser that applies child output to a scrollback buffer
#[derive(Debug, Default)]
pub struct Parser {
    state: ParserState,
    sequence: Vec<u8>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Normal,
            sequence: Vec::with_capacity(MAX_ESCAPE_LEN),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Parse input bytes and apply them to the scrollback
    pub fn parse(&mut self, scrollback: &mut ScrollbackBuffer, bytes: &[u8]) {
        for &byte in bytes {
            self.advance(scrollback, byte);
        }
    }

    fn advance(&mut self, scrollback: &mut ScrollbackBuffer, byte: u8) {
        match self.state {
            ParserState::Escape => {
                self.sequence.push(byte);
                if byte.is_ascii_alphabetic() || self.sequence.len() >= MAX_ESCAPE_LEN {
                    log::trace!(
                        "Discarding escape sequence {:?}",
                        String::from_utf8_lossy(&self.sequence)
                    );
                    self.sequence.clear();
                    self.state = ParserState::Normal;
                }
            }
            ParserState::Normal => match byte {
                ESC => {
                    self.sequence.clear();
                    self.sequence.push(byte);
                    self.state = ParserState::Escape;
                }
                b'\n' | b'\r' => scrollback.new_line(),
                BACKSPACE | DELETE => scrollback.backspace(),
                0x20..=0x7E => scrollback.put_char(byte),
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> (Parser, ScrollbackBuffer) {
        let mut parser = Parser::new();
        let mut scrollback = ScrollbackBuffer::default();
        parser.parse(&mut scrollback, input);
        (parser, scrollback)
    }

    #[test]
    fn test_plain_text() {
        let (_, sb) = parse(b"hello");
        assert_eq!(sb.line(0).unwrap().text(), "hello");
    }

    #[test]
    fn test_csi_sequences_discarded() {
        let (parser, sb) = parse(b"\x1b[1;32mgreen\x1b[0m done");
        assert_eq!(sb.line(0).unwrap().text(), "green done");
        assert_eq!(parser.state(), ParserState::Normal);
    }

    #[test]
    fn test_sequence_split_across_reads() {
        let mut parser = Parser::new();
        let mut sb = ScrollbackBuffer::default();
        parser.parse(&mut sb, b"a\x1b[3");
        assert_eq!(parser.state(), ParserState::Escape);
        parser.parse(&mut sb, b"1mb");
        assert_eq!(sb.line(0).unwrap().text(), "ab");
    }

    #[test]
    fn test_unterminated_sequence_capped() {
        let mut input = vec![ESC];
        input.extend(std::iter::repeat(b'1').take(MAX_ESCAPE_LEN - 1));
        input.extend_from_slice(b"xy");
        let (parser, sb) = parse(&input);
        // The cap ends the sequence, so "x" and "y" are printed
        assert_eq!(parser.state(), ParserState::Normal);
        assert_eq!(sb.line(0).unwrap().text(), "xy");
    }

    #[test]
    fn test_crlf_starts_two_lines() {
        let (_, sb) = parse(b"a\r\nb");
        assert_eq!(sb.total_lines(), 3);
        assert_eq!(sb.line(0).unwrap().text(), "a");
        assert!(sb.line(1).unwrap().is_empty());
        assert_eq!(sb.line(2).unwrap().text(), "b");
    }

    #[test]
    fn test_delete_and_controls() {
        let (_, sb) = parse(b"ab\x7f\x07\tc");
        assert_eq!(sb.line(0).unwrap().text(), "ac");
    }
}
