//! Display command frames
//!
//! Every command is an opcode byte, a fixed number of parameter bytes and the
//! `0x0A` terminator. Multi-byte parameters are little-endian.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::DisplayError;

pub const OP_SET_ORIENTATION: u8 = 0x02;
pub const OP_SET_BRIGHTNESS: u8 = 0x03;
pub const OP_FILL_SCREEN: u8 = 0x04;
pub const OP_SET_BITMAP: u8 = 0x05;
pub const OP_SYSTEM_RESET: u8 = 0x40;

/// Frame terminator
pub const TERMINATOR: u8 = 0x0A;

/// Upper bound for the brightness ramp time
pub const MAX_BRIGHTNESS_RAMP_MS: u16 = 5000;

/// Native panel size in landscape
pub const LANDSCAPE_SIZE: (usize, usize) = (160, 80);
/// Native panel size in portrait
pub const PORTRAIT_SIZE: (usize, usize) = (80, 160);

/// Panel orientation (protocol v1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Orientation {
    Portrait = 0,
    ReversePortrait = 1,
    #[default]
    Landscape = 2,
    ReverseLandscape = 3,
    /// Device-driven rotation; logical size is left unchanged
    Rotate = 5,
}

impl Orientation {
    /// Logical (width, height) for this orientation, or `None` when the
    /// current size should be kept
    pub fn dimensions(self) -> Option<(usize, usize)> {
        match self {
            Self::Portrait | Self::ReversePortrait => Some(PORTRAIT_SIZE),
            Self::Landscape | Self::ReverseLandscape => Some(LANDSCAPE_SIZE),
            Self::Rotate => None,
        }
    }
}

impl TryFrom<u8> for Orientation {
    type Error = DisplayError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Portrait),
            1 => Ok(Self::ReversePortrait),
            2 => Ok(Self::Landscape),
            3 => Ok(Self::ReverseLandscape),
            5 => Ok(Self::Rotate),
            other => Err(DisplayError::InvalidOrientation(other)),
        }
    }
}

/// A single command understood by the display firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetOrientation(Orientation),
    SetBrightness { level: u8, ramp_ms: u16 },
    FillScreen { width: usize, height: usize, color: Color },
    /// Header of a bitmap transfer; the pixel payload follows as a separate write
    SetBitmap { width: usize, height: usize },
    SystemReset,
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::SetOrientation(_) => OP_SET_ORIENTATION,
            Self::SetBrightness { .. } => OP_SET_BRIGHTNESS,
            Self::FillScreen { .. } => OP_FILL_SCREEN,
            Self::SetBitmap { .. } => OP_SET_BITMAP,
            Self::SystemReset => OP_SYSTEM_RESET,
        }
    }

    /// Encode the command into its wire frame
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(12);
        frame.push(self.opcode());

        match *self {
            Self::SetOrientation(orientation) => frame.push(orientation as u8),
            Self::SetBrightness { level, ramp_ms } => {
                frame.push(level);
                frame.extend_from_slice(&ramp_ms.min(MAX_BRIGHTNESS_RAMP_MS).to_le_bytes());
            }
            Self::FillScreen {
                width,
                height,
                color,
            } => {
                push_viewport(&mut frame, width, height);
                frame.extend_from_slice(&color.value().to_le_bytes());
            }
            Self::SetBitmap { width, height } => push_viewport(&mut frame, width, height),
            Self::SystemReset => {}
        }

        frame.push(TERMINATOR);
        frame
    }
}

/// Rectangle (0,0)-(width-1,height-1) as four little-endian u16 values
fn push_viewport(frame: &mut Vec<u8>, width: usize, height: usize) {
    let x_end = width.saturating_sub(1) as u16;
    let y_end = height.saturating_sub(1) as u16;
    frame.extend_from_slice(&0u16.to_le_bytes());
    frame.extend_from_slice(&0u16.to_le_bytes());
    frame.extend_from_slice(&x_end.to_le_bytes());
    frame.extend_from_slice(&y_end.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_frame() {
        let frame = Command::SetOrientation(Orientation::ReverseLandscape).encode();
        assert_eq!(frame, vec![0x02, 0x03, 0x0A]);
    }

    #[test]
    fn test_brightness_frame_clamps_ramp() {
        let frame = Command::SetBrightness {
            level: 128,
            ramp_ms: 9000,
        }
        .encode();
        // 5000 = 0x1388
        assert_eq!(frame, vec![0x03, 128, 0x88, 0x13, 0x0A]);
    }

    #[test]
    fn test_fill_screen_frame() {
        let frame = Command::FillScreen {
            width: 160,
            height: 80,
            color: Color(0xF800),
        }
        .encode();
        assert_eq!(
            frame,
            vec![0x04, 0, 0, 0, 0, 159, 0, 79, 0, 0x00, 0xF8, 0x0A]
        );
    }

    #[test]
    fn test_bitmap_header_frame() {
        let frame = Command::SetBitmap {
            width: 80,
            height: 160,
        }
        .encode();
        assert_eq!(frame, vec![0x05, 0, 0, 0, 0, 79, 0, 159, 0, 0x0A]);
    }

    #[test]
    fn test_reset_frame() {
        assert_eq!(Command::SystemReset.encode(), vec![0x40, 0x0A]);
    }

    #[test]
    fn test_orientation_from_u8() {
        assert_eq!(Orientation::try_from(5).unwrap(), Orientation::Rotate);
        assert!(matches!(
            Orientation::try_from(4),
            Err(DisplayError::InvalidOrientation(4))
        ));
    }

    #[test]
    fn test_orientation_dimensions() {
        assert_eq!(Orientation::Portrait.dimensions(), Some((80, 160)));
        assert_eq!(Orientation::ReverseLandscape.dimensions(), Some((160, 80)));
        assert_eq!(Orientation::Rotate.dimensions(), None);
    }
}
