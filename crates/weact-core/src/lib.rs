//! weact-core: WeAct Display FS driver library
//!
//! This crate provides the building blocks for drawing on the display:
//! - BRG565 colors
//! - Command frames and the serial transport
//! - The double-buffered framebuffer with drawing primitives
//! - Text measurement, rendering and word wrap

pub mod color;
pub mod display;
pub mod error;
pub mod protocol;
pub mod text;
pub mod transport;

pub use color::Color;
pub use display::Display;
pub use error::{DisplayError, FontError};
pub use protocol::{Command, Orientation};
pub use text::{Align, PixelSink, TextRenderer, TextService};
pub use transport::{MemoryTransport, Transport};
#[cfg(unix)]
pub use transport::SerialTransport;
