//! Display handle and framebuffer
//!
//! A `Display` owns the transport plus two pixel surfaces. All drawing goes to
//! the back surface; `flush` ships it to the panel and `update` additionally
//! flips which surface is the back one.

use std::time::Duration;

use crate::color::Color;
use crate::error::{DisplayError, Result};
use crate::protocol::{Command, Orientation, LANDSCAPE_SIZE};
use crate::text::PixelSink;
use crate::transport::Transport;

/// Brightness after open
pub const DEFAULT_BRIGHTNESS: u8 = 255;

const INIT_DELAY: Duration = Duration::from_millis(500);
const BITMAP_DELAY: Duration = Duration::from_millis(10);
const ORIENTATION_DELAY: Duration = Duration::from_millis(100);
const FILL_DELAY: Duration = Duration::from_millis(50);
const RESET_DELAY: Duration = Duration::from_millis(1000);

/// Handle to a connected display
pub struct Display<T: Transport> {
    transport: T,
    port: String,
    width: usize,
    height: usize,
    orientation: Orientation,
    brightness: u8,
    buffers: [Vec<u8>; 2],
    back: usize,
}

#[cfg(unix)]
impl Display<crate::transport::SerialTransport> {
    /// Open the display attached to `port`
    pub fn open(port: &str) -> Result<Self> {
        let transport = crate::transport::SerialTransport::open(port)?;
        Ok(Self::with_transport(transport, port))
    }
}

impl<T: Transport> Display<T> {
    /// Wrap an already open transport and put the panel in landscape mode
    pub fn with_transport(transport: T, port: &str) -> Self {
        let (width, height) = LANDSCAPE_SIZE;
        let mut display = Self {
            transport,
            port: port.to_string(),
            width,
            height,
            orientation: Orientation::Landscape,
            brightness: DEFAULT_BRIGHTNESS,
            buffers: [vec![0; width * height * 2], vec![0; width * height * 2]],
            back: 0,
        };

        if let Err(e) = display.send(Command::SetOrientation(Orientation::Landscape)) {
            log::warn!("Failed to set initial orientation on {}: {}", port, e);
        }
        display.transport.delay(INIT_DELAY);

        log::info!("Display initialized: {}", display.info());
        display
    }

    /// Close the transport and release both buffers
    pub fn close(mut self) {
        self.transport.close();
        log::debug!("Display on {} closed", self.port);
    }

    fn send(&mut self, command: Command) -> Result<()> {
        if !self.transport.is_open() {
            return Err(DisplayError::NotConnected);
        }
        self.transport.send(&command.encode())
    }

    // ------------------------------------------------------------------------
    // Drawing primitives (back buffer, never fail)
    // ------------------------------------------------------------------------

    /// Fill the whole back buffer with `color`
    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_wire_bytes();
        for pixel in self.buffers[self.back].chunks_exact_mut(2) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Set one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(offset) = self.offset(x, y) {
            self.buffers[self.back][offset..offset + 2].copy_from_slice(&color.to_wire_bytes());
        }
    }

    /// Read one pixel back from the back buffer
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.offset(x, y).map(|offset| {
            let buf = &self.buffers[self.back];
            Color(u16::from_be_bytes([buf[offset], buf[offset + 1]]))
        })
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) * 2)
    }

    /// Bresenham line, both endpoints included
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x1, y1);

        loop {
            self.set_pixel(x, y, color);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color, filled: bool) {
        if w <= 0 || h <= 0 {
            return;
        }

        if filled {
            for row in y..y + h {
                for col in x..x + w {
                    self.set_pixel(col, row, color);
                }
            }
        } else {
            let (right, bottom) = (x + w - 1, y + h - 1);
            for col in x..=right {
                self.set_pixel(col, y, color);
                self.set_pixel(col, bottom, color);
            }
            for row in y..=bottom {
                self.set_pixel(x, row, color);
                self.set_pixel(right, row, color);
            }
        }
    }

    pub fn draw_circle(&mut self, cx: i32, cy: i32, r: i32, color: Color, filled: bool) {
        if r < 0 {
            return;
        }

        if filled {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy <= r * r {
                        self.set_pixel(cx + dx, cy + dy, color);
                    }
                }
            }
            return;
        }

        // Midpoint circle, 8-way symmetric
        let (mut x, mut y) = (0, r);
        let mut d = 3 - 2 * r;
        while y >= x {
            for (px, py) in [
                (x, y),
                (-x, y),
                (x, -y),
                (-x, -y),
                (y, x),
                (-y, x),
                (y, -x),
                (-y, -x),
            ] {
                self.set_pixel(cx + px, cy + py, color);
            }
            if d < 0 {
                d += 4 * x + 6;
            } else {
                d += 4 * (x - y) + 10;
                y -= 1;
            }
            x += 1;
        }
    }

    // ------------------------------------------------------------------------
    // Device commands
    // ------------------------------------------------------------------------

    /// Send the back buffer to the panel
    pub fn flush(&mut self) -> Result<()> {
        self.send(Command::SetBitmap {
            width: self.width,
            height: self.height,
        })?;
        self.transport.delay(BITMAP_DELAY);

        self.transport.send(&self.buffers[self.back])?;
        self.transport.delay(BITMAP_DELAY);

        log::trace!("Flushed {}x{} frame", self.width, self.height);
        Ok(())
    }

    /// Flush, then flip front and back
    pub fn update(&mut self) -> Result<()> {
        self.flush()?;
        self.swap_buffers();
        Ok(())
    }

    pub fn swap_buffers(&mut self) {
        self.back ^= 1;
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.send(Command::SetOrientation(orientation))?;

        if let Some((width, height)) = orientation.dimensions() {
            self.width = width;
            self.height = height;
        }
        self.orientation = orientation;
        self.buffers = [
            vec![0; self.width * self.height * 2],
            vec![0; self.width * self.height * 2],
        ];

        log::debug!(
            "Orientation set to {:?} ({}x{})",
            orientation,
            self.width,
            self.height
        );
        self.transport.delay(ORIENTATION_DELAY);
        Ok(())
    }

    /// Set brightness; the ramp time is clamped to 5 s
    pub fn set_brightness(&mut self, level: u8, ramp_ms: u16) -> Result<()> {
        self.send(Command::SetBrightness { level, ramp_ms })?;
        self.brightness = level;
        log::debug!("Brightness set to {}", level);
        Ok(())
    }

    /// Fill the panel directly, without touching the buffers
    pub fn fill_screen(&mut self, color: Color) -> Result<()> {
        self.send(Command::FillScreen {
            width: self.width,
            height: self.height,
            color,
        })?;
        self.transport.delay(FILL_DELAY);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.send(Command::SystemReset)?;
        self.transport.delay(RESET_DELAY);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Information
    // ------------------------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn port_name(&self) -> &str {
        &self.port
    }

    /// One-line description of the device
    pub fn info(&self) -> String {
        if self.is_connected() {
            format!(
                "WeAct Display FS 0.96-inch ({}) {}x{}",
                self.port, self.width, self.height
            )
        } else {
            "Not connected".to_string()
        }
    }

    pub fn back_buffer(&self) -> &[u8] {
        &self.buffers[self.back]
    }

    pub fn front_buffer(&self) -> &[u8] {
        &self.buffers[self.back ^ 1]
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> PixelSink for Display<T> {
    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        Display::set_pixel(self, x, y, color);
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}
