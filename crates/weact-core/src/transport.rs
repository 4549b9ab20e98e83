//! Byte transport to the display
//!
//! The firmware needs a short pause after every command before it accepts the
//! next one. `Transport::send` implementations apply that settle delay
//! themselves; longer protocol pauses are requested through
//! `Transport::delay` so that an in-memory transport can record them instead of
//! sleeping.

use std::time::Duration;

use crate::error::{DisplayError, Result};

/// Mandatory pause after every successful command write
pub const SETTLE_DELAY: Duration = Duration::from_millis(5);

/// Baud rate used by the display's USB serial bridge
pub const BAUD_RATE: u32 = 115_200;

/// A byte-reliable command channel to the device
pub trait Transport {
    /// Write all of `bytes` in one write and wait for the settle delay
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Wait for a protocol-mandated pause
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Whether the channel is still open
    fn is_open(&self) -> bool;

    /// Release the underlying channel. Calling it twice is harmless.
    fn close(&mut self);
}

// ============================================================================
// Serial port (termios)
// ============================================================================

#[cfg(unix)]
mod serial {
    use super::*;
    use std::ffi::CString;
    use std::fs::File;
    use std::io::{self, Write};
    use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

    /// Serial line configured 115200 8N1 raw
    pub struct SerialTransport {
        port: String,
        file: Option<File>,
    }

    impl SerialTransport {
        /// Open and configure the serial port
        pub fn open(port: &str) -> Result<Self> {
            let connection_error = |source: io::Error| DisplayError::Connection {
                port: port.to_string(),
                source,
            };

            let path = CString::new(port)
                .map_err(|e| connection_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

            let fd = unsafe {
                libc::open(
                    path.as_ptr(),
                    libc::O_RDWR | libc::O_NOCTTY | libc::O_SYNC,
                )
            };
            if fd < 0 {
                return Err(connection_error(io::Error::last_os_error()));
            }

            // Owning the fd from here on closes it on every error path
            let file = unsafe { File::from_raw_fd(fd) };
            configure_line(fd).map_err(connection_error)?;

            log::debug!("Opened serial port {} at {} baud", port, BAUD_RATE);

            Ok(Self {
                port: port.to_string(),
                file: Some(file),
            })
        }

        /// Path of the opened port
        pub fn port(&self) -> &str {
            &self.port
        }
    }

    /// Apply 8N1 raw mode with a one second read timeout
    fn configure_line(fd: RawFd) -> io::Result<()> {
        let mut tty = std::mem::MaybeUninit::<libc::termios>::uninit();
        if unsafe { libc::tcgetattr(fd, tty.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut tty = unsafe { tty.assume_init() };

        unsafe {
            libc::cfsetospeed(&mut tty, libc::B115200);
            libc::cfsetispeed(&mut tty, libc::B115200);
        }

        // 8 data bits, no parity, one stop bit, no hardware flow control
        tty.c_cflag = (tty.c_cflag & !libc::CSIZE) | libc::CS8;
        tty.c_cflag &= !(libc::PARENB | libc::PARODD);
        tty.c_cflag &= !libc::CSTOPB;
        tty.c_cflag &= !libc::CRTSCTS;
        tty.c_cflag |= libc::CLOCAL | libc::CREAD;

        // Raw mode
        tty.c_lflag = 0;
        tty.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        tty.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL);
        tty.c_oflag = 0;

        // VTIME is in tenths of a second
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cc[libc::VTIME] = 10;

        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tty) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    impl Transport for SerialTransport {
        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            let file = self.file.as_mut().ok_or(DisplayError::NotConnected)?;

            let written = file.write(bytes)?;
            if written != bytes.len() {
                return Err(DisplayError::ShortWrite {
                    written,
                    expected: bytes.len(),
                });
            }

            std::thread::sleep(SETTLE_DELAY);
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.file.is_some()
        }

        fn close(&mut self) {
            if self.file.take().is_some() {
                log::debug!("Closed serial port {}", self.port);
            }
        }
    }

    impl AsRawFd for SerialTransport {
        fn as_raw_fd(&self) -> RawFd {
            self.file.as_ref().map_or(-1, |f| f.as_raw_fd())
        }
    }
}

#[cfg(unix)]
pub use serial::SerialTransport;

// ============================================================================
// In-memory transport
// ============================================================================

/// Transport that records frames and delays instead of talking to hardware
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    /// Every successful `send`, in order
    pub sent: Vec<Vec<u8>>,
    /// Every requested protocol delay, in order (settle delays are not recorded)
    pub delays: Vec<Duration>,
    closed: bool,
    fail_sends: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `send` fail with an I/O error
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.sent.clear();
        self.delays.clear();
    }

    /// The last frame sent, if any
    pub fn last(&self) -> Option<&[u8]> {
        self.sent.last().map(Vec::as_slice)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(DisplayError::NotConnected);
        }
        if self.fail_sends {
            return Err(DisplayError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_records() {
        let mut transport = MemoryTransport::new();
        transport.send(&[1, 2, 3]).unwrap();
        transport.delay(Duration::from_millis(10));
        assert_eq!(transport.sent, vec![vec![1, 2, 3]]);
        assert_eq!(transport.delays, vec![Duration::from_millis(10)]);
    }

    #[test]
    fn test_memory_transport_close_is_idempotent() {
        let mut transport = MemoryTransport::new();
        transport.close();
        transport.close();
        assert!(!transport.is_open());
        assert!(matches!(
            transport.send(&[0x40, 0x0A]),
            Err(DisplayError::NotConnected)
        ));
    }

    #[test]
    fn test_memory_transport_failure() {
        let mut transport = MemoryTransport::new();
        transport.fail_sends(true);
        assert!(matches!(transport.send(&[0]), Err(DisplayError::Io(_))));
        assert!(transport.sent.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_serial_open_missing_port() {
        let err = SerialTransport::open("/dev/does-not-exist-weact").err().unwrap();
        match err {
            DisplayError::Connection { port, .. } => {
                assert_eq!(port, "/dev/does-not-exist-weact")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
