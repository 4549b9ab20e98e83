//! Terminal engine event loop
//!
//! Single-threaded: one `poll` over the keyboard and the child channel per
//! iteration. Display work inside the loop is best-effort; a failed frame is
//! logged and the next change redraws.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use weact_core::{Color, Display, TextService, Transport};

use crate::error::TermError;
use crate::pty::{ChildProcessChannel, Pty, PtyConfig, PtySize};
use crate::render::{self, Banner};
use crate::session::{KeyAction, Session, SessionState, TermGeometry};
use crate::signals;

/// Upper bound on one poll wait
const POLL_TIMEOUT_MS: libc::c_int = 100;

const CHILD_READ_SIZE: usize = 4096;
const KEY_READ_SIZE: usize = 256;

/// How long the startup banner stays up
pub const BANNER_HOLD: Duration = Duration::from_secs(1);

/// Child process settings
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Shell to run (None = $SHELL, then the passwd entry, then /bin/sh)
    pub shell: Option<String>,
    pub args: Vec<String>,
    /// TERM for the child (None = vt100)
    pub term: Option<String>,
    pub scrollback_lines: usize,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Ctrl-C on the keyboard
    UserQuit,
    /// SIGINT or SIGTERM
    Signal,
    /// The child closed its side of the channel
    ChildExited,
}

/// A hosted shell rendered on the display
pub struct TerminalEngine<T: Transport, S: TextService, C: ChildProcessChannel> {
    display: Display<T>,
    text: S,
    channel: C,
    session: Session,
}

impl<T: Transport, S: TextService> TerminalEngine<T, S, Pty> {
    /// Size the grid from the font and spawn the shell on a new PTY
    pub fn start(display: Display<T>, text: S, config: &EngineConfig) -> Result<Self, TermError> {
        let geometry = TermGeometry::fit(
            text.advance('M'),
            text.line_height(),
            display.width(),
            display.height(),
        );
        log::debug!(
            "Terminal grid {}x{} ({}x{} px cells)",
            geometry.cols,
            geometry.rows,
            geometry.char_width,
            geometry.char_height
        );

        let pty_config = PtyConfig {
            size: PtySize {
                rows: geometry.rows as u16,
                cols: geometry.cols as u16,
                pixel_width: display.width() as u16,
                pixel_height: display.height() as u16,
            },
            shell: config.shell.clone(),
            args: config.args.clone(),
            term: config.term.clone(),
        };
        let pty = Pty::new(&pty_config)?;

        let session = Session::new(geometry, config.scrollback_lines);
        Ok(Self::with_channel(display, text, pty, session))
    }
}

impl<T: Transport, S: TextService, C: ChildProcessChannel> TerminalEngine<T, S, C> {
    pub fn with_channel(display: Display<T>, text: S, channel: C, session: Session) -> Self {
        Self {
            display,
            text,
            channel,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn display(&self) -> &Display<T> {
        &self.display
    }

    pub fn geometry(&self) -> TermGeometry {
        self.session.geometry()
    }

    /// Show the startup banner and hold it
    pub fn show_banner(&mut self, banner: &Banner, hold: Duration) {
        let geometry = self.session.geometry();
        if let Err(e) = render::render_banner(&mut self.display, &self.text, banner, geometry) {
            log::warn!("Failed to draw banner: {}", e);
        }
        self.display.transport_mut().delay(hold);
    }

    fn render(&mut self) {
        if let Err(e) = render::render_session(&mut self.display, &self.text, &self.session) {
            log::warn!("Failed to update display: {}", e);
        }
    }

    /// Run until Ctrl-C, a stop signal, or the child hanging up.
    ///
    /// `input_fd` is the keyboard, normally stdin in raw mode.
    pub fn run(&mut self, input_fd: RawFd) -> Result<ExitReason, TermError> {
        self.session.set_state(SessionState::Running);
        self.render();

        let mut child_buf = [0u8; CHILD_READ_SIZE];
        let mut key_buf = [0u8; KEY_READ_SIZE];
        let mut input_fd = input_fd;

        let reason = loop {
            if !signals::is_running() {
                break ExitReason::Signal;
            }

            let mut fds = [
                libc::pollfd {
                    fd: input_fd,
                    events: libc::POLLIN,
                    revents: 0,
                },
                libc::pollfd {
                    fd: self.channel.raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];

            let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, POLL_TIMEOUT_MS) };
            if ret < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(TermError::Poll(err));
            }
            if ret == 0 {
                continue;
            }

            if fds[0].revents != 0 {
                match read_fd(input_fd, &mut key_buf) {
                    Ok(0) => {
                        if fds[0].revents & libc::POLLHUP != 0 {
                            // Keyboard went away; negative fds are skipped by poll
                            log::debug!("Keyboard input closed");
                            input_fd = -1;
                        }
                    }
                    Ok(n) => {
                        if self.handle_keys(n, &key_buf) {
                            break ExitReason::UserQuit;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        log::warn!("Keyboard read failed: {}", e);
                        input_fd = -1;
                    }
                }
            }

            if fds[1].revents != 0 {
                match self.channel.read(&mut child_buf) {
                    Ok(0) => {
                        log::debug!("Shell (pid {}) exited", self.channel.child_pid());
                        break ExitReason::ChildExited;
                    }
                    Ok(n) => {
                        self.session.feed(&child_buf[..n]);
                        self.render();
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        log::warn!("Reading from shell failed: {}", e);
                        break ExitReason::ChildExited;
                    }
                }
            }
        };

        log::debug!("Terminal loop ended: {:?}", reason);
        self.session.set_state(SessionState::Exiting);
        Ok(reason)
    }

    /// Returns true when the session should end
    fn handle_keys(&mut self, n: usize, keys: &[u8]) -> bool {
        let input = &keys[..n];
        match self.session.handle_key(input) {
            KeyAction::Quit => return true,
            KeyAction::Redraw => self.render(),
            KeyAction::Forward => {
                if let Err(e) = self.channel.write_all(input) {
                    log::warn!("Writing to shell failed: {}", e);
                }
            }
            KeyAction::Ignore => {}
        }
        false
    }

    /// Hang up the child, blank the panel and close the transport
    pub fn shutdown(self) {
        let Self {
            mut display,
            text,
            channel,
            session: _,
        } = self;

        drop(channel);
        drop(text);

        display.clear(Color::BLACK);
        if let Err(e) = display.update() {
            log::warn!("Failed to clear display: {}", e);
        }
        display.close();
    }
}

fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}
