//! PTY handling for the hosted shell
//!
//! The shell runs on the secondary side of a pseudo-terminal created with
//! openpty and fork. The engine only talks to it through the
//! [`ChildProcessChannel`] trait.

use std::fs::File;
use std::io::{self, Read, Write};

use thiserror::Error;

/// Window size reported to the child
#[derive(Debug, Clone, Copy, Default)]
pub struct PtySize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("Failed to open pseudo-terminal: {0}")]
    Create(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to start shell: {0}")]
    Spawn(String),

    #[error("PTY I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How to launch the child
#[derive(Debug, Clone, Default)]
pub struct PtyConfig {
    pub size: PtySize,
    /// None picks $SHELL, then the passwd entry, then /bin/sh
    pub shell: Option<String>,
    pub args: Vec<String>,
    /// None means vt100
    pub term: Option<String>,
}

/// Prompt given to the shell; the panel is too small for anything longer
pub const DEFAULT_PROMPT: &str = "\\$ ";

/// Default TERM; escape sequences beyond vt100 are not interpreted anyway
pub const DEFAULT_TERM: &str = "vt100";

/// A duplex byte stream to a child process
pub trait ChildProcessChannel {
    /// Read child output; `Ok(0)` means the child side is gone
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write keyboard input to the child
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Descriptor to wait on for readability
    #[cfg(unix)]
    fn raw_fd(&self) -> std::os::unix::io::RawFd;

    fn child_pid(&self) -> i32;
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::ffi::{CStr, CString};
    use std::os::unix::io::{FromRawFd, RawFd};

    /// Primary side of a pseudo-terminal with a shell on the other end
    pub struct Pty {
        master_fd: RawFd,
        /// Owns `master_fd`
        master: File,
        child_pid: libc::pid_t,
        /// Set once the child has been reaped
        exit_status: Option<i32>,
    }

    /// Everything exec needs, built before fork so the child never allocates
    struct ExecPlan {
        program: CString,
        argv: Vec<CString>,
        env: Vec<(CString, CString)>,
    }

    impl ExecPlan {
        fn new(config: &PtyConfig) -> Result<Self, PtyError> {
            let cstring = |s: &str| {
                CString::new(s).map_err(|_| PtyError::Spawn(format!("null byte in {:?}", s)))
            };

            let shell = config.shell.clone().unwrap_or_else(get_default_shell);
            let shell_name = shell.rsplit('/').next().unwrap_or(&shell);

            let mut argv = vec![cstring(shell_name)?];
            for arg in &config.args {
                argv.push(cstring(arg)?);
            }

            let term = config.term.as_deref().unwrap_or(DEFAULT_TERM);
            let env = vec![
                (cstring("TERM")?, cstring(term)?),
                (cstring("PS1")?, cstring(DEFAULT_PROMPT)?),
            ];

            Ok(Self {
                program: cstring(&shell)?,
                argv,
                env,
            })
        }
    }

    impl Pty {
        /// Open a PTY pair and start the shell on its secondary side
        pub fn new(config: &PtyConfig) -> Result<Self, PtyError> {
            let plan = ExecPlan::new(config)?;
            let pty = unsafe { Self::create_pty_and_spawn(config, &plan)? };
            log::debug!(
                "Spawned {:?} (pid {}) on a {}x{} PTY",
                plan.program,
                pty.child_pid,
                config.size.cols,
                config.size.rows
            );
            Ok(pty)
        }

        pub fn child_pid(&self) -> i32 {
            self.child_pid
        }

        /// EIO after the child hung up reads as EOF.
        pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.master.read(buf) {
                Err(e) if e.raw_os_error() == Some(libc::EIO) => Ok(0),
                other => other,
            }
        }

        /// Non-blocking reap. A signal death reports as 128 + signal number.
        pub fn try_wait(&mut self) -> io::Result<Option<i32>> {
            if let Some(status) = self.exit_status {
                return Ok(Some(status));
            }

            let mut status: libc::c_int = 0;
            let ret = unsafe { libc::waitpid(self.child_pid, &mut status, libc::WNOHANG) };

            if ret < 0 {
                return Err(io::Error::last_os_error());
            }

            if ret == 0 {
                return Ok(None);
            }

            let exit_code = if libc::WIFEXITED(status) {
                libc::WEXITSTATUS(status)
            } else if libc::WIFSIGNALED(status) {
                128 + libc::WTERMSIG(status)
            } else {
                -1
            };

            self.exit_status = Some(exit_code);
            Ok(Some(exit_code))
        }

        pub fn send_signal(&self, signal: i32) -> io::Result<()> {
            let ret = unsafe { libc::kill(self.child_pid, signal) };
            if ret < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(())
            }
        }

        unsafe fn create_pty_and_spawn(config: &PtyConfig, plan: &ExecPlan) -> Result<Self, PtyError> {
            let mut master_fd: libc::c_int = 0;
            let mut slave_fd: libc::c_int = 0;

            let ret = libc::openpty(
                &mut master_fd,
                &mut slave_fd,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            );

            if ret < 0 {
                return Err(PtyError::Create(Box::new(io::Error::last_os_error())));
            }

            let ws = winsize(config.size);
            libc::ioctl(slave_fd, libc::TIOCSWINSZ, &ws);

            let pid = libc::fork();

            if pid < 0 {
                libc::close(master_fd);
                libc::close(slave_fd);
                return Err(PtyError::Create(Box::new(io::Error::last_os_error())));
            }

            if pid == 0 {
                // Only returns by exec or _exit
                Self::setup_child(slave_fd, master_fd, plan);
            }

            libc::close(slave_fd);

            Ok(Self {
                master_fd,
                master: File::from_raw_fd(master_fd),
                child_pid: pid,
                exit_status: None,
            })
        }

        /// Runs between fork and exec: new session, controlling tty, stdio
        unsafe fn setup_child(slave_fd: RawFd, master_fd: RawFd, plan: &ExecPlan) -> ! {
            libc::close(master_fd);

            if libc::setsid() < 0 {
                libc::_exit(1);
            }

            // The request type differs between libc targets
            if libc::ioctl(slave_fd, libc::TIOCSCTTY as libc::c_ulong, 0) < 0 {
                libc::_exit(1);
            }

            for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
                if libc::dup2(slave_fd, fd) < 0 {
                    libc::_exit(1);
                }
            }

            if slave_fd > libc::STDERR_FILENO {
                libc::close(slave_fd);
            }

            for (key, value) in &plan.env {
                libc::setenv(key.as_ptr(), value.as_ptr(), 1);
            }

            let mut argv: Vec<*const libc::c_char> = plan.argv.iter().map(|s| s.as_ptr()).collect();
            argv.push(std::ptr::null());

            libc::execvp(plan.program.as_ptr(), argv.as_ptr());

            libc::_exit(127);
        }
    }

    fn winsize(size: PtySize) -> libc::winsize {
        libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: size.pixel_width,
            ws_ypixel: size.pixel_height,
        }
    }

    impl ChildProcessChannel for Pty {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            Pty::read(self, buf)
        }

        fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            self.master.write_all(data)
        }

        fn raw_fd(&self) -> RawFd {
            self.master_fd
        }

        fn child_pid(&self) -> i32 {
            self.child_pid
        }
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            let _ = self.send_signal(libc::SIGHUP);
            // Reap if already gone; `master` closes the descriptor
            let _ = self.try_wait();
        }
    }

    /// $SHELL, else the login shell from passwd, else /bin/sh
    pub(super) fn get_default_shell() -> String {
        if let Ok(shell) = std::env::var("SHELL") {
            if !shell.is_empty() {
                return shell;
            }
        }

        unsafe {
            let uid = libc::getuid();
            let passwd = libc::getpwuid(uid);
            if !passwd.is_null() {
                let shell_ptr = (*passwd).pw_shell;
                if !shell_ptr.is_null() {
                    if let Ok(shell) = CStr::from_ptr(shell_ptr).to_str() {
                        if !shell.is_empty() {
                            return shell.to_string();
                        }
                    }
                }
            }
        }

        "/bin/sh".to_string()
    }
}

#[cfg(unix)]
pub use unix::Pty;

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, Instant};

    #[test]
    fn test_config_defaults_to_login_shell() {
        let defaults = PtyConfig::default();
        assert_eq!((defaults.size.rows, defaults.size.cols), (0, 0));
        assert_eq!(defaults.shell, None);
        assert_eq!(defaults.term, None);
    }

    #[cfg(unix)]
    fn config(shell: &str, args: &[&str]) -> PtyConfig {
        PtyConfig {
            size: PtySize {
                rows: 6,
                cols: 26,
                pixel_width: 160,
                pixel_height: 80,
            },
            shell: Some(shell.to_string()),
            args: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Poll for the exit status until `timeout_ms` passes
    #[cfg(unix)]
    fn wait_with_timeout(pty: &mut Pty, timeout_ms: u64) -> Option<i32> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            if let Ok(Some(status)) = pty.try_wait() {
                return Some(status);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }

    /// Read until EOF or timeout
    #[cfg(unix)]
    fn read_all(pty: &mut Pty, timeout_ms: u64) -> String {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut out = Vec::new();
        let mut chunk = [0u8; 512];
        while Instant::now() < deadline {
            match pty.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => out.extend_from_slice(&chunk[..n]),
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    #[cfg(unix)]
    fn test_child_environment() {
        let mut pty = Pty::new(&config(
            "/bin/sh",
            &["-c", "echo \"$TERM|$PS1\"; stty size"],
        ))
        .expect("Failed to create PTY");
        assert!(pty.child_pid() > 0);

        let output = read_all(&mut pty, 5000);
        assert!(output.contains("vt100|\\$ "), "output: {output:?}");
        assert!(output.contains("6 26"), "output: {output:?}");

        let status = wait_with_timeout(&mut pty, 5000).expect("Child did not exit in time");
        assert_eq!(status, 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_read_after_exit_is_eof() {
        let mut pty = Pty::new(&config("/bin/sh", &["-c", "exit 3"])).unwrap();
        let _ = read_all(&mut pty, 5000);
        assert_eq!(wait_with_timeout(&mut pty, 5000), Some(3));

        let mut buf = [0u8; 16];
        assert_eq!(pty.read(&mut buf).unwrap(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_channel_write_echoes() {
        let mut pty = Pty::new(&config("/bin/cat", &[])).unwrap();
        ChildProcessChannel::write_all(&mut pty, b"ping\n").unwrap();

        std::thread::sleep(Duration::from_millis(100));
        let mut echo = [0u8; 256];
        let n = ChildProcessChannel::read(&mut pty, &mut echo).unwrap();
        assert!(String::from_utf8_lossy(&echo[..n]).contains("ping"));
        assert!(pty.raw_fd() >= 0);

        pty.send_signal(libc::SIGTERM).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_term_override() {
        let mut pty = Pty::new(&PtyConfig {
            term: Some("dumb".into()),
            ..config("/bin/sh", &["-c", "echo \"[$TERM]\""])
        })
        .unwrap();
        let output = read_all(&mut pty, 5000);
        assert!(output.contains("[dumb]"), "output: {output:?}");
    }

    #[test]
    #[cfg(unix)]
    fn test_spawn_rejects_nul() {
        let result = Pty::new(&config("/bin/sh\0x", &[]));
        assert!(matches!(result, Err(PtyError::Spawn(_))));
    }
}
