//! Raw mode for the invoking terminal

use std::io;
use std::os::unix::io::RawFd;

/// Guard that restores the original terminal settings on drop
pub struct RawModeGuard {
    fd: RawFd,
    original: libc::termios,
}

impl RawModeGuard {
    /// Put `fd` into raw mode.
    ///
    /// Keys arrive byte by byte without echo, and Ctrl-C is delivered as
    /// `0x03` instead of raising SIGINT. Reads return after at most 100 ms.
    pub fn enter(fd: RawFd) -> io::Result<Self> {
        let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
        if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let original = unsafe { termios.assume_init() };

        let mut raw = original;
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        raw.c_oflag &= !libc::OPOST;
        raw.c_cflag |= libc::CS8;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
        raw.c_cc[libc::VMIN] = 0;
        raw.c_cc[libc::VTIME] = 1;

        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        log::debug!("Entered raw terminal mode on fd {}", fd);
        Ok(Self { fd, original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, &self.original) } != 0 {
            log::warn!(
                "Failed to restore terminal settings: {}",
                io::Error::last_os_error()
            );
        } else {
            log::debug!("Restored terminal settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lflag(fd: RawFd) -> libc::tcflag_t {
        let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
        assert_eq!(unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) }, 0);
        unsafe { termios.assume_init() }.c_lflag
    }

    #[test]
    fn test_raw_mode_restored_on_drop() {
        let mut master: libc::c_int = 0;
        let mut slave: libc::c_int = 0;
        let ret = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(ret, 0);

        let before = lflag(slave);
        {
            let _guard = RawModeGuard::enter(slave).unwrap();
            assert_eq!(lflag(slave) & (libc::ICANON | libc::ECHO | libc::ISIG), 0);
        }
        assert_eq!(lflag(slave), before);

        unsafe {
            libc::close(slave);
            libc::close(master);
        }
    }

    #[test]
    fn test_not_a_tty() {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        assert!(RawModeGuard::enter(fds[0]).is_err());
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }
}
