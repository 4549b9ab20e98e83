//! Process-wide stop flag set from SIGINT and SIGTERM

use std::sync::atomic::{AtomicBool, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn handle_stop(_signo: libc::c_int) {
    // Only async-signal-safe work here
    RUNNING.store(false, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to the stop flag
pub fn install() {
    RUNNING.store(true, Ordering::SeqCst);
    let handler = handle_stop as extern "C" fn(libc::c_int) as libc::sighandler_t;
    unsafe {
        libc::signal(libc::SIGINT, handler);
        libc::signal(libc::SIGTERM, handler);
    }
    log::debug!("Installed SIGINT/SIGTERM handlers");
}

/// False once a stop signal arrived
pub fn is_running() -> bool {
    RUNNING.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigterm_clears_flag() {
        install();
        assert!(is_running());
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        assert!(!is_running());
        RUNNING.store(true, Ordering::SeqCst);
    }
}
