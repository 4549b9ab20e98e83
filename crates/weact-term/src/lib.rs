//! weact-term: Headless terminal console for the WeAct Display FS
//!
//! Hosts a shell on a pseudo-terminal, keeps a bounded scrollback of its
//! output and renders a window of it on the panel:
//! - Scrollback buffer and output parser
//! - Session state machine (live view and scrollback browsing)
//! - PTY child process channel
//! - Render functions and the poll-based event loop

pub mod error;
pub mod parser;
pub mod render;
pub mod scrollback;
pub mod session;

#[cfg(unix)]
pub mod cli;
#[cfg(unix)]
pub mod engine;
pub mod pty;
#[cfg(unix)]
pub mod signals;
#[cfg(unix)]
pub mod tty;

pub use error::TermError;
pub use parser::Parser;
pub use render::Banner;
pub use scrollback::ScrollbackBuffer;
pub use session::{KeyAction, Session, SessionState, TermGeometry};

#[cfg(unix)]
pub use engine::{EngineConfig, ExitReason, TerminalEngine};
#[cfg(unix)]
pub use pty::Pty;
pub use pty::{ChildProcessChannel, PtyConfig, PtyError, PtySize};
