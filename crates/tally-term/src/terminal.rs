// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, alternate screen, RAII cleanup.
//
// Safety: termios (tcgetattr/tcsetattr), ioctl (TIOCGWINSZ), isatty,
// and the panic hook's raw fd write have no safe alternative; each
// unsafe block is minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's modes. It enters raw mode via
// termios, switches to the alternate screen, and guarantees cleanup on
// drop — including through a panic hook that writes a pre-built
// restore sequence straight to fd 1. The hook bypasses Rust's stdout
// lock on purpose: a panic mid-frame can hold that lock, and a
// deadlocked panic handler leaves the user with a broken terminal and
// no error message.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Columns.
    pub cols: u16,
    /// Rows.
    pub rows: u16,
}

/// Fallback when the size query fails (tests, pipes).
const FALLBACK_SIZE: Size = Size { cols: 80, rows: 24 };

/// Query the terminal size via `ioctl(TIOCGWINSZ)`.
///
/// `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn query_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn query_size() -> Option<Size> {
    None
}

/// Whether stdin is connected to a TTY.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-safe restore ──────────────────────────────────────────────────────

/// Termios backup reachable from the panic hook, which can't see the
/// [`Terminal`] struct. Behind a `Mutex`, not `static mut`.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(original) = guard.as_ref() {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Emergency restore: reset SGR, show the cursor, leave the alternate
/// screen — in that order, so the restored shell shows no artifacts.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h\x1b[?1049l";

/// The panic hook installs at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before the panic
/// message prints. Without it, a panic in raw mode leaves no echo, no
/// line editing, and an unreadable error.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to fd 1, bypassing the stdout
/// lock the panicking thread may hold.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ────────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// [`enter`](Self::enter) switches to TUI mode (raw mode + alternate
/// screen); drop restores everything, even on panic.
///
/// ```no_run
/// use tally_term::terminal::Terminal;
///
/// let mut term = Terminal::new()?;
/// term.enter()?;
/// // ... run the event loop ...
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    /// Original termios, saved before raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Cached size; refresh with [`refresh_size`](Self::refresh_size).
    size: Size,

    /// Whether TUI mode is active.
    active: bool,
}

impl Terminal {
    /// Create a handle and query the current size. Does **not** enter
    /// TUI mode. Falls back to 80×24 when the size is unknowable.
    ///
    /// # Errors
    ///
    /// Currently infallible; `Result` keeps the signature stable for
    /// platforms where initialization can fail.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            original_termios: None,
            size: query_size().unwrap_or(FALLBACK_SIZE),
            active: false,
        })
    }

    /// The cached terminal size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size from the OS (after SIGWINCH).
    pub fn refresh_size(&mut self) -> Size {
        if let Some(size) = query_size() {
            self.size = size;
        }
        self.size
    }

    /// Whether TUI mode is active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter TUI mode: raw mode, alternate screen, hidden cursor,
    /// cleared screen. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or terminal output fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::cursor_hide(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        lock.flush()?;

        self.active = true;
        Ok(())
    }

    /// Leave TUI mode and restore the terminal. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::reset(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        ansi::exit_alt_screen(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode();
        self.active = false;
        Ok(())
    }

    // ─── Raw mode ─────────────────────────────────────────────────────────

    /// Enable raw mode via termios. No-op when stdin is not a TTY
    /// (tests, pipes) so the rest of TUI mode still works for output.
    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if !is_tty() {
            return Ok(());
        }

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }

        // Keep the original for leave() and the panic hook.
        self.original_termios = Some(termios);
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(termios);
        }

        unsafe { libc::cfmakeraw(&raw mut termios) };
        // read() returns as soon as one byte is available.
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;

        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const termios) } != 0
        {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Restore the saved termios. Best effort.
    #[cfg(unix)]
    fn disable_raw_mode(&mut self) {
        if let Some(original) = self.original_termios.take() {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const original);
            }
        }
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) {}
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_a_usable_size() {
        let term = Terminal::new().unwrap();
        let size = term.size();
        assert!(size.cols > 0);
        assert!(size.rows > 0);
    }

    #[test]
    fn new_is_not_active() {
        let term = Terminal::new().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn fallback_size_is_classic() {
        assert_eq!(FALLBACK_SIZE, Size { cols: 80, rows: 24 });
    }

    #[test]
    fn leave_without_enter_is_a_no_op() {
        let mut term = Terminal::new().unwrap();
        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn refresh_size_keeps_a_valid_size() {
        let mut term = Terminal::new().unwrap();
        let size = term.refresh_size();
        assert!(size.cols > 0);
        assert!(size.rows > 0);
    }

    #[test]
    fn emergency_restore_ends_with_alt_screen_exit() {
        // Alternate-screen exit must come last so the restored shell
        // content appears clean.
        assert!(EMERGENCY_RESTORE.ends_with(b"\x1b[?1049l"));
    }
}
