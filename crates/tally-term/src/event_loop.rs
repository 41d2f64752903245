// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop — the heartbeat of the application.
//
// Stdin bytes flow in from the background reader, get parsed into key
// events, the application handles them, paints a frame buffer, and the
// diff renderer outputs only what changed. One loop.
//
// # Hybrid blocking model
//
// The loop blocks on the stdin channel with a 16.7 ms timeout (60 Hz),
// which gives three behaviors at once:
//
//   1. Instant response: typed bytes arrive on the channel immediately,
//      no polling latency.
//   2. Zero idle CPU: with nothing happening, `recv_timeout` parks the
//      thread.
//   3. A timeout tick that doubles as the escape-sequence timeout: a
//      lone ESC held by the parser is flushed as a real Escape keypress
//      on the first quiet tick, at most one frame late.
//
// Rendering is dirty-flag driven — an idle calculator renders nothing.
//
// # Resize
//
// SIGWINCH sets an AtomicBool (one of the few things a signal handler
// may do); the loop notices it, re-queries the size, resizes the frame,
// and forces a full redraw.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::ansi;
use crate::buffer::FrameBuffer;
use crate::diff::DiffRenderer;
use crate::input::{KeyEvent, Parser};
use crate::reader::StdinReader;
use crate::terminal::{Size, Terminal};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

/// Set by the SIGWINCH handler, checked each loop iteration.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the loop after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// Per frame, the loop calls: [`on_event`](App::on_event) for each
/// parsed key, [`on_resize`](App::on_resize) when the terminal size
/// changed, [`on_tick`](App::on_tick) every iteration, and — when the
/// frame is dirty — [`paint`](App::paint) followed by
/// [`cursor`](App::cursor). Only `paint` is mandatory.
pub trait App {
    /// Handle one key event. Return [`Action::Quit`] to exit.
    fn on_event(&mut self, _event: &KeyEvent) -> Action {
        Action::Continue
    }

    /// The terminal was resized. The frame buffer has already been
    /// resized when this is called.
    fn on_resize(&mut self, _size: Size) {}

    /// Called every loop iteration, input or not. Return `true` when
    /// time-based state changed and a repaint is needed.
    fn on_tick(&mut self) -> bool {
        false
    }

    /// Paint the application into the frame buffer. The buffer has
    /// been cleared — paint everything that should be visible.
    fn paint(&mut self, frame: &mut FrameBuffer);

    /// Where to show the hardware cursor after painting, or `None` to
    /// keep it hidden.
    fn cursor(&self) -> Option<(u16, u16)> {
        None
    }
}

// ─── Loop config ─────────────────────────────────────────────────────────────

/// Event loop timing.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// `recv_timeout` duration in microseconds — the tick rate and the
    /// escape-sequence timeout in one. Default: 16 667 µs (60 Hz).
    pub tick_interval_us: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: 16_667, // 60 Hz
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal, input parser, renderer, and stdin reader.
/// [`run`](Self::run) returns when the application answers
/// [`Action::Quit`].
///
/// ```no_run
/// use tally_term::buffer::FrameBuffer;
/// use tally_term::event_loop::{Action, App, EventLoop};
/// use tally_term::input::{KeyCode, KeyEvent};
///
/// struct MyApp;
///
/// impl App for MyApp {
///     fn on_event(&mut self, event: &KeyEvent) -> Action {
///         if event.code == KeyCode::Char('q') {
///             return Action::Quit;
///         }
///         Action::Continue
///     }
///
///     fn paint(&mut self, frame: &mut FrameBuffer) {
///         // ...
///     }
/// }
///
/// let mut event_loop = EventLoop::new()?;
/// event_loop.run(&mut MyApp)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    parser: Parser,
    renderer: DiffRenderer,
    config: LoopConfig,
}

impl EventLoop {
    /// An event loop with default timing.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new() -> io::Result<Self> {
        Self::with_config(LoopConfig::default())
    }

    /// An event loop with custom timing.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn with_config(config: LoopConfig) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new()?,
            parser: Parser::new(),
            renderer: DiffRenderer::new(),
            config,
        })
    }

    /// The current terminal size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Run until the application quits.
    ///
    /// Enters TUI mode, installs the SIGWINCH handler, spawns the
    /// stdin reader, runs the loop, and restores the terminal on the
    /// way out — error or not.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal enter/leave or rendering fails.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        self.terminal.enter()?;
        install_sigwinch_handler();

        let (mut reader, rx) = StdinReader::spawn();
        let result = self.run_inner(app, &rx);

        // Clean up regardless of how the loop ended.
        reader.stop();
        self.terminal.leave()?;
        result
    }

    fn run_inner(&mut self, app: &mut impl App, rx: &Receiver<Vec<u8>>) -> io::Result<()> {
        let size = self.terminal.size();
        let mut frame = FrameBuffer::new(size.cols, size.rows);
        let mut dirty = true; // First frame always renders.
        let timeout = Duration::from_micros(self.config.tick_interval_us);

        loop {
            // ── Input ──
            match rx.recv_timeout(timeout) {
                Ok(bytes) => {
                    for event in self.parser.advance(&bytes) {
                        if app.on_event(&event) == Action::Quit {
                            return Ok(());
                        }
                        dirty = true;
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                    // Quiet tick: a held lone ESC becomes the Escape key.
                    if self.parser.has_pending() {
                        for event in self.parser.flush() {
                            if app.on_event(&event) == Action::Quit {
                                return Ok(());
                            }
                            dirty = true;
                        }
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    // Reader thread gone (stdin EOF) — exit gracefully.
                    return Ok(());
                }
            }

            // ── Resize ──
            if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
                let new_size = self.terminal.refresh_size();
                frame.resize(new_size.cols, new_size.rows);
                self.renderer.force_redraw();
                app.on_resize(new_size);
                dirty = true;
            }

            // ── Tick ──
            if app.on_tick() {
                dirty = true;
            }

            // ── Render ──
            if dirty {
                frame.clear();
                app.paint(&mut frame);
                self.renderer.render(&frame);
                self.renderer.flush()?;

                let stdout = io::stdout();
                let mut lock = stdout.lock();
                if let Some((x, y)) = app.cursor() {
                    ansi::cursor_to(&mut lock, x, y)?;
                    ansi::cursor_show(&mut lock)?;
                } else {
                    ansi::cursor_hide(&mut lock)?;
                }
                lock.flush()?;

                dirty = false;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    // ── LoopConfig ──────────────────────────────────────────────

    #[test]
    fn default_config_is_60fps() {
        assert_eq!(LoopConfig::default().tick_interval_us, 16_667);
    }

    // ── Action ──────────────────────────────────────────────────

    #[test]
    fn action_equality() {
        assert_eq!(Action::Continue, Action::Continue);
        assert_ne!(Action::Continue, Action::Quit);
    }

    // ── App trait defaults ──────────────────────────────────────

    struct MinimalApp;
    impl App for MinimalApp {
        fn paint(&mut self, _frame: &mut FrameBuffer) {}
    }

    #[test]
    fn default_on_event_continues() {
        let mut app = MinimalApp;
        let event = KeyEvent::plain(KeyCode::Char('x'));
        assert_eq!(app.on_event(&event), Action::Continue);
    }

    #[test]
    fn default_on_tick_is_not_dirty() {
        let mut app = MinimalApp;
        assert!(!app.on_tick());
    }

    #[test]
    fn default_on_resize_is_a_no_op() {
        let mut app = MinimalApp;
        app.on_resize(Size { cols: 120, rows: 40 }); // Must not panic.
    }

    #[test]
    fn default_cursor_is_hidden() {
        let app = MinimalApp;
        assert!(app.cursor().is_none());
    }

    // ── Construction ────────────────────────────────────────────

    #[test]
    fn event_loop_new_succeeds() {
        let event_loop = EventLoop::new().unwrap();
        let size = event_loop.size();
        assert!(size.cols > 0);
        assert!(size.rows > 0);
    }

    #[test]
    fn event_loop_custom_config() {
        let config = LoopConfig {
            tick_interval_us: 8333,
        };
        let event_loop = EventLoop::with_config(config).unwrap();
        assert_eq!(event_loop.config.tick_interval_us, 8333);
    }

    // ── SIGWINCH flag ───────────────────────────────────────────

    #[test]
    fn sigwinch_flag_swaps() {
        SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
        assert!(SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed));
        assert!(!SIGWINCH_RECEIVED.load(Ordering::Relaxed));
    }

    // ── Paint receives the sized buffer ─────────────────────────

    #[test]
    fn paint_sees_buffer_dimensions() {
        struct CheckSize;
        impl App for CheckSize {
            fn paint(&mut self, frame: &mut FrameBuffer) {
                assert_eq!(frame.width(), 40);
                assert_eq!(frame.height(), 12);
            }
        }
        let mut app = CheckSize;
        let mut frame = FrameBuffer::new(40, 12);
        app.paint(&mut frame);
    }
}
