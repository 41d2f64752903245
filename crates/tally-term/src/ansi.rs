// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state, no decisions about when to emit — that's the CellWriter's job.
// This module only knows the byte-level encoding of the terminal
// commands the calculator uses.
//
// Cursor positions are 0-indexed in our API and converted to the
// terminal's 1-indexed coordinates on output.

use std::io::{self, Write};

use crate::cell::Attr;
use crate::color::CellColor;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` (CUP — Cursor Position).
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
///
/// Clears everything — colors and attributes alike. The stateful
/// renderer must invalidate its tracked state after emitting this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Enter the alternate screen buffer (DEC 1049). The user's shell
/// content is preserved and restored by [`exit_alt_screen`].
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC 2026): the terminal buffers output
/// until [`end_sync`], so partial frames never flicker onto the screen.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized output — the terminal presents the buffered frame.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Set the foreground color.
///
/// Compact SGR codes for the 16 classic colors (30–37, 90–97), the
/// 256-color extended form for higher palette indices, 24-bit SGR for
/// RGB.
pub fn fg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[39m"),
        CellColor::Ansi256(idx) => {
            if idx < 8 {
                write!(w, "\x1b[{}m", 30 + u16::from(idx))
            } else if idx < 16 {
                write!(w, "\x1b[{}m", 82 + u16::from(idx))
            } else {
                write!(w, "\x1b[38;5;{idx}m")
            }
        }
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Set the background color. Same strategy as [`fg`] with the
/// background SGR codes (40–47, 100–107, 48;5;N, 48;2;R;G;B).
pub fn bg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[49m"),
        CellColor::Ansi256(idx) => {
            if idx < 8 {
                write!(w, "\x1b[{}m", 40 + u16::from(idx))
            } else if idx < 16 {
                write!(w, "\x1b[{}m", 92 + u16::from(idx))
            } else {
                write!(w, "\x1b[48;5;{idx}m")
            }
        }
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[48;2;{r};{g};{b}m"),
    }
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

/// Emit SGR codes for a set of attributes as one CSI sequence,
/// semicolon-separated (`\x1b[1;7m` for bold + inverse). Emits nothing
/// for an empty set.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    if attr.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    let mut first = true;

    macro_rules! emit {
        ($flag:expr, $code:expr) => {
            if attr.contains($flag) {
                if !first {
                    w.write_all(b";")?;
                }
                w.write_all($code)?;
                first = false;
            }
        };
    }

    emit!(Attr::BOLD, b"1");
    emit!(Attr::DIM, b"2");
    emit!(Attr::ITALIC, b"3");
    emit!(Attr::UNDERLINE, b"4");
    emit!(Attr::INVERSE, b"7");
    let _ = first; // Last expansion sets first; suppress dead-write warning.

    w.write_all(b"m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_to_is_one_indexed() {
        assert_eq!(collect(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(collect(|w| cursor_to(w, 10, 4)), "\x1b[5;11H");
    }

    #[test]
    fn cursor_visibility() {
        assert_eq!(collect(cursor_hide), "\x1b[?25l");
        assert_eq!(collect(cursor_show), "\x1b[?25h");
    }

    #[test]
    fn screen_control() {
        assert_eq!(collect(clear_screen), "\x1b[2J");
        assert_eq!(collect(reset), "\x1b[0m");
        assert_eq!(collect(enter_alt_screen), "\x1b[?1049h");
        assert_eq!(collect(exit_alt_screen), "\x1b[?1049l");
    }

    #[test]
    fn sync_bracketing() {
        assert_eq!(collect(begin_sync), "\x1b[?2026h");
        assert_eq!(collect(end_sync), "\x1b[?2026l");
    }

    #[test]
    fn fg_default() {
        assert_eq!(collect(|w| fg(w, CellColor::Default)), "\x1b[39m");
    }

    #[test]
    fn fg_classic_colors_use_compact_codes() {
        assert_eq!(collect(|w| fg(w, CellColor::Ansi256(1))), "\x1b[31m");
        assert_eq!(collect(|w| fg(w, CellColor::Ansi256(9))), "\x1b[91m");
    }

    #[test]
    fn fg_extended_palette() {
        assert_eq!(collect(|w| fg(w, CellColor::Ansi256(42))), "\x1b[38;5;42m");
    }

    #[test]
    fn fg_truecolor() {
        assert_eq!(
            collect(|w| fg(w, CellColor::Rgb(12, 34, 56))),
            "\x1b[38;2;12;34;56m"
        );
    }

    #[test]
    fn bg_variants() {
        assert_eq!(collect(|w| bg(w, CellColor::Default)), "\x1b[49m");
        assert_eq!(collect(|w| bg(w, CellColor::Ansi256(4))), "\x1b[44m");
        assert_eq!(collect(|w| bg(w, CellColor::Ansi256(12))), "\x1b[104m");
        assert_eq!(collect(|w| bg(w, CellColor::Ansi256(200))), "\x1b[48;5;200m");
        assert_eq!(
            collect(|w| bg(w, CellColor::Rgb(1, 2, 3))),
            "\x1b[48;2;1;2;3m"
        );
    }

    #[test]
    fn attrs_empty_emits_nothing() {
        assert_eq!(collect(|w| attrs(w, Attr::empty())), "");
    }

    #[test]
    fn attrs_single() {
        assert_eq!(collect(|w| attrs(w, Attr::BOLD)), "\x1b[1m");
        assert_eq!(collect(|w| attrs(w, Attr::INVERSE)), "\x1b[7m");
    }

    #[test]
    fn attrs_combined_are_semicolon_separated() {
        assert_eq!(collect(|w| attrs(w, Attr::BOLD | Attr::DIM)), "\x1b[1;2m");
        assert_eq!(
            collect(|w| attrs(w, Attr::BOLD | Attr::UNDERLINE | Attr::INVERSE)),
            "\x1b[1;4;7m"
        );
    }
}
