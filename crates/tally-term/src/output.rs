// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell rendering.
//
// Two pieces that together minimize terminal I/O:
//
//   OutputBuffer — accumulates all ANSI bytes in memory so an entire
//   frame goes to the terminal in one write() syscall.
//
//   CellWriter — remembers the terminal's current cursor position,
//   colors, and attributes, and skips escape sequences that would
//   change nothing. Consecutive cells with the same style cost one
//   byte of output each: the character itself.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Accumulates a frame's ANSI output for a single `write()` syscall.
///
/// Default capacity: 8 KB — a full calculator frame fits without
/// reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 8192;

impl OutputBuffer {
    /// An empty buffer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no bytes are accumulated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for tests and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a Unicode codepoint as UTF-8.
    ///
    /// Invalid codepoints — including 0, the continuation marker, which
    /// must never reach output — produce `?` instead of garbage bytes.
    pub fn push_codepoint(&mut self, cp: u32) {
        match char::from_u32(cp) {
            Some(ch) if cp != 0 => {
                let mut enc = [0u8; 4];
                self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
            }
            _ => self.buf.push(b'?'),
        }
    }

    /// Drop the accumulated bytes, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write everything to stdout in one call and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&self.buf)?;
            stdout.flush()?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Write everything to an arbitrary writer and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op: real flushing goes through flush_stdout() / flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Stateful cell renderer that skips redundant escape sequences.
///
/// Tracking rules:
///
/// - **Cursor**: no move is emitted when the next cell sits at
///   `(last_x + 1, last_y)` — the terminal auto-advances after output.
/// - **Attributes**: a change resets (SGR 0) and re-emits, which also
///   invalidates the tracked colors so they re-emit too. Going from
///   no attributes to some skips the reset.
/// - **Colors**: emitted only when they differ from the tracked state.
/// - **Continuation cells**: produce no output when they directly
///   follow their wide-character lead cell — the terminal has already
///   drawn both columns.
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_fg: Option<CellColor>,
    last_bg: Option<CellColor>,
    last_attrs: Attr,
}

impl CellWriter {
    /// A writer with no tracked state (everything emits on first use).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_fg: None,
            last_bg: None,
            last_attrs: Attr::empty(),
        }
    }

    /// Forget all tracked state. Call after anything else has touched
    /// the terminal (screen clear, SGR reset, frame boundary).
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Emit one cell at `(x, y)`, producing only the escapes needed.
    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        // A continuation cell right after its lead needs nothing: the
        // wide character already covered this column.
        if cell.is_continuation() && yi == self.last_y && xi == self.last_x + 1 {
            self.last_x = xi;
            return;
        }

        // ── Cursor ──
        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        // ── Attributes (reset + re-emit on change) ──
        if cell.attrs != self.last_attrs {
            if !self.last_attrs.is_empty() {
                ansi::reset(out).ok();
                self.last_fg = None;
                self.last_bg = None;
            }
            ansi::attrs(out, cell.attrs).ok();
            self.last_attrs = cell.attrs;
        }

        // ── Colors ──
        if self.last_fg != Some(cell.fg) {
            ansi::fg(out, cell.fg).ok();
            self.last_fg = Some(cell.fg);
        }
        if self.last_bg != Some(cell.bg) {
            ansi::bg(out, cell.bg).ok();
            self.last_bg = Some(cell.bg);
        }

        // ── Character ──
        if cell.is_continuation() {
            // Orphaned continuation (its lead was unchanged): repaint
            // the column as a styled space.
            out.push_codepoint(b' '.into());
        } else {
            out.push_codepoint(cell.ch);
        }
        self.last_x = xi;
        self.last_y = yi;
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(cells: &[(u16, u16, Cell)]) -> String {
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        for (x, y, cell) in cells {
            writer.render_cell(&mut out, *x, *y, cell);
        }
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── OutputBuffer ─────────────────────────────────────────────────────

    #[test]
    fn buffer_starts_empty() {
        let out = OutputBuffer::new();
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn write_accumulates() {
        let mut out = OutputBuffer::new();
        out.write_all(b"abc").unwrap();
        out.write_all(b"def").unwrap();
        assert_eq!(out.as_bytes(), b"abcdef");
    }

    #[test]
    fn push_codepoint_encodes_utf8() {
        let mut out = OutputBuffer::new();
        out.push_codepoint(u32::from('A'));
        out.push_codepoint(u32::from('÷'));
        assert_eq!(out.as_bytes(), "A÷".as_bytes());
    }

    #[test]
    fn push_codepoint_rejects_invalid() {
        let mut out = OutputBuffer::new();
        out.push_codepoint(0); // Continuation marker.
        out.push_codepoint(0xD800); // Surrogate.
        assert_eq!(out.as_bytes(), b"??");
    }

    #[test]
    fn flush_to_clears() {
        let mut out = OutputBuffer::new();
        out.write_all(b"xyz").unwrap();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"xyz");
        assert!(out.is_empty());
    }

    #[test]
    fn clear_keeps_nothing() {
        let mut out = OutputBuffer::new();
        out.write_all(b"xyz").unwrap();
        out.clear();
        assert!(out.is_empty());
    }

    // ── CellWriter: cursor tracking ──────────────────────────────────────

    #[test]
    fn first_cell_emits_cursor_move() {
        let s = rendered(&[(0, 0, Cell::new('A'))]);
        assert!(s.contains("\x1b[1;1H"));
        assert!(s.ends_with('A'));
    }

    #[test]
    fn sequential_cells_skip_cursor_moves() {
        let s = rendered(&[(0, 0, Cell::new('A')), (1, 0, Cell::new('B'))]);
        // Three escapes total: the first cell's cursor move, default
        // fg, and default bg. The second cell rides auto-advance.
        assert_eq!(s.matches("\x1b[").count(), 3);
        assert!(s.contains("AB"));
    }

    #[test]
    fn gap_emits_cursor_move() {
        let s = rendered(&[(0, 0, Cell::new('A')), (5, 0, Cell::new('B'))]);
        assert!(s.contains("\x1b[1;6H"));
    }

    #[test]
    fn row_change_emits_cursor_move() {
        let s = rendered(&[(0, 0, Cell::new('A')), (0, 1, Cell::new('B'))]);
        assert!(s.contains("\x1b[2;1H"));
    }

    // ── CellWriter: style tracking ───────────────────────────────────────

    #[test]
    fn same_style_emits_colors_once() {
        let red = Cell::new('A').with_fg(CellColor::Rgb(255, 0, 0));
        let s = rendered(&[(0, 0, red), (1, 0, red)]);
        assert_eq!(s.matches("38;2;255;0;0").count(), 1);
    }

    #[test]
    fn color_change_reemits() {
        let red = Cell::new('A').with_fg(CellColor::Rgb(255, 0, 0));
        let blue = Cell::new('B').with_fg(CellColor::Rgb(0, 0, 255));
        let s = rendered(&[(0, 0, red), (1, 0, blue)]);
        assert!(s.contains("38;2;255;0;0"));
        assert!(s.contains("38;2;0;0;255"));
    }

    #[test]
    fn attr_change_resets_first() {
        let bold = Cell::new('A').with_attrs(Attr::BOLD);
        let plain = Cell::new('B');
        let s = rendered(&[(0, 0, bold), (1, 0, plain)]);
        // Going bold → plain must pass through SGR 0.
        assert!(s.contains("\x1b[0m"));
    }

    #[test]
    fn entering_attrs_skips_reset() {
        let plain = Cell::new('A');
        let bold = Cell::new('B').with_attrs(Attr::BOLD);
        let s = rendered(&[(0, 0, plain), (1, 0, bold)]);
        assert!(!s.contains("\x1b[0m"));
        assert!(s.contains("\x1b[1m"));
    }

    // ── CellWriter: continuation cells ───────────────────────────────────

    #[test]
    fn continuation_after_lead_is_silent() {
        let lead = Cell::new('計');
        let cont = Cell::continuation(CellColor::Default, CellColor::Default, Attr::empty());
        let s = rendered(&[(0, 0, lead), (1, 0, cont)]);
        assert!(s.ends_with('計'));
        assert!(!s.contains('?'));
    }

    #[test]
    fn orphaned_continuation_paints_space() {
        let cont = Cell::continuation(CellColor::Default, CellColor::Default, Attr::empty());
        let s = rendered(&[(4, 2, cont)]);
        assert!(s.contains("\x1b[3;5H"));
        assert!(s.ends_with(' '));
    }

    // ── reset_state ──────────────────────────────────────────────────────

    #[test]
    fn reset_state_forgets_tracking() {
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        let red = Cell::new('A').with_fg(CellColor::Rgb(255, 0, 0));

        writer.render_cell(&mut out, 0, 0, &red);
        out.clear();
        writer.reset_state();
        writer.render_cell(&mut out, 1, 0, &red);

        let s = String::from_utf8(out.as_bytes().to_vec()).unwrap();
        // After reset, position and color both re-emit.
        assert!(s.contains("\x1b[1;2H"));
        assert!(s.contains("38;2;255;0;0"));
    }
}
