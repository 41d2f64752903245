// SPDX-License-Identifier: MIT
//
// Cell — the atomic unit of terminal rendering.
//
// Every character position on screen is a Cell: a Unicode codepoint,
// foreground and background colors, and an attribute bitfield. The
// whole rendering pipeline exists to produce, diff, and output these.
//
// Wide characters (CJK, some emoji) occupy two columns. The first cell
// holds the codepoint; the second is a continuation cell (ch = 0). The
// renderer skips continuation cells when outputting characters but
// still applies their colors for correct background fill.
//
// Size: 16 bytes, Copy. An 80×24 frame is 1,920 cells = 30 KB — the
// double-buffered pair costs nothing worth thinking about.

use crate::color::CellColor;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes as a compact bitfield.
    ///
    /// Each flag maps to one SGR (Select Graphic Rendition) parameter.
    /// Combine with bitwise OR:
    ///
    /// ```
    /// use tally_term::cell::Attr;
    ///
    /// let style = Attr::BOLD | Attr::DIM;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::INVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1 — increased intensity.
        const BOLD      = 1 << 0;
        /// SGR 2 — decreased intensity (faint).
        const DIM       = 1 << 1;
        /// SGR 3 — italic or oblique.
        const ITALIC    = 1 << 2;
        /// SGR 4 — underline.
        const UNDERLINE = 1 << 3;
        /// SGR 7 — swap foreground and background.
        const INVERSE   = 1 << 4;
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// Continuation marker: a cell whose `ch` is 0 belongs to the preceding
/// wide character and produces no character output of its own.
const CONTINUATION: u32 = 0;

/// Default character for empty cells.
const SPACE: u32 = b' ' as u32;

/// A single terminal cell.
///
/// The renderer's job is to produce a grid of these, diff it against
/// the previous frame, and emit minimal ANSI for the differences.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Unicode codepoint to display. `0` marks the continuation column
    /// of a wide character; `b' '` is empty.
    pub ch: u32,
    /// Foreground (text) color.
    pub fg: CellColor,
    /// Background color.
    pub bg: CellColor,
    /// Text attributes.
    pub attrs: Attr,
}

impl Cell {
    /// An empty cell: space, default colors, no attributes.
    pub const EMPTY: Self = Self {
        ch: SPACE,
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    /// A cell showing `ch` with default styling.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: ch as u32,
            fg: CellColor::Default,
            bg: CellColor::Default,
            attrs: Attr::empty(),
        }
    }

    /// A continuation cell for the second column of a wide character.
    ///
    /// Inherits the parent's colors and attributes so backgrounds fill
    /// both columns.
    #[inline]
    #[must_use]
    pub const fn continuation(fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self {
            ch: CONTINUATION,
            fg,
            bg,
            attrs,
        }
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    /// Whether this is a continuation cell.
    #[inline]
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        self.ch == CONTINUATION
    }

    /// The codepoint as a `char`. `None` for continuation cells and
    /// invalid scalar values.
    #[inline]
    #[must_use]
    pub const fn character(self) -> Option<char> {
        if self.ch == CONTINUATION {
            return None;
        }
        char::from_u32(self.ch)
    }

    /// Whether two cells share colors and attributes, character aside.
    /// The renderer uses this to decide when new SGR output is needed.
    #[inline]
    #[must_use]
    pub fn same_style(self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attrs == other.attrs
    }

    // ─── Builders ─────────────────────────────────────────────────────────

    /// Replace the foreground color.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: CellColor) -> Self {
        Self { fg, ..self }
    }

    /// Replace the background color.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: CellColor) -> Self {
        Self { bg, ..self }
    }

    /// Replace the attribute set.
    #[inline]
    #[must_use]
    pub const fn with_attrs(self, attrs: Attr) -> Self {
        Self { attrs, ..self }
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_continuation() {
            return write!(f, "Cell(continuation)");
        }
        let ch = char::from_u32(self.ch).unwrap_or('?');
        write!(f, "Cell({ch:?}")?;
        if self.fg != CellColor::Default {
            write!(f, ", fg={:?}", self.fg)?;
        }
        if self.bg != CellColor::Default {
            write!(f, ", bg={:?}", self.bg)?;
        }
        if !self.attrs.is_empty() {
            write!(f, ", {:?}", self.attrs)?;
        }
        write!(f, ")")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    // ── Layout ───────────────────────────────────────────────────────────

    #[test]
    fn cell_is_16_bytes() {
        assert_eq!(mem::size_of::<Cell>(), 16);
    }

    #[test]
    fn attr_is_1_byte() {
        assert_eq!(mem::size_of::<Attr>(), 1);
    }

    #[test]
    fn cell_is_copy() {
        let a = Cell::new('A');
        let b = a;
        assert_eq!(a, b);
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn default_cell_is_a_plain_space() {
        let cell = Cell::default();
        assert_eq!(cell, Cell::EMPTY);
        assert_eq!(cell.character(), Some(' '));
        assert_eq!(cell.fg, CellColor::Default);
        assert_eq!(cell.bg, CellColor::Default);
        assert!(cell.attrs.is_empty());
    }

    #[test]
    fn new_keeps_the_character() {
        assert_eq!(Cell::new('7').character(), Some('7'));
        assert_eq!(Cell::new('÷').character(), Some('÷'));
    }

    #[test]
    fn builder_chain() {
        let cell = Cell::new('=')
            .with_fg(CellColor::Rgb(255, 255, 255))
            .with_bg(CellColor::Ansi256(4))
            .with_attrs(Attr::BOLD | Attr::INVERSE);
        assert_eq!(cell.character(), Some('='));
        assert_eq!(cell.fg, CellColor::Rgb(255, 255, 255));
        assert_eq!(cell.bg, CellColor::Ansi256(4));
        assert!(cell.attrs.contains(Attr::BOLD));
        assert!(cell.attrs.contains(Attr::INVERSE));
    }

    // ── Continuation ─────────────────────────────────────────────────────

    #[test]
    fn continuation_has_no_character() {
        let cell = Cell::continuation(CellColor::Default, CellColor::Ansi256(0), Attr::DIM);
        assert!(cell.is_continuation());
        assert!(cell.character().is_none());
        assert_eq!(cell.bg, CellColor::Ansi256(0));
        assert!(cell.attrs.contains(Attr::DIM));
    }

    #[test]
    fn regular_cell_is_not_continuation() {
        assert!(!Cell::new('x').is_continuation());
        assert!(!Cell::EMPTY.is_continuation());
    }

    // ── Style comparison ─────────────────────────────────────────────────

    #[test]
    fn same_style_ignores_character() {
        let a = Cell::new('1').with_fg(CellColor::Rgb(200, 200, 200));
        let b = Cell::new('2').with_fg(CellColor::Rgb(200, 200, 200));
        assert!(a.same_style(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn different_styling_detected() {
        let plain = Cell::new('1');
        assert!(!plain.same_style(&plain.with_fg(CellColor::Ansi256(1))));
        assert!(!plain.same_style(&plain.with_bg(CellColor::Ansi256(1))));
        assert!(!plain.same_style(&plain.with_attrs(Attr::BOLD)));
    }

    // ── Debug ────────────────────────────────────────────────────────────

    #[test]
    fn debug_formats() {
        assert_eq!(format!("{:?}", Cell::new('A')), "Cell('A')");
        let styled = format!("{:?}", Cell::new('A').with_attrs(Attr::BOLD));
        assert!(styled.contains("BOLD"));
        let cont = Cell::continuation(CellColor::Default, CellColor::Default, Attr::empty());
        assert_eq!(format!("{cont:?}"), "Cell(continuation)");
    }
}
