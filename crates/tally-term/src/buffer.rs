// SPDX-License-Identifier: MIT
//
// FrameBuffer — the 2D cell grid that everything paints to.
//
// The application paints its whole UI into this grid each frame; the
// diff renderer then compares it against the previous frame and emits
// ANSI only for what changed.
//
// Design:
//
//   - Flat `Vec<Cell>` with row-major indexing. A row's cells are
//     contiguous, so the renderer's left-to-right scan is a linear
//     walk, and whole-row equality is one slice comparison.
//
//   - Text painting is grapheme-aware: `set_text` walks grapheme
//     clusters, consults their display width, and writes continuation
//     cells after wide characters so CJK and symbol glyphs occupy the
//     columns the terminal will actually give them.
//
//   - The frame is cleared and fully repainted every dirty frame, so
//     paint methods don't need to repair stale wide-character state.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::cell::Cell;

// ─── Rect ────────────────────────────────────────────────────────────────────

/// A rectangular region of the frame, used for panel layout and fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left column.
    pub x: u16,
    /// Top row.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Create a region.
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Whether the region has zero area.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ─── FrameBuffer ─────────────────────────────────────────────────────────────

/// A 2D buffer of terminal cells.
///
/// ```
/// use tally_term::buffer::FrameBuffer;
/// use tally_term::cell::Cell;
///
/// let mut frame = FrameBuffer::new(80, 24);
/// frame.set(5, 3, Cell::new('X'));
/// assert_eq!(frame.get(5, 3).unwrap().character(), Some('X'));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// Create a buffer filled with empty cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; size],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Buffer width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The full buffer as a [`Rect`].
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Whether `(x, y)` lies inside the buffer.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The cell at `(x, y)`, or `None` out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&self.cells[idx])
        } else {
            None
        }
    }

    /// One full row of cells, or `None` out of bounds. Rows are
    /// contiguous, which is what makes the renderer's whole-row skip a
    /// single slice comparison.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            let end = start + usize::from(self.width);
            Some(&self.cells[start..end])
        } else {
            None
        }
    }

    // ─── Painting ────────────────────────────────────────────────────────

    /// Write one cell. Out-of-bounds writes are silently dropped.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }

    /// Paint a string starting at `(x, y)`, styled like `template`
    /// (its colors and attributes; its character is ignored).
    ///
    /// Walks grapheme clusters. A double-width cluster writes its lead
    /// codepoint plus a continuation cell; a wide cluster that would
    /// straddle the right edge is dropped. Painting stops at the edge.
    /// Returns the column after the last painted cell.
    pub fn set_text(&mut self, x: u16, y: u16, text: &str, template: Cell) -> u16 {
        if y >= self.height {
            return x;
        }

        let mut col = x;
        for grapheme in text.graphemes(true) {
            let width = grapheme.width().min(2) as u16;
            if width == 0 {
                // Zero-width cluster (combining mark on its own) — skip.
                continue;
            }
            if col >= self.width || col + width > self.width {
                break;
            }

            let ch = grapheme.chars().next().unwrap_or(' ');
            self.set(col, y, Cell { ch: ch as u32, ..template });
            if width == 2 {
                self.set(
                    col + 1,
                    y,
                    Cell::continuation(template.fg, template.bg, template.attrs),
                );
            }
            col += width;
        }
        col
    }

    /// Fill a region with copies of `cell`, clipped to the buffer.
    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let right = rect.right().min(self.width);
        let bottom = rect.bottom().min(self.height);
        for y in rect.y..bottom {
            for x in rect.x..right {
                let idx = self.index(x, y);
                self.cells[idx] = cell;
            }
        }
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    // ─── Reshaping ───────────────────────────────────────────────────────

    /// Resize to new dimensions, clearing all content.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = usize::from(width) * usize::from(height);
        self.cells.clear();
        self.cells.resize(size, Cell::EMPTY);
    }

    /// Copy another buffer's content into this one.
    ///
    /// Reuses this buffer's allocation when the dimensions match — the
    /// renderer calls this every frame to store the previous frame
    /// without allocating.
    pub fn copy_from(&mut self, other: &Self) {
        self.width = other.width;
        self.height = other.height;
        self.cells.clone_from(&other.cells);
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}x{})", self.width, self.height)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
