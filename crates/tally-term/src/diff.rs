// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// Instead of redrawing the whole screen every frame, compare the
// current FrameBuffer against the previous one and emit ANSI only for
// the cells that changed. A keypress on the calculator touches the
// readout and maybe one history row — a handful of cells out of the
// whole screen. The diff turns a repaint into a surgical update.
//
// Per frame:
//
//   1. The application paints into a FrameBuffer.
//   2. render() diffs it against the stored previous frame. Unchanged
//      rows are skipped with one slice comparison; changed cells go
//      through the CellWriter for minimal escape output.
//   3. Everything lands in the OutputBuffer; flush() is one write()
//      syscall, bracketed by synchronized-output (DEC 2026) so the
//      terminal presents the frame atomically.
//
// The previous-frame buffer is reused across frames (copy_from), so
// steady-state rendering allocates nothing.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::FrameBuffer;
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from one render pass, for tests and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the previous frame and were emitted.
    pub cells_rendered: usize,
    /// Cells that matched the previous frame and were skipped.
    pub cells_skipped: usize,
    /// Bytes of ANSI output generated.
    pub bytes_written: usize,
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Renders frames by diffing against the previous one.
///
/// ```no_run
/// use tally_term::buffer::FrameBuffer;
/// use tally_term::diff::DiffRenderer;
///
/// let mut renderer = DiffRenderer::new();
/// let frame = FrameBuffer::new(80, 24);
/// // ... paint into `frame` ...
/// let stats = renderer.render(&frame);
/// renderer.flush().unwrap();
/// ```
pub struct DiffRenderer {
    output: OutputBuffer,
    writer: CellWriter,
    previous: Option<FrameBuffer>,
}

impl DiffRenderer {
    /// A renderer with no previous frame — the first render draws
    /// everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            previous: None,
        }
    }

    /// Diff `current` against the previous frame and generate output.
    ///
    /// Follow with [`flush`](Self::flush) (or
    /// [`flush_to`](Self::flush_to) in tests) to deliver the bytes.
    pub fn render(&mut self, current: &FrameBuffer) -> RenderStats {
        self.output.clear();
        self.writer.reset_state();

        let width = current.width();
        let height = current.height();
        let mut stats = RenderStats::default();

        if width == 0 || height == 0 {
            self.store_frame(current);
            return stats;
        }

        ansi::begin_sync(&mut self.output).ok();

        // First render, or a resize, forces a full redraw.
        let size_matches = self
            .previous
            .as_ref()
            .is_some_and(|prev| prev.width() == width && prev.height() == height);
        let full_redraw = !size_matches;

        if full_redraw {
            ansi::clear_screen(&mut self.output).ok();
            ansi::cursor_to(&mut self.output, 0, 0).ok();
        }

        for y in 0..height {
            // Whole-row skip: one slice comparison per unchanged row.
            if !full_redraw {
                let unchanged = self
                    .previous
                    .as_ref()
                    .and_then(|prev| Some((current.row(y)?, prev.row(y)?)))
                    .is_some_and(|(cur, prev)| cur == prev);
                if unchanged {
                    stats.cells_skipped += usize::from(width);
                    continue;
                }
            }

            for x in 0..width {
                let Some(cell) = current.get(x, y) else { continue };

                let changed = full_redraw
                    || self.previous.as_ref().and_then(|p| p.get(x, y)) != Some(cell);

                if changed {
                    self.writer.render_cell(&mut self.output, x, y, cell);
                    stats.cells_rendered += 1;
                } else {
                    stats.cells_skipped += 1;
                }
            }
        }

        // Leave the terminal in a clean state between frames.
        ansi::reset(&mut self.output).ok();
        ansi::end_sync(&mut self.output).ok();

        stats.bytes_written = self.output.len();
        self.store_frame(current);
        stats
    }

    /// The raw bytes from the last render (for tests).
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Write the accumulated output to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush_stdout()
    }

    /// Write the accumulated output to an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }

    /// Forget the previous frame so the next render draws everything.
    /// Used after a resize and for manual refresh.
    pub fn force_redraw(&mut self) {
        self.previous = None;
    }

    /// Store the frame for the next diff, reusing the allocation when
    /// dimensions match.
    fn store_frame(&mut self, current: &FrameBuffer) {
        match &mut self.previous {
            Some(prev) => prev.copy_from(current),
            None => self.previous = Some(current.clone()),
        }
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
