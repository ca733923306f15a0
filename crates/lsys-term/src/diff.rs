// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// Each frame is compared against the previous one and only changed cells are
// written. Panning or turning a fractal usually rewrites most of the canvas,
// but typing in edit mode or idling on a resize touches a row or two, and the
// status line rarely changes at all.
//
// Per frame:
//
//   1. The app paints a FrameBuffer.
//   2. render() diffs it against the stored previous frame, row by row.
//   3. Changed cells go through CellWriter into an OutputBuffer.
//   4. flush() writes the whole frame with one write().
//
// The frame is wrapped in synchronized output (DEC 2026) so terminals that
// support it never show a half-drawn fractal.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::FrameBuffer;
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Counters from one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub cells_rendered: usize,
    pub cells_skipped: usize,
    pub bytes_written: usize,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Emits ANSI output only for cells that changed since the last frame.
///
/// ```no_run
/// use lsys_term::buffer::FrameBuffer;
/// use lsys_term::diff::DiffRenderer;
///
/// let mut renderer = DiffRenderer::new();
/// let frame = FrameBuffer::new(80, 24);
/// let stats = renderer.render(&frame);
/// renderer.flush().unwrap();
/// assert_eq!(stats.cells_rendered, 80 * 24);
/// ```
pub struct DiffRenderer {
    output: OutputBuffer,
    writer: CellWriter,
    previous: Option<FrameBuffer>,
}

impl DiffRenderer {
    /// A renderer with no previous frame; the first render draws everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            previous: None,
        }
    }

    /// Diff `current` against the previous frame and buffer the output.
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

        let previous = self
            .previous
            .as_ref()
            .filter(|prev| prev.width() == width && prev.height() == height);

        if previous.is_none() {
            ansi::clear_screen(&mut self.output).ok();
            ansi::cursor_to(&mut self.output, 0, 0).ok();
        }

        for y in 0..height {
            let Some(curr_row) = current.row(y) else {
                continue;
            };
            let prev_row = previous.and_then(|prev| prev.row(y));

            if prev_row == Some(curr_row) {
                stats.cells_skipped += curr_row.len();
                continue;
            }

            for (x, cell) in (0..width).zip(curr_row) {
                let unchanged = prev_row
                    .and_then(|row| row.get(usize::from(x)))
                    .is_some_and(|prev| prev == cell);
                if unchanged {
                    stats.cells_skipped += 1;
                } else {
                    self.writer.render_cell(&mut self.output, x, y, cell);
                    stats.cells_rendered += 1;
                }
            }
        }

        ansi::reset(&mut self.output).ok();
        ansi::end_sync(&mut self.output).ok();

        stats.bytes_written = self.output.len();
        self.store_frame(current);
        stats
    }

    /// Raw bytes from the last render.
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush_stdout()
    }

    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }

    /// Forget the previous frame so the next render redraws everything.
    pub fn force_redraw(&mut self) {
        self.previous = None;
    }

    fn store_frame(&mut self, current: &FrameBuffer) {
        match &mut self.previous {
            Some(prev) if prev.width() == current.width() && prev.height() == current.height() => {
                prev.copy_from(current);
            }
            _ => self.previous = Some(current.clone()),
        }
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
