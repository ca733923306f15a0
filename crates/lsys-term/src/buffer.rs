// SPDX-License-Identifier: MIT
//
// FrameBuffer — the cell grid the application paints each frame.
//
// Flat `Vec<Cell>` in row-major order, so a row is a contiguous slice and
// the diff renderer can compare whole rows with one slice equality.
//
// Text painting is clipped at the right edge and understands wide
// characters: a two-column character gets a continuation cell, and one that
// would straddle the edge is replaced by a space.

use unicode_width::UnicodeWidthChar;

use crate::cell::{Attr, Cell};

// ─── FrameBuffer ────────────────────────────────────────────────────────────────

/// A 2D grid of terminal cells, `index = y * width + x`.
///
/// ```
/// use lsys_term::buffer::FrameBuffer;
/// use lsys_term::cell::Attr;
///
/// let mut buf = FrameBuffer::new(10, 2);
/// buf.paint_text(0, 1, "$$ab", Attr::empty());
/// assert_eq!(buf.row_text(1), "$$ab      ");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    // ─── Construction ────────────────────────────────────────────────────

    /// A buffer of empty cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The cell at `(x, y)`, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Overwrite one cell. Returns `false` if out of bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        true
    }

    /// Row `y` as a slice.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// Row `y` as plain text, continuation cells dropped. Empty if out of
    /// bounds.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|cells| cells.iter().filter_map(Cell::character).collect())
            .unwrap_or_default()
    }

    // ─── Clear & Resize ──────────────────────────────────────────────────

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Change dimensions. All content is cleared.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(usize::from(width) * usize::from(height), Cell::EMPTY);
    }

    /// Copy every cell from a buffer of the same size. Returns `false` (and
    /// copies nothing) when sizes differ.
    pub fn copy_from(&mut self, other: &Self) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        self.cells.copy_from_slice(&other.cells);
        true
    }

    // ─── Painting ────────────────────────────────────────────────────────

    /// Set `attrs` on every cell of row `y`, keeping the characters.
    pub fn fill_row_attrs(&mut self, y: u16, attrs: Attr) {
        if y >= self.height {
            return;
        }
        let start = self.index(0, y);
        let end = start + usize::from(self.width);
        for cell in &mut self.cells[start..end] {
            cell.attrs = attrs;
        }
    }

    /// Paint `text` left to right from `(x, y)`, clipped at the right edge.
    ///
    /// Zero-width characters are skipped. A wide character that doesn't fit
    /// in the last column becomes a space. Returns the columns consumed.
    pub fn paint_text(&mut self, x: u16, y: u16, text: &str, attrs: Attr) -> u16 {
        if y >= self.height {
            return 0;
        }

        let mut col = x;
        for ch in text.chars() {
            if col >= self.width {
                break;
            }

            let w = ch.width().unwrap_or(0);
            if w == 0 {
                continue;
            }

            if w == 2 {
                if col + 1 >= self.width {
                    self.set(col, y, Cell::new(' ').with_attrs(attrs));
                    col += 1;
                    break;
                }
                self.set(col, y, Cell::new(ch).with_attrs(attrs));
                self.set(col + 1, y, Cell::continuation(attrs));
                col += 2;
            } else {
                self.set(col, y, Cell::new(ch).with_attrs(attrs));
                col += 1;
            }
        }

        col - x
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}x{})", self.width, self.height)
    }
}

// ─── Text Width ─────────────────────────────────────────────────────────────────

/// Display width of a string in terminal columns.
///
/// ```
/// use lsys_term::buffer::string_width;
///
/// assert_eq!(string_width("Sierpiński"), 10);
/// assert_eq!(string_width("中文"), 4);
/// ```
#[must_use]
pub fn string_width(s: &str) -> usize {
    s.chars().map(|ch| ch.width().unwrap_or(0)).sum()
}

// ─── Tests ──────────────────────────────────────────────────────────────────────
