// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell rendering.
//
//   OutputBuffer — collects a whole frame of ANSI bytes so it goes out in a
//   single write().
//
//   CellWriter — remembers where the terminal cursor is and which SGR
//   attributes are active, and only emits the escapes that change something.
//   A row of fractal glyphs with no attributes becomes one cursor move
//   followed by plain characters.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Attr, Cell};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Byte buffer for one frame of terminal output.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `ch` as UTF-8. The continuation marker `'\0'` becomes `?`.
    pub fn write_char(&mut self, ch: char) {
        if ch == '\0' {
            self.buf.push(b'?');
            return;
        }
        let mut enc = [0u8; 4];
        self.buf
            .extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Clear for reuse, keeping capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write everything to stdout and clear.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.flush_to(&mut stdout)
    }

    /// Write everything to `w` and clear.
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

    // Real flushing goes through flush_stdout() / flush_to().
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Renders cells while tracking cursor position and active attributes.
///
/// - Cursor moves are skipped when the cell is directly right of the last one.
/// - An attribute change resets (SGR 0) and re-emits, except when moving
///   from no attributes to some.
/// - A continuation cell right after its wide character emits nothing.
#[allow(clippy::struct_field_names)]
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_attrs: Attr,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_attrs: Attr::empty(),
        }
    }

    /// Forget all tracked state. Call after a screen clear or SGR reset.
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        if cell.is_continuation() && yi == self.last_y && xi == self.last_x + 1 {
            self.last_x = xi;
            return;
        }

        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        self.apply_attrs(out, cell.attrs);
        out.write_char(cell.character().unwrap_or(' '));

        self.last_x = xi;
        self.last_y = yi;
    }

    fn apply_attrs(&mut self, out: &mut OutputBuffer, attrs: Attr) {
        if attrs == self.last_attrs {
            return;
        }
        if !self.last_attrs.is_empty() {
            ansi::reset(out).ok();
        }
        if !attrs.is_empty() {
            ansi::attrs(out, attrs).ok();
        }
        self.last_attrs = attrs;
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
    use pretty_assertions::assert_eq;

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn output_buffer_write_trait() {
        let mut buf = OutputBuffer::new();
        write!(buf, "angle {}", 60).unwrap();
        assert_eq!(buf.as_bytes(), b"angle 60");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn write_char_encodes_utf8() {
        let mut buf = OutputBuffer::new();
        buf.write_char('$');
        buf.write_char('ś');
        assert_eq!(buf.as_bytes(), "$ś".as_bytes());
    }

    #[test]
    fn write_char_replaces_continuation_marker() {
        let mut buf = OutputBuffer::new();
        buf.write_char('\0');
        assert_eq!(buf.as_bytes(), b"?");
    }

    #[test]
    fn flush_to_drains() {
        let mut buf = OutputBuffer::new();
        write!(buf, "frame").unwrap();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"frame");
        assert!(buf.is_empty());

        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"frame");
    }

    // ── CellWriter — helpers ────────────────────────────────────────────

    fn render_seq(cells: &[(u16, u16, Cell)]) -> String {
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        for &(x, y, ref cell) in cells {
            writer.render_cell(&mut out, x, y, cell);
        }
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── CellWriter — cursor ─────────────────────────────────────────────

    #[test]
    fn sequential_cells_share_one_cursor_move() {
        let output = render_seq(&[
            (0, 2, Cell::new('$')),
            (1, 2, Cell::new('@')),
            (2, 2, Cell::new('B')),
        ]);
        assert_eq!(output, "\x1b[3;1H$@B");
    }

    #[test]
    fn gap_or_new_row_moves_cursor() {
        let output = render_seq(&[
            (0, 0, Cell::new('a')),
            (5, 0, Cell::new('b')),
            (5, 1, Cell::new('c')),
        ]);
        assert_eq!(output, "\x1b[1;1Ha\x1b[1;6Hb\x1b[2;6Hc");
    }

    // ── CellWriter — attributes ─────────────────────────────────────────

    #[test]
    fn none_to_attr_skips_reset() {
        let output = render_seq(&[
            (0, 0, Cell::new('a')),
            (1, 0, Cell::new('b').with_attrs(Attr::INVERSE)),
        ]);
        assert_eq!(output, "\x1b[1;1Ha\x1b[7mb");
    }

    #[test]
    fn attr_to_none_resets() {
        let output = render_seq(&[
            (0, 0, Cell::new('a').with_attrs(Attr::INVERSE)),
            (1, 0, Cell::new('b')),
        ]);
        assert_eq!(output, "\x1b[1;1H\x1b[7ma\x1b[0mb");
    }

    #[test]
    fn same_attrs_not_re_emitted() {
        let output = render_seq(&[
            (0, 0, Cell::new('a').with_attrs(Attr::BOLD)),
            (1, 0, Cell::new('b').with_attrs(Attr::BOLD)),
        ]);
        assert_eq!(output.matches("\x1b[1m").count(), 1);
    }

    #[test]
    fn reset_state_forces_cursor_move() {
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        writer.render_cell(&mut out, 0, 0, &Cell::new('a'));
        writer.reset_state();
        writer.render_cell(&mut out, 1, 0, &Cell::new('b'));
        assert_eq!(out.as_bytes(), b"\x1b[1;1Ha\x1b[1;2Hb");
    }

    // ── CellWriter — wide chars ─────────────────────────────────────────

    #[test]
    fn continuation_after_wide_char_skipped() {
        let output = render_seq(&[
            (3, 0, Cell::new('中')),
            (4, 0, Cell::continuation(Attr::empty())),
            (5, 0, Cell::new('x')),
        ]);
        assert_eq!(output, "\x1b[1;4H中x");
    }

    #[test]
    fn orphan_continuation_emits_space() {
        let output = render_seq(&[(4, 0, Cell::continuation(Attr::empty()))]);
        assert_eq!(output, "\x1b[1;5H ");
    }
}
