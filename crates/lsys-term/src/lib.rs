// SPDX-License-Identifier: MIT
//
// lsys-term — terminal backend for lsys-tty.
//
// A small, monochrome terminal layer: raw mode and the alternate screen via
// termios, a byte-level key parser, a cell grid the viewer paints ASCII art
// into, and a differential renderer that only rewrites rows that changed.
//
// No colors. Every cell is a character plus a few SGR attributes (the status
// line is drawn inverse). The viewer redraws large areas of glyphs on every
// keystroke, so the row-skipping diff and single-write output buffer carry
// most of the performance.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod diff;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod terminal;
