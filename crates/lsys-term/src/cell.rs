// SPDX-License-Identifier: MIT
//
// Cell — one character position on screen.
//
// A cell is a character plus SGR attributes. There are no colors: the
// viewer draws with glyph density alone and highlights the status line with
// INVERSE.
//
// Wide characters (CJK, some emoji) occupy two columns. The first cell holds
// the character; the second is a continuation cell (ch = '\0') that the
// writer never outputs.

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// SGR text attributes.
    ///
    /// ```
    /// use lsys_term::cell::Attr;
    ///
    /// let style = Attr::BOLD | Attr::INVERSE;
    /// assert!(style.contains(Attr::INVERSE));
    /// assert!(!style.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1.
        const BOLD      = 1 << 0;
        /// SGR 2.
        const DIM       = 1 << 1;
        /// SGR 4.
        const UNDERLINE = 1 << 2;
        /// SGR 7 — swap foreground and background.
        const INVERSE   = 1 << 3;
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Character to display; `'\0'` marks a wide-character continuation.
    pub ch: char,
    pub attrs: Attr,
}

const CONTINUATION: char = '\0';

impl Cell {
    /// A space with no attributes.
    pub const EMPTY: Self = Self {
        ch: ' ',
        attrs: Attr::empty(),
    };

    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            attrs: Attr::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_attrs(mut self, attrs: Attr) -> Self {
        self.attrs = attrs;
        self
    }

    /// Second column of a wide character.
    #[inline]
    #[must_use]
    pub const fn continuation(attrs: Attr) -> Self {
        Self {
            ch: CONTINUATION,
            attrs,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.ch == CONTINUATION
    }

    /// The character, or `None` for a continuation cell.
    #[inline]
    #[must_use]
    pub const fn character(&self) -> Option<char> {
        if self.is_continuation() {
            None
        } else {
            Some(self.ch)
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
