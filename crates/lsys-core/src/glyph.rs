//! Canvas → text quantization.
//!
//! Every pixel becomes one glyph. The pixel's luminance picks a position on a
//! [`GlyphRamp`] ordered from the densest glyph (darkest) to the sparsest
//! (lightest), so a black stroke comes out as `$` and untouched background as
//! a space.

use std::fmt;

use image::Rgb;

use crate::config::{DEFAULT_GLYPH_RAMP, MIN_RAMP_LEN};
use crate::error::ConfigError;
use crate::raster::Canvas;

// ---------------------------------------------------------------------------
// GlyphRamp
// ---------------------------------------------------------------------------

/// Glyphs ordered darkest → lightest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    /// Build a ramp from a string, one glyph per `char`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::RampTooShort`] when `glyphs` has fewer than
    /// [`MIN_RAMP_LEN`] characters.
    pub fn new(glyphs: &str) -> Result<Self, ConfigError> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.len() < MIN_RAMP_LEN {
            return Err(ConfigError::RampTooShort {
                min: MIN_RAMP_LEN,
                got: glyphs.len(),
            });
        }
        Ok(Self { glyphs })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Never true for a constructed ramp.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Ramp position for a gray level (0 = black, 255 = white).
    #[must_use]
    pub fn index_for_gray(&self, gray: u8) -> usize {
        usize::from(gray) * (self.glyphs.len() - 1) / 255
    }

    /// Glyph for a gray level.
    #[must_use]
    pub fn glyph_for_gray(&self, gray: u8) -> char {
        self.glyphs[self.index_for_gray(gray)]
    }

    /// Glyph at ramp position `index`, clamped to the lightest.
    #[must_use]
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_GLYPH_RAMP.chars().collect(),
        }
    }
}

impl std::str::FromStr for GlyphRamp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Luminance
// ---------------------------------------------------------------------------

/// Perceptual gray level `0.30·R + 0.59·G + 0.11·B`, truncated.
///
/// Integer arithmetic, so pure white is exactly 255.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn luminance(rgb: Rgb<u8>) -> u8 {
    let [r, g, b] = rgb.0;
    let weighted = 30 * u32::from(r) + 59 * u32::from(g) + 11 * u32::from(b);
    // At most 100 * 255, so the quotient fits in a u8.
    (weighted / 100) as u8
}

// ---------------------------------------------------------------------------
// TextImage
// ---------------------------------------------------------------------------

/// A quantized frame: one `String` per pixel row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextImage {
    rows: Vec<String>,
}

impl TextImage {
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Glyphs per row (rows are all the same width).
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.chars().count())
    }
}

impl fmt::Display for TextImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}

/// Map every pixel of `canvas` to a glyph, row-major.
#[must_use]
pub fn quantize(canvas: &Canvas, ramp: &GlyphRamp) -> TextImage {
    let rows = canvas
        .rows()
        .map(|row| row.map(|px| ramp.glyph_for_gray(luminance(*px))).collect())
        .collect();
    TextImage { rows }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
