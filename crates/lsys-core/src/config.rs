//! Calibration constants and runtime settings.
//!
//! The pipeline has a handful of fixed numbers (glyph ramp, aspect stretch,
//! step sizes for the view controls). They live here as named constants so
//! the rasterizer and quantizer can be tested with other values, and so the
//! front end can override the few that make sense at runtime through
//! [`Settings`].
//!
//! | Constant                  | Value   | Used by                          |
//! |---------------------------|---------|----------------------------------|
//! | [`DEFAULT_GLYPH_RAMP`]    | 68 glyphs, dark → light | quantizer        |
//! | [`HORIZONTAL_STRETCH`]    | `2.0`   | rasterizer (cell aspect ratio)   |
//! | [`DEFAULT_MAX_EXPANSION`] | 4 M     | rewriter length cap              |
//! | [`DEFAULT_ITERATIONS`]    | `5`     | initial view                     |
//! | [`LENGTH_STEP`]           | `1.5`   | grow / shrink segment length     |

use crate::error::ConfigError;
use crate::glyph::GlyphRamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Glyphs from darkest (densest) to lightest. The last one is a space, so a
/// blank canvas quantizes to blank text.
pub const DEFAULT_GLYPH_RAMP: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^` ";

/// Shortest ramp accepted by [`GlyphRamp::new`].
pub const MIN_RAMP_LEN: usize = 10;

/// Horizontal scale applied to every point before drawing.
///
/// Terminal cells are roughly twice as tall as they are wide; one pixel maps
/// to one cell, so X is doubled to keep angles looking right.
pub const HORIZONTAL_STRETCH: f64 = 2.0;

/// Longest expanded command string the rewriter will build.
pub const DEFAULT_MAX_EXPANSION: usize = 4_000_000;

/// Generations shown when the viewer starts.
pub const DEFAULT_ITERATIONS: u32 = 5;

/// Turtle step length when the viewer starts, in pixels.
pub const DEFAULT_SEGMENT_LENGTH: f64 = 1.0;

/// Factor applied by the grow / shrink length controls.
pub const LENGTH_STEP: f64 = 1.5;

/// Factor the segment length is divided by for each added generation.
pub const ITERATION_LENGTH_FACTOR: f64 = 2.0;

/// Segment length never shrinks below this.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Degrees per turn-angle or start-heading keypress.
pub const ANGLE_STEP: i32 = 1;

/// Pixels per pan keypress.
pub const PAN_STEP: i32 = 1;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime knobs for a [`Session`](crate::view::Session).
///
/// Built from defaults and, in the binary, from command-line flags. Call
/// [`validate`](Self::validate) after overriding fields by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Glyphs used by the quantizer, darkest first.
    pub glyph_ramp: GlyphRamp,
    /// Horizontal stretch applied by the rasterizer.
    pub stretch_x: f64,
    /// Upper bound on the expanded string length.
    pub max_expansion: usize,
    /// Generations at startup.
    pub iterations: u32,
    /// Turtle step length at startup.
    pub segment_length: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            glyph_ramp: GlyphRamp::default(),
            stretch_x: HORIZONTAL_STRETCH,
            max_expansion: DEFAULT_MAX_EXPANSION,
            iterations: DEFAULT_ITERATIONS,
            segment_length: DEFAULT_SEGMENT_LENGTH,
        }
    }
}

impl Settings {
    /// Check the numeric fields. The ramp validates itself on construction.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.segment_length.is_finite() && self.segment_length > 0.0) {
            return Err(ConfigError::InvalidLength(self.segment_length.to_string()));
        }
        if !(self.stretch_x.is_finite() && self.stretch_x > 0.0) {
            return Err(ConfigError::InvalidStretch(self.stretch_x.to_string()));
        }
        if self.max_expansion == 0 {
            return Err(ConfigError::ZeroExpansionLimit);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
