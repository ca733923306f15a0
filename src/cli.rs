// SPDX-License-Identifier: MIT
//
// Command-line flags.
//
// Every flag maps onto a `Settings` field or a front-end choice. Values are
// parsed by clap; cross-field checks happen in `Settings::validate`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use lsys_core::config::{
    DEFAULT_ITERATIONS, DEFAULT_MAX_EXPANSION, DEFAULT_SEGMENT_LENGTH, HORIZONTAL_STRETCH,
};
use lsys_core::{ConfigError, GlyphRamp, Settings};

/// L-system fractal viewer and editor that draws ASCII art in the terminal.
#[derive(Parser, Debug)]
#[command(name = "lsys-tty")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Rewrite generations at startup
    #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u32,

    /// Turtle step length in pixels at startup
    #[arg(short, long, default_value_t = DEFAULT_SEGMENT_LENGTH)]
    pub length: f64,

    /// Longest expanded string before a generation is refused
    #[arg(long, default_value_t = DEFAULT_MAX_EXPANSION, value_name = "SYMBOLS")]
    pub max_expansion: usize,

    /// Glyphs from darkest to lightest (at least 10)
    #[arg(long, value_name = "GLYPHS")]
    pub ramp: Option<GlyphRamp>,

    /// Index of the fractal shown first
    #[arg(short, long, default_value_t = 0, value_name = "INDEX")]
    pub fractal: usize,

    /// Write logs to this file (filtered by RUST_LOG, default info)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print one frame of this size to stdout and exit
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub print: Option<Dimensions>,
}

impl Args {
    /// Runtime settings from the flags.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found by [`Settings::validate`].
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let settings = Settings {
            glyph_ramp: self.ramp.clone().unwrap_or_default(),
            stretch_x: HORIZONTAL_STRETCH,
            max_expansion: self.max_expansion,
            iterations: self.iterations,
            segment_length: self.length,
        };
        settings.validate()?;
        Ok(settings)
    }
}

// ─── Dimensions ─────────────────────────────────────────────────────────────

/// Largest accepted side of a `--print` frame, in cells.
pub const MAX_PRINT_SIDE: u32 = 65_535;

/// `WIDTHxHEIGHT` in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Dimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_PRINT_SIDE).contains(n))
                .ok_or_else(|| format!("{part:?} is not an integer in 1..={MAX_PRINT_SIDE}"))
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
