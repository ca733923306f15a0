//! lsys-core — L-system fractals rendered as text.
//!
//! The pipeline, one module per stage:
//!
//! ```text
//! grammar ──▶ rewrite ──▶ turtle ──▶ raster ──▶ glyph
//! FractalDef   expanded    segments   RgbImage   TextImage
//!              string
//! ```
//!
//! - [`grammar`]: fractal definitions, ordered rule sets, the seeded store
//! - [`rewrite`]: generation-by-generation string expansion, optionally capped
//! - [`turtle`]: lazy turtle-graphics interpretation into line segments
//! - [`raster`]: anti-aliased line drawing onto a white canvas
//! - [`glyph`]: luminance → glyph-ramp quantization
//! - [`edit`]: the field-editing state machine used in edit mode
//! - [`view`]: [`Session`](view::Session), intents, and the generation cache
//! - [`config`]: calibration constants and runtime [`Settings`](config::Settings)
//! - [`error`]: error types
//!
//! Nothing here touches the terminal. Front ends decode input into
//! [`Intent`](view::Intent)s and paint the [`TextImage`](glyph::TextImage)
//! and status line however they like.

pub mod config;
pub mod edit;
pub mod error;
pub mod glyph;
pub mod grammar;
pub mod raster;
pub mod rewrite;
pub mod turtle;
pub mod view;

pub use config::Settings;
pub use error::{ConfigError, GenerationError};
pub use glyph::{GlyphRamp, TextImage};
pub use grammar::{FractalDef, GrammarStore, RuleSet};
pub use view::{Applied, Intent, Session};
