//! Session: the viewer's state and the intents that drive it.
//!
//! A [`Session`] owns the grammar store, the current [`ViewState`], the
//! runtime [`Settings`], and a one-entry cache of the expanded command
//! string. The front end decodes keystrokes into [`Intent`]s and hands them
//! to [`Session::apply`]; painting asks for [`Session::render_frame`] and
//! [`Session::status_line`].
//!
//! # Generation cache
//!
//! The expansion is keyed by `(selected, revision, iterations)`. After every
//! intent the key is recomputed and the string rebuilt only if it changed,
//! so panning or turning never re-expands, while any edit does.
//!
//! # Failed regeneration
//!
//! Expansion is capped at [`Settings::max_expansion`]. When an intent would
//! need a longer string, `apply` puts the store and view back the way they
//! were before the intent and returns the error. The displayed generation
//! therefore always matches the displayed state.
//!
//! ```text
//! Intent ──▶ handler ──▶ cache key changed? ──no──▶ Applied { false }
//!                               │yes
//!                               ▼
//!                        expand_bounded ──ok──▶ Applied { true }
//!                               │err
//!                               ▼
//!                        restore snapshot ──▶ Err(TooLarge)
//! ```

use crate::config::{
    ANGLE_STEP, ITERATION_LENGTH_FACTOR, LENGTH_STEP, MIN_SEGMENT_LENGTH, PAN_STEP, Settings,
};
use crate::edit::{EditCursor, edit_preview};
use crate::error::GenerationError;
use crate::glyph::{TextImage, quantize};
use crate::grammar::{FractalDef, GrammarStore};
use crate::raster::Rasterizer;
use crate::rewrite::expand_bounded;
use crate::turtle::{Point, TurtleParams, interpret};

/// Name given to a fractal created by [`Intent::NewFractal`].
pub const NEW_FRACTAL_NAME: &str = "New Fractal";

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Everything about the display that isn't part of a fractal definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Index into the grammar store.
    pub selected: usize,
    /// Turn angle in degrees.
    pub angle: i32,
    pub iterations: u32,
    /// Turtle step in pixels.
    pub segment_length: f64,
    /// Initial turtle heading in degrees.
    pub start_heading: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub cursor: EditCursor,
}

impl ViewState {
    fn for_fractal(selected: usize, def: &FractalDef, settings: &Settings) -> Self {
        Self {
            selected,
            angle: def.initial_angle(),
            iterations: settings.iterations,
            segment_length: settings.segment_length,
            start_heading: 0,
            offset_x: 0,
            offset_y: 0,
            cursor: EditCursor::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// One user action, already decoded from whatever input produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    NextFractal,
    PrevFractal,
    TurnLeft,
    TurnRight,
    GrowLength,
    ShrinkLength,
    IncIterations,
    DecIterations,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    RotateStartHeadingCw,
    RotateStartHeadingCcw,
    EnterEditField(usize),
    ToggleEditKeyOrValue,
    EditKey,
    EditValue,
    AppendChar(char),
    Backspace,
    MoveEditCursorUp,
    MoveEditCursorDown,
    /// Clone the selected fractal under [`NEW_FRACTAL_NAME`] and select it.
    NewFractal,
}

/// Outcome of a successful [`Session::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applied {
    /// The expanded string was rebuilt.
    pub regenerated: bool,
}

// ---------------------------------------------------------------------------
// Generation cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GenerationKey {
    selected: usize,
    revision: u64,
    iterations: u32,
}

#[derive(Debug, Clone)]
struct Generation {
    key: GenerationKey,
    commands: String,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The viewer's complete state.
#[derive(Debug, Clone)]
pub struct Session {
    store: GrammarStore,
    view: ViewState,
    settings: Settings,
    rasterizer: Rasterizer,
    generation: Generation,
}

impl Session {
    /// Start on the first fractal of `store`.
    ///
    /// # Errors
    ///
    /// [`GenerationError::TooLarge`] if the initial expansion exceeds
    /// `settings.max_expansion`.
    pub fn new(store: GrammarStore, settings: Settings) -> Result<Self, GenerationError> {
        Self::starting_at(store, settings, 0)
    }

    /// Start on fractal `selected` (wrapped into range).
    ///
    /// # Errors
    ///
    /// [`GenerationError::TooLarge`] if the initial expansion exceeds
    /// `settings.max_expansion`.
    pub fn starting_at(
        store: GrammarStore,
        settings: Settings,
        selected: usize,
    ) -> Result<Self, GenerationError> {
        let selected = selected % store.len();
        let view = ViewState::for_fractal(selected, &store[selected], &settings);
        let key = Self::key_for(&store, &view);
        let def = &store[selected];
        let commands = expand_bounded(
            def.axiom(),
            def.rules(),
            view.iterations,
            settings.max_expansion,
        )?;
        tracing::debug!(
            fractal = def.name(),
            iterations = view.iterations,
            len = commands.len(),
            "initial generation"
        );

        Ok(Self {
            rasterizer: Rasterizer::new(settings.stretch_x),
            store,
            view,
            settings,
            generation: Generation { key, commands },
        })
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub const fn store(&self) -> &GrammarStore {
        &self.store
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The fractal being viewed or edited.
    #[must_use]
    pub fn selected(&self) -> &FractalDef {
        &self.store[self.view.selected]
    }

    /// The cached expanded command string.
    #[must_use]
    pub fn generated(&self) -> &str {
        &self.generation.commands
    }

    /// Edit-mode text block for the selected fractal.
    #[must_use]
    pub fn edit_preview(&self) -> Vec<String> {
        edit_preview(self.selected(), &self.view.cursor)
    }

    // -- Apply --------------------------------------------------------------

    /// Run one intent and bring the generation up to date.
    ///
    /// # Errors
    ///
    /// [`GenerationError::TooLarge`] when the resulting state would expand
    /// past the length cap. The session is then left exactly as it was
    /// before the call.
    pub fn apply(&mut self, intent: Intent) -> Result<Applied, GenerationError> {
        let snapshot = (self.store.clone(), self.view.clone());

        self.dispatch(intent);

        match self.regenerate() {
            Ok(regenerated) => Ok(Applied { regenerated }),
            Err(err) => {
                tracing::warn!(?intent, %err, "regeneration failed, state restored");
                (self.store, self.view) = snapshot;
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::NextFractal => self.select(self.store.next_index(self.view.selected)),
            Intent::PrevFractal => self.select(self.store.prev_index(self.view.selected)),
            Intent::TurnLeft => self.turn(-ANGLE_STEP),
            Intent::TurnRight => self.turn(ANGLE_STEP),
            Intent::GrowLength => self.scale_length(LENGTH_STEP),
            Intent::ShrinkLength => self.scale_length(LENGTH_STEP.recip()),
            Intent::IncIterations => self.inc_iterations(),
            Intent::DecIterations => self.dec_iterations(),
            Intent::PanUp => self.pan(0, -PAN_STEP),
            Intent::PanDown => self.pan(0, PAN_STEP),
            Intent::PanLeft => self.pan(-PAN_STEP, 0),
            Intent::PanRight => self.pan(PAN_STEP, 0),
            Intent::RotateStartHeadingCw => self.rotate_start_heading(ANGLE_STEP),
            Intent::RotateStartHeadingCcw => self.rotate_start_heading(-ANGLE_STEP),
            Intent::EnterEditField(index) => self.enter_edit_field(index),
            Intent::ToggleEditKeyOrValue => self.view.cursor.toggle_key_value(),
            Intent::EditKey => self.view.cursor.select_key(),
            Intent::EditValue => self.view.cursor.select_value(),
            Intent::AppendChar(ch) => self.append_char(ch),
            Intent::Backspace => self.backspace(),
            Intent::MoveEditCursorUp => self.move_edit_cursor_up(),
            Intent::MoveEditCursorDown => self.move_edit_cursor_down(),
            Intent::NewFractal => self.new_fractal(),
        }
    }

    fn key_for(store: &GrammarStore, view: &ViewState) -> GenerationKey {
        GenerationKey {
            selected: view.selected,
            revision: store[view.selected].revision(),
            iterations: view.iterations,
        }
    }

    /// Rebuild the expansion if its key is stale. Returns whether it was.
    fn regenerate(&mut self) -> Result<bool, GenerationError> {
        let key = Self::key_for(&self.store, &self.view);
        if key == self.generation.key {
            return Ok(false);
        }

        let def = self.selected();
        let commands = expand_bounded(
            def.axiom(),
            def.rules(),
            self.view.iterations,
            self.settings.max_expansion,
        )?;
        tracing::debug!(
            fractal = def.name(),
            iterations = key.iterations,
            revision = key.revision,
            len = commands.len(),
            "regenerated"
        );
        self.generation = Generation { key, commands };
        Ok(true)
    }

    // -- View handlers ------------------------------------------------------

    fn select(&mut self, index: usize) {
        self.store[self.view.selected].discard_placeholder_rule();
        self.view.selected = index;
        self.view.angle = self.store[index].initial_angle();
        self.view.cursor.reset();
    }

    const fn turn(&mut self, delta: i32) {
        self.view.angle = self.view.angle.saturating_add(delta);
    }

    const fn rotate_start_heading(&mut self, delta: i32) {
        self.view.start_heading = self.view.start_heading.saturating_add(delta);
    }

    fn scale_length(&mut self, factor: f64) {
        self.view.segment_length = (self.view.segment_length * factor).max(MIN_SEGMENT_LENGTH);
    }

    fn inc_iterations(&mut self) {
        self.view.iterations = self.view.iterations.saturating_add(1);
        self.scale_length(ITERATION_LENGTH_FACTOR.recip());
    }

    fn dec_iterations(&mut self) {
        if self.view.iterations == 0 {
            return;
        }
        self.view.iterations -= 1;
        self.scale_length(ITERATION_LENGTH_FACTOR);
    }

    const fn pan(&mut self, dx: i32, dy: i32) {
        self.view.offset_x = self.view.offset_x.saturating_add(dx);
        self.view.offset_y = self.view.offset_y.saturating_add(dy);
    }

    fn new_fractal(&mut self) {
        let copy = self.selected().clone_as(NEW_FRACTAL_NAME);
        let index = self.store.push(copy);
        tracing::debug!(index, "new fractal");
        self.select(index);
    }

    // -- Edit handlers ------------------------------------------------------

    fn enter_edit_field(&mut self, index: usize) {
        let def = &self.store[self.view.selected];
        self.view.cursor.enter_field(def, index);
    }

    fn append_char(&mut self, ch: char) {
        let def = &mut self.store[self.view.selected];
        self.view.cursor.insert_char(def, ch);
    }

    fn backspace(&mut self) {
        let def = &mut self.store[self.view.selected];
        self.view.cursor.backspace(def);
    }

    fn move_edit_cursor_up(&mut self) {
        let def = &mut self.store[self.view.selected];
        self.view.cursor.move_up(def);
    }

    fn move_edit_cursor_down(&mut self) {
        let def = &mut self.store[self.view.selected];
        self.view.cursor.move_down(def);
    }

    // -- Output -------------------------------------------------------------

    /// Draw the current generation into a `width × height` glyph frame.
    ///
    /// The turtle starts at `(width / 4 + offset_x, height / 2 + offset_y)`
    /// before the horizontal stretch, i.e. halfway across once stretched.
    #[must_use]
    pub fn render_frame(&self, width: u32, height: u32) -> TextImage {
        let params = TurtleParams {
            turn_angle: f64::from(self.view.angle),
            start_heading: f64::from(self.view.start_heading),
            start: Point::new(
                f64::from(width / 4) + f64::from(self.view.offset_x),
                f64::from(height / 2) + f64::from(self.view.offset_y),
            ),
            length: self.view.segment_length,
        };
        let canvas = self
            .rasterizer
            .rasterize(width, height, interpret(self.generated(), params));
        quantize(&canvas, &self.settings.glyph_ramp)
    }

    /// One-line summary: fractal list with the selection in `<>`, the view
    /// parameters, and the key legend.
    #[must_use]
    pub fn status_line(&self) -> String {
        let mut line = String::new();
        for (i, def) in self.store.iter().enumerate() {
            if i == self.view.selected {
                line.push('<');
                line.push_str(def.name());
                line.push_str("> ");
            } else {
                line.push(' ');
                line.push_str(def.name());
                line.push_str("  ");
            }
        }
        line.push_str(&format!(
            "- Angle: {} (Left Right) | Iterations: {} (I O) | Length: {:.3} (Up Down)",
            self.view.angle, self.view.iterations, self.view.segment_length,
        ));
        line.push_str(" | Quit: X | Heading: Q E | Pan: W A S D | New: R");
        line
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
