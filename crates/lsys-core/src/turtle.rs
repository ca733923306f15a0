//! Turtle-graphics interpretation of an expanded command string.
//!
//! The turtle has a position, a heading in degrees, and a branch stack.
//! Commands are read one symbol at a time:
//!
//! | Symbol | Effect                                                   |
//! |--------|----------------------------------------------------------|
//! | `+`    | heading += turn angle                                    |
//! | `-`    | heading -= turn angle                                    |
//! | `[`    | push (position, heading)                                 |
//! | `]`    | pop (position, heading); no-op on an empty stack          |
//! | other  | step forward by `length`, emitting a [`Segment`]         |
//!
//! [`Turtle`] is a lazy iterator over segments. It borrows the command
//! string and allocates only for the branch stack, so a frame can stream
//! millions of segments into the rasterizer without collecting them. It is
//! `Clone`, and interpreting the same inputs again yields the same sequence.

use std::str::Chars;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in canvas pixel space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One straight stroke drawn by the turtle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Everything the turtle needs besides the command string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleParams {
    /// Degrees added by `+` and subtracted by `-`.
    pub turn_angle: f64,
    /// Initial heading in degrees; 0 points along +x.
    pub start_heading: f64,
    /// Initial position.
    pub start: Point,
    /// Step length for drawing symbols.
    pub length: f64,
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            turn_angle: 90.0,
            start_heading: 0.0,
            start: Point::default(),
            length: 1.0,
        }
    }
}

/// Snapshot of the turtle between commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub position: Point,
    pub heading: f64,
    pub depth: usize,
}

// ---------------------------------------------------------------------------
// Turtle
// ---------------------------------------------------------------------------

/// Start interpreting `commands`. Nothing runs until the iterator is pulled.
#[must_use]
pub fn interpret(commands: &str, params: TurtleParams) -> Turtle<'_> {
    Turtle::new(commands, params)
}

/// Lazy segment iterator over a command string.
#[derive(Debug, Clone)]
pub struct Turtle<'a> {
    commands: Chars<'a>,
    turn_angle: f64,
    length: f64,
    position: Point,
    heading: f64,
    stack: Vec<(Point, f64)>,
    underflows: usize,
}

impl<'a> Turtle<'a> {
    #[must_use]
    pub fn new(commands: &'a str, params: TurtleParams) -> Self {
        Self {
            commands: commands.chars(),
            turn_angle: params.turn_angle,
            length: params.length,
            position: params.start,
            heading: params.start_heading,
            stack: Vec::new(),
            underflows: 0,
        }
    }

    /// Current position, heading, and branch depth.
    #[must_use]
    pub fn state(&self) -> TurtleState {
        TurtleState {
            position: self.position,
            heading: self.heading,
            depth: self.stack.len(),
        }
    }

    /// Number of `]` seen so far with nothing to pop.
    #[inline]
    #[must_use]
    pub const fn underflows(&self) -> usize {
        self.underflows
    }

    /// Run the remaining commands without collecting segments and return the
    /// final state.
    #[must_use]
    pub fn finish(mut self) -> TurtleState {
        while self.next().is_some() {}
        self.state()
    }

    fn forward(&mut self) -> Segment {
        let rad = self.heading.to_radians();
        let from = self.position;
        let to = Point::new(
            from.x + self.length * rad.cos(),
            from.y + self.length * rad.sin(),
        );
        self.position = to;
        Segment { from, to }
    }
}

impl Iterator for Turtle<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        loop {
            match self.commands.next()? {
                '+' => self.heading += self.turn_angle,
                '-' => self.heading -= self.turn_angle,
                '[' => self.stack.push((self.position, self.heading)),
                ']' => {
                    if let Some((position, heading)) = self.stack.pop() {
                        self.position = position;
                        self.heading = heading;
                    } else {
                        self.underflows += 1;
                        tracing::trace!(count = self.underflows, "branch stack underflow ignored");
                    }
                }
                _ => return Some(self.forward()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
