//! Segment rasterization onto an RGB pixel canvas.
//!
//! The canvas starts white and every segment is drawn as a black,
//! anti-aliased, one-pixel line (Xiaolin Wu's algorithm). Coverage darkens
//! the existing pixel multiplicatively, so overlapping strokes only ever get
//! darker and the quantizer sees a monotone image.
//!
//! Before drawing, each point's x is multiplied by the horizontal stretch
//! (see [`HORIZONTAL_STRETCH`]). One pixel becomes one terminal cell, and
//! cells are about twice as tall as they are wide.
//!
//! Segments are clipped to a margin around the canvas before the scan, so a
//! runaway segment length costs no more than an on-screen line.

use image::{Rgb, RgbImage};

use crate::config::HORIZONTAL_STRETCH;
use crate::turtle::{Point, Segment};

/// Pixel canvas the rasterizer draws into.
pub type Canvas = RgbImage;

/// Blank canvas color.
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Fully covered stroke color.
pub const STROKE: Rgb<u8> = Rgb([0, 0, 0]);

/// Pixels of slack kept around the canvas when clipping, so that the
/// anti-aliased fringe of a line just outside the edge still lands.
const CLIP_MARGIN: f64 = 2.0;

// ---------------------------------------------------------------------------
// Rasterizer
// ---------------------------------------------------------------------------

/// Draws turtle segments into a [`Canvas`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rasterizer {
    stretch_x: f64,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(HORIZONTAL_STRETCH)
    }
}

impl Rasterizer {
    #[must_use]
    pub const fn new(stretch_x: f64) -> Self {
        Self { stretch_x }
    }

    #[inline]
    #[must_use]
    pub const fn stretch_x(&self) -> f64 {
        self.stretch_x
    }

    /// A white canvas of the given size.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Canvas {
        RgbImage::from_pixel(width, height, BACKGROUND)
    }

    /// Draw every segment onto a fresh white canvas.
    pub fn rasterize<I>(&self, width: u32, height: u32, segments: I) -> Canvas
    where
        I: IntoIterator<Item = Segment>,
    {
        let mut canvas = Self::blank(width, height);
        let mut drawn = 0usize;
        for seg in segments {
            self.draw_segment(&mut canvas, seg);
            drawn += 1;
        }
        tracing::trace!(width, height, segments = drawn, "rasterized frame");
        canvas
    }

    /// Stretch, clip, and draw one segment.
    pub fn draw_segment(&self, canvas: &mut Canvas, seg: Segment) {
        let from = Point::new(seg.from.x * self.stretch_x, seg.from.y);
        let to = Point::new(seg.to.x * self.stretch_x, seg.to.y);

        let bounds = ClipBounds::around(canvas);
        if let Some((a, b)) = bounds.clip(from, to) {
            draw_line_aa(canvas, a, b);
        }
    }
}

// ---------------------------------------------------------------------------
// Clipping (Liang–Barsky)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct ClipBounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl ClipBounds {
    fn around(canvas: &Canvas) -> Self {
        Self {
            min_x: -CLIP_MARGIN,
            min_y: -CLIP_MARGIN,
            max_x: f64::from(canvas.width()) + CLIP_MARGIN,
            max_y: f64::from(canvas.height()) + CLIP_MARGIN,
        }
    }

    /// The part of `a → b` inside the bounds, or `None` if nothing is.
    fn clip(self, a: Point, b: Point) -> Option<(Point, Point)> {
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return None;
        }

        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        let edges = [
            (-dx, a.x - self.min_x),
            (dx, self.max_x - a.x),
            (-dy, a.y - self.min_y),
            (dy, self.max_y - a.y),
        ];

        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        Some((
            Point::new(dx.mul_add(t0, a.x), dy.mul_add(t0, a.y)),
            Point::new(dx.mul_add(t1, a.x), dy.mul_add(t1, a.y)),
        ))
    }
}

// ---------------------------------------------------------------------------
// Xiaolin Wu line
// ---------------------------------------------------------------------------

#[inline]
fn fpart(v: f64) -> f64 {
    v - v.floor()
}

#[inline]
fn rfpart(v: f64) -> f64 {
    1.0 - fpart(v)
}

#[inline]
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Draw an anti-aliased line between two canvas-space points.
///
/// Pixels outside the canvas are skipped.
#[allow(clippy::similar_names)]
pub fn draw_line_aa(canvas: &mut Canvas, a: Point, b: Point) {
    let (mut x0, mut y0, mut x1, mut y1) = (a.x, a.y, b.x, b.y);

    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let gradient = if dx == 0.0 { 1.0 } else { dy / dx };

    let mut plot = |x: f64, y: f64, coverage: f64| {
        if steep {
            darken(canvas, y, x, coverage);
        } else {
            darken(canvas, x, y, coverage);
        }
    };

    // First endpoint.
    let xend = round_half_up(x0);
    let yend = gradient.mul_add(xend - x0, y0);
    let xgap = rfpart(x0 + 0.5);
    let xpxl1 = xend;
    let ypxl1 = yend.floor();
    plot(xpxl1, ypxl1, rfpart(yend) * xgap);
    plot(xpxl1, ypxl1 + 1.0, fpart(yend) * xgap);
    let mut intery = yend + gradient;

    // Second endpoint.
    let xend = round_half_up(x1);
    let yend = gradient.mul_add(xend - x1, y1);
    let xgap = fpart(x1 + 0.5);
    let xpxl2 = xend;
    let ypxl2 = yend.floor();
    plot(xpxl2, ypxl2, rfpart(yend) * xgap);
    plot(xpxl2, ypxl2 + 1.0, fpart(yend) * xgap);

    // Span between the endpoints.
    let mut x = xpxl1 + 1.0;
    while x < xpxl2 {
        let y = intery.floor();
        plot(x, y, rfpart(intery));
        plot(x, y + 1.0, fpart(intery));
        intery += gradient;
        x += 1.0;
    }
}

/// Blend pixel `(x, y)` toward [`STROKE`] by `coverage` in `[0, 1]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn darken(canvas: &mut Canvas, x: f64, y: f64, coverage: f64) {
    if coverage <= 0.0 || x < 0.0 || y < 0.0 {
        return;
    }
    // Non-negative and checked against the canvas size below.
    let (px, py) = (x as u64, y as u64);
    if px >= u64::from(canvas.width()) || py >= u64::from(canvas.height()) {
        return;
    }
    let keep = 1.0 - coverage.min(1.0);
    let pixel = canvas.get_pixel_mut(px as u32, py as u32);
    for channel in &mut pixel.0 {
        *channel = (f64::from(*channel) * keep).round() as u8;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment {
            from: Point::new(x0, y0),
            to: Point::new(x1, y1),
        }
    }

    fn is_white(canvas: &Canvas) -> bool {
        canvas.pixels().all(|p| *p == BACKGROUND)
    }

    // -- Canvas -------------------------------------------------------------

    #[test]
    fn blank_canvas_is_white() {
        let canvas = Rasterizer::blank(8, 4);
        assert_eq!(canvas.dimensions(), (8, 4));
        assert!(is_white(&canvas));
    }

    #[test]
    fn no_segments_leaves_canvas_white() {
        let canvas = Rasterizer::default().rasterize(10, 10, std::iter::empty());
        assert!(is_white(&canvas));
    }

    // -- Lines --------------------------------------------------------------

    #[test]
    fn horizontal_line_is_black_inside() {
        let canvas = Rasterizer::new(1.0).rasterize(8, 4, [seg(0.0, 1.0, 4.0, 1.0)]);
        for x in 1..=3 {
            assert_eq!(*canvas.get_pixel(x, 1), STROKE, "pixel ({x}, 1)");
        }
        assert_eq!(*canvas.get_pixel(2, 0), BACKGROUND);
        assert_eq!(*canvas.get_pixel(2, 2), BACKGROUND);
        assert_eq!(*canvas.get_pixel(6, 1), BACKGROUND);
    }

    #[test]
    fn endpoints_are_partially_covered() {
        let canvas = Rasterizer::new(1.0).rasterize(8, 4, [seg(0.0, 1.0, 4.0, 1.0)]);
        let p = canvas.get_pixel(0, 1).0[0];
        assert!(p > 0 && p < 255, "endpoint value {p}");
    }

    #[test]
    fn vertical_line_is_drawn() {
        let canvas = Rasterizer::new(1.0).rasterize(4, 8, [seg(2.0, 0.0, 2.0, 5.0)]);
        for y in 1..=4 {
            assert_eq!(*canvas.get_pixel(2, y), STROKE, "pixel (2, {y})");
        }
    }

    #[test]
    fn diagonal_line_darkens_its_path() {
        let canvas = Rasterizer::new(1.0).rasterize(8, 8, [seg(0.0, 0.0, 6.0, 6.0)]);
        for i in 1..6 {
            assert!(canvas.get_pixel(i, i).0[0] < 128, "pixel ({i}, {i})");
        }
        assert_eq!(*canvas.get_pixel(6, 0), BACKGROUND);
    }

    #[test]
    fn stretch_doubles_x() {
        let canvas = Rasterizer::new(2.0).rasterize(12, 4, [seg(0.0, 1.0, 4.0, 1.0)]);
        // Drawn from x=0 to x=8 after stretching.
        assert_eq!(*canvas.get_pixel(6, 1), STROKE);
        assert_eq!(*canvas.get_pixel(10, 1), BACKGROUND);
    }

    #[test]
    fn default_stretch_is_two() {
        assert!((Rasterizer::default().stretch_x() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlapping_strokes_only_darken() {
        let once = Rasterizer::new(1.0).rasterize(8, 8, [seg(0.3, 2.4, 7.0, 2.4)]);
        let twice = Rasterizer::new(1.0).rasterize(
            8,
            8,
            [seg(0.3, 2.4, 7.0, 2.4), seg(0.3, 2.4, 7.0, 2.4)],
        );
        for (a, b) in once.pixels().zip(twice.pixels()) {
            assert!(b.0[0] <= a.0[0]);
        }
    }

    // -- Clipping -----------------------------------------------------------

    #[test]
    fn offscreen_segment_draws_nothing() {
        let canvas = Rasterizer::new(1.0).rasterize(8, 8, [seg(-50.0, -50.0, -20.0, -40.0)]);
        assert!(is_white(&canvas));
    }

    #[test]
    fn huge_segment_is_clipped_not_scanned() {
        let canvas = Rasterizer::new(1.0).rasterize(8, 8, [seg(-1e12, 3.0, 1e12, 3.0)]);
        for x in 0..8 {
            assert_eq!(*canvas.get_pixel(x, 3), STROKE);
        }
    }

    #[test]
    fn non_finite_segment_is_skipped() {
        let canvas = Rasterizer::new(1.0).rasterize(4, 4, [seg(f64::NAN, 0.0, 2.0, 2.0)]);
        assert!(is_white(&canvas));
    }

    #[test]
    fn zero_length_segment_does_not_panic() {
        let _ = Rasterizer::new(1.0).rasterize(4, 4, [seg(1.0, 1.0, 1.0, 1.0)]);
    }

    #[test]
    fn zero_sized_canvas() {
        let canvas = Rasterizer::default().rasterize(0, 0, [seg(0.0, 0.0, 3.0, 3.0)]);
        assert_eq!(canvas.dimensions(), (0, 0));
    }
}
