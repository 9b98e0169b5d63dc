//! Path segments: straight lines and cubic Béziers.
//!
//! Quadratics are degree-elevated on entry, so the rest of the
//! pipeline only ever matches on these two variants.

mod classify;
mod cubic;
mod line;

pub use classify::Fan;
pub use cubic::{CubicSegment, CurveClass, StrokeStepper, Subdivision};
pub use line::LineSegment;

use kurbo::Point;

/// One segment of a subpath.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Line(LineSegment),
    Cubic(CubicSegment),
}

impl Segment {
    pub fn start(&self) -> Point {
        match self {
            Segment::Line(line) => line.p0,
            Segment::Cubic(curve) => curve.points[0],
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Segment::Line(line) => line.p1,
            Segment::Cubic(curve) => curve.points[3],
        }
    }

    pub fn thickness(&self) -> f64 {
        match self {
            Segment::Line(line) => line.thickness,
            Segment::Cubic(curve) => curve.thickness,
        }
    }

    pub fn set_thickness(&mut self, thickness: f64) {
        match self {
            Segment::Line(line) => line.thickness = thickness,
            Segment::Cubic(curve) => curve.set_thickness(thickness),
        }
    }

    pub fn reverse(&mut self) {
        match self {
            Segment::Line(line) => line.reverse(),
            Segment::Cubic(curve) => curve.reverse(),
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, Segment::Cubic(_))
    }

    /// Number of stroke sample points this segment contributes.
    pub fn stroke_steps(&self) -> usize {
        match self {
            Segment::Line(_) => LineSegment::STROKE_STEPS,
            Segment::Cubic(curve) => curve.stepper().map_or(1, |s| s.steps + 1),
        }
    }
}
