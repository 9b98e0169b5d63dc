use kurbo::Point;

/// A straight segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub p0: Point,
    pub p1: Point,
    /// Stroke width carried along this segment.
    pub thickness: f64,
}

impl LineSegment {
    /// A line contributes exactly one stroke sample: its end point.
    pub const STROKE_STEPS: usize = 1;

    pub fn new(p0: Point, p1: Point, thickness: f64) -> Self {
        Self { p0, p1, thickness }
    }

    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.p0, &mut self.p1);
    }

    pub fn length(&self) -> f64 {
        (self.p1 - self.p0).hypot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_swaps_endpoints() {
        let mut line = LineSegment::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0), 2.0);
        line.reverse();
        assert_eq!(line.p0, Point::new(3.0, 4.0));
        assert_eq!(line.p1, Point::new(0.0, 0.0));
        assert_eq!(line.length(), 5.0);
        line.reverse();
        assert_eq!(line.p0, Point::new(0.0, 0.0));
    }
}
