//! Cubic Bézier segment with its subdivision tree.

use kurbo::{CubicBez, Point, Vec2};

use crate::geom::signed_area;
use crate::gjk;

use super::classify::Fan;

/// Loop-Blinn curve type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveClass {
    /// Not classified yet.
    Unclassified,
    /// All control points collinear. Rendered by the interior polygon only.
    Degenerate,
    Quadratic,
    Cusp,
    Serpentine,
    Loop,
}

/// Subdivision state. Only leaves carry usable coords and triangles.
#[derive(Debug, Clone, PartialEq)]
pub enum Subdivision {
    Leaf,
    Split {
        left: Box<CubicSegment>,
        right: Box<CubicSegment>,
    },
}

/// Forward-difference coefficients for walking the curve by addition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStepper {
    pub start: Point,
    pub df: Vec2,
    pub ddf: Vec2,
    pub dddf: Vec2,
    /// Intermediate samples between the end points.
    pub steps: usize,
}

impl StrokeStepper {
    /// Coefficients for `steps` intermediate samples, i.e. a parameter
    /// step of `1 / (steps + 1)`.
    fn new(points: &[Point; 4], steps: usize) -> Self {
        let [p0, p1, p2, p3] = *points;
        let h = 1.0 / (steps as f64 + 1.0);
        let h2 = h * h;
        let h3 = h2 * h;

        let tmp1 = p0.to_vec2() - p1.to_vec2() * 2.0 + p2.to_vec2();
        let tmp2 = (p1 - p2) * 3.0 - p0.to_vec2() + p3.to_vec2();

        Self {
            start: p0,
            df: (p1 - p0) * (3.0 * h) + tmp1 * (3.0 * h2) + tmp2 * h3,
            ddf: tmp1 * (6.0 * h2) + tmp2 * (6.0 * h3),
            dddf: tmp2 * (6.0 * h3),
            steps,
        }
    }
}

/// One cubic Bézier segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSegment {
    pub points: [Point; 4],
    pub(crate) thickness: f64,
    pub(super) class: CurveClass,
    pub(super) coords: Option<[[f64; 3]; 4]>,
    pub(super) fan: Fan,
    stepper: Option<StrokeStepper>,
    level: u32,
    pub(super) subdivision: Subdivision,
}

impl CubicSegment {
    pub fn new(p0: Point, p1: Point, p2: Point, p3: Point, thickness: f64) -> Self {
        Self::with_level([p0, p1, p2, p3], thickness, 0)
    }

    /// Degree-elevate a quadratic into an equivalent cubic.
    pub fn from_quadratic(p0: Point, c: Point, p2: Point, thickness: f64) -> Self {
        let c1 = Point::new((p0.x + 2.0 * c.x) / 3.0, (p0.y + 2.0 * c.y) / 3.0);
        let c2 = Point::new((p2.x + 2.0 * c.x) / 3.0, (p2.y + 2.0 * c.y) / 3.0);
        Self::new(p0, c1, c2, p2, thickness)
    }

    fn with_level(points: [Point; 4], thickness: f64, level: u32) -> Self {
        Self {
            points,
            thickness,
            class: CurveClass::Unclassified,
            coords: None,
            fan: Fan::EMPTY,
            stepper: None,
            level,
            subdivision: Subdivision::Leaf,
        }
    }

    pub fn class(&self) -> CurveClass {
        self.class
    }

    /// Per-control-point `(k, l, m)` coordinates. `None` until classified,
    /// for degenerate curves, and for subdivided nodes.
    pub fn coords(&self) -> Option<&[[f64; 3]; 4]> {
        self.coords.as_ref()
    }

    /// Triangle fan over the control points (indices into `points`).
    pub fn triangles(&self) -> &[u8] {
        self.fan.as_slice()
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: f64) {
        self.thickness = thickness;
        if let Subdivision::Split { left, right } = &mut self.subdivision {
            left.set_thickness(thickness);
            right.set_thickness(thickness);
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Forward-difference state, once `update_stroke_stepper` has run.
    pub fn stepper(&self) -> Option<&StrokeStepper> {
        self.stepper.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.subdivision, Subdivision::Leaf)
    }

    pub fn children(&self) -> Option<(&CubicSegment, &CubicSegment)> {
        match &self.subdivision {
            Subdivision::Leaf => None,
            Subdivision::Split { left, right } => Some((left, right)),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<(&mut CubicSegment, &mut CubicSegment)> {
        match &mut self.subdivision {
            Subdivision::Leaf => None,
            Subdivision::Split { left, right } => Some((left, right)),
        }
    }

    pub fn to_kurbo(&self) -> CubicBez {
        let [p0, p1, p2, p3] = self.points;
        CubicBez::new(p0, p1, p2, p3)
    }

    /// Signed area of the control polygon.
    pub fn hull_area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// De Casteljau split at `t`. The halves become exclusively owned
    /// children; this node's own coords and triangles are dropped.
    /// Splitting an already subdivided node is a no-op.
    pub fn subdivide(&mut self, t: f64) {
        if !self.is_leaf() {
            return;
        }
        let [p0, p1, p2, p3] = self.points;
        let p01 = p0.lerp(p1, t);
        let p12 = p1.lerp(p2, t);
        let p23 = p2.lerp(p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);

        let level = self.level + 1;
        self.subdivision = Subdivision::Split {
            left: Box::new(Self::with_level([p0, p01, p012, mid], self.thickness, level)),
            right: Box::new(Self::with_level([mid, p123, p23, p3], self.thickness, level)),
        };
        self.coords = None;
        self.fan = Fan::EMPTY;
    }

    /// Flip the traversal direction. Applying it twice restores the segment.
    pub fn reverse(&mut self) {
        self.points.reverse();
        if let Some(coords) = &mut self.coords {
            coords.reverse();
        }
        self.fan = self.fan.reversed();

        // Walk the reversed curve with the same sample count. The
        // derivatives change sign and are re-anchored at the new start.
        if let Some(stepper) = &mut self.stepper {
            *stepper = StrokeStepper::new(&self.points, stepper.steps);
        }

        if let Subdivision::Split { left, right } = &mut self.subdivision {
            std::mem::swap(left, right);
            left.reverse();
            right.reverse();
        }
    }

    /// Candidate overlap with another curve.
    ///
    /// Descends into subdivided nodes on either side; leaves fall back
    /// to GJK on the raw control polygons.
    pub fn intersects(&self, other: &CubicSegment) -> bool {
        match (&self.subdivision, &other.subdivision) {
            (Subdivision::Split { left, right }, _) => {
                left.intersects(other) || right.intersects(other)
            }
            (Subdivision::Leaf, Subdivision::Split { left, right }) => {
                self.intersects(left) || self.intersects(right)
            }
            (Subdivision::Leaf, Subdivision::Leaf) => gjk::intersects(&self.points, &other.points),
        }
    }

    /// Precompute forward differences for stroking.
    ///
    /// `sx`/`sy` are the axis scale factors of the current transform,
    /// so the sample density follows the on-screen length.
    pub fn update_stroke_stepper(&mut self, sx: f64, sy: f64, step_length: f64) {
        let [p0, p1, p2, p3] = self.points;
        let leg = |a: Point, b: Point| Vec2::new((b.x - a.x) * sx, (b.y - a.y) * sy).hypot();
        let len = leg(p0, p1) + leg(p1, p2) + leg(p2, p3);

        let steps = if step_length > 0.0 {
            (len / step_length).ceil().max(0.0) as usize
        } else {
            0
        };
        self.stepper = Some(StrokeStepper::new(&self.points, steps));
    }

    /// Append the stroke samples after the start point: every
    /// forward-difference step, then the exact end point.
    /// Without a prepared stepper only the end point is emitted.
    pub fn stroke_samples(&self, out: &mut Vec<Point>) {
        if let Some(s) = &self.stepper {
            let mut f = s.start;
            let mut df = s.df;
            let mut ddf = s.ddf;
            for _ in 0..s.steps {
                f += df;
                df += ddf;
                ddf += s.dddf;
                out.push(f);
            }
        }
        out.push(self.points[3]);
    }

    /// Visit every leaf in path order.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a CubicSegment)) {
        match &self.subdivision {
            Subdivision::Leaf => f(self),
            Subdivision::Split { left, right } => {
                left.for_each_leaf(f);
                right.for_each_leaf(f);
            }
        }
    }

    /// Consume the tree, returning its leaves in path order.
    pub fn into_leaves(self) -> Vec<CubicSegment> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(self, out: &mut Vec<CubicSegment>) {
        match self.subdivision {
            Subdivision::Leaf => out.push(self),
            Subdivision::Split { left, right } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    /// Evaluate `k³ - l·m` at parameter `t`, interpolating the
    /// control-point coords with the Bernstein basis.
    pub fn implicit_at(&self, t: f64) -> Option<f64> {
        let coords = self.coords.as_ref()?;
        let u = 1.0 - t;
        let w = [u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t];
        let mut klm = [0.0; 3];
        for (wi, c) in w.iter().zip(coords) {
            for j in 0..3 {
                klm[j] += wi * c[j];
            }
        }
        let [k, l, m] = klm;
        Some(k * k * k - l * m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::ParamCurve;

    fn arch() -> CubicSegment {
        CubicSegment::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            1.0,
        )
    }

    #[test]
    fn subdivide_matches_kurbo_eval() {
        let mut c = arch();
        c.subdivide(0.3);
        let expected = c.to_kurbo().eval(0.3);
        let (left, right) = c.children().expect("split");
        assert!((left.points[3] - expected).hypot() < 1e-12);
        assert_eq!(left.points[3], right.points[0]);
        assert_eq!(left.points[0], c.points[0]);
        assert_eq!(right.points[3], c.points[3]);
        assert_eq!(left.level(), 1);
        assert!(c.coords().is_none());
        assert!(c.triangles().is_empty());
    }

    #[test]
    fn subdivide_twice_is_noop() {
        let mut c = arch();
        c.subdivide(0.5);
        let before = c.clone();
        c.subdivide(0.25);
        assert_eq!(c, before);
    }

    #[test]
    fn reverse_is_involution() {
        let mut c = CubicSegment::new(
            Point::new(0.0, 0.0),
            Point::new(30.0, 10.0),
            Point::new(-20.0, 10.0),
            Point::new(10.0, 0.0),
            2.0,
        );
        c.classify(false, 5e-5);
        c.update_stroke_stepper(1.0, 1.0, 4.0);
        let original = c.clone();
        c.reverse();
        assert_ne!(c, original);
        assert_eq!(c.points[0], original.points[3]);
        let (fwd, back) = (original.stepper().expect("stepper"), c.stepper().expect("stepper"));
        assert_eq!(back.steps, fwd.steps);
        assert_eq!(back.dddf, -fwd.dddf, "third difference flips sign");
        c.reverse();
        assert_eq!(c, original);
    }

    #[test]
    fn reverse_leaf_fan_stays_in_range() {
        let mut c = arch();
        c.classify(false, 5e-5);
        c.reverse();
        assert!(c.triangles().iter().all(|&i| i < 4));
        assert_eq!(c.triangles(), &[2, 3, 0, 2, 1, 0]);
    }

    #[test]
    fn stroke_samples_follow_the_curve() {
        let mut c = arch();
        let mut samples = Vec::new();
        c.stroke_samples(&mut samples);
        assert_eq!(samples, vec![Point::new(10.0, 0.0)], "unprepared stepper");

        c.update_stroke_stepper(1.0, 1.0, 4.0);
        // Control polygon length 30 -> ceil(30 / 4) = 8 intermediate steps.
        assert_eq!(c.stepper().map(|s| s.steps), Some(8));
        let mut samples = Vec::new();
        c.stroke_samples(&mut samples);
        assert_eq!(samples.len(), 9);
        let bez = c.to_kurbo();
        for (i, p) in samples.iter().enumerate() {
            let t = (i + 1) as f64 / 9.0;
            assert!((*p - bez.eval(t)).hypot() < 1e-9, "sample {} off the curve", i);
        }
        assert_eq!(samples[8], Point::new(10.0, 0.0));
    }

    #[test]
    fn stroke_steps_scale_with_transform() {
        let mut c = arch();
        c.update_stroke_stepper(2.0, 2.0, 4.0);
        assert_eq!(c.stepper().map(|s| s.steps), Some(15));
    }

    #[test]
    fn reversed_stepper_walks_backwards() {
        let mut c = arch();
        c.update_stroke_stepper(1.0, 1.0, 4.0);
        c.reverse();
        let mut samples = Vec::new();
        c.stroke_samples(&mut samples);
        assert_eq!(samples.len(), 9);
        assert_eq!(*samples.last().expect("samples"), Point::new(0.0, 0.0));
        let bez = arch().to_kurbo();
        for (i, p) in samples.iter().enumerate() {
            let t = 1.0 - (i + 1) as f64 / 9.0;
            assert!((*p - bez.eval(t)).hypot() < 1e-9, "sample {} off the curve", i);
        }
    }

    #[test]
    fn intersects_descends_into_children() {
        let a = arch();
        let mut b = CubicSegment::new(
            Point::new(5.0, -5.0),
            Point::new(5.0, 5.0),
            Point::new(6.0, 5.0),
            Point::new(6.0, -5.0),
            1.0,
        );
        assert!(a.intersects(&b));
        b.subdivide(0.5);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));

        let far = CubicSegment::new(
            Point::new(50.0, 0.0),
            Point::new(50.0, 10.0),
            Point::new(60.0, 10.0),
            Point::new(60.0, 0.0),
            1.0,
        );
        assert!(!far.intersects(&b));
    }

    #[test]
    fn quadratic_elevation_preserves_shape() {
        let c = CubicSegment::from_quadratic(
            Point::new(0.0, 0.0),
            Point::new(5.0, 10.0),
            Point::new(10.0, 0.0),
            1.0,
        );
        let quad = kurbo::QuadBez::new((0.0, 0.0), (5.0, 10.0), (10.0, 0.0));
        for i in 0..=4 {
            let t = i as f64 / 4.0;
            assert!((c.to_kurbo().eval(t) - quad.eval(t)).hypot() < 1e-9);
        }
    }

    #[test]
    fn leaves_in_path_order() {
        let mut c = arch();
        c.subdivide(0.5);
        if let Some((left, _)) = c.children_mut() {
            left.subdivide(0.5);
        }
        let mut starts = Vec::new();
        c.for_each_leaf(&mut |leaf| starts.push(leaf.points[0]));
        assert_eq!(starts.len(), 3);
        let leaves = c.into_leaves();
        assert_eq!(leaves.len(), 3);
        for pair in leaves.windows(2) {
            assert_eq!(pair[0].points[3], pair[1].points[0]);
        }
        assert_eq!(leaves[0].level(), 2);
        assert_eq!(leaves[2].level(), 1);
    }
}
