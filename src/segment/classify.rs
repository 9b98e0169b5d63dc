//! Loop-Blinn classification and implicit texture coordinates.
//!
//! Each cubic gets per-control-point `(k, l, m)` coordinates such that a
//! pixel is inside the curve iff `k³ - l·m < 0` after barycentric
//! interpolation. See "Resolution Independent Curve Rendering using
//! Programmable Graphics Hardware" (Loop & Blinn, 2005) and GPU Gems 3,
//! chapter 25.

use kurbo::Point;

use crate::geom::{is_triangle_convex, snap_to_zero};

use super::cubic::{CubicSegment, CurveClass, Subdivision};

const ONE_THIRD: f64 = 1.0 / 3.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;

/// Triangles fanned over the four control points, as indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fan {
    indices: [u8; 6],
    len: u8,
}

impl Fan {
    pub const EMPTY: Fan = Fan { indices: [0; 6], len: 0 };
    /// Split along the p0-p3 diagonal, both inner points used.
    const DIAGONAL: Fan = Fan { indices: [0, 1, 3, 0, 2, 3], len: 6 };
    /// Two triangles sharing p1-p3.
    const SHARE_13: Fan = Fan { indices: [1, 0, 3, 1, 2, 3], len: 6 };
    /// Two triangles sharing p1-p2.
    const SHARE_12: Fan = Fan { indices: [1, 0, 2, 1, 2, 3], len: 6 };
    /// p2 lies inside triangle p0 p1 p3.
    const HULL_013: Fan = Fan { indices: [0, 1, 3, 0, 0, 0], len: 3 };
    /// p1 lies inside triangle p0 p2 p3.
    const HULL_023: Fan = Fan { indices: [0, 2, 3, 0, 0, 0], len: 3 };

    pub fn as_slice(&self) -> &[u8] {
        &self.indices[..self.len as usize]
    }

    /// Fan for the reversed control point order.
    pub fn reversed(self) -> Fan {
        let mut out = self;
        for i in &mut out.indices[..self.len as usize] {
            *i = 3 - *i;
        }
        out
    }

    /// Pick the fan tiling the control polygon's convex hull.
    ///
    /// Decided by cross-product signs only.
    pub fn select(points: &[Point; 4]) -> Fan {
        let [p0, p1, p2, p3] = *points;
        let convex = is_triangle_convex(p0, p1, p3);
        if convex != is_triangle_convex(p0, p2, p3) {
            return Fan::DIAGONAL;
        }
        // "Same side as the hull" flips with the hull's own orientation.
        if is_triangle_convex(p0, p1, p2) ^ !convex {
            if is_triangle_convex(p2, p1, p3) ^ !convex {
                Fan::HULL_013
            } else {
                Fan::SHARE_13
            }
        } else if is_triangle_convex(p1, p2, p3) ^ !convex {
            Fan::HULL_023
        } else {
            Fan::SHARE_12
        }
    }
}

/// The three projective invariants `(d1, d2, d3)` of the cubic, each
/// snapped to zero within `eps`.
pub fn invariants(points: &[Point; 4], eps: f64) -> [f64; 3] {
    let [b0, b1, b2, b3] = *points;
    let a1 = triple(b0, b3, b2);
    let a2 = triple(b1, b0, b3);
    let a3 = triple(b2, b1, b0);
    [
        snap_to_zero(a1 - 2.0 * a2 + 3.0 * a3, eps),
        snap_to_zero(-a2 + 3.0 * a3, eps),
        snap_to_zero(3.0 * a3, eps),
    ]
}

/// `a · (b × c)` with every point lifted to `(x, y, 1)`.
fn triple(a: Point, b: Point, c: Point) -> f64 {
    let cx = b.y - c.y;
    let cy = c.x - b.x;
    let cz = b.x * c.y - b.y * c.x;
    a.x * cx + a.y * cy + cz
}

fn normalized(s: f64, t: f64) -> (f64, f64) {
    let len = s.hypot(t);
    if len > 0.0 {
        (s / len, t / len)
    } else {
        (s, t)
    }
}

fn sign_of(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn quadratic_coords(d3: f64) -> [[f64; 3]; 4] {
    let s = sign_of(d3);
    [
        [0.0, 0.0, 0.0],
        [ONE_THIRD * s, 0.0, ONE_THIRD],
        [TWO_THIRDS * s, ONE_THIRD * s, TWO_THIRDS],
        [s, s, 1.0],
    ]
}

/// Cusp with its inflection pair at infinity (`d1 == 0`).
fn cusp_coords(d2: f64, d3: f64) -> [[f64; 3]; 4] {
    let (ls, lt) = normalized(d3, 3.0 * d2);
    let l = lt - ls;
    [
        [ls, ls * ls * ls, 1.0],
        [ls - ONE_THIRD * lt, ls * ls * -l, 1.0],
        [ls - TWO_THIRDS * lt, l * l * ls, 1.0],
        [-l, -l * l * l, 1.0],
    ]
}

fn serpentine_coords(d1: f64, d2: f64, discr: f64) -> [[f64; 3]; 4] {
    let root = (3.0 * discr).sqrt();
    let (ls, lt) = normalized(3.0 * d2 - root, 6.0 * d1);
    let (ms, mt) = normalized(3.0 * d2 + root, 6.0 * d1);
    let l = lt - ls;
    let m = mt - ms;
    let s = sign_of(d1);
    [
        [ls * ms * s, ls * ls * ls * s, ms * ms * ms],
        [
            ONE_THIRD * (3.0 * ls * ms - ls * mt - lt * ms) * s,
            ls * ls * -l * s,
            ms * ms * -m,
        ],
        [
            ONE_THIRD * (lt * (mt - 2.0 * ms) + ls * (3.0 * ms - 2.0 * mt)) * s,
            l * l * ls * s,
            m * m * ms,
        ],
        [l * m * s, -l * l * l * s, -m * m * m],
    ]
}

/// Normalized double-point roots of a loop.
struct LoopRoots {
    ls: f64,
    lt: f64,
    ms: f64,
    mt: f64,
}

impl LoopRoots {
    fn new(d1: f64, d2: f64, discr: f64) -> Self {
        let root = (-discr).sqrt();
        let (ls, lt) = normalized(d2 - root, 2.0 * d1);
        let (ms, mt) = normalized(d2 + root, 2.0 * d1);
        Self { ls, lt, ms, mt }
    }

    /// Parameter of the self-intersection when it falls inside the segment.
    fn split_parameter(&self) -> Option<f64> {
        let ql = self.ls / self.lt;
        let qm = self.ms / self.mt;
        if ql > 0.0 && ql < 1.0 {
            Some(ql)
        } else if qm > 0.0 && qm < 1.0 {
            Some(qm)
        } else {
            None
        }
    }

    fn coords(&self, d1: f64, eps: f64) -> [[f64; 3]; 4] {
        let LoopRoots { ls, lt, ms, mt } = *self;
        let l = lt - ls;
        let m = mt - ms;
        let k1 = snap_to_zero(ls * ms, eps);
        let s = if (d1 > 0.0 && k1 < 0.0) || (d1 < 0.0 && k1 > 0.0) { -1.0 } else { 1.0 };
        [
            [k1 * s, ls * ls * ms * s, ls * ms * ms],
            [
                ONE_THIRD * (-ls * mt - lt * ms + 3.0 * ls * ms) * s,
                -ONE_THIRD * ls * (ls * (mt - 3.0 * ms) + 2.0 * lt * ms) * s,
                -ONE_THIRD * ms * (ls * (2.0 * mt - 3.0 * ms) + lt * ms),
            ],
            [
                ONE_THIRD * (lt * (mt - 2.0 * ms) + ls * (3.0 * ms - 2.0 * mt)) * s,
                ONE_THIRD * l * (ls * (2.0 * mt - 3.0 * ms) + lt * ms) * s,
                ONE_THIRD * m * (ls * (mt - 3.0 * ms) + 2.0 * lt * ms),
            ],
            [l * m * s, -l * l * m * s, -l * m * m],
        ]
    }
}

impl CubicSegment {
    /// Classify this curve (or every leaf below it) and assign coords
    /// and triangles.
    ///
    /// A loop whose double point falls inside `(0, 1)` is split there and
    /// both halves are classified with `force = true`, which stops any
    /// further splitting.
    pub fn classify(&mut self, force: bool, eps: f64) {
        if let Subdivision::Split { left, right } = &mut self.subdivision {
            left.classify(force, eps);
            right.classify(force, eps);
            return;
        }

        let [d1, d2, d3] = invariants(&self.points, eps);
        let (class, coords) = if d1 == 0.0 && d2 == 0.0 && d3 == 0.0 {
            (CurveClass::Degenerate, None)
        } else if d1 == 0.0 && d2 == 0.0 {
            (CurveClass::Quadratic, Some(quadratic_coords(d3)))
        } else if d1 == 0.0 {
            (CurveClass::Cusp, Some(cusp_coords(d2, d3)))
        } else {
            let discr = snap_to_zero(3.0 * d2 * d2 - 4.0 * d1 * d3, eps);
            if discr >= 0.0 {
                (CurveClass::Serpentine, Some(serpentine_coords(d1, d2, discr)))
            } else {
                let roots = LoopRoots::new(d1, d2, discr);
                match roots.split_parameter() {
                    Some(t) if !force => {
                        log::trace!("loop double point at t={:.4}, splitting", t);
                        self.class = CurveClass::Loop;
                        self.subdivide(t);
                        if let Some((left, right)) = self.children_mut() {
                            left.classify(true, eps);
                            right.classify(true, eps);
                        }
                        return;
                    }
                    _ => (CurveClass::Loop, Some(roots.coords(d1, eps))),
                }
            }
        };

        self.class = class;
        self.coords = coords;
        self.fan = if coords.is_some() {
            Fan::select(&self.points)
        } else {
            Fan::EMPTY
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{signed_area, triangle_area};

    const EPS: f64 = 5e-5;

    fn cubic(pts: [(f64, f64); 4]) -> CubicSegment {
        let [a, b, c, d] = pts.map(|(x, y)| Point::new(x, y));
        CubicSegment::new(a, b, c, d, 1.0)
    }

    fn classified(pts: [(f64, f64); 4]) -> CubicSegment {
        let mut c = cubic(pts);
        c.classify(false, EPS);
        c
    }

    /// Convex hull area of four points (monotone chain).
    fn hull_area(points: &[Point; 4]) -> f64 {
        fn half(pts: impl Iterator<Item = Point>) -> Vec<Point> {
            let mut chain: Vec<Point> = Vec::new();
            for p in pts {
                while chain.len() >= 2
                    && crate::geom::cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0
                {
                    chain.pop();
                }
                chain.push(p);
            }
            chain.pop();
            chain
        }
        let mut pts = points.to_vec();
        pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        let mut hull = half(pts.iter().copied());
        hull.extend(half(pts.iter().rev().copied()));
        signed_area(&hull).abs()
    }

    fn fan_area(c: &CubicSegment) -> f64 {
        c.triangles()
            .chunks(3)
            .map(|t| {
                let p = |i: u8| c.points[i as usize];
                triangle_area(p(t[0]), p(t[1]), p(t[2])).abs()
            })
            .sum()
    }

    #[test]
    fn arch_is_an_unsplit_loop() {
        // The double point lies at t ≈ -0.37 and t ≈ 1.37, outside the segment.
        let c = classified([(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        assert_eq!(c.class(), CurveClass::Loop);
        assert!(c.is_leaf(), "no split expected");
        let mid = c.implicit_at(0.5).expect("coords");
        assert!(mid.abs() < 1e-3, "implicit at midpoint = {}", mid);
        assert_eq!(c.triangles(), &[1, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn loop_with_inner_double_point_splits_once() {
        let c = classified([(0.0, 0.0), (30.0, 10.0), (-20.0, 10.0), (10.0, 0.0)]);
        assert!(!c.is_leaf());
        assert!(c.coords().is_none(), "split node has no coords");
        let (left, right) = c.children().expect("split");
        for half in [left, right] {
            assert!(half.is_leaf(), "forced classification never splits");
            assert!(half.coords().is_some());
            assert!(!half.triangles().is_empty());
            let v = half.implicit_at(0.5).expect("coords");
            assert!(v.abs() < 1e-6, "implicit on curve = {}", v);
        }
    }

    #[test]
    fn serpentine_and_cusp() {
        let s = classified([(0.0, 0.0), (5.0, 10.0), (10.0, 10.0), (20.0, 0.0)]);
        assert_eq!(s.class(), CurveClass::Serpentine);
        let c = classified([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 10.0)]);
        assert_eq!(c.class(), CurveClass::Cusp);
        for curve in [&s, &c] {
            for t in [0.25, 0.5, 0.75] {
                let v = curve.implicit_at(t).expect("coords");
                assert!(v.abs() < 1e-6, "{:?} implicit at {} = {}", curve.class(), t, v);
            }
        }
    }

    #[test]
    fn elevated_quadratic() {
        let mut q = CubicSegment::from_quadratic(
            Point::new(0.0, 0.0),
            Point::new(5.0, 10.0),
            Point::new(10.0, 0.0),
            1.0,
        );
        q.classify(false, EPS);
        assert_eq!(q.class(), CurveClass::Quadratic);
        for t in [0.3, 0.6] {
            let v = q.implicit_at(t).expect("coords");
            assert!(v.abs() < 1e-9, "quadratic implicit at {} = {}", t, v);
        }
    }

    #[test]
    fn collinear_is_degenerate() {
        let c = classified([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert_eq!(c.class(), CurveClass::Degenerate);
        assert!(c.coords().is_none());
        assert!(c.triangles().is_empty());
    }

    #[test]
    fn inside_rule_holds_off_curve() {
        // Sample just inside and outside the arch along the chord normal.
        let c = classified([(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let coords = c.coords().expect("coords");
        // Barycentric interpolation over triangle (p1, p0, p3) of the fan.
        let klm_at = |p: Point| {
            let (a, b, d) = (c.points[1], c.points[0], c.points[3]);
            let area = triangle_area(a, b, d);
            let wa = triangle_area(p, b, d) / area;
            let wb = triangle_area(a, p, d) / area;
            let wd = 1.0 - wa - wb;
            let mut klm = [0.0; 3];
            for j in 0..3 {
                klm[j] = wa * coords[1][j] + wb * coords[0][j] + wd * coords[3][j];
            }
            klm[0].powi(3) - klm[1] * klm[2]
        };
        // Curve apex is at (5, 7.5).
        let below = klm_at(Point::new(5.0, 6.0));
        let above = klm_at(Point::new(5.0, 8.5));
        assert!(below * above < 0.0, "apex must separate the two samples");
    }

    #[test]
    fn fans_tile_the_hull() {
        let cases: [([(f64, f64); 4], &[u8]); 5] = [
            ([(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)], &[1, 0, 3, 1, 2, 3]),
            ([(0.0, 0.0), (5.0, 10.0), (5.0, -10.0), (10.0, 0.0)], &[0, 1, 3, 0, 2, 3]),
            ([(0.0, 0.0), (5.0, 10.0), (5.0, 5.0), (10.0, 0.0)], &[0, 1, 3]),
            ([(0.0, 0.0), (5.0, 5.0), (5.0, 10.0), (10.0, 0.0)], &[0, 2, 3]),
            ([(0.0, 0.0), (10.0, 10.0), (0.0, 10.0), (10.0, 0.0)], &[1, 0, 2, 1, 2, 3]),
        ];
        for (pts, expected) in cases {
            let c = classified(pts);
            assert_eq!(c.triangles(), expected, "fan for {:?}", pts);
            let hull = hull_area(&c.points);
            assert!(
                (fan_area(&c) - hull).abs() < 1e-9,
                "fan area {} != hull area {} for {:?}",
                fan_area(&c),
                hull,
                pts
            );
        }
    }

    #[test]
    fn reversed_fan_is_involution() {
        for fan in [Fan::DIAGONAL, Fan::SHARE_13, Fan::SHARE_12, Fan::HULL_013, Fan::HULL_023] {
            assert_eq!(fan.reversed().reversed(), fan);
            assert!(fan.reversed().as_slice().iter().all(|&i| i < 4));
        }
    }

    #[test]
    fn invariants_snap_small_values() {
        let [d1, d2, d3] = invariants(
            &[
                Point::new(0.0, 0.0),
                Point::new(1.0, 1e-6),
                Point::new(2.0, -1e-6),
                Point::new(3.0, 0.0),
            ],
            EPS,
        );
        assert_eq!((d1, d2, d3), (0.0, 0.0, 0.0));
    }
}
