//! Convex hull overlap test (GJK) in 2D.
//!
//! Works on the Minkowski difference `B - A` of two small point sets
//! (control polygons, at most 4 points each). All state lives on the
//! stack so concurrent callers never share scratch buffers.

use kurbo::{Point, Vec2};

use crate::geom::is_triangle_convex;

/// Iteration cap. Control polygons converge in a handful of steps;
/// hitting the cap reports a candidate overlap.
const GJK_MAX_ITERATIONS: usize = 32;

/// Whether the convex hulls of `a` and `b` overlap.
///
/// Touching hulls (sharing only a boundary point) report `false`, so
/// consecutive curves joined at an endpoint are not treated as overlapping.
/// A positive answer is a candidate only: hull overlap does not imply
/// curve overlap.
pub fn intersects(a: &[Point], b: &[Point]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let s = support(a, b, a[0] - b[0]);
    let mut simplex = Simplex::new(s);
    let mut dir = -s;

    for _ in 0..GJK_MAX_ITERATIONS {
        let s = support(a, b, dir);
        if dir.dot(s) <= 0.0 {
            return false;
        }
        simplex.push(s);
        match simplex.evolve() {
            Some(next) => dir = next,
            None => return true,
        }
    }
    true
}

/// Support point of the Minkowski difference `B - A` along `dir`.
fn support(a: &[Point], b: &[Point], dir: Vec2) -> Vec2 {
    let pa = farthest(a, -dir);
    let pb = farthest(b, dir);
    pb - pa
}

fn farthest(points: &[Point], dir: Vec2) -> Point {
    let mut best = points[0];
    let mut best_dot = best.to_vec2().dot(dir);
    for &p in &points[1..] {
        let d = p.to_vec2().dot(dir);
        if d > best_dot {
            best = p;
            best_dot = d;
        }
    }
    best
}

/// Perpendicular of `edge` pointing from `a` toward the origin.
fn perp_toward_origin(edge: Vec2, a: Vec2) -> Vec2 {
    let to_origin = -a;
    if -edge.y * to_origin.x + edge.x * to_origin.y > 0.0 {
        Vec2::new(-edge.y, edge.x)
    } else {
        Vec2::new(edge.y, -edge.x)
    }
}

fn convex(a: Vec2, b: Vec2, c: Vec2) -> bool {
    is_triangle_convex(a.to_point(), b.to_point(), c.to_point())
}

/// Up to three Minkowski-difference points; the newest is last.
struct Simplex {
    points: [Vec2; 3],
    len: usize,
}

impl Simplex {
    fn new(p: Vec2) -> Self {
        Self {
            points: [p, Vec2::ZERO, Vec2::ZERO],
            len: 1,
        }
    }

    fn push(&mut self, p: Vec2) {
        self.points[self.len] = p;
        self.len += 1;
    }

    fn set(&mut self, points: &[Vec2]) {
        self.points[..points.len()].copy_from_slice(points);
        self.len = points.len();
    }

    /// Reduce the simplex toward the origin. Returns the next search
    /// direction, or `None` once the triangle encloses the origin.
    fn evolve(&mut self) -> Option<Vec2> {
        if self.len == 2 {
            let (b, a) = (self.points[0], self.points[1]);
            let ab = b - a;
            if ab.dot(-a) < 0.0 {
                self.set(&[a]);
                return Some(-a);
            }
            return Some(perp_toward_origin(ab, a));
        }

        let (mut c, mut b, a) = (self.points[0], self.points[1], self.points[2]);
        if !convex(a, c, b) {
            std::mem::swap(&mut b, &mut c);
        }
        let ab = b - a;
        let ac = c - a;

        if !convex(Vec2::ZERO, a, c) {
            if (-a).dot(ac) > 0.0 {
                self.set(&[c, a]);
                Some(perp_toward_origin(ac, a))
            } else {
                self.set(&[a]);
                Some(-a)
            }
        } else if convex(Vec2::ZERO, a, b) {
            if ab.dot(-a) > 0.0 {
                self.set(&[b, a]);
                Some(perp_toward_origin(ab, a))
            } else {
                self.set(&[a]);
                Some(-a)
            }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    fn translate(points: &[Point], by: Vec2) -> Vec<Point> {
        points.iter().map(|&p| p + by).collect()
    }

    #[test]
    fn disjoint_squares_do_not_intersect() {
        assert!(!intersects(&square(0.0, 0.0, 1.0), &square(5.0, 5.0, 1.0)));
        assert!(!intersects(&square(0.0, 0.0, 1.0), &square(1.5, 0.0, 1.0)));
    }

    #[test]
    fn overlapping_squares_intersect() {
        assert!(intersects(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0)));
    }

    #[test]
    fn containment_intersects() {
        assert!(intersects(&square(0.0, 0.0, 10.0), &square(4.0, 4.0, 1.0)));
        assert!(intersects(&square(4.0, 4.0, 1.0), &square(0.0, 0.0, 10.0)));
    }

    #[test]
    fn control_polygons() {
        let arch = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ];
        let crossing = [
            Point::new(5.0, -5.0),
            Point::new(5.0, 5.0),
            Point::new(6.0, 5.0),
            Point::new(6.0, -5.0),
        ];
        let far = translate(&arch, Vec2::new(30.0, 0.0));
        assert!(intersects(&arch, &crossing));
        assert!(!intersects(&arch, &far));
    }

    #[test]
    fn translation_invariant() {
        let cases = [
            (square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)),
            (square(0.0, 0.0, 1.0), square(3.0, 0.5, 1.0)),
            (
                vec![Point::new(0.0, 0.0), Point::new(4.0, 1.0), Point::new(1.0, 3.0)],
                vec![Point::new(2.0, 2.5), Point::new(6.0, 2.0), Point::new(5.0, 6.0)],
            ),
            (
                vec![Point::new(0.0, 0.0), Point::new(4.0, 1.0), Point::new(1.0, 3.0)],
                vec![Point::new(3.0, 3.0), Point::new(6.0, 2.0), Point::new(5.0, 6.0)],
            ),
        ];
        let offsets = [Vec2::new(37.5, -12.25), Vec2::new(-250.0, 1000.0), Vec2::new(0.125, 0.5)];
        for (a, b) in &cases {
            let expected = intersects(a, b);
            for &off in &offsets {
                assert_eq!(
                    intersects(&translate(a, off), &translate(b, off)),
                    expected,
                    "translation by {:?} changed the result",
                    off
                );
            }
        }
    }

    #[test]
    fn empty_input() {
        assert!(!intersects(&[], &square(0.0, 0.0, 1.0)));
    }
}
