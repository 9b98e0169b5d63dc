//! Shared geometry utilities.

use kurbo::Point;

/// Tolerance for exact point comparisons (closing detection).
pub const EPSILON: f64 = 1e-5;

/// Tolerance for coarse comparisons (coincident polygon vertices, arc joins).
pub const COARSE_EPSILON: f64 = 0.1;

/// `a` and `b` differ by less than `eps` on both axes.
pub fn points_coincide(a: Point, b: Point, eps: f64) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

/// Snap `v` to exactly zero when it lies within `eps` of zero.
pub fn snap_to_zero(v: f64, eps: f64) -> f64 {
    if v > -eps && v < eps {
        0.0
    } else {
        v
    }
}

/// Z component of `(a - o) × (b - o)`.
pub fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a - o).cross(b - o)
}

/// Whether the triangle `a → b → c` turns clockwise in the y-up sense
/// (equivalently, counter-clockwise on a y-down screen).
///
/// This is the orientation every other test in the crate is built on.
pub fn is_triangle_convex(a: Point, b: Point, c: Point) -> bool {
    (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x) < 0.0
}

/// Signed area of a closed polygon via the shoelace formula.
///
/// Positive = counter-clockwise in y-up coordinates. Subpaths are
/// normalized so this is never positive.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        area += p.x * q.y - q.x * p.y;
    }
    area / 2.0
}

/// Signed area of a single triangle (same sign convention as `signed_area`).
pub fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    cross(a, b, c) / 2.0
}

/// Whether `p` lies inside or on the boundary of triangle `abc`,
/// regardless of the triangle's winding.
pub fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area() {
        let sq = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!((signed_area(&sq) - 1.0).abs() < 1e-12);
        let mut rev = sq;
        rev.reverse();
        assert!((signed_area(&rev) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn convexity_matches_negative_cross() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        let c = Point::new(1.0, 1.0);
        assert!(!is_triangle_convex(a, b, c), "ccw (y-up) is not convex");
        assert!(is_triangle_convex(a, c, b));
        assert_eq!(is_triangle_convex(a, c, b), cross(a, c, b) < 0.0);
    }

    #[test]
    fn containment_ignores_winding() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        let c = Point::new(0.0, 4.0);
        let p = Point::new(1.0, 1.0);
        assert!(point_in_triangle(p, a, b, c));
        assert!(point_in_triangle(p, a, c, b));
        assert!(!point_in_triangle(Point::new(3.0, 3.0), a, b, c));
    }

    #[test]
    fn snapping() {
        assert_eq!(snap_to_zero(4e-5, 5e-5), 0.0);
        assert_eq!(snap_to_zero(-4e-5, 5e-5), 0.0);
        assert_eq!(snap_to_zero(6e-5, 5e-5), 6e-5);
        assert!(points_coincide(Point::new(1.0, 1.0), Point::new(1.05, 0.95), COARSE_EPSILON));
        assert!(!points_coincide(Point::new(1.0, 1.0), Point::new(1.0, 1.0001), EPSILON));
    }
}
