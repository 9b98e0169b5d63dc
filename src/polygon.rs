//! Outline polygons: a growable builder used while a subpath is being
//! built, and the immutable form produced by `finalize()`.

use kurbo::{Point, Rect};

use crate::error::TessError;
use crate::geom::{cross, point_in_triangle, points_coincide, signed_area};
use crate::triangulate::Triangulator;

/// Growable polygon with an incrementally maintained bounding box.
#[derive(Debug, Clone, Default)]
pub struct PolygonBuilder {
    points: Vec<Point>,
    triangles: Vec<u32>,
    bbox: Rect,
    start: Point,
    current: Point,
    closed: bool,
}

impl PolygonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset and start a new outline at `p`.
    pub fn begin(&mut self, p: Point) {
        self.points.clear();
        self.triangles.clear();
        self.closed = false;
        self.start = p;
        self.bbox = Rect::from_points(p, p);
        self.add_point(p);
    }

    pub fn add_point(&mut self, p: Point) {
        self.points.push(p);
        self.current = p;
        self.bbox = self.bbox.union_pt(p);
    }

    /// Whether `p` returns onto the start point. Marks the outline closed
    /// when it does.
    pub fn check_close(&mut self, p: Point, eps: f64) -> bool {
        if !self.points.is_empty() && points_coincide(p, self.start, eps) {
            self.closed = true;
            return true;
        }
        false
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn bounding_box(&self) -> Rect {
        self.bbox
    }

    /// Shoelace area. The canonical subpath winding makes this `<= 0`.
    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
        if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
            self.start = first;
            self.current = last;
        }
    }

    /// Drop neighbours closer than `eps`, treating the outline as cyclic
    /// (the last point is compared with the first).
    pub fn remove_duplicates(&mut self, eps: f64) {
        let mut i = 0;
        while i < self.points.len() && self.points.len() > 1 {
            let next = (i + 1) % self.points.len();
            if points_coincide(self.points[i], self.points[next], eps) {
                self.points.remove(i);
            } else {
                i += 1;
            }
        }
        self.update_bounding_box();
    }

    /// Drop vertices lying within `eps` of the line through their
    /// neighbours, including zero-width spikes. Cyclic like
    /// [`remove_duplicates`](Self::remove_duplicates); stops at a triangle.
    pub fn remove_collinear(&mut self, eps: f64) {
        let mut i = 0;
        let mut unchanged = 0;
        while self.points.len() > 3 && unchanged < self.points.len() {
            let n = self.points.len();
            i %= n;
            let a = self.points[(i + n - 1) % n];
            let b = self.points[i];
            let c = self.points[(i + 1) % n];
            // |cross| / |ac| is b's distance from the line ac.
            if cross(a, b, c).abs() <= eps * (c - a).hypot().max(eps) {
                self.points.remove(i);
                unchanged = 0;
            } else {
                i += 1;
                unchanged += 1;
            }
        }
        self.update_bounding_box();
    }

    fn update_bounding_box(&mut self) {
        let mut iter = self.points.iter();
        self.bbox = match iter.next() {
            Some(&first) => iter.fold(Rect::from_points(first, first), |r, &p| r.union_pt(p)),
            None => Rect::ZERO,
        };
    }

    /// Fill `triangles` with indices into `points`.
    pub fn triangulate(&mut self, triangulator: &dyn Triangulator) -> Result<(), TessError> {
        self.triangles = triangulator.triangulate(&self.points)?;
        Ok(())
    }

    /// Freeze into the immutable form.
    pub fn finalize(self) -> Polygon {
        Polygon {
            points: self.points.into_boxed_slice(),
            triangles: self.triangles.into_boxed_slice(),
            bbox: self.bbox,
        }
    }
}

/// Finalized polygon: fixed-size point and index buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Box<[Point]>,
    triangles: Box<[u32]>,
    bbox: Rect,
}

impl Polygon {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn bounding_box(&self) -> Rect {
        self.bbox
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Whether `p` lies in one of the polygon's triangles.
    pub fn contains(&self, p: Point) -> bool {
        let b = self.bbox;
        if p.x < b.x0 || p.x > b.x1 || p.y < b.y0 || p.y > b.y1 {
            return false;
        }
        self.triangles.chunks_exact(3).any(|t| {
            point_in_triangle(
                p,
                self.points[t[0] as usize],
                self.points[t[1] as usize],
                self.points[t[2] as usize],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulate::MonotoneTriangulator;

    fn square() -> PolygonBuilder {
        let mut poly = PolygonBuilder::new();
        poly.begin(Point::new(0.0, 0.0));
        poly.add_point(Point::new(2.0, 0.0));
        poly.add_point(Point::new(2.0, 2.0));
        poly.add_point(Point::new(0.0, 2.0));
        poly
    }

    #[test]
    fn bounding_box_tracks_points() {
        let poly = square();
        assert_eq!(poly.bounding_box(), Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(poly.len(), 4);
        assert_eq!(poly.area(), 4.0);
    }

    #[test]
    fn close_detection() {
        let mut poly = square();
        assert!(!poly.check_close(Point::new(0.0, 1.0), 1e-5));
        assert!(!poly.is_closed());
        assert!(poly.check_close(Point::new(0.000001, 0.0), 1e-5));
        assert!(poly.is_closed());
    }

    #[test]
    fn collinear_vertices_and_spikes_removed() {
        let mut poly = PolygonBuilder::new();
        poly.begin(Point::new(0.0, 0.0));
        poly.add_point(Point::new(1.0, 0.0));
        poly.add_point(Point::new(2.0, 0.0));
        poly.add_point(Point::new(2.0, 2.0));
        // Spike up the left side and back.
        poly.add_point(Point::new(0.0, 2.0));
        poly.add_point(Point::new(0.0, 3.0));
        poly.add_point(Point::new(0.0, 2.0));
        poly.add_point(Point::new(0.0, 1.0));
        poly.remove_collinear(1e-9);
        assert_eq!(
            poly.points(),
            &[
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(0.0, 2.0),
            ]
        );
        assert_eq!(poly.bounding_box(), Rect::new(0.0, 0.0, 2.0, 2.0));

        let mut flat = PolygonBuilder::new();
        flat.begin(Point::new(0.0, 0.0));
        flat.add_point(Point::new(1.0, 0.0));
        flat.add_point(Point::new(2.0, 0.0));
        flat.remove_collinear(1e-9);
        assert_eq!(flat.len(), 3, "a triangle is left alone");
    }

    #[test]
    fn duplicates_removed_cyclically() {
        let mut poly = PolygonBuilder::new();
        poly.begin(Point::new(0.0, 0.0));
        poly.add_point(Point::new(1.0, 0.0));
        poly.add_point(Point::new(1.05, 0.0));
        poly.add_point(Point::new(1.0, 1.0));
        poly.add_point(Point::new(0.02, 0.01));
        poly.remove_duplicates(0.1);
        assert_eq!(
            poly.points(),
            &[Point::new(0.0, 0.0), Point::new(1.05, 0.0), Point::new(1.0, 1.0)][..]
        );
    }

    #[test]
    fn reverse_flips_area() {
        let mut poly = square();
        poly.reverse();
        assert_eq!(poly.area(), -4.0);
        assert_eq!(poly.start(), Point::new(0.0, 2.0));
    }

    #[test]
    fn finalize_keeps_triangles() {
        let mut poly = square();
        poly.triangulate(&MonotoneTriangulator).expect("triangulate");
        let frozen = poly.finalize();
        assert_eq!(frozen.triangles().len(), 6);
        assert!(frozen.contains(Point::new(1.0, 1.0)));
        assert!(frozen.contains(Point::new(0.1, 1.9)));
        assert!(!frozen.contains(Point::new(3.0, 1.0)));
    }

    #[test]
    fn small_polygons() {
        let mut poly = PolygonBuilder::new();
        poly.begin(Point::new(0.0, 0.0));
        poly.add_point(Point::new(1.0, 0.0));
        poly.triangulate(&MonotoneTriangulator).expect("two points");
        assert!(poly.triangles().is_empty());
        poly.add_point(Point::new(0.0, 1.0));
        poly.triangulate(&MonotoneTriangulator).expect("three points");
        assert_eq!(poly.triangles(), &[0, 1, 2]);
    }
}
