//! One contour of a path and everything derived from it: the base
//! outline, overlap-free curve leaves, the triangulated interior polygon
//! and the stroke triangles.

use std::collections::VecDeque;

use kurbo::Point;

use crate::config::TessConfig;
use crate::error::TessError;
use crate::geom::{is_triangle_convex, EPSILON};
use crate::polygon::{Polygon, PolygonBuilder};
use crate::segment::{CubicSegment, CurveClass, LineSegment, Segment};
use crate::stroke;
use crate::triangulate::Triangulator;

/// A contour under construction or already tessellated.
///
/// The fill list is rebuilt into curve leaves by [`Subpath::fill`]; the
/// stroke list keeps curves whole and additionally holds the closing
/// line added by [`Subpath::close`].
#[derive(Debug, Clone)]
pub struct Subpath {
    fill_segments: Vec<Segment>,
    stroke_segments: Vec<Segment>,
    base_polygon: PolygonBuilder,
    interior_polygon: PolygonBuilder,
    stroke_vertices: Vec<Point>,
    miter_limit: Option<f64>,
    close_epsilon: f64,
    closed: bool,
    ended: bool,
    filled: bool,
    stroked: bool,
}

/// Address of a node inside one fill curve's subdivision tree.
#[derive(Debug, Clone)]
struct NodeRef {
    segment: usize,
    /// `false` descends left, `true` right.
    path: Vec<bool>,
}

impl NodeRef {
    fn child(&self, right: bool) -> NodeRef {
        let mut path = self.path.clone();
        path.push(right);
        NodeRef {
            segment: self.segment,
            path,
        }
    }
}

fn descend<'a>(node: &'a CubicSegment, path: &[bool]) -> Option<&'a CubicSegment> {
    match path.split_first() {
        None => Some(node),
        Some((&right, rest)) => {
            let (left, r) = node.children()?;
            descend(if right { r } else { left }, rest)
        }
    }
}

fn descend_mut<'a>(node: &'a mut CubicSegment, path: &[bool]) -> Option<&'a mut CubicSegment> {
    match path.split_first() {
        None => Some(node),
        Some((&right, rest)) => {
            let (left, r) = node.children_mut()?;
            descend_mut(if right { r } else { left }, rest)
        }
    }
}

impl Default for Subpath {
    fn default() -> Self {
        Self::with_close_epsilon(EPSILON)
    }
}

impl Subpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// `close_epsilon` is how near the start an end point must land to
    /// close the contour.
    pub fn with_close_epsilon(close_epsilon: f64) -> Self {
        Self {
            fill_segments: Vec::new(),
            stroke_segments: Vec::new(),
            base_polygon: PolygonBuilder::new(),
            interior_polygon: PolygonBuilder::new(),
            stroke_vertices: Vec::new(),
            miter_limit: None,
            close_epsilon,
            closed: false,
            ended: false,
            filled: false,
            stroked: false,
        }
    }

    /// Reset every list and flag and start the outline at `p`.
    pub fn begin(&mut self, p: Point) {
        self.fill_segments.clear();
        self.stroke_segments.clear();
        self.interior_polygon = PolygonBuilder::new();
        self.stroke_vertices.clear();
        self.closed = false;
        self.ended = false;
        self.filled = false;
        self.stroked = false;
        self.base_polygon.begin(p);
    }

    /// Append a line. Returns whether it closed the contour.
    pub fn add_line(&mut self, p0: Point, p1: Point, thickness: f64) -> bool {
        let closed = self.extend_outline(p1);
        let seg = Segment::Line(LineSegment::new(p0, p1, thickness));
        self.stroke_segments.push(seg.clone());
        self.fill_segments.push(seg);
        closed
    }

    /// Append a quadratic, stored as its degree-elevated cubic.
    pub fn add_quadratic_bezier_curve(&mut self, p0: Point, c: Point, p2: Point, thickness: f64) -> bool {
        let closed = self.extend_outline(p2);
        self.push_curve(CubicSegment::from_quadratic(p0, c, p2, thickness));
        closed
    }

    /// Append a cubic. Returns whether it closed the contour.
    pub fn add_cubic_bezier_curve(
        &mut self,
        p0: Point,
        p1: Point,
        p2: Point,
        p3: Point,
        thickness: f64,
    ) -> bool {
        let closed = self.extend_outline(p3);
        self.push_curve(CubicSegment::new(p0, p1, p2, p3, thickness));
        closed
    }

    fn push_curve(&mut self, curve: CubicSegment) {
        self.stroke_segments.push(Segment::Cubic(curve.clone()));
        self.fill_segments.push(Segment::Cubic(curve));
    }

    /// A point returning onto the start closes the contour instead of
    /// extending the outline.
    fn extend_outline(&mut self, p: Point) -> bool {
        let closed = self.base_polygon.check_close(p, self.close_epsilon);
        if closed {
            self.closed = true;
        } else {
            self.base_polygon.add_point(p);
        }
        closed
    }

    /// Close the contour: a stroke-only line back to the start point.
    pub fn close(&mut self, thickness: f64) {
        if self.closed {
            return;
        }
        if self.base_polygon.len() > 1 {
            let (from, to) = (self.base_polygon.current(), self.base_polygon.start());
            self.stroke_segments
                .push(Segment::Line(LineSegment::new(from, to, thickness)));
        }
        self.closed = true;
    }

    /// Stop accepting segments and normalize the winding so the base
    /// outline's signed area is not positive.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        let area = self.base_polygon.area();
        if area > 0.0 {
            self.reverse();
        } else if area == 0.0 {
            // Collinear outline: orient by the first curve's control polygon.
            let first_curve = self.fill_segments.iter().find_map(|seg| match seg {
                Segment::Cubic(curve) => Some(curve),
                Segment::Line(_) => None,
            });
            if first_curve.is_some_and(|curve| curve.hull_area() >= 0.0) {
                self.reverse();
            }
        }
    }

    /// Flip the traversal direction of every list and segment.
    pub fn reverse(&mut self) {
        for list in [&mut self.fill_segments, &mut self.stroke_segments] {
            list.reverse();
            list.iter_mut().for_each(Segment::reverse);
        }
        self.base_polygon.reverse();
    }

    /// Tessellate the interior.
    ///
    /// Resolves curve overlaps, classifies every leaf, replaces
    /// subdivided curves by their leaves, then builds and triangulates the
    /// interior polygon. Runs once; later calls are no-ops.
    pub fn fill(&mut self, config: &TessConfig, triangulator: &dyn Triangulator) -> Result<(), TessError> {
        if self.filled {
            return Ok(());
        }
        self.end();
        self.filled = true;

        // ── Overlaps ──
        self.resolve_overlaps(config);

        // ── Implicit coords ──
        for seg in &mut self.fill_segments {
            if let Segment::Cubic(curve) = seg {
                curve.classify(false, config.curve_epsilon);
            }
        }

        // ── Leaves in path order ──
        let segments = std::mem::take(&mut self.fill_segments);
        for seg in segments {
            match seg {
                Segment::Cubic(curve) => self
                    .fill_segments
                    .extend(curve.into_leaves().into_iter().map(Segment::Cubic)),
                line => self.fill_segments.push(line),
            }
        }

        // ── Interior ──
        self.build_interior_polygon(config);
        self.interior_polygon.triangulate(triangulator)
    }

    /// Bisect overlapping curves until no two large pieces overlap.
    ///
    /// Pairs are processed first in, first out. The first member of a
    /// pair is split at `t = 0.5` and each half still touching the other
    /// member is queued again, as long as its control polygon is bigger
    /// than the area floor and the depth cap is not reached.
    fn resolve_overlaps(&mut self, config: &TessConfig) {
        let curves: Vec<usize> = self
            .fill_segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| seg.is_curve())
            .map(|(i, _)| i)
            .collect();

        let mut queue = VecDeque::new();
        for (n, &i) in curves.iter().enumerate() {
            for &j in &curves[n + 1..] {
                let (a, b) = (self.root(i), self.root(j));
                if a.zip(b).is_some_and(|(a, b)| a.intersects(b)) {
                    queue.push_back((NodeRef { segment: i, path: Vec::new() }, NodeRef { segment: j, path: Vec::new() }));
                }
            }
        }
        if queue.is_empty() {
            return;
        }

        let initial = queue.len();
        let mut bisections = 0;
        while let Some((first, second)) = queue.pop_front() {
            let Some(node) = self.node_mut(&first) else {
                continue;
            };
            if node.level() >= config.max_subdivision_level {
                continue;
            }
            node.subdivide(0.5);
            bisections += 1;

            for right in [false, true] {
                let half = first.child(right);
                let queue_again = match (self.node(&half), self.node(&second)) {
                    (Some(h), Some(other)) => {
                        h.hull_area().abs() > config.overlap_area_floor && h.intersects(other)
                    }
                    _ => false,
                };
                if queue_again {
                    queue.push_back((second.clone(), half));
                }
            }
        }
        log::debug!(
            "overlap resolution: {} intersecting pairs, {} bisections",
            initial,
            bisections
        );
    }

    fn root(&self, index: usize) -> Option<&CubicSegment> {
        match self.fill_segments.get(index)? {
            Segment::Cubic(curve) => Some(curve),
            Segment::Line(_) => None,
        }
    }

    fn node(&self, r: &NodeRef) -> Option<&CubicSegment> {
        descend(self.root(r.segment)?, &r.path)
    }

    fn node_mut(&mut self, r: &NodeRef) -> Option<&mut CubicSegment> {
        match self.fill_segments.get_mut(r.segment)? {
            Segment::Cubic(curve) => descend_mut(curve, &r.path),
            Segment::Line(_) => None,
        }
    }

    /// Rebuild the interior polygon from the (flattened) fill list.
    ///
    /// Lines contribute their end point. Each curve contributes the
    /// control points that bound the part of its hull not shaded by its
    /// own triangles, in an order that keeps the outline's winding.
    /// Near-coincident and collinear vertices are then dropped, since the
    /// sweep cannot place a vertex on a straight run of its neighbours.
    fn build_interior_polygon(&mut self, config: &TessConfig) {
        self.interior_polygon = PolygonBuilder::new();
        if self.fill_segments.len() < 2 {
            return;
        }

        let poly = &mut self.interior_polygon;
        poly.begin(self.fill_segments[0].start());
        for seg in &self.fill_segments {
            match seg {
                Segment::Line(line) => poly.add_point(line.p1),
                Segment::Cubic(curve) => reduce_curve(curve, poly),
            }
        }
        poly.remove_duplicates(config.dedup_epsilon);
        poly.remove_collinear(config.curve_epsilon);
    }

    /// Expand the stroke triangles. `sx`/`sy` are the transform's axis
    /// scales, used for the curve sampling density. Runs once.
    pub fn stroke(&mut self, sx: f64, sy: f64, config: &TessConfig) {
        if self.stroked {
            return;
        }
        self.end();
        self.stroked = true;
        self.miter_limit = config.miter_limit;

        for seg in &mut self.stroke_segments {
            if let Segment::Cubic(curve) = seg {
                curve.update_stroke_stepper(sx, sy, config.stroke_step_length);
            }
        }
        self.expand_stroke();
    }

    /// Change the stroke width. An already stroked subpath is re-expanded.
    pub fn update_stroke_thickness(&mut self, thickness: f64) {
        for seg in &mut self.stroke_segments {
            seg.set_thickness(thickness);
        }
        if self.stroked {
            self.expand_stroke();
        }
    }

    fn expand_stroke(&mut self) {
        let samples = stroke::sample_centerline(&self.stroke_segments, self.closed);
        self.stroke_vertices = stroke::expand(&samples, self.closed, self.miter_limit);
    }

    /// Whether the contour encloses or draws anything at all.
    pub fn is_valid(&self) -> bool {
        match self.fill_segments.as_slice() {
            [] => false,
            [Segment::Cubic(_)] => true,
            [Segment::Line(_)] => self.base_polygon.len() > 2,
            _ => true,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn is_stroked(&self) -> bool {
        self.stroked
    }

    /// Current end of the outline.
    pub fn current_point(&self) -> Point {
        self.base_polygon.current()
    }

    pub fn fill_segments(&self) -> &[Segment] {
        &self.fill_segments
    }

    pub fn stroke_segments(&self) -> &[Segment] {
        &self.stroke_segments
    }

    /// Curves of the fill list. After `fill()` these are all leaves.
    pub fn curves(&self) -> impl Iterator<Item = &CubicSegment> + '_ {
        self.fill_segments.iter().filter_map(|seg| match seg {
            Segment::Cubic(curve) => Some(curve),
            Segment::Line(_) => None,
        })
    }

    pub fn base_polygon(&self) -> &PolygonBuilder {
        &self.base_polygon
    }

    pub fn interior_polygon(&self) -> &PolygonBuilder {
        &self.interior_polygon
    }

    /// Stroke triangles, three points each.
    pub fn stroke_vertices(&self) -> &[Point] {
        &self.stroke_vertices
    }

    /// Freeze the tessellation results and drop the segment lists.
    pub fn into_static(self) -> StaticSubpath {
        let curves = self
            .fill_segments
            .into_iter()
            .filter_map(|seg| match seg {
                Segment::Cubic(curve) => Some(curve),
                Segment::Line(_) => None,
            })
            .flat_map(CubicSegment::into_leaves)
            .collect();
        StaticSubpath {
            base_polygon: self.base_polygon.finalize(),
            interior_polygon: self.interior_polygon.finalize(),
            curves,
            stroke_vertices: self.stroke_vertices.into_boxed_slice(),
            closed: self.closed,
        }
    }
}

/// Push the interior-polygon vertices contributed by one curve leaf.
fn reduce_curve(curve: &CubicSegment, poly: &mut PolygonBuilder) {
    let [x0, x1, x2, x3] = curve.points;
    if curve.class() == CurveClass::Degenerate {
        poly.add_point(x3);
        return;
    }

    let convex = is_triangle_convex(x0, x1, x3);
    let points: &[Point] = if convex != is_triangle_convex(x0, x2, x3) {
        // Control points on opposite sides of the chord.
        if convex {
            &[x2, x3]
        } else {
            &[x1, x3]
        }
    } else if convex {
        // Both bulge outward: the chord bounds the interior.
        &[x3]
    } else if is_triangle_convex(x0, x2, x1) {
        if is_triangle_convex(x1, x2, x3) {
            &[x1, x3]
        } else {
            &[x1, x2, x3]
        }
    } else if is_triangle_convex(x2, x1, x3) {
        &[x2, x3]
    } else {
        &[x2, x1, x3]
    };
    for &p in points {
        poly.add_point(p);
    }
}

/// Tessellation results of one contour, with no further mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSubpath {
    base_polygon: Polygon,
    interior_polygon: Polygon,
    curves: Vec<CubicSegment>,
    stroke_vertices: Box<[Point]>,
    closed: bool,
}

impl StaticSubpath {
    pub fn base_polygon(&self) -> &Polygon {
        &self.base_polygon
    }

    pub fn interior_polygon(&self) -> &Polygon {
        &self.interior_polygon
    }

    /// Classified curve leaves in path order.
    pub fn curves(&self) -> &[CubicSegment] {
        &self.curves
    }

    pub fn stroke_vertices(&self) -> &[Point] {
        &self.stroke_vertices
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
