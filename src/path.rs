//! Canvas-style path builder.
//!
//! Commands accumulate into [`Subpath`]s; `fill()` and `stroke()`
//! tessellate them and the vertex buffers are read back with
//! [`Path::fill_vertices`] / [`Path::stroke_vertices`].

use std::f64::consts::{FRAC_PI_4, TAU};

use kurbo::{Affine, BezPath, PathEl, Point, Shape, Vec2};
use rayon::prelude::*;

use crate::config::TessConfig;
use crate::error::TessError;
use crate::geom::{points_coincide, COARSE_EPSILON, EPSILON};
use crate::style::DrawingStyle;
use crate::subpath::{StaticSubpath, Subpath};
use crate::triangulate::{MonotoneTriangulator, Triangulator};

/// Stroke triangles sit slightly in front of the fill.
const STROKE_DEPTH_OFFSET: f32 = 0.002;

/// Flattening tolerance for `add_shape`.
const SHAPE_TOLERANCE: f64 = 0.1;

/// Filled triangles: xyz positions and the matching `(k, l, m)` coords,
/// three floats per vertex each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillVertices {
    pub position: Vec<f32>,
    pub coord: Vec<f32>,
}

impl FillVertices {
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }
}

/// Stroke triangles: xyz positions, three floats per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeVertices {
    pub position: Vec<f32>,
}

impl StrokeVertices {
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }
}

/// A path under construction.
#[derive(Debug, Clone)]
pub struct Path<T = MonotoneTriangulator> {
    subpaths: Vec<Subpath>,
    open: Option<Subpath>,
    cursor: Point,
    first_command: bool,
    transform: Affine,
    style: DrawingStyle,
    depth: f32,
    filled: bool,
    stroked: bool,
    config: TessConfig,
    triangulator: T,
}

impl Path<MonotoneTriangulator> {
    pub fn new() -> Self {
        Self::with_config(TessConfig::default())
    }

    pub fn with_config(config: TessConfig) -> Self {
        Path::with_triangulator(config, MonotoneTriangulator)
    }
}

impl Default for Path<MonotoneTriangulator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Triangulator> Path<T> {
    pub fn with_triangulator(config: TessConfig, triangulator: T) -> Self {
        Self {
            subpaths: Vec::new(),
            open: None,
            cursor: Point::ZERO,
            first_command: true,
            transform: Affine::IDENTITY,
            style: DrawingStyle::default(),
            depth: 0.0,
            filled: false,
            stroked: false,
            config,
            triangulator,
        }
    }

    /// Drop every subpath and start over.
    pub fn begin(&mut self) {
        self.subpaths.clear();
        self.open = None;
        self.filled = false;
        self.stroked = false;
        self.first_command = true;
    }

    pub fn move_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        self.end_subpath();
        self.first_command = false;
        self.begin_subpath(p);
        self.cursor = p;
    }

    pub fn line_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        let (from, width) = (self.cursor, self.style.line_width);
        if let Some(sub) = self.current_subpath(p) {
            let closed = sub.add_line(from, p, width);
            self.finish_command(p, closed);
        }
    }

    pub fn quadratic_curve_to(&mut self, c: impl Into<Point>, p: impl Into<Point>) {
        let (c, p) = (c.into(), p.into());
        let (from, width) = (self.cursor, self.style.line_width);
        if let Some(sub) = self.current_subpath(p) {
            let closed = sub.add_quadratic_bezier_curve(from, c, p, width);
            self.finish_command(p, closed);
        }
    }

    pub fn bezier_curve_to(&mut self, c1: impl Into<Point>, c2: impl Into<Point>, p: impl Into<Point>) {
        let (c1, c2, p) = (c1.into(), c2.into(), p.into());
        let (from, width) = (self.cursor, self.style.line_width);
        if let Some(sub) = self.current_subpath(p) {
            let closed = sub.add_cubic_bezier_curve(from, c1, c2, p, width);
            self.finish_command(p, closed);
        }
    }

    /// Circular arc approximated by cubics, one per 45 degrees at the
    /// configured radius (more for larger radii, never fewer than four).
    ///
    /// A line joins the current point to the arc start when they differ.
    pub fn arc(
        &mut self,
        center: impl Into<Point>,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        let center = center.into();
        let on_circle = |angle: f64| center + Vec2::from_angle(angle) * radius;
        let thickness = self.style.line_width;

        let mut p0 = on_circle(start_angle);
        if self.open.is_none() {
            self.first_command = false;
            self.begin_subpath(p0);
            self.cursor = p0;
        }
        let cursor = self.cursor;
        let Some(sub) = self.open.as_mut() else {
            return;
        };
        if !points_coincide(p0, cursor, COARSE_EPSILON) {
            sub.add_line(cursor, p0, thickness);
        }
        self.cursor = p0;
        if radius == 0.0 || (start_angle - end_angle).abs() < EPSILON {
            return;
        }

        let start = start_angle.rem_euclid(TAU);
        let mut end = end_angle.rem_euclid(TAU);
        if anticlockwise {
            if start <= end {
                end -= TAU;
            }
        } else if start >= end {
            end += TAU;
        }

        let sweep = end - start;
        let segments =
            ((sweep.abs() / FRAC_PI_4 * radius / self.config.arc_segment_radius).ceil() as usize).max(4);
        let step = sweep / segments as f64;

        let mut from = start;
        for _ in 0..segments {
            let mut to = from + step;
            if (anticlockwise && to < end) || (!anticlockwise && to > end) {
                to = end;
            }
            let p3 = on_circle(to);
            // Tangent handles of a circular arc spanning `to - from`.
            let k = 4.0 / 3.0 * ((to - from) / 4.0).tan();
            let tangent = |p: Point| Vec2::new(-(p.y - center.y), p.x - center.x);
            let p1 = p0 + tangent(p0) * k;
            let p2 = p3 - tangent(p3) * k;

            let Some(sub) = self.open.as_mut() else {
                break;
            };
            let closed = sub.add_cubic_bezier_curve(p0, p1, p2, p3, thickness);
            self.cursor = p3;
            if closed {
                self.end_subpath();
                break;
            }
            p0 = p3;
            from = to;
        }
    }

    /// Axis-aligned rectangle as its own closed subpath.
    pub fn rect(&mut self, origin: impl Into<Point>, width: f64, height: f64) {
        let o = origin.into();
        self.end_subpath();
        self.first_command = false;
        self.begin_subpath(o);

        let corners = [
            o,
            Point::new(o.x, o.y + height),
            Point::new(o.x + width, o.y + height),
            Point::new(o.x + width, o.y),
        ];
        let thickness = self.style.line_width;
        if let Some(sub) = self.open.as_mut() {
            for i in 0..4 {
                sub.add_line(corners[i], corners[(i + 1) % 4], thickness);
            }
        }
        self.cursor = o;
        self.end_subpath();
    }

    /// Close the current contour with a stroke-only line and end it.
    /// The current point moves back to the contour's start.
    pub fn close_path(&mut self) {
        if let Some(sub) = self.open.as_mut() {
            let start = sub.base_polygon().start();
            sub.close(self.style.line_width);
            self.cursor = start;
        }
        self.end_subpath();
    }

    /// Append every element of a kurbo path.
    pub fn extend(&mut self, path: &BezPath) {
        self.extend_elements(path.elements().iter().copied());
    }

    /// Append the outline of any kurbo shape.
    pub fn add_shape(&mut self, shape: &impl Shape) {
        self.extend_elements(shape.path_elements(SHAPE_TOLERANCE));
    }

    fn extend_elements(&mut self, elements: impl IntoIterator<Item = PathEl>) {
        for el in elements {
            match el {
                PathEl::MoveTo(p) => self.move_to(p),
                PathEl::LineTo(p) => self.line_to(p),
                PathEl::QuadTo(c, p) => self.quadratic_curve_to(c, p),
                PathEl::CurveTo(c1, c2, p) => self.bezier_curve_to(c1, c2, p),
                PathEl::ClosePath => self.close_path(),
            }
        }
    }

    /// Tessellate the interior of every subpath.
    ///
    /// Subpaths share nothing, so they are filled in parallel.
    pub fn fill(&mut self) -> Result<(), TessError> {
        self.end_subpath();
        let (config, triangulator) = (&self.config, &self.triangulator);
        self.subpaths
            .par_iter_mut()
            .try_for_each(|sub| sub.fill(config, triangulator))
            .inspect_err(|e| log::warn!("fill failed: {}", e))?;
        self.filled = true;
        log::debug!("filled {} subpaths", self.subpaths.len());
        Ok(())
    }

    /// Expand the stroke of every subpath with the current line width.
    /// Curve sampling density follows the transform's scale.
    pub fn stroke(&mut self) {
        self.end_subpath();
        let [a, b, c, d, _, _] = self.transform.as_coeffs();
        let sx = (a * a + b * b).sqrt();
        let sy = (c * c + d * d).sqrt();
        let config = &self.config;
        self.subpaths
            .par_iter_mut()
            .for_each(|sub| sub.stroke(sx, sy, config));
        self.stroked = true;
    }

    /// Change the line width. Already stroked subpaths are re-expanded.
    pub fn set_line_width(&mut self, width: f64) {
        if width == self.style.line_width {
            return;
        }
        self.style.line_width = width;
        for sub in self.subpaths.iter_mut().chain(self.open.as_mut()) {
            sub.update_stroke_thickness(width);
        }
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Replace the style. The line width goes through `set_line_width`.
    pub fn set_style(&mut self, style: DrawingStyle) {
        let width = style.line_width;
        self.style = DrawingStyle {
            line_width: self.style.line_width,
            ..style
        };
        self.set_line_width(width);
    }

    pub fn style(&self) -> &DrawingStyle {
        &self.style
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn config(&self) -> &TessConfig {
        &self.config
    }

    pub fn has_fill(&self) -> bool {
        self.filled
    }

    pub fn has_stroke(&self) -> bool {
        self.stroked
    }

    /// Finished subpaths. The contour still being built is not included.
    pub fn subpaths(&self) -> &[Subpath] {
        &self.subpaths
    }

    /// Interior triangles (coords `(0, 1, 1)`) followed by the curve
    /// triangles of every filled subpath.
    pub fn fill_vertices(&self) -> FillVertices {
        let mut out = FillVertices::default();
        let z = self.depth;
        for sub in self.subpaths.iter().filter(|s| s.is_filled()) {
            let poly = sub.interior_polygon();
            for &i in poly.triangles() {
                let p = poly.points()[i as usize];
                out.position.extend([p.x as f32, p.y as f32, z]);
                out.coord.extend([0.0, 1.0, 1.0]);
            }
            for curve in sub.curves() {
                let Some(coords) = curve.coords() else {
                    continue;
                };
                for &i in curve.triangles() {
                    let p = curve.points[i as usize];
                    let [k, l, m] = coords[i as usize];
                    out.position.extend([p.x as f32, p.y as f32, z]);
                    out.coord.extend([k as f32, l as f32, m as f32]);
                }
            }
        }
        out
    }

    pub fn stroke_vertices(&self) -> StrokeVertices {
        let z = self.depth + STROKE_DEPTH_OFFSET;
        let position = self
            .subpaths
            .iter()
            .filter(|s| s.is_stroked())
            .flat_map(|s| s.stroke_vertices())
            .flat_map(|p| [p.x as f32, p.y as f32, z])
            .collect();
        StrokeVertices { position }
    }

    /// Freeze the path: vertex buffers are computed once and the segment
    /// lists are dropped.
    pub fn into_static(mut self) -> StaticPath {
        self.end_subpath();
        let fill = self.filled.then(|| self.fill_vertices());
        let stroke = self.stroked.then(|| self.stroke_vertices());
        StaticPath {
            subpaths: self.subpaths.into_iter().map(Subpath::into_static).collect(),
            fill,
            stroke,
            transform: self.transform,
            style: self.style,
            depth: self.depth,
        }
    }

    // ── Subpath bookkeeping ──

    fn begin_subpath(&mut self, p: Point) {
        let mut sub = Subpath::with_close_epsilon(self.config.close_epsilon);
        sub.begin(p);
        self.open = Some(sub);
    }

    /// Keep a valid contour, drop a degenerate one.
    fn end_subpath(&mut self) {
        let Some(mut sub) = self.open.take() else {
            return;
        };
        if sub.is_valid() {
            sub.end();
            self.subpaths.push(sub);
        } else {
            log::debug!(
                "dropping degenerate subpath ({} segments)",
                sub.fill_segments().len()
            );
        }
    }

    /// The subpath a drawing command extends.
    ///
    /// The very first command of a path only sets the current point,
    /// like a move. Any other command without an open contour starts one
    /// at the current point.
    fn current_subpath(&mut self, end: Point) -> Option<&mut Subpath> {
        if self.open.is_none() {
            if self.first_command {
                self.first_command = false;
                self.begin_subpath(end);
                self.cursor = end;
                return None;
            }
            self.begin_subpath(self.cursor);
        }
        self.open.as_mut()
    }

    fn finish_command(&mut self, end: Point, closed: bool) {
        if closed {
            self.end_subpath();
        }
        self.cursor = end;
    }
}

/// A tessellated path that no longer accepts commands.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPath {
    subpaths: Vec<StaticSubpath>,
    fill: Option<FillVertices>,
    stroke: Option<StrokeVertices>,
    transform: Affine,
    style: DrawingStyle,
    depth: f32,
}

impl StaticPath {
    pub fn subpaths(&self) -> &[StaticSubpath] {
        &self.subpaths
    }

    /// `None` unless the path was filled.
    pub fn fill_vertices(&self) -> Option<&FillVertices> {
        self.fill.as_ref()
    }

    /// `None` unless the path was stroked.
    pub fn stroke_vertices(&self) -> Option<&StrokeVertices> {
        self.stroke.as_ref()
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn style(&self) -> &DrawingStyle {
        &self.style
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }
}
