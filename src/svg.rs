//! SVG path data (`d` attribute) to `kurbo::BezPath`.
//!
//! Tokenizing is done by `svgtypes`; this module resolves relative
//! coordinates against the current point and reflects the previous
//! control point for smooth curves. Elliptical arcs are rejected.

use kurbo::{BezPath, Point};
use svgtypes::{PathParser, PathSegment};

use crate::error::TessError;

/// Mirror the previous control point through the current point, or use
/// the current point when the previous command had no matching control.
fn reflect(control: Option<Point>, about: Point) -> Point {
    match control {
        Some(c) => about + (about - c),
        None => about,
    }
}

/// Parse SVG path data.
///
/// Elliptical arcs (`A`/`a`) yield [`TessError::UnsupportedCommand`];
/// malformed input yields [`TessError::Parse`] with the number of
/// segments read before the failure.
pub fn parse_path_data(d: &str) -> Result<BezPath, TessError> {
    let mut path = BezPath::new();
    let mut current = Point::ZERO;
    let mut start = Point::ZERO;
    let mut last_cubic: Option<Point> = None;
    let mut last_quad: Option<Point> = None;

    for (index, segment) in PathParser::from(d).enumerate() {
        let segment = segment.map_err(|err| TessError::Parse {
            segment: index,
            message: err.to_string(),
        })?;

        // Resolve a coordinate pair against the current point.
        let base = current;
        let at = |abs: bool, x: f64, y: f64| {
            if abs {
                Point::new(x, y)
            } else {
                Point::new(base.x + x, base.y + y)
            }
        };

        let mut cubic_control = None;
        let mut quad_control = None;
        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                current = at(abs, x, y);
                start = current;
                path.move_to(current);
            }
            PathSegment::LineTo { abs, x, y } => {
                current = at(abs, x, y);
                path.line_to(current);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                current = Point::new(if abs { x } else { current.x + x }, current.y);
                path.line_to(current);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                current = Point::new(current.x, if abs { y } else { current.y + y });
                path.line_to(current);
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = at(abs, x1, y1);
                let c2 = at(abs, x2, y2);
                current = at(abs, x, y);
                path.curve_to(c1, c2, current);
                cubic_control = Some(c2);
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = reflect(last_cubic, current);
                let c2 = at(abs, x2, y2);
                current = at(abs, x, y);
                path.curve_to(c1, c2, current);
                cubic_control = Some(c2);
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let c = at(abs, x1, y1);
                current = at(abs, x, y);
                path.quad_to(c, current);
                quad_control = Some(c);
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let c = reflect(last_quad, current);
                current = at(abs, x, y);
                path.quad_to(c, current);
                quad_control = Some(c);
            }
            PathSegment::ClosePath { .. } => {
                path.close_path();
                current = start;
            }
            PathSegment::EllipticalArc { abs, .. } => {
                return Err(TessError::UnsupportedCommand(if abs { 'A' } else { 'a' }));
            }
        }
        last_cubic = cubic_control;
        last_quad = quad_control;
    }

    Ok(path)
}
