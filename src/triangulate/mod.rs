//! Polygon triangulation.

mod monotone;

pub use monotone::MonotoneTriangulator;

use kurbo::Point;

use crate::error::TessError;

/// Turns a simple polygon into triangle indices.
///
/// Implementations accept either winding and return `3 * (n - 2)`
/// indices into `points`, wound like the input polygon.
pub trait Triangulator: Send + Sync {
    fn triangulate(&self, points: &[Point]) -> Result<Vec<u32>, TessError>;
}
