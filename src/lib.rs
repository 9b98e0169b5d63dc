//! path2tri: vector paths → GPU-ready triangles.
//!
//! Fills are split into an interior polygon, triangulated by monotone
//! decomposition, plus one small fan per curve carrying Loop-Blinn
//! implicit coordinates so a fragment shader can decide inside/outside
//! per pixel. Strokes are expanded into mitred triangle strips.
//!
//! # Example
//!
//! ```
//! use path2tri::{tessellate, DrawingStyle, TessConfig};
//!
//! let path = tessellate(
//!     "M 0 0 L 100 0 C 150 30 150 70 100 100 L 0 100 Z",
//!     &TessConfig::default(),
//!     &DrawingStyle::default(),
//!     true,
//!     false,
//! )?;
//! let fill = path.fill_vertices().expect("filled");
//! assert_eq!(fill.position.len(), fill.coord.len());
//! # Ok::<(), path2tri::TessError>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod geom;
mod gjk;
mod polygon;
mod stroke;

pub mod error;
pub mod logging;
pub mod path;
pub mod render;
pub mod segment;
pub mod style;
pub mod subpath;
pub mod svg;
pub mod triangulate;

// Re-export kurbo so callers build points, transforms and BezPaths
// with the same version.
pub use kurbo;

pub use config::TessConfig;
pub use error::TessError;
pub use path::{FillVertices, Path, StaticPath, StrokeVertices};
pub use polygon::{Polygon, PolygonBuilder};
pub use segment::{CubicSegment, CurveClass, LineSegment, Segment};
pub use style::{Color, DrawingStyle};
pub use subpath::{StaticSubpath, Subpath};
pub use triangulate::{MonotoneTriangulator, Triangulator};

use std::time::Instant;

/// Full pipeline: SVG path data → filled and/or stroked [`StaticPath`].
///
/// Each `M` starts a subpath and `Z` closes it. Fails on malformed or
/// arc-bearing path data, on triangulation failure, and with
/// [`TessError::EmptyPath`] when every subpath was degenerate.
pub fn tessellate(
    d: &str,
    config: &TessConfig,
    style: &DrawingStyle,
    fill: bool,
    stroke: bool,
) -> Result<StaticPath, TessError> {
    let t_start = Instant::now();

    // ── Parse ─────────────────────────────────────────────
    let bez = svg::parse_path_data(d)?;
    let mut path = Path::with_config(config.clone());
    path.set_style(style.clone());
    path.extend(&bez);
    log::info!("parsed {} path elements", bez.elements().len());

    // ── Tessellate ────────────────────────────────────────
    if fill {
        path.fill()?;
        log::info!("fill: {} vertices", path.fill_vertices().vertex_count());
    }
    if stroke {
        path.stroke();
        log::info!("stroke: {} vertices", path.stroke_vertices().vertex_count());
    }

    let path = path.into_static();
    if path.subpaths().is_empty() {
        return Err(TessError::EmptyPath);
    }
    let curves: usize = path.subpaths().iter().map(|s| s.curves().len()).sum();
    log::info!(
        "{} subpaths ({} curve leaves) in {}ms",
        path.subpaths().len(),
        curves,
        t_start.elapsed().as_millis(),
    );
    Ok(path)
}
