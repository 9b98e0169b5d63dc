//! Software rasterization of tessellated paths.
//!
//! Renders the vertex buffers exactly as a GPU would consume them: every
//! fill triangle is sampled at pixel centers and kept where the implicit
//! `k³ - l·m` is negative, stroke triangles are solid. Coverage is a
//! union per buffer, so overlapping triangles never blend twice; each
//! buffer is then painted through a tiny-skia mask.

use kurbo::{Affine, Point, Rect};
use tiny_skia::{Mask, Paint, Pixmap, Transform};

use crate::error::TessError;
use crate::path::StaticPath;
use crate::style::Color;

/// Barycentric slack so pixel centers on a shared edge are never dropped
/// by both neighbours.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Canvas size, background and the view transform applied on top of the
/// path's own transform.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub view: Affine,
}

impl RenderOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Color::WHITE,
            view: Affine::IDENTITY,
        }
    }

    /// Scale and center `bounds` into a `width` x `height` canvas,
    /// leaving `margin` pixels on every side. Aspect ratio is kept.
    pub fn fit(bounds: Rect, width: u32, height: u32, margin: f64) -> Self {
        let avail_w = (width as f64 - 2.0 * margin).max(1.0);
        let avail_h = (height as f64 - 2.0 * margin).max(1.0);
        let scale = if bounds.width() > 0.0 && bounds.height() > 0.0 {
            (avail_w / bounds.width()).min(avail_h / bounds.height())
        } else if bounds.width() > 0.0 {
            avail_w / bounds.width()
        } else if bounds.height() > 0.0 {
            avail_h / bounds.height()
        } else {
            1.0
        };
        let offset_x = (width as f64 - bounds.width() * scale) / 2.0 - bounds.x0 * scale;
        let offset_y = (height as f64 - bounds.height() * scale) / 2.0 - bounds.y0 * scale;
        Self {
            view: Affine::new([scale, 0.0, 0.0, scale, offset_x, offset_y]),
            ..Self::new(width, height)
        }
    }
}

/// Bounding box of every fill and stroke vertex, after the path transform.
pub fn path_bounds(path: &StaticPath) -> Option<Rect> {
    let transform = path.transform();
    let fill = path.fill_vertices().map(|f| f.position.as_slice()).unwrap_or(&[]);
    let stroke = path.stroke_vertices().map(|s| s.position.as_slice()).unwrap_or(&[]);
    fill.chunks_exact(3)
        .chain(stroke.chunks_exact(3))
        .map(|p| transform * Point::new(p[0] as f64, p[1] as f64))
        .fold(None, |acc: Option<Rect>, p| {
            Some(match acc {
                Some(r) => r.union_pt(p),
                None => Rect::from_points(p, p),
            })
        })
}

/// Rasterize a tessellated path onto a fresh pixmap.
pub fn rasterize(path: &StaticPath, options: &RenderOptions) -> Result<Pixmap, TessError> {
    let (width, height) = (options.width, options.height);
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| TessError::Render(format!("invalid canvas size {}x{}", width, height)))?;

    let bg = options.background;
    let background = tiny_skia::Color::from_rgba(bg.r, bg.g, bg.b, bg.a)
        .ok_or_else(|| TessError::Render(format!("background color out of range: {:?}", bg)))?;
    pixmap.fill(background);

    let device = options.view * path.transform();
    let mut mask = CoverageMask::new(width, height)?;

    // ── Fill: implicit test per pixel ──
    if let Some(fill) = path.fill_vertices() {
        for (tri, klm) in fill.position.chunks_exact(9).zip(fill.coord.chunks_exact(9)) {
            let corners = triangle_corners(tri, device);
            let coords = [
                [klm[0] as f64, klm[1] as f64, klm[2] as f64],
                [klm[3] as f64, klm[4] as f64, klm[5] as f64],
                [klm[6] as f64, klm[7] as f64, klm[8] as f64],
            ];
            mask.cover(corners, |w| {
                let [k, l, m] = interpolate(&coords, w);
                k * k * k - l * m < 0.0
            });
        }
        mask.composite(&mut pixmap, path.style().effective_fill())?;
    }

    // ── Stroke: solid triangles ──
    if let Some(stroke) = path.stroke_vertices() {
        mask.clear();
        for tri in stroke.position.chunks_exact(9) {
            mask.cover(triangle_corners(tri, device), |_| true);
        }
        mask.composite(&mut pixmap, path.style().effective_stroke())?;
    }

    log::debug!("rasterized {}x{} canvas", width, height);
    Ok(pixmap)
}

/// Encode a pixmap as straight-alpha RGBA PNG bytes.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, TessError> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| TessError::Render(e.to_string()))?;
    writer
        .write_image_data(&data)
        .map_err(|e| TessError::Render(e.to_string()))?;
    drop(writer);
    Ok(buf)
}

/// Write a pixmap to disk as PNG.
pub fn save_png(pixmap: &Pixmap, output: &std::path::Path) -> Result<(), TessError> {
    let bytes = encode_png(pixmap)?;
    std::fs::write(output, bytes)?;
    Ok(())
}

fn triangle_corners(tri: &[f32], device: Affine) -> [Point; 3] {
    [
        device * Point::new(tri[0] as f64, tri[1] as f64),
        device * Point::new(tri[3] as f64, tri[4] as f64),
        device * Point::new(tri[6] as f64, tri[7] as f64),
    ]
}

fn interpolate(coords: &[[f64; 3]; 3], w: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (j, v) in out.iter_mut().enumerate() {
        *v = w[0] * coords[0][j] + w[1] * coords[1][j] + w[2] * coords[2][j];
    }
    out
}

/// Per-pixel coverage, 0 or 255, kept in a tiny-skia mask so compositing
/// goes through the regular paint pipeline.
struct CoverageMask {
    width: usize,
    height: usize,
    mask: Mask,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Result<Self, TessError> {
        let mask = Mask::new(width, height)
            .ok_or_else(|| TessError::Render(format!("invalid mask size {}x{}", width, height)))?;
        Ok(Self {
            width: width as usize,
            height: height as usize,
            mask,
        })
    }

    fn clear(&mut self) {
        self.mask.data_mut().fill(0);
    }

    /// Mark every pixel whose center lies in the triangle and passes `keep`,
    /// which receives the barycentric weights of the center.
    fn cover(&mut self, [a, b, c]: [Point; 3], keep: impl Fn([f64; 3]) -> bool) {
        let det = (b - a).cross(c - a);
        if det.abs() < f64::EPSILON {
            return;
        }
        let bbox = Rect::from_points(a, b).union_pt(c);
        let x0 = bbox.x0.floor().max(0.0) as usize;
        let y0 = bbox.y0.floor().max(0.0) as usize;
        let x1 = (bbox.x1.ceil().max(0.0) as usize).min(self.width);
        let y1 = (bbox.y1.ceil().max(0.0) as usize).min(self.height);

        let width = self.width;
        let data = self.mask.data_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let w1 = (p - a).cross(c - a) / det;
                let w2 = (b - a).cross(p - a) / det;
                let w0 = 1.0 - w1 - w2;
                if w0 < -EDGE_TOLERANCE || w1 < -EDGE_TOLERANCE || w2 < -EDGE_TOLERANCE {
                    continue;
                }
                if keep([w0, w1, w2]) {
                    data[y * width + x] = 255;
                }
            }
        }
    }

    /// Source-over `color` through the mask.
    fn composite(&self, pixmap: &mut Pixmap, color: Color) -> Result<(), TessError> {
        let rgba = tiny_skia::Color::from_rgba(color.r, color.g, color.b, color.a)
            .ok_or_else(|| TessError::Render(format!("color out of range: {:?}", color)))?;
        let mut paint = Paint::default();
        paint.set_color(rgba);
        paint.anti_alias = false;

        let area = tiny_skia::Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32)
            .ok_or_else(|| TessError::Render("empty canvas".to_string()))?;
        pixmap.fill_rect(area, &paint, Transform::identity(), Some(&self.mask));
        Ok(())
    }
}
