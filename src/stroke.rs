//! Stroke expansion: centerline samples to a list of triangles.
//!
//! Joins are mitred along the bisector of the neighbouring segment
//! normals; open ends get flat caps.

use kurbo::{Point, Vec2};

use crate::geom::{points_coincide, EPSILON};
use crate::segment::Segment;

/// A centerline point and the half-width of the stroke there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    pub point: Point,
    pub half_width: f64,
}

/// Walk a segment chain into centerline samples.
///
/// Curves contribute their forward-difference samples (prepared by
/// `CubicSegment::update_stroke_stepper`), lines their end point.
/// Coincident neighbours are dropped, and for closed chains the repeated
/// start point is dropped too.
pub fn sample_centerline(segments: &[Segment], closed: bool) -> Vec<StrokeSample> {
    let Some(first) = segments.first() else {
        return Vec::new();
    };

    let mut samples = vec![StrokeSample {
        point: first.start(),
        half_width: first.thickness() / 2.0,
    }];
    let mut scratch = Vec::new();
    for seg in segments {
        let half_width = seg.thickness() / 2.0;
        scratch.clear();
        match seg {
            Segment::Line(line) => scratch.push(line.p1),
            Segment::Cubic(curve) => curve.stroke_samples(&mut scratch),
        }
        for &point in &scratch {
            let duplicate = samples
                .last()
                .is_some_and(|s| points_coincide(s.point, point, EPSILON));
            if !duplicate {
                samples.push(StrokeSample { point, half_width });
            }
        }
    }

    if closed && samples.len() > 1 {
        let (first, last) = (samples[0].point, samples[samples.len() - 1].point);
        if points_coincide(first, last, EPSILON) {
            samples.pop();
        }
    }
    samples
}

/// Left-hand normal of a direction (y-up sense).
fn normal(d: Vec2) -> Vec2 {
    Vec2::new(d.y, -d.x)
}

fn direction(from: Point, to: Point) -> Vec2 {
    let d = to - from;
    let len = d.hypot();
    if len > 0.0 {
        d / len
    } else {
        Vec2::ZERO
    }
}

/// Offset of a join whose incoming and outgoing normals are `n_in`/`n_out`.
///
/// The offset runs along the bisector with length `half / cos θ`, θ being
/// the angle between the bisector and either normal. With a miter limit
/// the length never exceeds `limit * half`.
fn miter_offset(n_in: Vec2, n_out: Vec2, half: f64, miter_limit: Option<f64>) -> Vec2 {
    let sum = n_in + n_out;
    let sum_len = sum.hypot();
    if sum_len < 1e-9 {
        // Full reversal: the bisector is undefined.
        return n_in * half;
    }
    let bisector = sum / sum_len;
    let cos_theta = bisector.dot(n_in);
    let mut len = half / cos_theta;
    if let Some(limit) = miter_limit {
        len = len.min(limit * half);
    }
    bisector * len
}

/// Expand centerline samples into stroke triangles (three points each).
///
/// Each consecutive pair of samples becomes a quad split into two
/// triangles; closed chains also connect the last sample to the first.
pub fn expand(samples: &[StrokeSample], closed: bool, miter_limit: Option<f64>) -> Vec<Point> {
    let n = samples.len();
    if n < 2 {
        return Vec::new();
    }

    let edges = if closed { n } else { n - 1 };
    let dirs: Vec<Vec2> = (0..edges)
        .map(|i| direction(samples[i].point, samples[(i + 1) % n].point))
        .collect();

    let offsets: Vec<Vec2> = (0..n)
        .map(|i| {
            let half = samples[i].half_width;
            if !closed && i == 0 {
                normal(dirs[0]) * half
            } else if !closed && i == n - 1 {
                normal(dirs[n - 2]) * half
            } else {
                let incoming = dirs[(i + edges - 1) % edges];
                miter_offset(normal(incoming), normal(dirs[i]), half, miter_limit)
            }
        })
        .collect();

    let left = |i: usize| samples[i].point + offsets[i];
    let right = |i: usize| samples[i].point - offsets[i];

    let mut out = Vec::with_capacity(edges * 6);
    for i in 0..edges {
        let j = (i + 1) % n;
        // L_i ---- L_j
        //  |   /    |
        // R_i ---- R_j
        out.extend([left(i), right(i), left(j)]);
        out.extend([right(i), right(j), left(j)]);
    }
    out
}
