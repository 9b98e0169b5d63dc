//! Triangulation by y-monotone decomposition.
//!
//! Sweep top to bottom, classify vertices, insert diagonals at split and
//! merge vertices (de Berg et al., "Computational Geometry", ch. 3), then
//! triangulate every monotone piece with the chain/stack algorithm.
//!
//! Internally the polygon is mirrored to y-up and re-ordered to be
//! counter-clockwise, so "left chain" and "above" have their textbook
//! meaning. Output indices refer to the caller's original order.

use std::cmp::Ordering;

use kurbo::Point;

use crate::error::TessError;
use crate::geom::{cross, signed_area};

use super::Triangulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexKind {
    Start,
    End,
    Split,
    Merge,
    /// Regular vertex on the left chain (interior to the right).
    RegularLeft,
    /// Regular vertex on the right chain.
    RegularRight,
}

/// Monotone-decomposition triangulator.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotoneTriangulator;

impl Triangulator for MonotoneTriangulator {
    fn triangulate(&self, points: &[Point]) -> Result<Vec<u32>, TessError> {
        let n = points.len();
        if n < 3 {
            return Ok(Vec::new());
        }
        if n == 3 {
            return Ok(vec![0, 1, 2]);
        }

        let sweep = Sweep::new(points);
        let head = sweep.sorted[0];
        if sweep.kinds[head] != VertexKind::Start {
            return Err(TessError::InvalidPolygon(format!(
                "topmost vertex {} is {:?}, expected a start vertex",
                sweep.order[head], sweep.kinds[head]
            )));
        }

        let has_turns = sweep
            .kinds
            .iter()
            .any(|k| matches!(k, VertexKind::Split | VertexKind::Merge));
        let diagonals = if has_turns { sweep.diagonals()? } else { Vec::new() };
        let pieces = split_pieces(n, &diagonals);
        log::trace!("{} vertices, {} diagonals, {} monotone pieces", n, diagonals.len(), pieces.len());

        let mut local = Vec::with_capacity(3 * (n - 2));
        let mut on_left = vec![false; n];
        for piece in &pieces {
            sweep.triangulate_piece(piece, &mut on_left, &mut local);
        }

        // Back to caller indices, wound like the input polygon.
        let winding = signed_area(points);
        let mut out = Vec::with_capacity(local.len() * 3);
        for [a, b, c] in local {
            let (a, b, c) = (sweep.order[a], sweep.order[b], sweep.order[c]);
            let area = cross(points[a], points[b], points[c]);
            if (area < 0.0) == (winding < 0.0) {
                out.extend([a as u32, b as u32, c as u32]);
            } else {
                out.extend([a as u32, c as u32, b as u32]);
            }
        }
        Ok(out)
    }
}

/// Polygon in the sweep frame.
struct Sweep {
    /// Mirrored points, counter-clockwise.
    pts: Vec<Point>,
    /// `order[i]` is the caller's index of sweep vertex `i`.
    order: Vec<usize>,
    kinds: Vec<VertexKind>,
    /// Vertex indices, topmost first.
    sorted: Vec<usize>,
}

impl Sweep {
    fn new(points: &[Point]) -> Self {
        let n = points.len();
        let mirrored: Vec<Point> = points.iter().map(|p| Point::new(p.x, -p.y)).collect();
        let order: Vec<usize> = if signed_area(&mirrored) >= 0.0 {
            (0..n).collect()
        } else {
            (0..n).rev().collect()
        };
        let pts: Vec<Point> = order.iter().map(|&i| mirrored[i]).collect();

        let mut sweep = Sweep {
            pts,
            order,
            kinds: Vec::with_capacity(n),
            sorted: (0..n).collect(),
        };
        sweep.kinds = (0..n).map(|i| sweep.classify(i)).collect();
        let mut sorted = std::mem::take(&mut sweep.sorted);
        sorted.sort_by(|&a, &b| sweep.compare(a, b));
        sweep.sorted = sorted;
        sweep
    }

    fn len(&self) -> usize {
        self.pts.len()
    }

    fn prev(&self, i: usize) -> usize {
        (i + self.len() - 1) % self.len()
    }

    fn next(&self, i: usize) -> usize {
        (i + 1) % self.len()
    }

    /// Sweep order: higher y first, ties broken by smaller x.
    fn above(&self, a: usize, b: usize) -> bool {
        let (p, q) = (self.pts[a], self.pts[b]);
        p.y > q.y || (p.y == q.y && p.x < q.x)
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        if self.above(a, b) {
            Ordering::Less
        } else if self.above(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    fn classify(&self, v: usize) -> VertexKind {
        let (u, w) = (self.prev(v), self.next(v));
        if self.above(u, v) && self.above(v, w) {
            return VertexKind::RegularLeft;
        }
        if self.above(w, v) && self.above(v, u) {
            return VertexKind::RegularRight;
        }
        let convex = cross(self.pts[u], self.pts[v], self.pts[w]) > 0.0;
        match (self.above(v, u) && self.above(v, w), convex) {
            (true, true) => VertexKind::Start,
            (true, false) => VertexKind::Split,
            (false, true) => VertexKind::End,
            (false, false) => VertexKind::Merge,
        }
    }

    /// x where edge `e` (vertex `e` to its successor) crosses height `y`.
    /// Horizontal edges report their right end.
    fn x_at(&self, e: usize, y: f64) -> f64 {
        let p = self.pts[e];
        let r = self.pts[self.next(e)];
        if p.y == r.y {
            return p.x.max(r.x);
        }
        let t = ((y - p.y) / (r.y - p.y)).clamp(0.0, 1.0);
        p.x + (r.x - p.x) * t
    }

    /// Insert the edge starting at `e` into the status, which is kept
    /// ordered left to right. Active edges never cross, so an order
    /// established at insertion holds for the rest of the sweep.
    fn insert_edge(&self, status: &mut Vec<usize>, e: usize) {
        let p = self.pts[e];
        let at = status.partition_point(|&s| self.x_at(s, p.y) < p.x);
        status.insert(at, e);
    }

    /// Remove edge `e`, which ends at the vertex `v` being swept.
    fn remove_edge(&self, status: &mut Vec<usize>, e: usize, v: usize) -> Result<(), TessError> {
        let p = self.pts[v];
        let guess = status.partition_point(|&s| self.x_at(s, p.y) < p.x);
        // Rounding in x_at can put `e` one slot either side of the guess.
        let pos = (guess.saturating_sub(1)..(guess + 2).min(status.len()))
            .find(|&i| status[i] == e)
            .or_else(|| status.iter().position(|&s| s == e))
            .ok_or_else(|| TessError::InvalidPolygon(format!("edge {} not active", self.order[e])))?;
        status.remove(pos);
        Ok(())
    }

    /// The status edge immediately left of vertex `v`.
    fn left_edge(&self, status: &[usize], v: usize) -> Result<usize, TessError> {
        let p = self.pts[v];
        let split = status.partition_point(|&e| self.x_at(e, p.y) <= p.x);
        status[..split]
            .iter()
            .rev()
            .find(|&&e| e != v && self.next(e) != v)
            .copied()
            .ok_or_else(|| {
                TessError::InvalidPolygon(format!("no edge left of vertex {}", self.order[v]))
            })
    }

    /// Run the sweep and collect the diagonals that cut the polygon into
    /// y-monotone pieces.
    fn diagonals(&self) -> Result<Vec<(usize, usize)>, TessError> {
        let n = self.len();
        let mut status: Vec<usize> = Vec::new();
        let mut helper = vec![0usize; n];
        let mut diagonals = Vec::new();

        for &v in &self.sorted {
            let prev = self.prev(v);
            match self.kinds[v] {
                VertexKind::Start => {
                    self.insert_edge(&mut status, v);
                    helper[v] = v;
                }
                VertexKind::End => {
                    if self.kinds[helper[prev]] == VertexKind::Merge {
                        diagonals.push((v, helper[prev]));
                    }
                    self.remove_edge(&mut status, prev, v)?;
                }
                VertexKind::Split => {
                    let e = self.left_edge(&status, v)?;
                    diagonals.push((v, helper[e]));
                    helper[e] = v;
                    self.insert_edge(&mut status, v);
                    helper[v] = v;
                }
                VertexKind::Merge => {
                    if self.kinds[helper[prev]] == VertexKind::Merge {
                        diagonals.push((v, helper[prev]));
                    }
                    self.remove_edge(&mut status, prev, v)?;
                    let e = self.left_edge(&status, v)?;
                    if self.kinds[helper[e]] == VertexKind::Merge {
                        diagonals.push((v, helper[e]));
                    }
                    helper[e] = v;
                }
                VertexKind::RegularLeft => {
                    if self.kinds[helper[prev]] == VertexKind::Merge {
                        diagonals.push((v, helper[prev]));
                    }
                    self.remove_edge(&mut status, prev, v)?;
                    self.insert_edge(&mut status, v);
                    helper[v] = v;
                }
                VertexKind::RegularRight => {
                    let e = self.left_edge(&status, v)?;
                    if self.kinds[helper[e]] == VertexKind::Merge {
                        diagonals.push((v, helper[e]));
                    }
                    helper[e] = v;
                }
            }
        }
        Ok(diagonals)
    }

    /// Chain/stack triangulation of one monotone piece (vertex indices
    /// in counter-clockwise order).
    fn triangulate_piece(&self, piece: &[usize], on_left: &mut [bool], out: &mut Vec<[usize; 3]>) {
        let m = piece.len();
        if m < 3 {
            return;
        }
        if m == 3 {
            out.push([piece[0], piece[1], piece[2]]);
            return;
        }

        let mut top = 0;
        let mut bottom = 0;
        for i in 1..m {
            if self.above(piece[i], piece[top]) {
                top = i;
            }
            if self.above(piece[bottom], piece[i]) {
                bottom = i;
            }
        }

        // Counter-clockwise from the top runs down the left chain.
        for &v in piece {
            on_left[v] = false;
        }
        on_left[piece[top]] = true;
        let mut i = (top + 1) % m;
        while i != bottom {
            on_left[piece[i]] = true;
            i = (i + 1) % m;
        }

        let mut sorted = piece.to_vec();
        sorted.sort_by(|&a, &b| self.compare(a, b));

        let mut stack = vec![sorted[0], sorted[1]];
        for &u in &sorted[2..m - 1] {
            let top_of_stack = stack[stack.len() - 1];
            if on_left[u] != on_left[top_of_stack] {
                for w in stack.windows(2) {
                    out.push([u, w[0], w[1]]);
                }
                stack = vec![top_of_stack, u];
            } else {
                let mut last = top_of_stack;
                stack.pop();
                while let Some(&t) = stack.last() {
                    let c = cross(self.pts[t], self.pts[u], self.pts[last]);
                    let inside = if on_left[u] { c < 0.0 } else { c > 0.0 };
                    if !inside {
                        break;
                    }
                    out.push([u, last, t]);
                    last = t;
                    stack.pop();
                }
                stack.push(last);
                stack.push(u);
            }
        }

        let u = sorted[m - 1];
        for w in stack.windows(2) {
            out.push([u, w[0], w[1]]);
        }
    }
}

/// Cut the polygon `0..n` along non-crossing diagonals.
fn split_pieces(n: usize, diagonals: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut pieces = vec![(0..n).collect::<Vec<_>>()];
    for &(a, b) in diagonals {
        for pi in 0..pieces.len() {
            let pc = &pieces[pi];
            let (Some(ia), Some(ib)) = (pc.iter().position(|&v| v == a), pc.iter().position(|&v| v == b))
            else {
                continue;
            };
            let (ia, ib) = if ia < ib { (ia, ib) } else { (ib, ia) };
            if ib - ia == 1 || (ia == 0 && ib == pc.len() - 1) {
                continue;
            }
            let first: Vec<usize> = pc[ia..=ib].to_vec();
            let second: Vec<usize> = pc[ib..].iter().chain(&pc[..=ia]).copied().collect();
            pieces[pi] = first;
            pieces.push(second);
            break;
        }
    }
    pieces
}
