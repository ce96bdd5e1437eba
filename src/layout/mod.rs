//! Coordinate layouts over embedded graphs and the shared layout artifact.

pub mod orthogonal;
pub mod planarize;
pub mod straight;

pub use orthogonal::orthogonal_layout;
pub use planarize::{planarization_layout, PlanarizationResult, PlanarizeMode};
pub use straight::planar_straight_line;

use serde::{Deserialize, Serialize};

use crate::graph::VertexId;

/// Coordinates are clamped into `[-COORD_LIMIT, COORD_LIMIT]`.
pub const COORD_LIMIT: f64 = 1e7;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Which layout produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMode {
    #[serde(rename = "planar-straight")]
    PlanarStraight,
    #[serde(rename = "orthogonal")]
    Orthogonal,
    #[serde(rename = "planarization-straight")]
    PlanarizationStraight,
    #[serde(rename = "planarization-orthogonal")]
    PlanarizationOrthogonal,
    /// Relaxation without a planarity guarantee; the last-resort fallback.
    #[serde(rename = "raw-relaxation")]
    RawRelaxation,
}

/// One routed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRoute {
    /// Endpoint vertex ids `[u, v]`.
    pub edge: (VertexId, VertexId),
    pub points: Vec<Point>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn empty() -> Self {
        BBox { min_x: 0.0, min_y: 0.0, max_x: 0.0, max_y: 0.0 }
    }

    pub fn of(points: impl IntoIterator<Item = Point>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return BBox::empty();
        };
        let mut b = BBox { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for p in iter {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        b
    }
}

/// The serialisable result of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutArtifact {
    pub mode: LayoutMode,
    pub crossings: usize,
    pub bends: usize,
    /// `(vertex, position)` pairs sorted by vertex id.
    pub positions: Vec<(VertexId, Point)>,
    pub edge_routes: Vec<EdgeRoute>,
    pub bbox: BBox,
}

impl LayoutArtifact {
    /// Clamps every coordinate into the limit and maps non-finite values to
    /// zero. Idempotent.
    pub fn clamp(&mut self) {
        for (_, p) in &mut self.positions {
            p.x = clamp_coord(p.x);
            p.y = clamp_coord(p.y);
        }
        for route in &mut self.edge_routes {
            for p in &mut route.points {
                p.x = clamp_coord(p.x);
                p.y = clamp_coord(p.y);
            }
        }
        self.bbox = BBox::of(self.positions.iter().map(|&(_, p)| p));
    }
}

/// Clamps one coordinate; non-finite maps to `0`.
pub fn clamp_coord(x: f64) -> f64 {
    if !x.is_finite() {
        0.0
    } else {
        x.clamp(-COORD_LIMIT, COORD_LIMIT)
    }
}

/// A straight segment belonging to an edge `{u, v}`.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub u: VertexId,
    pub v: VertexId,
    pub a: Point,
    pub b: Point,
}

fn orient(p: Point, q: Point, r: Point) -> f64 {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

fn segments_cross(s: &Segment, t: &Segment) -> bool {
    let d1 = orient(s.a, s.b, t.a);
    let d2 = orient(s.a, s.b, t.b);
    let d3 = orient(t.a, t.b, s.a);
    let d4 = orient(t.a, t.b, s.b);
    (d1 > 0.0) != (d2 > 0.0)
        && (d3 > 0.0) != (d4 > 0.0)
        && d1 != 0.0
        && d2 != 0.0
        && d3 != 0.0
        && d4 != 0.0
}

/// Counts pairwise proper segment crossings, skipping pairs that share an
/// endpoint vertex.
///
/// Brute force: **O(k²)** over the segment count, which is what the live
/// crossing metric and the final stats both use.
pub fn count_crossings(segments: &[Segment]) -> usize {
    let mut crossings = 0;
    for i in 0..segments.len() {
        for j in i + 1..segments.len() {
            let (s, t) = (&segments[i], &segments[j]);
            if s.u == t.u || s.u == t.v || s.v == t.u || s.v == t.v {
                continue;
            }
            if segments_cross(s, t) {
                crossings += 1;
            }
        }
    }
    crossings
}
