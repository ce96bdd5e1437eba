//! Planar straight-line layout: boundary pinned on a regular polygon,
//! interior vertices settled by iterated neighbour averaging.

use std::f64::consts::TAU;

use hashbrown::HashSet;

use crate::error::Result;
use crate::layout::{
    count_crossings, BBox, EdgeRoute, LayoutArtifact, LayoutMode, Point, Segment,
};
use crate::mesh::{select_outer_face, HalfEdgeMesh};

/// Convergence threshold on the max L1 position delta.
const TOLERANCE: f64 = 1e-4;
/// Iteration cap for the averaging loop.
const MAX_ITERATIONS: usize = 500;
/// Final coordinates are multiplied by this and rounded.
const SCALE: f64 = 10.0;

/// Computes a straight-line drawing of the embedded graph.
///
/// The outer face boundary is pinned on a regular polygon with radius
/// proportional to the boundary length; every interior vertex is repeatedly
/// replaced by the average of its neighbours, augmented with fan
/// triangulation neighbours of each interior face so that faces cannot
/// collapse. Edges are drawn as straight segments and crossings are counted
/// by brute force for the report.
///
/// # Example
/// ```rust
/// use planegraph::graph::Graph;
/// use planegraph::layout::planar_straight_line;
/// use planegraph::mesh::build_half_edge_mesh;
/// use planegraph::planarity::{test_planarity, PlanarityOptions};
///
/// let g = Graph::from_edge_list(3, &[(0, 1), (1, 2), (2, 0)]).unwrap();
/// let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
/// let mesh = build_half_edge_mesh(&g, report.embedding().unwrap()).unwrap();
/// let drawing = planar_straight_line(&mesh).unwrap();
/// assert_eq!(drawing.crossings, 0);
/// assert_eq!(drawing.edge_routes.len(), 3);
/// ```
pub fn planar_straight_line(mesh: &HalfEdgeMesh) -> Result<LayoutArtifact> {
    let n = mesh.vertex_count();
    let positions = solve_positions(mesh, None);

    let mut routes = Vec::with_capacity(mesh.edge_count());
    let mut segments = Vec::with_capacity(mesh.edge_count());
    for e in 0..mesh.edge_count() {
        let (u, v) = mesh.edge_endpoints(e);
        let (a, b) = (positions[u], positions[v]);
        routes.push(EdgeRoute { edge: (u, v), points: vec![a, b] });
        segments.push(Segment { u, v, a, b });
    }
    let crossings = count_crossings(&segments);

    let positions: Vec<_> = (0..n).map(|v| (v, positions[v])).collect();
    let bbox = BBox::of(positions.iter().map(|&(_, p)| p));
    Ok(LayoutArtifact {
        mode: LayoutMode::PlanarStraight,
        crossings,
        bends: 0,
        positions,
        edge_routes: routes,
        bbox,
    })
}

/// The position-solving core, shared with the orthogonal base layout.
///
/// `outer_override` pins a caller-chosen outer face instead of the default
/// selection.
pub(crate) fn solve_positions(
    mesh: &HalfEdgeMesh,
    outer_override: Option<usize>,
) -> Vec<Point> {
    let n = mesh.vertex_count();
    if n == 0 {
        return Vec::new();
    }
    let outer = outer_override.unwrap_or_else(|| select_outer_face(mesh, None));

    // Boundary cycle, deduplicated in first-occurrence order.
    let mut boundary: Vec<usize> = Vec::new();
    let mut on_boundary = vec![false; n];
    if mesh.face_count() > 0 {
        for v in mesh.face_vertices(outer) {
            if !on_boundary[v] {
                on_boundary[v] = true;
                boundary.push(v);
            }
        }
    }

    // Averaging neighbours: real adjacency plus fan-triangulation
    // auxiliaries inside every interior face.
    let mut aux: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for e in 0..mesh.edge_count() {
        let (u, v) = mesh.edge_endpoints(e);
        aux[u].insert(v);
        aux[v].insert(u);
    }
    for f in 0..mesh.face_count() {
        if f == outer {
            continue;
        }
        let mut vs = Vec::new();
        let mut seen = HashSet::new();
        for v in mesh.face_vertices(f) {
            if seen.insert(v) {
                vs.push(v);
            }
        }
        if vs.len() > 3 {
            let hub = vs[0];
            for &v in &vs[2..vs.len() - 1] {
                aux[hub].insert(v);
                aux[v].insert(hub);
            }
        }
    }
    // Deterministic averaging order.
    let neighbours: Vec<Vec<usize>> = aux
        .into_iter()
        .map(|set| {
            let mut list: Vec<usize> = set.into_iter().collect();
            list.sort_unstable();
            list
        })
        .collect();

    let mut pos = vec![Point::new(0.0, 0.0); n];
    let b = boundary.len().max(1) as f64;
    let radius = 2.0 * b;
    for (i, &v) in boundary.iter().enumerate() {
        let angle = TAU * i as f64 / b;
        pos[v] = Point::new(radius * angle.cos(), radius * angle.sin());
    }

    for _ in 0..MAX_ITERATIONS {
        let mut max_delta: f64 = 0.0;
        for v in 0..n {
            if on_boundary[v] || neighbours[v].is_empty() {
                continue;
            }
            let mut x = 0.0;
            let mut y = 0.0;
            for &w in &neighbours[v] {
                x += pos[w].x;
                y += pos[w].y;
            }
            let k = neighbours[v].len() as f64;
            let next = Point::new(x / k, y / k);
            max_delta = max_delta
                .max((next.x - pos[v].x).abs() + (next.y - pos[v].y).abs());
            pos[v] = next;
        }
        if max_delta < TOLERANCE {
            break;
        }
    }

    for p in &mut pos {
        p.x = (p.x * SCALE).round();
        p.y = (p.y * SCALE).round();
    }
    pos
}
