//! The face-adjacency dual of a mesh and shortest-path routing over it.
//!
//! Routing a new edge `{u, v}` through an embedding is a shortest path in
//! the dual between the faces incident to `u` and those incident to `v`;
//! the dual edges on the path are exactly the primal edges the new edge
//! must cross.

use std::collections::BinaryHeap;

use crate::error::Result;
use crate::graph::{EdgeId, Graph, VertexId};
use crate::mesh::{build_half_edge_mesh, FaceId, HalfEdgeMesh};
use crate::planarity::{
    maximal_planar_subgraph, test_planarity, Planarity, PlanarityOptions,
};

/// `MinScored<K, T>` holds a score and a payload for use with
/// [`BinaryHeap`] as a min-heap; it compares in reverse order by the score
/// and totalises NaN last.
#[derive(Copy, Clone, Debug)]
struct MinScored<K, T>(K, T);

impl<K: PartialOrd, T> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == core::cmp::Ordering::Equal
    }
}

impl<K: PartialOrd, T> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd, T> Ord for MinScored<K, T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        use core::cmp::Ordering::*;
        let a = &self.0;
        let b = &other.0;
        if a == b {
            Equal
        } else if a < b {
            Greater
        } else if a > b {
            Less
        } else if a != a && b != b {
            Equal
        } else if a != a {
            // NaN sorts last in min-score order.
            Less
        } else {
            Greater
        }
    }
}

/// The dual graph of a half-edge mesh: one vertex per face, one edge per
/// primal edge.
///
/// Dual edge ids coincide with primal edge ids; the two maps record the
/// correspondence explicitly.
#[derive(Debug, Clone)]
pub struct DualGraph {
    face_count: usize,
    /// `edge_faces[e]` is `(face(2e), face(2e + 1))`.
    pub edge_faces: Vec<(FaceId, FaceId)>,
    pub dual_edge_to_primal: Vec<EdgeId>,
    pub primal_edge_to_dual: Vec<usize>,
    /// Per face, `(dual edge, other face)` in edge-id order.
    adj: Vec<Vec<(usize, FaceId)>>,
}

impl DualGraph {
    pub fn from_mesh(mesh: &HalfEdgeMesh) -> DualGraph {
        let m = mesh.edge_count();
        let mut edge_faces = Vec::with_capacity(m);
        let mut adj: Vec<Vec<(usize, FaceId)>> = vec![Vec::new(); mesh.face_count()];
        for e in 0..m {
            let left = mesh.face_of(2 * e);
            let right = mesh.face_of(2 * e + 1);
            edge_faces.push((left, right));
            adj[left].push((e, right));
            adj[right].push((e, left));
        }
        DualGraph {
            face_count: mesh.face_count(),
            edge_faces,
            dual_edge_to_primal: (0..m).collect(),
            primal_edge_to_dual: (0..m).collect(),
            adj,
        }
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    /// The two faces on either side of a primal edge.
    pub fn faces_of_edge(&self, e: EdgeId) -> (FaceId, FaceId) {
        self.edge_faces[e]
    }
}

/// A shortest route between two face sets.
#[derive(Debug, Clone, PartialEq)]
pub struct DualPath {
    /// Faces visited, start to goal.
    pub faces: Vec<FaceId>,
    /// Dual edges crossed, in path order.
    pub dual_edges: Vec<usize>,
    /// The same crossings as primal edge ids.
    pub primal_edges: Vec<EdgeId>,
    pub distance: f64,
}

/// Multi-source Dijkstra over the dual from `start_faces` to any of
/// `goal_faces`, with `weight` giving the cost of crossing each primal
/// edge.
///
/// Ties are broken by smaller face id, then smaller dual edge id, so equal
/// inputs always produce the same path. Returns `None` when no goal face is
/// reachable or either set is empty.
pub fn dual_shortest_path<F>(
    dual: &DualGraph,
    start_faces: &[FaceId],
    goal_faces: &[FaceId],
    weight: F,
) -> Option<DualPath>
where
    F: Fn(EdgeId) -> f64,
{
    if start_faces.is_empty() || goal_faces.is_empty() {
        return None;
    }
    let nf = dual.face_count;
    let mut dist = vec![f64::INFINITY; nf];
    let mut settled = vec![false; nf];
    let mut prev: Vec<Option<(FaceId, usize)>> = vec![None; nf];
    let mut is_goal = vec![false; nf];
    for &f in goal_faces {
        is_goal[f] = true;
    }

    let mut heap: BinaryHeap<MinScored<(f64, FaceId), FaceId>> = BinaryHeap::new();
    let mut starts: Vec<FaceId> = start_faces.to_vec();
    starts.sort_unstable();
    starts.dedup();
    for f in starts {
        dist[f] = 0.0;
        heap.push(MinScored((0.0, f), f));
    }

    let mut goal_hit: Option<FaceId> = None;
    while let Some(MinScored((d, _), f)) = heap.pop() {
        if settled[f] {
            continue;
        }
        settled[f] = true;
        if is_goal[f] {
            goal_hit = Some(f);
            break;
        }
        for &(de, g) in &dual.adj[f] {
            if settled[g] {
                continue;
            }
            let nd = d + weight(dual.dual_edge_to_primal[de]);
            if nd < dist[g] {
                dist[g] = nd;
                prev[g] = Some((f, de));
                heap.push(MinScored((nd, g), g));
            }
        }
    }

    let goal = goal_hit?;
    let mut faces = vec![goal];
    let mut dual_edges = Vec::new();
    let mut cur = goal;
    while let Some((p, de)) = prev[cur] {
        dual_edges.push(de);
        faces.push(p);
        cur = p;
    }
    faces.reverse();
    dual_edges.reverse();
    let primal_edges = dual_edges
        .iter()
        .map(|&de| dual.dual_edge_to_primal[de])
        .collect();
    Some(DualPath {
        faces,
        dual_edges,
        primal_edges,
        distance: dist[goal],
    })
}

/// Routes a new edge `{u, v}` through a fixed embedding.
///
/// The start and goal sets are the distinct faces incident to `u` and `v`.
/// Returns `None` when either vertex touches no face (isolated vertex) or
/// no route exists.
///
/// # Example
/// ```rust
/// use planegraph::dual::route_edge_fixed_embedding;
/// use planegraph::graph::Graph;
/// use planegraph::mesh::build_half_edge_mesh;
/// use planegraph::planarity::{test_planarity, PlanarityOptions};
///
/// let g = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]).unwrap();
/// let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
/// let mesh = build_half_edge_mesh(&g, report.embedding().unwrap()).unwrap();
///
/// // 1 and 3 sit on the outer face together: nothing to cross.
/// let path = route_edge_fixed_embedding(&mesh, 1, 3, |_| 1.0).unwrap();
/// assert!(path.primal_edges.is_empty());
/// ```
pub fn route_edge_fixed_embedding<F>(
    mesh: &HalfEdgeMesh,
    u: VertexId,
    v: VertexId,
    weight: F,
) -> Option<DualPath>
where
    F: Fn(EdgeId) -> f64,
{
    let dual = DualGraph::from_mesh(mesh);
    let starts = mesh.faces_at(u);
    let goals = mesh.faces_at(v);
    dual_shortest_path(&dual, &starts, &goals, weight)
}

/// Options for [`route_edge_on_graph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions {
    /// When the graph is nonplanar, route on a greedy maximal planar
    /// subgraph instead of giving up.
    pub planarity_fallback: bool,
    pub planarity_options: PlanarityOptions,
}

/// A route found on a graph's own embedding (or its planar fallback).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRoute {
    /// Primal edges of the *original* graph crossed by the new edge.
    pub crossed_primal_edges: Vec<EdgeId>,
    /// Faces of the routing mesh visited.
    pub faces: Vec<FaceId>,
    /// Describes the planarity fallback when one was taken.
    pub note: Option<String>,
}

/// Routes a new edge `{u, v}` on `g`'s own planar embedding; when `g` is
/// nonplanar and the fallback is enabled, routes on a greedy maximal planar
/// subgraph and remaps the crossed edges back to original ids.
pub fn route_edge_on_graph(
    g: &Graph,
    u: VertexId,
    v: VertexId,
    opts: RouteOptions,
) -> Result<Option<GraphRoute>> {
    let report = test_planarity(g, opts.planarity_options)?;
    match report.outcome {
        Planarity::Planar { embedding } => {
            let mesh = build_half_edge_mesh(g, &embedding)?;
            Ok(route_edge_fixed_embedding(&mesh, u, v, |_| 1.0).map(|path| GraphRoute {
                crossed_primal_edges: path.primal_edges,
                faces: path.faces,
                note: None,
            }))
        }
        Planarity::Nonplanar { .. } => {
            if !opts.planarity_fallback {
                return Ok(None);
            }
            let mps = maximal_planar_subgraph(g, opts.planarity_options)?;
            let sub_report = test_planarity(&mps.graph, PlanarityOptions::default())?;
            let embedding = match sub_report.outcome {
                Planarity::Planar { embedding } => embedding,
                Planarity::Nonplanar { .. } => {
                    return Err(crate::error::Error::internal(
                        "greedy maximal planar subgraph is not planar",
                    ));
                }
            };
            let mesh = build_half_edge_mesh(&mps.graph, &embedding)?;
            let note = format!(
                "routed on greedy maximal planar subgraph ({} of {} edges dropped)",
                mps.dropped.len(),
                g.edge_count()
            );
            Ok(
                route_edge_fixed_embedding(&mesh, u, v, |_| 1.0).map(|path| GraphRoute {
                    crossed_primal_edges: path
                        .primal_edges
                        .iter()
                        .map(|&e| mps.kept[e])
                        .collect(),
                    faces: path.faces,
                    note: Some(note),
                }),
            )
        }
    }
}
