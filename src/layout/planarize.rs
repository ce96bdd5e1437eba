//! Planarisation: draw a nonplanar graph by inserting dummy vertices at
//! crossings.
//!
//! A greedy maximal planar subgraph is embedded first; every remaining edge
//! is then reinserted along a dual shortest path, splitting each crossed
//! edge with a fresh dummy subdivision vertex. The resulting graph is
//! planar by construction and is laid out straight-line or orthogonally.

use hashbrown::HashMap;
use log::debug;

use crate::dual::{dual_shortest_path, DualGraph};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, GraphBuilder, VertexId};
use crate::layout::{
    orthogonal_layout, planar_straight_line, BBox, EdgeRoute, LayoutArtifact, LayoutMode, Point,
};
use crate::mesh::build_half_edge_mesh;
use crate::planarity::{
    maximal_planar_subgraph, test_planarity, Planarity, PlanarityOptions, SelfLoops,
};

/// Geometry of the final drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanarizeMode {
    #[default]
    Straight,
    Orthogonal,
}

/// Result of a planarisation layout.
#[derive(Debug, Clone)]
pub struct PlanarizationResult {
    /// Original edge ids kept in the planar base.
    pub base_edges: Vec<EdgeId>,
    /// Original edge ids reinserted over the base.
    pub remaining_edges: Vec<EdgeId>,
    /// Self-loops excluded from the drawing.
    pub ignored_self_loops: Vec<EdgeId>,
    /// Layout over the original graph: positions for original vertices,
    /// one polyline per drawable edge (threaded through dummy positions).
    /// `crossings` counts the dummy vertices introduced.
    pub layout: LayoutArtifact,
}

/// One edge of the working (planarised) graph and the original edge it
/// belongs to.
#[derive(Debug, Clone, Copy)]
struct WorkingEdge {
    u: VertexId,
    v: VertexId,
    /// Original edge id this segment is a piece of.
    parent: EdgeId,
}

/// Lays out `g` by planarisation.
///
/// Fails with [`Error::PlanarizationFailed`] when a reinsertion finds no
/// dual path (for example on a disconnected base mesh); the compute
/// pipeline falls back to a raw relaxation layout in that case. Orthogonal
/// geometry may fail with [`Error::LayoutInfeasible`], which falls back to
/// straight-line in the pipeline as well.
///
/// # Example
/// ```rust
/// use planegraph::graph::Graph;
/// use planegraph::layout::{planarization_layout, PlanarizeMode};
///
/// let mut edges = Vec::new();
/// for u in 0..5 {
///     for v in u + 1..5 {
///         edges.push((u, v));
///     }
/// }
/// let k5 = Graph::from_edge_list(5, &edges).unwrap();
/// let result = planarization_layout(&k5, PlanarizeMode::Straight).unwrap();
/// // K5 needs exactly one crossing, realised as one dummy vertex.
/// assert_eq!(result.layout.crossings, 1);
/// assert_eq!(result.remaining_edges.len(), 1);
/// ```
pub fn planarization_layout(g: &Graph, mode: PlanarizeMode) -> Result<PlanarizationResult> {
    let opts = PlanarityOptions {
        treat_directed_as_undirected: true,
        self_loops: SelfLoops::Ignore,
    };
    let mps = maximal_planar_subgraph(g, opts)?;
    debug!(
        "planarization: {} kept, {} to reinsert",
        mps.kept.len(),
        mps.dropped.len()
    );

    let n = g.vertex_count();
    let mut working: Vec<WorkingEdge> = mps
        .kept
        .iter()
        .map(|&id| {
            let e = g.edge(id).expect("kept ids exist");
            WorkingEdge { u: e.u, v: e.v, parent: id }
        })
        .collect();
    let mut dummy_count = 0usize;

    for &missing in &mps.dropped {
        let e = g.edge(missing).expect("dropped ids exist");
        let crossed = route_on_working(n + dummy_count, &working, e.u, e.v)
            .ok_or_else(|| {
                Error::PlanarizationFailed(format!(
                    "no dual path to reinsert edge {missing} ({}-{})",
                    e.u, e.v
                ))
            })?;

        // Split every crossed working edge with a fresh dummy vertex and
        // thread the new edge through the dummies.
        let mut chain_from = e.u;
        for &ci in &crossed {
            let dummy = n + dummy_count;
            dummy_count += 1;
            let old = working[ci];
            working[ci] = WorkingEdge { u: old.u, v: dummy, parent: old.parent };
            working.push(WorkingEdge { u: dummy, v: old.v, parent: old.parent });
            working.push(WorkingEdge { u: chain_from, v: dummy, parent: missing });
            chain_from = dummy;
        }
        working.push(WorkingEdge { u: chain_from, v: e.v, parent: missing });
    }

    // The working graph is planar by construction; embed and lay it out.
    let total_vertices = n + dummy_count;
    let planarised = build_working_graph(total_vertices, &working)?;
    let report = test_planarity(&planarised, PlanarityOptions::default())?;
    let embedding = match report.outcome {
        Planarity::Planar { embedding } => embedding,
        Planarity::Nonplanar { .. } => {
            return Err(Error::internal("planarised graph is not planar"));
        }
    };
    let mesh = build_half_edge_mesh(&planarised, &embedding)?;
    let inner = match mode {
        PlanarizeMode::Straight => planar_straight_line(&mesh)?,
        PlanarizeMode::Orthogonal => orthogonal_layout(&mesh)?,
    };

    // Re-assemble per-original-edge routes through the dummies.
    let routes = assemble_routes(g, &working, &inner, &mps.ignored_self_loops);
    let positions: Vec<(VertexId, Point)> = inner
        .positions
        .iter()
        .filter(|&&(v, _)| v < n)
        .copied()
        .collect();
    let bbox = BBox::of(positions.iter().map(|&(_, p)| p));
    let layout = LayoutArtifact {
        mode: match mode {
            PlanarizeMode::Straight => LayoutMode::PlanarizationStraight,
            PlanarizeMode::Orthogonal => LayoutMode::PlanarizationOrthogonal,
        },
        crossings: dummy_count,
        bends: inner.bends,
        positions,
        edge_routes: routes,
        bbox,
    };

    Ok(PlanarizationResult {
        base_edges: mps.kept,
        remaining_edges: mps.dropped,
        ignored_self_loops: mps.ignored_self_loops,
        layout,
    })
}

fn build_working_graph(vertex_count: usize, working: &[WorkingEdge]) -> Result<Graph> {
    let mut b = GraphBuilder::with_capacity(vertex_count, working.len());
    for _ in 0..vertex_count {
        b.add_vertex(None);
    }
    for we in working {
        b.add_edge(we.u, we.v, false)?;
    }
    Ok(b.build())
}

/// Embeds the current working graph and routes `u -> v` over its dual.
/// Returns the indices into `working` of the crossed edges, in path order.
fn route_on_working(
    vertex_count: usize,
    working: &[WorkingEdge],
    u: VertexId,
    v: VertexId,
) -> Option<Vec<usize>> {
    let g = build_working_graph(vertex_count, working).ok()?;
    let report = test_planarity(&g, PlanarityOptions::default()).ok()?;
    let embedding = report.embedding()?;
    let mesh = build_half_edge_mesh(&g, embedding).ok()?;
    let dual = DualGraph::from_mesh(&mesh);
    let starts = mesh.faces_at(u);
    let goals = mesh.faces_at(v);
    let path = dual_shortest_path(&dual, &starts, &goals, |_| 1.0)?;
    Some(path.primal_edges)
}

/// Concatenates the working-segment polylines of each original edge into
/// one route from its `u` to its `v`.
fn assemble_routes(
    g: &Graph,
    working: &[WorkingEdge],
    inner: &LayoutArtifact,
    ignored: &[EdgeId],
) -> Vec<EdgeRoute> {
    // Working edge i produced inner.edge_routes[i] (layouts emit routes in
    // edge order).
    let mut segments_of: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    for (i, we) in working.iter().enumerate() {
        segments_of.entry(we.parent).or_default().push(i);
    }

    let mut routes = Vec::new();
    for e in g.edges() {
        if ignored.contains(&e.id) {
            continue;
        }
        let Some(segs) = segments_of.get(&e.id) else {
            continue;
        };
        // Walk the chain from u to v over the segment endpoints; segments
        // form a simple path threaded through the dummies.
        let mut adj: HashMap<VertexId, Vec<usize>> = HashMap::new();
        for &i in segs {
            adj.entry(working[i].u).or_default().push(i);
            adj.entry(working[i].v).or_default().push(i);
        }
        let mut used: hashbrown::HashSet<usize> = hashbrown::HashSet::new();
        let mut points: Vec<Point> = vec![position_of(inner, e.u)];
        let mut cur = e.u;
        while used.len() < segs.len() {
            let next = adj
                .get(&cur)
                .and_then(|list| list.iter().find(|i| !used.contains(*i)));
            let Some(&i) = next else { break };
            used.insert(i);
            let we = working[i];
            let other = if we.u == cur { we.v } else { we.u };
            let mut piece = inner.edge_routes[i].points.clone();
            if we.u != cur {
                piece.reverse();
            }
            // Skip the junction point already present.
            points.extend(piece.into_iter().skip(1));
            cur = other;
        }
        routes.push(EdgeRoute { edge: (e.u, e.v), points });
    }
    routes
}

fn position_of(inner: &LayoutArtifact, v: VertexId) -> Point {
    inner
        .positions
        .iter()
        .find(|&&(w, _)| w == v)
        .map(|&(_, p)| p)
        .unwrap_or(Point::new(0.0, 0.0))
}
