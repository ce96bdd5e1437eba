//! Planarity testing with embedding or witness production.
//!
//! [`test_planarity`] decides planarity of an undirected graph using the
//! left-right criterion and returns either a rotation system (a
//! combinatorial embedding) or a Kuratowski witness. Multi-edges are
//! collapsed for the test and re-expanded into the rotation with their
//! multiplicity preserved; self-loops and directed edges are sanitised
//! according to [`PlanarityOptions`].

mod lr;
mod witness;

pub use witness::{KuratowskiWitness, WitnessKind};

use hashbrown::HashMap;
use log::debug;

use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, GraphBuilder, VertexId};
use crate::mesh::{RotationRef, RotationSystem};

use lr::{lr_planarity, LrOutcome};

/// What to do with self-loops in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfLoops {
    /// Fail with [`Error::BadInput`] on the first self-loop.
    #[default]
    Reject,
    /// Strip self-loops before the test, recording their ids in the meta.
    Ignore,
}

/// Options for [`test_planarity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarityOptions {
    /// Treat directed edges as undirected instead of failing.
    pub treat_directed_as_undirected: bool,
    pub self_loops: SelfLoops,
}

/// How the input was sanitised before the test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanarityMeta {
    /// Self-loop edge ids stripped under [`SelfLoops::Ignore`].
    pub ignored_self_loops: Vec<EdgeId>,
    /// Whether directed edges were coerced to undirected.
    pub treated_directed_as_undirected: bool,
}

/// The outcome of a planarity test.
#[derive(Debug, Clone)]
pub enum Planarity {
    Planar {
        /// A rotation system of the (sanitised) input graph.
        embedding: RotationSystem,
    },
    Nonplanar {
        witness: KuratowskiWitness,
    },
}

/// Outcome plus sanitisation meta.
#[derive(Debug, Clone)]
pub struct PlanarityReport {
    pub outcome: Planarity,
    pub meta: PlanarityMeta,
}

impl PlanarityReport {
    pub fn is_planar(&self) -> bool {
        matches!(self.outcome, Planarity::Planar { .. })
    }

    /// The embedding, if the graph is planar.
    pub fn embedding(&self) -> Option<&RotationSystem> {
        match &self.outcome {
            Planarity::Planar { embedding } => Some(embedding),
            Planarity::Nonplanar { .. } => None,
        }
    }

    /// The witness, if the graph is nonplanar.
    pub fn witness(&self) -> Option<&KuratowskiWitness> {
        match &self.outcome {
            Planarity::Planar { .. } => None,
            Planarity::Nonplanar { witness } => Some(witness),
        }
    }
}

/// The collapsed simple view the left-right check runs on.
struct SimpleView {
    /// Representative `(u, v)` per simple edge, in first-occurrence order.
    edges: Vec<(VertexId, VertexId)>,
    /// Original edge id of each representative.
    rep_ids: Vec<EdgeId>,
    /// All original edge ids per unordered endpoint pair, insertion order.
    bundles: HashMap<(VertexId, VertexId), Vec<EdgeId>>,
    meta: PlanarityMeta,
}

fn sanitise(g: &Graph, opts: PlanarityOptions) -> Result<SimpleView> {
    if g.has_directed_edges() && !opts.treat_directed_as_undirected {
        return Err(Error::bad_input(
            "graph has directed edges; set treat_directed_as_undirected to coerce them",
        ));
    }
    let mut view = SimpleView {
        edges: Vec::new(),
        rep_ids: Vec::new(),
        bundles: HashMap::new(),
        meta: PlanarityMeta {
            ignored_self_loops: Vec::new(),
            treated_directed_as_undirected: g.has_directed_edges(),
        },
    };
    for e in g.edges() {
        if e.is_self_loop() {
            match opts.self_loops {
                SelfLoops::Reject => {
                    return Err(Error::bad_input(format!(
                        "self-loop at vertex {} (edge {})",
                        e.u, e.id
                    )));
                }
                SelfLoops::Ignore => {
                    view.meta.ignored_self_loops.push(e.id);
                    continue;
                }
            }
        }
        let key = (e.u.min(e.v), e.u.max(e.v));
        let bundle = view.bundles.entry(key).or_default();
        if bundle.is_empty() {
            view.edges.push((e.u, e.v));
            view.rep_ids.push(e.id);
        }
        bundle.push(e.id);
    }
    Ok(view)
}

/// Tests planarity of `g`, producing a rotation system or a Kuratowski
/// witness.
///
/// The empty graph is trivially planar with an empty embedding; isolated
/// vertices get empty rotation lists; parallel edges appear in the rotation
/// with their multiplicity, consecutively and in insertion order.
///
/// # Complexity
/// The test itself is near-linear; witness extraction re-runs the check
/// once per candidate edge.
///
/// # Examples
/// ```rust
/// use planegraph::graph::Graph;
/// use planegraph::mesh::build_half_edge_mesh;
/// use planegraph::planarity::{test_planarity, PlanarityOptions};
///
/// let g = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]).unwrap();
/// let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
/// let mesh = build_half_edge_mesh(&g, report.embedding().unwrap()).unwrap();
/// assert_eq!(mesh.face_count(), 3);
/// ```
///
/// A nonplanar input yields a witness instead:
///
/// ```rust
/// use planegraph::graph::Graph;
/// use planegraph::planarity::{test_planarity, PlanarityOptions, WitnessKind};
///
/// let mut edges = Vec::new();
/// for u in 0..5 {
///     for v in u + 1..5 {
///         edges.push((u, v));
///     }
/// }
/// let k5 = Graph::from_edge_list(5, &edges).unwrap();
/// let report = test_planarity(&k5, PlanarityOptions::default()).unwrap();
/// let witness = report.witness().unwrap();
/// assert_eq!(witness.kind, WitnessKind::K5);
/// assert_eq!(witness.edges.len(), 10);
/// ```
pub fn test_planarity(g: &Graph, opts: PlanarityOptions) -> Result<PlanarityReport> {
    let view = sanitise(g, opts)?;
    let n = g.vertex_count();

    // Dense-graph early exit: planarity is impossible beyond 3n - 6 edges,
    // so skip the conflict-pair machinery entirely.
    if n >= 3 && view.edges.len() > 3 * n - 6 {
        debug!(
            "planarity early-exit: {} simple edges > 3*{} - 6",
            view.edges.len(),
            n
        );
        let witness = witness::extract_witness(n, &view.edges, &view.rep_ids);
        return Ok(PlanarityReport {
            outcome: Planarity::Nonplanar { witness },
            meta: view.meta,
        });
    }

    match lr_planarity(n, &view.edges, true) {
        LrOutcome::Planar(rotation) => {
            let rotation = rotation.expect("embedding was requested");
            let embedding = expand_rotation(g, &view, &rotation);
            Ok(PlanarityReport {
                outcome: Planarity::Planar { embedding },
                meta: view.meta,
            })
        }
        LrOutcome::Nonplanar => {
            let witness = witness::extract_witness(n, &view.edges, &view.rep_ids);
            Ok(PlanarityReport {
                outcome: Planarity::Nonplanar { witness },
                meta: view.meta,
            })
        }
    }
}

/// Decides planarity without building an embedding or witness.
pub fn is_planar(g: &Graph, opts: PlanarityOptions) -> Result<bool> {
    let view = sanitise(g, opts)?;
    let n = g.vertex_count();
    if n >= 3 && view.edges.len() > 3 * n - 6 {
        return Ok(false);
    }
    Ok(matches!(
        lr_planarity(n, &view.edges, false),
        LrOutcome::Planar(_)
    ))
}

/// Translates the simple-view rotation back to `{edge, to}` references,
/// expanding each representative to its bundle of parallel copies.
///
/// Parallel copies must nest: the bundle appears in insertion order at its
/// lower endpoint and reversed at the higher one, so each copy closes a
/// two-sided face with its neighbour.
fn expand_rotation(g: &Graph, view: &SimpleView, rotation: &[Vec<usize>]) -> RotationSystem {
    let mut out: RotationSystem = Vec::with_capacity(g.vertex_count());
    for (v, order) in rotation.iter().enumerate() {
        let mut refs = Vec::with_capacity(g.degree(v));
        for &w in order {
            let key = (v.min(w), v.max(w));
            let bundle = view
                .bundles
                .get(&key)
                .expect("rotation neighbours come from graph edges");
            if v == key.0 {
                for &id in bundle {
                    refs.push(RotationRef { edge: id, to: w });
                }
            } else {
                for &id in bundle.iter().rev() {
                    refs.push(RotationRef { edge: id, to: w });
                }
            }
        }
        out.push(refs);
    }
    out
}

/// A greedy maximal planar subgraph.
#[derive(Debug, Clone)]
pub struct MaximalPlanarSubgraph {
    /// The planar subgraph, with the original vertex set and re-numbered
    /// edges.
    pub graph: Graph,
    /// Original edge ids kept, in id order (`edge_map[new_id] = original`).
    pub kept: Vec<EdgeId>,
    /// Original edge ids dropped because adding them broke planarity.
    pub dropped: Vec<EdgeId>,
    /// Self-loops stripped before the search.
    pub ignored_self_loops: Vec<EdgeId>,
}

/// Builds a maximal planar subgraph greedily: edges are added in id order
/// and an edge is skipped iff adding it would break planarity of the set so
/// far.
///
/// Greedy maximality is not maximum cardinality; the result depends only on
/// edge ids, never on float arithmetic, so it is deterministic.
pub fn maximal_planar_subgraph(
    g: &Graph,
    opts: PlanarityOptions,
) -> Result<MaximalPlanarSubgraph> {
    let view = sanitise(g, opts)?;
    let n = g.vertex_count();

    // Work on simple representatives; parallel copies of a kept edge can
    // always be embedded alongside it and never break planarity.
    let mut kept_simple: Vec<(VertexId, VertexId)> = Vec::new();
    let mut kept_rep = vec![false; view.edges.len()];
    for (i, &(u, v)) in view.edges.iter().enumerate() {
        kept_simple.push((u, v));
        let planar = if n >= 3 && kept_simple.len() > 3 * n - 6 {
            false
        } else {
            matches!(lr_planarity(n, &kept_simple, false), LrOutcome::Planar(_))
        };
        if planar {
            kept_rep[i] = true;
        } else {
            kept_simple.pop();
        }
    }

    let mut kept: Vec<EdgeId> = Vec::new();
    let mut dropped: Vec<EdgeId> = Vec::new();
    for (i, &(u, v)) in view.edges.iter().enumerate() {
        let key = (u.min(v), u.max(v));
        let bundle = &view.bundles[&key];
        if kept_rep[i] {
            kept.extend(bundle.iter().copied());
        } else {
            dropped.extend(bundle.iter().copied());
        }
    }
    kept.sort_unstable();
    dropped.sort_unstable();

    let mut b = GraphBuilder::with_capacity(n, kept.len());
    for v in 0..n {
        b.add_vertex(g.label(v).cloned());
    }
    for &id in &kept {
        let e = g.edge(id).expect("kept ids come from the graph");
        b.add_edge(e.u, e.v, false)?;
    }

    Ok(MaximalPlanarSubgraph {
        graph: b.build(),
        kept,
        dropped,
        ignored_self_loops: view.meta.ignored_self_loops,
    })
}
