//! Biconnected components, articulation points and bridges.

use fixedbitset::FixedBitSet;

use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, VertexId};

/// What to do with self-loops in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfLoopPolicy {
    /// Fail with [`Error::BadInput`] on the first self-loop.
    #[default]
    Reject,
    /// Keep self-loops out of the DFS; each becomes its own single-edge
    /// block.
    Ignore,
}

/// Options for [`biconnected_components`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BccOptions {
    /// Treat directed edges as undirected instead of failing.
    pub treat_directed_as_undirected: bool,
    pub self_loops: SelfLoopPolicy,
}

/// A biconnected decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bcc {
    /// The blocks, each the set of its edge ids in emission order.
    pub blocks: Vec<Vec<EdgeId>>,
    /// Articulation vertices, ascending.
    pub articulation_points: Vec<VertexId>,
    /// Bridge edges, ascending.
    pub bridges: Vec<EdgeId>,
    /// `edge_to_block[e]` is the index into `blocks` of the block owning `e`.
    pub edge_to_block: Vec<usize>,
}

struct Frame {
    v: VertexId,
    parent_edge: Option<EdgeId>,
    iter: usize,
    tree_children: usize,
}

/// Computes the biconnected components of `g` with an iterative DFS
/// maintaining discovery times, low values and an edge stack.
///
/// A block is emitted whenever a finished child `v` of `u` satisfies
/// `low[v] >= disc[u]`. Every edge belongs to exactly one block; a
/// self-loop (under [`SelfLoopPolicy::Ignore`]) forms its own single-edge
/// block. Directed edges fail with [`Error::BadInput`] unless
/// `treat_directed_as_undirected` is set.
///
/// # Complexity
/// * Time complexity: **O(|V| + |E|)**.
/// * Auxiliary space: **O(|V| + |E|)**.
///
/// # Example
/// ```rust
/// use planegraph::algo::{biconnected_components, BccOptions};
/// use planegraph::graph::Graph;
///
/// // Two triangles sharing vertex 2.
/// let g = Graph::from_edge_list(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]).unwrap();
/// let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
/// assert_eq!(bcc.blocks.len(), 2);
/// assert_eq!(bcc.articulation_points, vec![2]);
/// assert!(bcc.bridges.is_empty());
/// ```
pub fn biconnected_components(g: &Graph, opts: BccOptions) -> Result<Bcc> {
    if !opts.treat_directed_as_undirected && g.has_directed_edges() {
        return Err(Error::bad_input(
            "graph has directed edges; set treat_directed_as_undirected to coerce them",
        ));
    }

    let n = g.vertex_count();
    let m = g.edge_count();
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![usize::MAX; n];
    let mut time = 0usize;

    let mut blocks: Vec<Vec<EdgeId>> = Vec::new();
    let mut edge_to_block = vec![usize::MAX; m];
    let mut articulation = FixedBitSet::with_capacity(n);
    let mut bridges: Vec<EdgeId> = Vec::new();

    // Self-loops are kept out of the traversal entirely.
    for e in g.edges() {
        if e.is_self_loop() {
            match opts.self_loops {
                SelfLoopPolicy::Reject => {
                    return Err(Error::bad_input(format!(
                        "self-loop at vertex {} (edge {})",
                        e.u, e.id
                    )));
                }
                SelfLoopPolicy::Ignore => {
                    edge_to_block[e.id] = blocks.len();
                    blocks.push(vec![e.id]);
                }
            }
        }
    }

    // An edge enters the stack exactly once: as a tree edge, or as a back
    // edge from its deeper endpoint.
    let mut edge_stack: Vec<EdgeId> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        disc[root] = time;
        low[root] = time;
        time += 1;
        frames.push(Frame { v: root, parent_edge: None, iter: 0, tree_children: 0 });

        while let Some(frame) = frames.last_mut() {
            let v = frame.v;
            let mut descended = false;
            while frame.iter < g.adjacency(v).len() {
                let inc = g.adjacency(v)[frame.iter];
                frame.iter += 1;
                if inc.to == v {
                    continue; // self-loop record, handled above
                }
                if Some(inc.edge) == frame.parent_edge {
                    continue;
                }
                let w = inc.to;
                if disc[w] == usize::MAX {
                    // Tree edge.
                    disc[w] = time;
                    low[w] = time;
                    time += 1;
                    edge_stack.push(inc.edge);
                    frame.tree_children += 1;
                    frames.push(Frame {
                        v: w,
                        parent_edge: Some(inc.edge),
                        iter: 0,
                        tree_children: 0,
                    });
                    descended = true;
                    break;
                } else if disc[w] < disc[v] {
                    // Back edge to an ancestor, or a parallel of the parent
                    // edge (which is what makes a doubled edge 2-connected).
                    // The record at the shallower endpoint is skipped, so
                    // each edge enters the stack exactly once.
                    edge_stack.push(inc.edge);
                    low[v] = low[v].min(disc[w]);
                }
            }
            if descended {
                continue;
            }

            let finished = frames.pop().expect("frame stack is non-empty");
            let v = finished.v;
            if let Some(parent_frame) = frames.last() {
                let u = parent_frame.v;
                let pe = finished.parent_edge.expect("non-root frame has a parent edge");
                low[u] = low[u].min(low[v]);
                if low[v] >= disc[u] {
                    // u separates the subtree under v: pop one block.
                    if parent_frame.parent_edge.is_some() || parent_frame.tree_children > 1 {
                        articulation.insert(u);
                    }
                    let mut block = Vec::new();
                    loop {
                        let e = edge_stack.pop().expect("block edges are on the stack");
                        edge_to_block[e] = blocks.len();
                        block.push(e);
                        if e == pe {
                            break;
                        }
                    }
                    block.reverse();
                    if block.len() == 1 && low[v] > disc[u] {
                        bridges.push(pe);
                    }
                    blocks.push(block);
                }
            }
        }
    }
    debug_assert!(edge_stack.is_empty());

    let mut articulation_points: Vec<VertexId> = articulation.ones().collect();
    articulation_points.sort_unstable();
    bridges.sort_unstable();
    Ok(Bcc {
        blocks,
        articulation_points,
        bridges,
        edge_to_block,
    })
}

/// Whether the whole graph is a single biconnected block (no articulation
/// point, connected, at least one edge).
pub fn is_biconnected(g: &Graph) -> Result<bool> {
    if g.vertex_count() < 2 {
        return Ok(false);
    }
    let bcc = biconnected_components(
        g,
        BccOptions { treat_directed_as_undirected: true, self_loops: SelfLoopPolicy::Ignore },
    )?;
    let (components, _) = super::connected_components(g);
    Ok(components == 1 && bcc.blocks.len() == 1)
}
