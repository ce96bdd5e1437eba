//! SPQR decomposition by iterative split-pair search.
//!
//! A biconnected multigraph decomposes into skeleton components linked by
//! virtual edges: series cycles (S), parallel bundles (P), rigid
//! triconnected cores (R) and single real edges (Q). The decomposition here
//! repeatedly splits components at parallel pairs or separation pairs until
//! every component classifies; the search is quadratic-ish but depends only
//! on ids, never on geometry.

use hashbrown::HashMap;

use crate::algo::biconnected::{biconnected_components, BccOptions, SelfLoopPolicy};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, GraphBuilder, VertexId};

/// The four skeleton kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpqrKind {
    /// Series cycle.
    S,
    /// Parallel bundle between two poles.
    P,
    /// Rigid triconnected core.
    R,
    /// A single real edge.
    Q,
}

/// A skeleton edge: a real edge of the input or a virtual edge shared with
/// exactly one other skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonEdge {
    Real(EdgeId),
    Virtual(usize),
}

/// One edge of a skeleton with its endpoints in the input graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonEdgeRecord {
    pub u: VertexId,
    pub v: VertexId,
    pub kind: SkeletonEdge,
}

/// One SPQR node: a skeleton graph over input vertex ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpqrNode {
    pub kind: SpqrKind,
    pub edges: Vec<SkeletonEdgeRecord>,
    /// Distinct endpoints, ascending.
    pub vertices: Vec<VertexId>,
}

/// How two tree nodes are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeLink {
    /// The two nodes carry the same virtual id.
    Virtual(usize),
    /// A `Q` leaf hangs off the node owning this real edge.
    Real(EdgeId),
}

/// An edge of the SPQR tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpqrTreeEdge {
    pub a: usize,
    pub b: usize,
    pub link: TreeLink,
}

/// The SPQR tree of one biconnected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpqrTree {
    pub nodes: Vec<SpqrNode>,
    pub tree_edges: Vec<SpqrTreeEdge>,
}

impl SpqrTree {
    /// Node counts by kind `(S, P, R, Q)`.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut c = (0, 0, 0, 0);
        for n in &self.nodes {
            match n.kind {
                SpqrKind::S => c.0 += 1,
                SpqrKind::P => c.1 += 1,
                SpqrKind::R => c.2 += 1,
                SpqrKind::Q => c.3 += 1,
            }
        }
        c
    }
}

/// A forest of SPQR trees, one per biconnected block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpqrForest {
    pub trees: Vec<SpqrTree>,
    pub articulation_points: Vec<VertexId>,
}

type Component = Vec<SkeletonEdgeRecord>;

fn component_vertices(comp: &Component) -> Vec<VertexId> {
    let mut vs: Vec<VertexId> = comp.iter().flat_map(|e| [e.u, e.v]).collect();
    vs.sort_unstable();
    vs.dedup();
    vs
}

fn is_cycle(comp: &Component) -> bool {
    let vs = component_vertices(comp);
    if vs.len() != comp.len() || vs.len() < 3 {
        return false;
    }
    let mut degree: HashMap<VertexId, usize> = HashMap::new();
    for e in comp {
        *degree.entry(e.u).or_insert(0) += 1;
        *degree.entry(e.v).or_insert(0) += 1;
    }
    degree.values().all(|&d| d == 2)
}

/// Finds two parallel edges, by edge position; smallest pair wins.
fn find_parallel_pair(comp: &Component) -> Option<(VertexId, VertexId)> {
    let mut seen: HashMap<(VertexId, VertexId), ()> = HashMap::new();
    for e in comp {
        let key = (e.u.min(e.v), e.u.max(e.v));
        if seen.insert(key, ()).is_some() {
            return Some(key);
        }
    }
    None
}

/// Finds a separation pair `(u, v)` whose removal disconnects the rest of
/// the component, trying pairs in ascending order.
fn find_separation_pair(comp: &Component) -> Option<(VertexId, VertexId)> {
    let vs = component_vertices(comp);
    if vs.len() < 4 {
        return None;
    }
    for (i, &u) in vs.iter().enumerate() {
        for &v in &vs[i + 1..] {
            if side_count(comp, u, v) >= 2 {
                return Some((u, v));
            }
        }
    }
    None
}

/// Number of connected components among the vertices other than `u`, `v`,
/// ignoring edges incident to either pole.
fn side_count(comp: &Component, u: VertexId, v: VertexId) -> usize {
    let vs = component_vertices(comp);
    let rest: Vec<VertexId> = vs.into_iter().filter(|&x| x != u && x != v).collect();
    if rest.is_empty() {
        return 0;
    }
    let index: HashMap<VertexId, usize> =
        rest.iter().enumerate().map(|(i, &x)| (x, i)).collect();
    let mut dsu: Vec<usize> = (0..rest.len()).collect();
    fn find(dsu: &mut Vec<usize>, x: usize) -> usize {
        let mut r = x;
        while dsu[r] != r {
            r = dsu[r];
        }
        let mut c = x;
        while dsu[c] != c {
            let n = dsu[c];
            dsu[c] = r;
            c = n;
        }
        r
    }
    for e in comp {
        if let (Some(&a), Some(&b)) = (index.get(&e.u), index.get(&e.v)) {
            let (ra, rb) = (find(&mut dsu, a), find(&mut dsu, b));
            if ra != rb {
                dsu[ra] = rb;
            }
        }
    }
    let mut roots: Vec<usize> = (0..rest.len()).map(|x| find(&mut dsu, x)).collect();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}

/// Partitions a component at the pair `(u, v)` into its sides (ordered by
/// smallest member vertex, edges in component order) and its direct `uv`
/// edges.
fn split_at(
    comp: &Component,
    u: VertexId,
    v: VertexId,
) -> (Vec<Component>, Component) {
    let vs = component_vertices(comp);
    let rest: Vec<VertexId> = vs.into_iter().filter(|&x| x != u && x != v).collect();
    let index: HashMap<VertexId, usize> =
        rest.iter().enumerate().map(|(i, &x)| (x, i)).collect();
    let mut dsu: Vec<usize> = (0..rest.len()).collect();
    fn find(dsu: &mut Vec<usize>, x: usize) -> usize {
        let mut r = x;
        while dsu[r] != r {
            r = dsu[r];
        }
        let mut c = x;
        while dsu[c] != c {
            let n = dsu[c];
            dsu[c] = r;
            c = n;
        }
        r
    }
    let mut directs: Component = Vec::new();
    for e in comp {
        match (index.get(&e.u), index.get(&e.v)) {
            (Some(&a), Some(&b)) => {
                let (ra, rb) = (find(&mut dsu, a), find(&mut dsu, b));
                if ra != rb {
                    dsu[ra] = rb;
                }
            }
            (None, None) => directs.push(*e),
            _ => {}
        }
    }
    // Group the remaining edges by the side of their non-pole endpoint.
    let mut side_of_root: HashMap<usize, usize> = HashMap::new();
    let mut sides: Vec<Component> = Vec::new();
    for e in comp {
        let anchor = if index.contains_key(&e.u) {
            e.u
        } else if index.contains_key(&e.v) {
            e.v
        } else {
            continue; // direct edge
        };
        let root = find(&mut dsu, index[&anchor]);
        let side = *side_of_root.entry(root).or_insert_with(|| {
            sides.push(Vec::new());
            sides.len() - 1
        });
        sides[side].push(*e);
    }
    (sides, directs)
}

/// Decomposes a biconnected multigraph into its SPQR tree.
///
/// # Errors
/// [`Error::BadInput`] when the graph has directed edges, self-loops, or is
/// not biconnected.
///
/// # Example
/// ```rust
/// use planegraph::graph::Graph;
/// use planegraph::spqr::spqr_decompose;
///
/// // A 4-cycle with one chord: the chord bundles with two series paths
/// // behind a parallel node.
/// let g = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]).unwrap();
/// let tree = spqr_decompose(&g).unwrap();
/// let (s, p, r, q) = tree.counts();
/// assert_eq!((s, p, r, q), (2, 1, 0, 5));
/// assert_eq!(tree.tree_edges.len(), tree.nodes.len() - 1);
/// ```
pub fn spqr_decompose(g: &Graph) -> Result<SpqrTree> {
    if g.has_directed_edges() {
        return Err(Error::bad_input("SPQR decomposition requires undirected edges"));
    }
    if g.has_self_loops() {
        return Err(Error::bad_input("SPQR decomposition rejects self-loops"));
    }
    if g.edge_count() == 0 {
        return Err(Error::bad_input("SPQR decomposition requires at least one edge"));
    }
    if g.edge_count() > 1 && !crate::algo::biconnected::is_biconnected(g)? {
        return Err(Error::bad_input("SPQR decomposition requires a biconnected graph"));
    }

    let initial: Component = g
        .edges()
        .iter()
        .map(|e| SkeletonEdgeRecord { u: e.u, v: e.v, kind: SkeletonEdge::Real(e.id) })
        .collect();

    let mut next_virtual = 0usize;
    let mut worklist: std::collections::VecDeque<Component> = std::collections::VecDeque::new();
    worklist.push_back(initial);
    let mut terminal: Vec<Component> = Vec::new();

    while let Some(comp) = worklist.pop_front() {
        let vs = component_vertices(&comp);
        // Terminal shapes first: single edges, bundles and pure cycles are
        // never split further.
        if comp.len() == 1 || vs.len() == 2 || is_cycle(&comp) {
            terminal.push(comp);
            continue;
        }
        let pair = find_parallel_pair(&comp).or_else(|| find_separation_pair(&comp));
        let Some((u, v)) = pair else {
            // Rigid: no split pair.
            terminal.push(comp);
            continue;
        };
        let (sides, directs) = split_at(&comp, u, v);
        if directs.is_empty() && sides.len() == 2 {
            let vid = next_virtual;
            next_virtual += 1;
            for side in sides {
                let mut piece = side;
                piece.push(SkeletonEdgeRecord { u, v, kind: SkeletonEdge::Virtual(vid) });
                worklist.push_back(piece);
            }
        } else {
            // At least three pieces (or a direct bundle): aggregate them
            // behind a P component, one fresh virtual id per side.
            let mut aggregator: Component = directs;
            for side in sides {
                let vid = next_virtual;
                next_virtual += 1;
                aggregator.push(SkeletonEdgeRecord { u, v, kind: SkeletonEdge::Virtual(vid) });
                let mut piece = side;
                piece.push(SkeletonEdgeRecord { u, v, kind: SkeletonEdge::Virtual(vid) });
                worklist.push_back(piece);
            }
            worklist.push_back(aggregator);
        }
    }

    let tree = build_tree(terminal);
    validate_tree(&tree)?;
    Ok(tree)
}

fn classify(comp: &Component) -> SpqrKind {
    let vs = component_vertices(comp);
    if comp.len() == 1 && matches!(comp[0].kind, SkeletonEdge::Real(_)) {
        SpqrKind::Q
    } else if vs.len() == 2 && comp.len() >= 2 {
        SpqrKind::P
    } else if is_cycle(comp) {
        SpqrKind::S
    } else {
        SpqrKind::R
    }
}

fn build_tree(terminal: Vec<Component>) -> SpqrTree {
    let mut nodes: Vec<SpqrNode> = terminal
        .into_iter()
        .map(|comp| {
            let vertices = component_vertices(&comp);
            SpqrNode { kind: classify(&comp), edges: comp, vertices }
        })
        .collect();

    let mut tree_edges: Vec<SpqrTreeEdge> = Vec::new();

    // Virtual ids pair the two skeletons that carry them.
    let mut owners: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        for e in &node.edges {
            if let SkeletonEdge::Virtual(vid) = e.kind {
                owners.entry(vid).or_default().push(i);
            }
        }
    }
    let mut vids: Vec<usize> = owners.keys().copied().collect();
    vids.sort_unstable();
    for vid in vids {
        let pair = &owners[&vid];
        if pair.len() == 2 {
            tree_edges.push(SpqrTreeEdge { a: pair[0], b: pair[1], link: TreeLink::Virtual(vid) });
        }
    }

    // Real edges of non-Q skeletons spawn Q leaves.
    let mut q_leaves: Vec<(SpqrNode, usize, EdgeId)> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if node.kind == SpqrKind::Q {
            continue;
        }
        for e in &node.edges {
            if let SkeletonEdge::Real(id) = e.kind {
                let leaf = SpqrNode {
                    kind: SpqrKind::Q,
                    edges: vec![*e],
                    vertices: {
                        let mut vs = vec![e.u, e.v];
                        vs.sort_unstable();
                        vs
                    },
                };
                q_leaves.push((leaf, i, id));
            }
        }
    }
    for (leaf, owner, id) in q_leaves {
        let leaf_idx = nodes.len();
        nodes.push(leaf);
        tree_edges.push(SpqrTreeEdge { a: owner, b: leaf_idx, link: TreeLink::Real(id) });
    }

    SpqrTree { nodes, tree_edges }
}

/// Structural validation: tree shape, virtual pairing, per-kind
/// constraints, and rigidity of R nodes.
fn validate_tree(tree: &SpqrTree) -> Result<()> {
    let n = tree.nodes.len();
    if n == 0 {
        return Err(Error::internal("SPQR tree has no nodes"));
    }
    if tree.tree_edges.len() != n - 1 {
        return Err(Error::internal(format!(
            "SPQR tree has {} edges for {n} nodes",
            tree.tree_edges.len()
        )));
    }
    // Connectivity.
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for te in &tree.tree_edges {
        adj[te.a].push(te.b);
        adj[te.b].push(te.a);
    }
    let mut seen = vec![false; n];
    let mut stack = vec![0usize];
    seen[0] = true;
    let mut reached = 1;
    while let Some(x) = stack.pop() {
        for &y in &adj[x] {
            if !seen[y] {
                seen[y] = true;
                reached += 1;
                stack.push(y);
            }
        }
    }
    if reached != n {
        return Err(Error::internal("SPQR tree is not connected"));
    }
    // Virtual ids appear exactly twice.
    let mut virtual_uses: HashMap<usize, usize> = HashMap::new();
    for node in &tree.nodes {
        for e in &node.edges {
            if let SkeletonEdge::Virtual(vid) = e.kind {
                *virtual_uses.entry(vid).or_insert(0) += 1;
            }
        }
    }
    if virtual_uses.values().any(|&c| c != 2) {
        return Err(Error::internal("a virtual id does not appear exactly twice"));
    }
    // Per-kind constraints.
    for node in &tree.nodes {
        match node.kind {
            SpqrKind::Q => {
                if node.edges.len() != 1 {
                    return Err(Error::internal("Q node with more than one edge"));
                }
            }
            SpqrKind::P => {
                if node.vertices.len() != 2 || node.edges.len() < 2 {
                    return Err(Error::internal("malformed P node"));
                }
            }
            SpqrKind::S => {
                if !is_cycle(&node.edges) {
                    return Err(Error::internal("S node is not a cycle"));
                }
            }
            SpqrKind::R => {
                if find_parallel_pair(&node.edges).is_some()
                    || find_separation_pair(&node.edges).is_some()
                {
                    return Err(Error::internal("R node still has a split pair"));
                }
            }
        }
    }
    Ok(())
}

/// Sanitisation options shared by the safe/forest entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpqrOptions {
    pub treat_directed_as_undirected: bool,
    /// Strip self-loops instead of failing.
    pub ignore_self_loops: bool,
}

/// Extracts the subgraph of one block with compacted vertex ids.
///
/// Returns the block graph, `vertex_map[new] = original` and
/// `edge_map[new] = original`.
fn block_subgraph(g: &Graph, block: &[EdgeId]) -> Result<(Graph, Vec<VertexId>, Vec<EdgeId>)> {
    let mut vertex_map: Vec<VertexId> = Vec::new();
    let mut inverse: HashMap<VertexId, usize> = HashMap::new();
    for &e in block {
        let edge = g.edge(e).expect("block edges exist");
        for v in [edge.u, edge.v] {
            inverse.entry(v).or_insert_with(|| {
                vertex_map.push(v);
                vertex_map.len() - 1
            });
        }
    }
    let mut b = GraphBuilder::with_capacity(vertex_map.len(), block.len());
    for _ in 0..vertex_map.len() {
        b.add_vertex(None);
    }
    let mut edge_map = Vec::with_capacity(block.len());
    for &e in block {
        let edge = g.edge(e).expect("block edges exist");
        b.add_edge(inverse[&edge.u], inverse[&edge.v], false)?;
        edge_map.push(e);
    }
    Ok((b.build(), vertex_map, edge_map))
}

fn remap_tree(tree: SpqrTree, vertex_map: &[VertexId], edge_map: &[EdgeId]) -> SpqrTree {
    let map_edge = |e: &SkeletonEdgeRecord| SkeletonEdgeRecord {
        u: vertex_map[e.u],
        v: vertex_map[e.v],
        kind: match e.kind {
            SkeletonEdge::Real(id) => SkeletonEdge::Real(edge_map[id]),
            SkeletonEdge::Virtual(vid) => SkeletonEdge::Virtual(vid),
        },
    };
    let nodes = tree
        .nodes
        .iter()
        .map(|node| {
            let edges: Vec<SkeletonEdgeRecord> = node.edges.iter().map(map_edge).collect();
            let mut vertices: Vec<VertexId> =
                node.vertices.iter().map(|&v| vertex_map[v]).collect();
            vertices.sort_unstable();
            SpqrNode { kind: node.kind, edges, vertices }
        })
        .collect();
    let tree_edges = tree
        .tree_edges
        .iter()
        .map(|te| SpqrTreeEdge {
            a: te.a,
            b: te.b,
            link: match te.link {
                TreeLink::Real(id) => TreeLink::Real(edge_map[id]),
                TreeLink::Virtual(vid) => TreeLink::Virtual(vid),
            },
        })
        .collect();
    SpqrTree { nodes, tree_edges }
}

fn sanitised_bcc(g: &Graph, opts: SpqrOptions) -> Result<crate::algo::biconnected::Bcc> {
    biconnected_components(
        g,
        BccOptions {
            treat_directed_as_undirected: opts.treat_directed_as_undirected,
            self_loops: if opts.ignore_self_loops {
                SelfLoopPolicy::Ignore
            } else {
                SelfLoopPolicy::Reject
            },
        },
    )
}

/// Decomposes the largest biconnected block of `g` (ties to the first),
/// remapping ids back to the input graph.
pub fn spqr_decompose_safe(g: &Graph, opts: SpqrOptions) -> Result<SpqrTree> {
    let bcc = sanitised_bcc(g, opts)?;
    // Largest block wins; equal sizes keep the earliest.
    let mut block: Option<&Vec<EdgeId>> = None;
    for b in &bcc.blocks {
        if b.len() == 1 && g.edge(b[0]).is_some_and(|e| e.is_self_loop()) {
            continue;
        }
        if block.map_or(true, |best| b.len() > best.len()) {
            block = Some(b);
        }
    }
    let block =
        block.ok_or_else(|| Error::bad_input("graph has no biconnected block to decompose"))?;
    let (sub, vertex_map, edge_map) = block_subgraph(g, block)?;
    let tree = spqr_decompose(&sub)?;
    Ok(remap_tree(tree, &vertex_map, &edge_map))
}

/// Decomposes every biconnected block of `g` into a forest of SPQR trees
/// plus the articulation list.
pub fn spqr_decompose_all(g: &Graph, opts: SpqrOptions) -> Result<SpqrForest> {
    let bcc = sanitised_bcc(g, opts)?;
    let mut trees = Vec::new();
    for block in &bcc.blocks {
        if block.len() == 1 && g.edge(block[0]).is_some_and(|e| e.is_self_loop()) {
            continue;
        }
        let (sub, vertex_map, edge_map) = block_subgraph(g, block)?;
        let tree = spqr_decompose(&sub)?;
        trees.push(remap_tree(tree, &vertex_map, &edge_map));
    }
    Ok(SpqrForest { trees, articulation_points: bcc.articulation_points })
}
