//! st-numbering and bipolar orientation.
//!
//! An st-numbering of a biconnected graph orders the vertices `s = 1 .. n = t`
//! such that every interior vertex has both a lower- and a higher-numbered
//! neighbour. Orienting every edge from lower to higher number yields a
//! bipolar (single-source, single-sink, acyclic) orientation.

use crate::algo::biconnected::is_biconnected;
use crate::error::{Error, Result};
use crate::graph::{Graph, VertexId};
use crate::mesh::HalfEdgeMesh;

/// A validated st-numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StNumbering {
    /// Vertices in st-order; `order[0] = s`, `order[n-1] = t`.
    pub order: Vec<VertexId>,
    /// `number[v]` is the position of `v` in `order`.
    pub number: Vec<usize>,
}

/// Computes an st-numbering of the biconnected undirected graph `g`.
///
/// The edge `{s, t}` is added temporarily (with a synthetic id beyond
/// `|E|`) when missing. Vertices are threaded into a doubly-linked list
/// seeded `s → t`; each vertex is inserted before or after its DFS parent
/// depending on the sign of its low vertex, which alternates as insertions
/// happen. The result is validated before it is returned.
///
/// # Errors
/// [`Error::BadInput`] when `s == t`, either id is out of range, the graph
/// has directed edges, or the graph is not biconnected.
///
/// # Example
/// ```rust
/// use planegraph::graph::Graph;
/// use planegraph::ordering::st_numbering;
///
/// let g = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]).unwrap();
/// let st = st_numbering(&g, 0, 2).unwrap();
/// assert_eq!(st.order[0], 0);
/// assert_eq!(st.order[3], 2);
/// // Every interior vertex sits between two neighbours.
/// for &v in &st.order[1..3] {
///     assert!(g.neighbors(v).any(|w| st.number[w] < st.number[v]));
///     assert!(g.neighbors(v).any(|w| st.number[w] > st.number[v]));
/// }
/// ```
pub fn st_numbering(g: &Graph, s: VertexId, t: VertexId) -> Result<StNumbering> {
    let n = g.vertex_count();
    if s >= n || t >= n {
        return Err(Error::bad_input(format!(
            "st-numbering endpoints ({s}, {t}) outside 0..{n}"
        )));
    }
    if s == t {
        return Err(Error::bad_input("st-numbering requires s != t"));
    }
    if g.has_directed_edges() {
        return Err(Error::bad_input("st-numbering requires an undirected graph"));
    }
    if !is_biconnected(g)? {
        return Err(Error::bad_input("st-numbering requires a biconnected graph"));
    }

    // Adjacency with t pulled to the front of s's list, plus the synthetic
    // {s, t} edge when the graph lacks one. Self-loops never affect the
    // numbering and are skipped.
    let mut adj: Vec<Vec<VertexId>> = vec![Vec::new(); n];
    for e in g.edges() {
        if e.is_self_loop() {
            continue;
        }
        adj[e.u].push(e.v);
        adj[e.v].push(e.u);
    }
    if !g.has_edge_between(s, t) {
        adj[s].push(t);
        adj[t].push(s);
    }
    adj[s].sort_by_key(|&w| if w == t { 0 } else { 1 });

    // Iterative DFS from s: preorder, parent, and the low *vertex* (the
    // vertex of smallest preorder number reachable through the subtree).
    let mut pre = vec![usize::MAX; n];
    let mut parent = vec![usize::MAX; n];
    let mut low_vtx = vec![usize::MAX; n];
    let mut preorder: Vec<VertexId> = Vec::with_capacity(n);

    let mut frames: Vec<(VertexId, usize)> = Vec::new();
    pre[s] = 0;
    low_vtx[s] = s;
    preorder.push(s);
    frames.push((s, 0));
    while let Some(&mut (v, ref mut iter)) = frames.last_mut() {
        let mut descended = false;
        while *iter < adj[v].len() {
            let w = adj[v][*iter];
            *iter += 1;
            if pre[w] == usize::MAX {
                pre[w] = preorder.len();
                parent[w] = v;
                low_vtx[w] = w;
                preorder.push(w);
                frames.push((w, 0));
                descended = true;
                break;
            } else if pre[w] < pre[low_vtx[v]] {
                low_vtx[v] = w;
            }
        }
        if descended {
            continue;
        }
        frames.pop();
        if let Some(&(p, _)) = frames.last() {
            if pre[low_vtx[v]] < pre[low_vtx[p]] {
                low_vtx[p] = low_vtx[v];
            }
        }
    }
    if preorder.len() != n {
        return Err(Error::bad_input(
            "st-numbering requires a connected graph",
        ));
    }

    // Doubly-linked list threading with sentinel-free head tracking.
    let mut next = vec![usize::MAX; n];
    let mut prev = vec![usize::MAX; n];
    let mut head = s;
    next[s] = t;
    prev[t] = s;

    // Minus means "the low vertex was last approached from below": the next
    // vertex hanging off it goes before its parent.
    let mut minus = vec![false; n];
    minus[s] = true;

    for &v in preorder.iter().skip(1) {
        if v == t {
            continue;
        }
        let p = parent[v];
        if minus[low_vtx[v]] {
            // Insert v before p.
            let before = prev[p];
            next[v] = p;
            prev[p] = v;
            if before == usize::MAX {
                head = v;
                prev[v] = usize::MAX;
            } else {
                next[before] = v;
                prev[v] = before;
            }
            minus[p] = false;
        } else {
            // Insert v after p.
            let after = next[p];
            prev[v] = p;
            next[p] = v;
            next[v] = after;
            if after != usize::MAX {
                prev[after] = v;
            }
            minus[p] = true;
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut cur = head;
    while cur != usize::MAX {
        order.push(cur);
        cur = next[cur];
    }
    let mut number = vec![usize::MAX; n];
    for (i, &v) in order.iter().enumerate() {
        number[v] = i;
    }

    validate(g, s, t, &order, &number)?;
    Ok(StNumbering { order, number })
}

/// Checks `order[0] = s`, `order[n-1] = t` and the sandwich property for
/// every interior vertex.
fn validate(
    g: &Graph,
    s: VertexId,
    t: VertexId,
    order: &[VertexId],
    number: &[usize],
) -> Result<()> {
    let n = g.vertex_count();
    if order.len() != n || order[0] != s || order[n - 1] != t {
        return Err(Error::internal("st-numbering does not span s..t"));
    }
    for &v in &order[1..n - 1] {
        let mut lower = false;
        let mut higher = false;
        for w in g.neighbors(v) {
            if w == v {
                continue;
            }
            if number[w] < number[v] {
                lower = true;
            } else if number[w] > number[v] {
                higher = true;
            }
        }
        // The synthetic {s, t} edge never helps an interior vertex, so this
        // failing means the input was not biconnected after all.
        if !(lower && higher) {
            return Err(Error::internal(format!(
                "vertex {v} lacks a lower or higher neighbour in the st-numbering"
            )));
        }
    }
    Ok(())
}

/// A bipolar orientation of an embedded graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BipolarOrientation {
    pub st: StNumbering,
    /// Per edge id, the edge oriented from lower to higher st-number.
    pub directions: Vec<(VertexId, VertexId)>,
}

/// Orients every edge of the mesh's underlying graph from lower to higher
/// st-number.
///
/// Requires `s` and `t` to share a face of the embedding, so that the
/// orientation is consistent with adding `{s, t}` inside that face.
pub fn bipolar_orientation(
    mesh: &HalfEdgeMesh,
    s: VertexId,
    t: VertexId,
) -> Result<BipolarOrientation> {
    let shares_face = mesh
        .faces_at(s)
        .iter()
        .any(|f| mesh.faces_at(t).contains(f));
    if !shares_face {
        return Err(Error::bad_input(format!(
            "bipolar orientation requires {s} and {t} to share a face"
        )));
    }

    let endpoints: Vec<(VertexId, VertexId)> = (0..mesh.edge_count())
        .map(|e| mesh.edge_endpoints(e))
        .collect();
    let g = Graph::from_edge_list(mesh.vertex_count(), &endpoints)?;
    let st = st_numbering(&g, s, t)?;
    let directions = endpoints
        .iter()
        .map(|&(u, v)| {
            if st.number[u] < st.number[v] {
                (u, v)
            } else {
                (v, u)
            }
        })
        .collect();
    Ok(BipolarOrientation { st, directions })
}
