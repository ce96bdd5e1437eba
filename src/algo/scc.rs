//! Strongly-connected components via Tarjan's algorithm.

use crate::graph::{Graph, VertexId};

/// A strongly-connected-component decomposition.
///
/// Components are emitted in postorder (reverse topological order of the
/// condensation); the condensation itself is acyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scc {
    /// The components, each a list of vertex ids in visitation order.
    pub components: Vec<Vec<VertexId>>,
    /// `component_of[v]` is the index into `components` of `v`'s component.
    pub component_of: Vec<usize>,
}

/// One explicit DFS frame; `iter` is the cursor into the vertex's incidence
/// list.
struct Frame {
    v: VertexId,
    iter: usize,
}

/// Computes the strongly connected components of `g` using an iterative
/// rendition of [Tarjan's algorithm][1].
///
/// Only outgoing adjacency is followed: directed edges in their stored
/// direction, undirected edges in both directions. For an undirected graph
/// the components are simply the connected components.
///
/// # Complexity
/// * Time complexity: **O(|V| + |E|)**.
/// * Auxiliary space: **O(|V|)**.
///
/// # Example
/// ```rust
/// use planegraph::algo::tarjan_scc;
/// use planegraph::graph::GraphBuilder;
///
/// // 0 -> 1 -> 2 -> 0, with a tail 2 -> 3.
/// let mut b = GraphBuilder::new();
/// for _ in 0..4 {
///     b.add_vertex(None);
/// }
/// b.add_edge(0, 1, true).unwrap();
/// b.add_edge(1, 2, true).unwrap();
/// b.add_edge(2, 0, true).unwrap();
/// b.add_edge(2, 3, true).unwrap();
///
/// let scc = tarjan_scc(&b.build());
/// assert_eq!(scc.components.len(), 2);
/// assert_eq!(scc.component_of[0], scc.component_of[2]);
/// ```
///
/// [1]: https://en.wikipedia.org/wiki/Tarjan%27s_strongly_connected_components_algorithm
pub fn tarjan_scc(g: &Graph) -> Scc {
    let n = g.vertex_count();
    let mut index = vec![usize::MAX; n];
    let mut low = vec![usize::MAX; n];
    let mut on_stack = vec![false; n];
    let mut next_index = 0usize;

    let mut scc_stack: Vec<VertexId> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    let mut components: Vec<Vec<VertexId>> = Vec::new();
    let mut component_of = vec![usize::MAX; n];

    for root in 0..n {
        if index[root] != usize::MAX {
            continue;
        }
        frames.push(Frame { v: root, iter: 0 });
        index[root] = next_index;
        low[root] = next_index;
        next_index += 1;
        scc_stack.push(root);
        on_stack[root] = true;

        while let Some(frame) = frames.last_mut() {
            let v = frame.v;
            let mut descended = false;
            while frame.iter < g.adjacency(v).len() {
                let inc = g.adjacency(v)[frame.iter];
                frame.iter += 1;
                // Incoming directed records are not outgoing adjacency.
                if inc.dir == crate::graph::Dir::In {
                    continue;
                }
                let w = inc.to;
                if index[w] == usize::MAX {
                    index[w] = next_index;
                    low[w] = next_index;
                    next_index += 1;
                    scc_stack.push(w);
                    on_stack[w] = true;
                    frames.push(Frame { v: w, iter: 0 });
                    descended = true;
                    break;
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
            }
            if descended {
                continue;
            }
            // v is exhausted; emit its component if it is a root.
            frames.pop();
            if low[v] == index[v] {
                let mut component = Vec::new();
                loop {
                    let w = scc_stack.pop().expect("scc stack holds the component");
                    on_stack[w] = false;
                    component_of[w] = components.len();
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.reverse();
                components.push(component);
            }
            if let Some(parent) = frames.last() {
                low[parent.v] = low[parent.v].min(low[v]);
            }
        }
    }

    debug_assert!(scc_stack.is_empty());
    Scc { components, component_of }
}
