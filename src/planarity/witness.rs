//! Kuratowski witness extraction and classification.
//!
//! A nonplanar graph contains a subdivision of K5 or K3,3. The witness is
//! found by deleting edges one at a time in id order and keeping exactly
//! those whose removal would make the remainder planar; the surviving set
//! is an edge-minimal nonplanar subgraph, i.e. a Kuratowski subdivision.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

use crate::graph::{EdgeId, VertexId};
use crate::planarity::lr::{lr_planarity, LrOutcome};

/// Which Kuratowski graph the witness subdivides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessKind {
    K5,
    K33,
}

/// A Kuratowski subdivision inside the original graph.
///
/// `edges` lists the full subdivided paths; `vertices` are all endpoints of
/// those edges, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KuratowskiWitness {
    pub kind: WitnessKind,
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

/// Extracts a witness from the nonplanar simple graph `(n, edges)`.
///
/// `rep_ids[i]` maps simple edge `i` back to an edge id of the original
/// graph. The caller guarantees the input is nonplanar.
pub(crate) fn extract_witness(
    n: usize,
    edges: &[(usize, usize)],
    rep_ids: &[EdgeId],
) -> KuratowskiWitness {
    let m = edges.len();
    let mut active = FixedBitSet::with_capacity(m);
    active.insert_range(..);

    let mut scratch: Vec<(usize, usize)> = Vec::with_capacity(m);
    let mut is_planar_without = |active: &FixedBitSet, skip: usize| {
        scratch.clear();
        scratch.extend(
            edges
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip && active.contains(i))
                .map(|(_, &uv)| uv),
        );
        matches!(lr_planarity(n, &scratch, false), LrOutcome::Planar(_))
    };

    // An edge is kept iff its removal from the current working set breaks
    // nonplanarity.
    for i in 0..m {
        if !is_planar_without(&active, i) {
            active.set(i, false);
        }
    }

    let witness_edges: Vec<usize> = active.ones().collect();
    let kind = classify(n, edges, &witness_edges);

    let mut vertices: Vec<VertexId> = witness_edges
        .iter()
        .flat_map(|&i| [edges[i].0, edges[i].1])
        .collect();
    vertices.sort_unstable();
    vertices.dedup();

    KuratowskiWitness {
        kind,
        vertices,
        edges: witness_edges.iter().map(|&i| rep_ids[i]).collect(),
    }
}

/// Classifies a Kuratowski subdivision by suppressing its degree-2 chains.
///
/// Exactly 5 branch vertices and 10 suppressed edges is K5; 6 branch
/// vertices, 9 suppressed edges and a bipartition is K3,3. Anything else
/// falls back by branch-vertex count.
fn classify(n: usize, edges: &[(usize, usize)], witness: &[usize]) -> WitnessKind {
    let mut adj: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for &i in witness {
        let (u, v) = edges[i];
        adj[u].push((i, v));
        adj[v].push((i, u));
    }
    let branch: Vec<usize> = (0..n).filter(|&v| adj[v].len() >= 3).collect();
    let is_branch = {
        let mut bits = FixedBitSet::with_capacity(n);
        for &b in &branch {
            bits.insert(b);
        }
        bits
    };

    // Walk every chain between branch vertices once, from its lower-id
    // branch endpoint and lower-id first edge.
    let mut suppressed: Vec<(usize, usize)> = Vec::new();
    let mut used = FixedBitSet::with_capacity(edges.len());
    for &b in &branch {
        for &(first_edge, first_to) in &adj[b] {
            if used.contains(first_edge) {
                continue;
            }
            used.insert(first_edge);
            let mut cur = first_to;
            while !is_branch.contains(cur) {
                // The edge we came by is marked used; a degree-2 vertex has
                // exactly one other.
                let &(next_edge, next_to) = adj[cur]
                    .iter()
                    .find(|&&(e, _)| !used.contains(e))
                    .expect("degree-2 chain continues to a branch vertex");
                used.insert(next_edge);
                cur = next_to;
            }
            suppressed.push((b.min(cur), b.max(cur)));
        }
    }

    let branch_count = branch.len();
    let edge_count = suppressed.len();
    if branch_count == 5 && edge_count == 10 {
        return WitnessKind::K5;
    }
    if branch_count == 6 && edge_count == 9 && is_bipartite(&branch, &suppressed) {
        return WitnessKind::K33;
    }
    if branch_count <= 5 {
        WitnessKind::K5
    } else {
        WitnessKind::K33
    }
}

/// BFS 2-colouring of the suppressed graph: every vertex lands in the red
/// or the blue set, and an edge inside either set refutes bipartiteness.
fn is_bipartite(vertices: &[usize], edges: &[(usize, usize)]) -> bool {
    let index: HashMap<usize, usize> =
        vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
    for &(u, v) in edges {
        let (u, v) = (index[&u], index[&v]);
        adj[u].push(v);
        adj[v].push(u);
    }

    let mut red = FixedBitSet::with_capacity(vertices.len());
    let mut blue = FixedBitSet::with_capacity(vertices.len());
    let mut queue: VecDeque<usize> = VecDeque::new();
    for start in 0..vertices.len() {
        if red.contains(start) || blue.contains(start) {
            continue;
        }
        red.insert(start);
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            let v_red = red.contains(v);
            for &w in &adj[v] {
                let w_red = red.contains(w);
                let w_blue = blue.contains(w);
                if (v_red && w_red) || (!v_red && w_blue) {
                    return false;
                }
                if !w_red && !w_blue {
                    if v_red {
                        blue.insert(w);
                    } else {
                        red.insert(w);
                    }
                    queue.push_back(w);
                }
            }
        }
    }
    true
}
