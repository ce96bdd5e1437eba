//! The block-cut tree: a bipartite tree over biconnected blocks and
//! articulation vertices.

use fixedbitset::FixedBitSet;
use hashbrown::HashSet;

use crate::algo::biconnected::Bcc;
use crate::graph::{EdgeId, Graph, VertexId};

/// A node of the block-cut tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcNode {
    /// A biconnected block, by index into [`Bcc::blocks`].
    Block(usize),
    /// An articulation vertex.
    Cut(VertexId),
}

/// A block-cut tree.
///
/// An edge links a block node to a cut node iff that articulation vertex is
/// incident to an edge of the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BcTree {
    pub nodes: Vec<BcNode>,
    /// Adjacency between node indices.
    pub adj: Vec<Vec<usize>>,
    /// Indices into `nodes` of the block nodes, in block order.
    pub block_nodes: Vec<usize>,
    /// Indices into `nodes` of the cut nodes, ascending by vertex.
    pub cut_nodes: Vec<usize>,
    /// `edge_to_block[e]` is the block index owning edge `e`.
    pub edge_to_block: Vec<usize>,
}

/// Builds the block-cut tree from a biconnected decomposition of `g`.
///
/// # Complexity
/// * Time complexity: **O(|V| + |E|)**.
/// * Auxiliary space: **O(|V| + |E|)**.
pub fn build_bc_tree(g: &Graph, bcc: &Bcc) -> BcTree {
    let mut nodes = Vec::with_capacity(bcc.blocks.len() + bcc.articulation_points.len());
    let mut block_nodes = Vec::with_capacity(bcc.blocks.len());
    for i in 0..bcc.blocks.len() {
        block_nodes.push(nodes.len());
        nodes.push(BcNode::Block(i));
    }
    let mut cut_nodes = Vec::with_capacity(bcc.articulation_points.len());
    let mut cut_node_of = vec![usize::MAX; g.vertex_count()];
    for &v in &bcc.articulation_points {
        cut_node_of[v] = nodes.len();
        cut_nodes.push(nodes.len());
        nodes.push(BcNode::Cut(v));
    }

    let mut is_cut = FixedBitSet::with_capacity(g.vertex_count());
    for &v in &bcc.articulation_points {
        is_cut.insert(v);
    }

    let mut adj = vec![Vec::new(); nodes.len()];
    for (block_idx, block) in bcc.blocks.iter().enumerate() {
        let mut linked: HashSet<VertexId> = HashSet::new();
        for &e in block {
            let edge = g.edge(e).expect("block edges exist in the graph");
            for v in [edge.u, edge.v] {
                if is_cut.contains(v) && linked.insert(v) {
                    let b = block_nodes[block_idx];
                    let c = cut_node_of[v];
                    adj[b].push(c);
                    adj[c].push(b);
                }
            }
        }
    }

    BcTree {
        nodes,
        adj,
        block_nodes,
        cut_nodes,
        edge_to_block: bcc.edge_to_block.clone(),
    }
}

impl BcTree {
    /// The vertices of a block (endpoints of its edges, deduplicated,
    /// ascending).
    pub fn block_vertices(&self, g: &Graph, block: &[EdgeId]) -> Vec<VertexId> {
        let mut vs: Vec<VertexId> = block
            .iter()
            .flat_map(|&e| {
                let edge = g.edge(e).expect("block edges exist in the graph");
                [edge.u, edge.v]
            })
            .collect();
        vs.sort_unstable();
        vs.dedup();
        vs
    }
}
