use planegraph::algo::{
    biconnected_components, build_bc_tree, connected_components, tarjan_scc, BcNode, BccOptions,
    SelfLoopPolicy,
};
use planegraph::error::Error;
use planegraph::graph::{Graph, GraphBuilder};

fn undirected(n: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_edge_list(n, edges).unwrap()
}

#[test]
// 0 - 1 - 2   (a path: every edge is a bridge, the middle is a cut vertex)
fn path_decomposes_into_bridges() {
    let g = undirected(3, &[(0, 1), (1, 2)]);
    let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
    assert_eq!(bcc.blocks.len(), 2);
    assert_eq!(bcc.articulation_points, vec![1]);
    assert_eq!(bcc.bridges, vec![0, 1]);
}

#[test]
// 0 - 1
// | \ |
// 3 - 2   (K4: one block, nothing cut)
fn k4_is_one_block() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (1, 3)]);
    let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
    assert_eq!(bcc.blocks.len(), 1);
    assert!(bcc.articulation_points.is_empty());
    assert!(bcc.bridges.is_empty());
    assert!(bcc.edge_to_block.iter().all(|&b| b == 0));
}

#[test]
// 0 - 1        3 - 4
//  \  |        |  /
//     2 ------ 2      (two triangles sharing vertex 2)
fn shared_vertex_triangles() {
    let g = undirected(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]);
    let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
    assert_eq!(bcc.blocks.len(), 2);
    assert_eq!(bcc.articulation_points, vec![2]);
    assert!(bcc.bridges.is_empty());

    let tree = build_bc_tree(&g, &bcc);
    assert_eq!(tree.block_nodes.len(), 2);
    assert_eq!(tree.cut_nodes.len(), 1);
    let cut = tree.cut_nodes[0];
    assert_eq!(tree.nodes[cut], BcNode::Cut(2));
    // The cut links both blocks.
    assert_eq!(tree.adj[cut].len(), 2);
}

#[test]
fn every_edge_belongs_to_exactly_one_block() {
    let g = undirected(
        7,
        &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3), (5, 6)],
    );
    let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
    let mut counted = vec![0usize; g.edge_count()];
    for block in &bcc.blocks {
        for &e in block {
            counted[e] += 1;
        }
    }
    assert!(counted.iter().all(|&c| c == 1));
    for (e, &b) in bcc.edge_to_block.iter().enumerate() {
        assert!(bcc.blocks[b].contains(&e));
    }
}

#[test]
fn parallel_edges_are_not_bridges() {
    let g = undirected(2, &[(0, 1), (0, 1)]);
    let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
    assert_eq!(bcc.blocks.len(), 1);
    assert!(bcc.bridges.is_empty());
}

#[test]
fn self_loop_policy() {
    let g = undirected(2, &[(0, 1), (0, 0)]);
    assert!(matches!(
        biconnected_components(&g, BccOptions::default()),
        Err(Error::BadInput(_))
    ));
    let bcc = biconnected_components(
        &g,
        BccOptions { self_loops: SelfLoopPolicy::Ignore, ..Default::default() },
    )
    .unwrap();
    // The loop forms its own single-edge block.
    assert_eq!(bcc.blocks.len(), 2);
    assert!(bcc.blocks.contains(&vec![1]));
}

#[test]
fn directed_edges_require_coercion() {
    let mut b = GraphBuilder::new();
    b.add_vertex(None);
    b.add_vertex(None);
    b.add_edge(0, 1, true).unwrap();
    let g = b.build();
    assert!(matches!(
        biconnected_components(&g, BccOptions::default()),
        Err(Error::BadInput(_))
    ));
    let bcc = biconnected_components(
        &g,
        BccOptions { treat_directed_as_undirected: true, ..Default::default() },
    )
    .unwrap();
    assert_eq!(bcc.blocks.len(), 1);
}

#[test]
// 0 -> 1 -> 2 -> 0,  2 -> 3
fn scc_directed_cycle_with_tail() {
    let mut b = GraphBuilder::new();
    for _ in 0..4 {
        b.add_vertex(None);
    }
    b.add_edge(0, 1, true).unwrap();
    b.add_edge(1, 2, true).unwrap();
    b.add_edge(2, 0, true).unwrap();
    b.add_edge(2, 3, true).unwrap();
    let g = b.build();
    let scc = tarjan_scc(&g);
    assert_eq!(scc.components.len(), 2);
    assert_eq!(scc.component_of[0], scc.component_of[1]);
    assert_eq!(scc.component_of[1], scc.component_of[2]);
    assert_ne!(scc.component_of[0], scc.component_of[3]);
}

#[test]
fn scc_of_undirected_graph_is_connected_components() {
    let g = undirected(5, &[(0, 1), (2, 3)]);
    let scc = tarjan_scc(&g);
    assert_eq!(scc.components.len(), 3);
    let (count, component_of) = connected_components(&g);
    assert_eq!(count, 3);
    // Same partition, possibly different numbering.
    for v in 0..5 {
        for w in 0..5 {
            assert_eq!(
                scc.component_of[v] == scc.component_of[w],
                component_of[v] == component_of[w]
            );
        }
    }
}

#[test]
fn articulation_matches_component_increase() {
    // Removing a vertex is an articulation iff the component count rises.
    let g = undirected(6, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3)]);
    let bcc = biconnected_components(&g, BccOptions::default()).unwrap();
    let (base, _) = connected_components(&g);
    for v in 0..g.vertex_count() {
        let remaining: Vec<(usize, usize)> = g
            .edges()
            .iter()
            .filter(|e| e.u != v && e.v != v)
            .map(|e| (e.u, e.v))
            .collect();
        let h = Graph::from_edge_list(g.vertex_count(), &remaining).unwrap();
        let (mut count, _) = connected_components(&h);
        count -= 1; // v itself is now isolated
        assert_eq!(
            bcc.articulation_points.contains(&v),
            count > base,
            "vertex {v}"
        );
    }
}
