use planegraph::error::Error;
use planegraph::graph::Graph;
use planegraph::spqr::{
    spqr_decompose, spqr_decompose_all, spqr_decompose_safe, SkeletonEdge, SpqrKind, SpqrOptions,
    TreeLink,
};

fn undirected(n: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_edge_list(n, edges).unwrap()
}

#[test]
fn triangle_is_a_single_series_node() {
    let g = undirected(3, &[(0, 1), (1, 2), (2, 0)]);
    let tree = spqr_decompose(&g).unwrap();
    assert_eq!(tree.counts(), (1, 0, 0, 3));
    assert_eq!(tree.tree_edges.len(), tree.nodes.len() - 1);
}

#[test]
fn long_cycle_stays_one_series_node() {
    let g = undirected(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
    let tree = spqr_decompose(&g).unwrap();
    assert_eq!(tree.counts(), (1, 0, 0, 5));
}

#[test]
fn parallel_bundle_is_a_single_p_node() {
    let g = undirected(2, &[(0, 1), (0, 1), (0, 1)]);
    let tree = spqr_decompose(&g).unwrap();
    assert_eq!(tree.counts(), (0, 1, 0, 3));
}

#[test]
fn k4_is_a_single_rigid_node() {
    let g = undirected(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    let tree = spqr_decompose(&g).unwrap();
    assert_eq!(tree.counts(), (0, 0, 1, 6));
}

#[test]
// 0 - 1
// | / |      (4-cycle plus the 0-2 chord: P bundle of two series paths
// 3 - 2       and the chord itself)
fn diamond_splits_into_p_and_two_series() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    let tree = spqr_decompose(&g).unwrap();
    assert_eq!(tree.counts(), (2, 1, 0, 5));

    // The P node sits between the poles 0 and 2.
    let p = tree
        .nodes
        .iter()
        .find(|n| n.kind == SpqrKind::P)
        .expect("a P node exists");
    assert_eq!(p.vertices, vec![0, 2]);
    // It carries the real chord and two virtual edges.
    let real: Vec<_> = p
        .edges
        .iter()
        .filter(|e| matches!(e.kind, SkeletonEdge::Real(_)))
        .collect();
    assert_eq!(real.len(), 1);
}

#[test]
fn virtual_ids_pair_tree_edges() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    let tree = spqr_decompose(&g).unwrap();
    let mut virtual_links = 0;
    for te in &tree.tree_edges {
        if let TreeLink::Virtual(vid) = te.link {
            virtual_links += 1;
            // The id appears in both endpoint skeletons.
            for node_idx in [te.a, te.b] {
                assert!(tree.nodes[node_idx]
                    .edges
                    .iter()
                    .any(|e| e.kind == SkeletonEdge::Virtual(vid)));
            }
        }
    }
    assert_eq!(virtual_links, 2);
}

#[test]
fn every_real_edge_has_exactly_one_q_leaf() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    let tree = spqr_decompose(&g).unwrap();
    let mut real_leaf_count = vec![0usize; g.edge_count()];
    for node in &tree.nodes {
        if node.kind == SpqrKind::Q {
            if let SkeletonEdge::Real(id) = node.edges[0].kind {
                real_leaf_count[id] += 1;
            }
        }
    }
    assert!(real_leaf_count.iter().all(|&c| c == 1));
}

#[test]
fn decompose_rejects_non_biconnected_input() {
    let g = undirected(3, &[(0, 1), (1, 2)]);
    assert!(matches!(spqr_decompose(&g), Err(Error::BadInput(_))));
    let mut b = planegraph::graph::GraphBuilder::new();
    b.add_vertex(None);
    b.add_vertex(None);
    b.add_edge(0, 1, true).unwrap();
    assert!(matches!(spqr_decompose(&b.build()), Err(Error::BadInput(_))));
}

#[test]
fn safe_variant_picks_the_largest_block() {
    // A triangle block and a K4 block sharing vertex 2.
    let g = undirected(
        7,
        &[
            (0, 1), (1, 2), (2, 0),
            (2, 3), (2, 4), (2, 5), (3, 4), (3, 5), (4, 5),
        ],
    );
    let tree = spqr_decompose_safe(&g, SpqrOptions::default()).unwrap();
    // The K4-on-{2,3,4,5} block decomposes to one rigid node.
    assert_eq!(tree.counts(), (0, 0, 1, 6));
    let r = tree.nodes.iter().find(|n| n.kind == SpqrKind::R).unwrap();
    assert_eq!(r.vertices, vec![2, 3, 4, 5]);
    // Real ids refer to the original graph.
    for e in &r.edges {
        if let SkeletonEdge::Real(id) = e.kind {
            assert!(id >= 3, "edge {id} belongs to the K4 block");
        }
    }
}

#[test]
fn forest_covers_every_block() {
    let g = undirected(
        7,
        &[
            (0, 1), (1, 2), (2, 0),
            (2, 3), (2, 4), (2, 5), (3, 4), (3, 5), (4, 5),
            (5, 6),
        ],
    );
    let forest = spqr_decompose_all(&g, SpqrOptions::default()).unwrap();
    assert_eq!(forest.trees.len(), 3);
    assert_eq!(forest.articulation_points, vec![2, 5]);
}
