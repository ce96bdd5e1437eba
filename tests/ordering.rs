use planegraph::error::Error;
use planegraph::graph::Graph;
use planegraph::mesh::build_half_edge_mesh;
use planegraph::ordering::{bipolar_orientation, st_numbering, StNumbering};
use planegraph::planarity::{test_planarity, PlanarityOptions};

fn undirected(n: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_edge_list(n, edges).unwrap()
}

fn assert_valid_st(g: &Graph, s: usize, t: usize, st: &StNumbering) {
    let n = g.vertex_count();
    assert_eq!(st.order.len(), n);
    assert_eq!(st.order[0], s);
    assert_eq!(st.order[n - 1], t);
    for &v in &st.order[1..n - 1] {
        let lower = g.neighbors(v).any(|w| w != v && st.number[w] < st.number[v]);
        let higher = g.neighbors(v).any(|w| w != v && st.number[w] > st.number[v]);
        assert!(lower && higher, "vertex {v} is not sandwiched");
    }
}

#[test]
fn cycle_numbering_is_valid() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
    let st = st_numbering(&g, 0, 3).unwrap();
    assert_valid_st(&g, 0, 3, &st);
}

#[test]
fn missing_st_edge_is_added_temporarily() {
    // 0 and 2 are not adjacent in the 4-cycle.
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
    let st = st_numbering(&g, 0, 2).unwrap();
    assert_valid_st(&g, 0, 2, &st);
}

#[test]
// 4-cycle with a pendant triangle on the 1-2 edge; exercises the sign flip.
//
//   0 --- 3
//   |     |
//   1 --- 2
//    \   /
//      4
fn cycle_with_triangle_is_valid() {
    let g = undirected(5, &[(0, 1), (1, 2), (2, 3), (3, 0), (1, 4), (2, 4)]);
    let st = st_numbering(&g, 0, 3).unwrap();
    assert_valid_st(&g, 0, 3, &st);
}

#[test]
fn k4_is_valid_for_every_pole_pair() {
    let g = undirected(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    for s in 0..4 {
        for t in 0..4 {
            if s == t {
                continue;
            }
            let st = st_numbering(&g, s, t).unwrap();
            assert_valid_st(&g, s, t, &st);
        }
    }
}

#[test]
fn wheel_numberings_are_valid() {
    // Hub 0 with a 5-cycle rim.
    let g = undirected(
        6,
        &[
            (0, 1), (0, 2), (0, 3), (0, 4), (0, 5),
            (1, 2), (2, 3), (3, 4), (4, 5), (5, 1),
        ],
    );
    let st = st_numbering(&g, 1, 4).unwrap();
    assert_valid_st(&g, 1, 4, &st);
}

#[test]
fn rejects_degenerate_inputs() {
    let g = undirected(3, &[(0, 1), (1, 2)]);
    // Not biconnected.
    assert!(matches!(st_numbering(&g, 0, 2), Err(Error::BadInput(_))));
    let g = undirected(3, &[(0, 1), (1, 2), (2, 0)]);
    assert!(matches!(st_numbering(&g, 1, 1), Err(Error::BadInput(_))));
    assert!(matches!(st_numbering(&g, 0, 9), Err(Error::BadInput(_))));
}

#[test]
fn bipolar_orientation_has_one_source_and_one_sink() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
    let mesh = build_half_edge_mesh(&g, report.embedding().unwrap()).unwrap();
    let bipolar = bipolar_orientation(&mesh, 0, 2).unwrap();

    let n = mesh.vertex_count();
    let mut has_out = vec![false; n];
    let mut has_in = vec![false; n];
    for &(from, to) in &bipolar.directions {
        has_out[from] = true;
        has_in[to] = true;
        // Every edge points from lower to higher st-number.
        assert!(bipolar.st.number[from] < bipolar.st.number[to]);
    }
    assert!(has_out[0] && !has_in[0]);
    assert!(has_in[2] && !has_out[2]);
    for v in [1, 3] {
        assert!(has_out[v] && has_in[v]);
    }
}

#[test]
fn bipolar_orientation_requires_a_shared_face() {
    // 4x4 grid: interior vertex 5 and boundary vertex 11 share no face.
    let mut edges = Vec::new();
    for r in 0..4 {
        for c in 0..4 {
            let v = r * 4 + c;
            if c + 1 < 4 {
                edges.push((v, v + 1));
            }
            if r + 1 < 4 {
                edges.push((v, v + 4));
            }
        }
    }
    let g = undirected(16, &edges);
    let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
    let mesh = build_half_edge_mesh(&g, report.embedding().unwrap()).unwrap();
    assert!(matches!(
        bipolar_orientation(&mesh, 5, 11),
        Err(Error::BadInput(_))
    ));
}
