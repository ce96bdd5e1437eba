use planegraph::graph::Graph;
use planegraph::mesh::{build_half_edge_mesh, select_outer_face, rotation_from_adjacency};
use planegraph::planarity::{test_planarity, PlanarityOptions};

fn embedded_mesh(n: usize, edges: &[(usize, usize)]) -> planegraph::mesh::HalfEdgeMesh {
    let g = Graph::from_edge_list(n, edges).unwrap();
    let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
    build_half_edge_mesh(&g, report.embedding().unwrap()).unwrap()
}

#[test]
// 0 - 1
// | / |
// 3 - 2    (square with one diagonal: 3 faces)
fn square_with_diagonal_has_three_faces() {
    let mesh = embedded_mesh(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    assert_eq!(mesh.face_count(), 3);
    assert!(mesh.validate().is_ok());
}

#[test]
fn mesh_involutions_hold() {
    let mesh = embedded_mesh(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    for h in 0..mesh.half_edge_count() {
        assert_eq!(mesh.twin(mesh.twin(h)), h);
        assert_eq!(mesh.next(mesh.prev(h)), h);
        assert_eq!(mesh.prev(mesh.next(h)), h);
    }
}

#[test]
fn faces_partition_the_half_edges() {
    let mesh = embedded_mesh(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]);
    let mut seen = vec![false; mesh.half_edge_count()];
    for f in 0..mesh.face_count() {
        for &h in mesh.face(f) {
            assert!(!seen[h]);
            seen[h] = true;
            assert_eq!(mesh.face_of(h), f);
        }
    }
    assert!(seen.into_iter().all(|s| s));
}

#[test]
fn faces_at_vertex_are_sorted_and_distinct() {
    let mesh = embedded_mesh(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    for v in 0..mesh.vertex_count() {
        let faces = mesh.faces_at(v);
        let mut sorted = faces.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(faces, sorted);
    }
    // The diagonal endpoints touch every face.
    assert_eq!(mesh.faces_at(0).len(), 3);
    assert_eq!(mesh.faces_at(2).len(), 3);
    assert_eq!(mesh.faces_at(1).len(), 2);
}

#[test]
fn outer_face_by_length_and_by_area_agree_on_the_square() {
    let mesh = embedded_mesh(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    let by_length = select_outer_face(&mesh, None);
    assert_eq!(mesh.face_len(by_length), 4);
    // Geometric square: the outer walk encloses the largest area.
    let positions = [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)];
    let by_area = select_outer_face(&mesh, Some(&positions));
    assert_eq!(mesh.face_len(by_area), 4);
}

#[test]
fn disconnected_mesh_components_each_satisfy_euler() {
    // Two disjoint triangles.
    let mesh = embedded_mesh(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    let report = mesh.validate().unwrap();
    assert_eq!(report.components, 2);
    assert!(report.euler_ok);
    assert_eq!(mesh.face_count(), 4);
}

#[test]
fn walk_face_matches_face_table() {
    let mesh = embedded_mesh(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    for f in 0..mesh.face_count() {
        let start = mesh.face(f)[0];
        assert_eq!(mesh.walk_face(start), mesh.face(f).to_vec());
    }
}

#[test]
fn adjacency_rotation_of_a_cycle_is_planar() {
    // Any rotation of a simple cycle embeds; the adjacency order is fine.
    let g = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
    let rotation = rotation_from_adjacency(&g);
    let mesh = build_half_edge_mesh(&g, &rotation).unwrap();
    assert!(mesh.validate().is_ok());
    assert_eq!(mesh.face_count(), 2);
}
