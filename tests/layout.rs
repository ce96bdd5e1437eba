use planegraph::graph::Graph;
use planegraph::layout::{
    orthogonal_layout, planar_straight_line, planarization_layout, LayoutArtifact, LayoutMode,
    PlanarizeMode, COORD_LIMIT,
};
use planegraph::mesh::build_half_edge_mesh;
use planegraph::planarity::{test_planarity, PlanarityOptions};

fn undirected(n: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_edge_list(n, edges).unwrap()
}

fn embedded_mesh(g: &Graph) -> planegraph::mesh::HalfEdgeMesh {
    let report = test_planarity(g, PlanarityOptions::default()).unwrap();
    build_half_edge_mesh(g, report.embedding().unwrap()).unwrap()
}

fn grid(rows: usize, cols: usize) -> Graph {
    let mut edges = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let v = r * cols + c;
            if c + 1 < cols {
                edges.push((v, v + 1));
            }
            if r + 1 < rows {
                edges.push((v, v + cols));
            }
        }
    }
    undirected(rows * cols, &edges)
}

fn complete(n: usize) -> Graph {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            edges.push((u, v));
        }
    }
    undirected(n, &edges)
}

fn assert_axis_aligned(artifact: &LayoutArtifact) {
    for route in &artifact.edge_routes {
        for pair in route.points.windows(2) {
            assert!(
                pair[0].x == pair[1].x || pair[0].y == pair[1].y,
                "segment {:?} -> {:?} is not axis-aligned",
                pair[0],
                pair[1]
            );
        }
    }
}

fn polyline_bends(artifact: &LayoutArtifact) -> usize {
    artifact
        .edge_routes
        .iter()
        .map(|r| r.points.len().saturating_sub(2))
        .sum()
}

#[test]
fn triangle_straight_line_has_no_crossings() {
    let g = undirected(3, &[(0, 1), (1, 2), (2, 0)]);
    let artifact = planar_straight_line(&embedded_mesh(&g)).unwrap();
    assert_eq!(artifact.mode, LayoutMode::PlanarStraight);
    assert_eq!(artifact.crossings, 0);
    assert_eq!(artifact.edge_routes.len(), 3);
    assert!(artifact.edge_routes.iter().all(|r| r.points.len() == 2));
    assert_eq!(artifact.positions.len(), 3);
}

#[test]
fn square_with_diagonal_draws_planar() {
    let g = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
    let artifact = planar_straight_line(&embedded_mesh(&g)).unwrap();
    assert_eq!(artifact.crossings, 0);
}

#[test]
fn grid_straight_line_is_planar_and_clamped() {
    let g = grid(4, 4);
    let artifact = planar_straight_line(&embedded_mesh(&g)).unwrap();
    assert_eq!(artifact.crossings, 0);
    for &(_, p) in &artifact.positions {
        assert!(p.x.abs() <= COORD_LIMIT && p.y.abs() <= COORD_LIMIT);
    }
    // Positions arrive sorted by vertex id.
    for pair in artifact.positions.windows(2) {
        assert!(pair[0].0 < pair[1].0);
    }
}

#[test]
fn orthogonal_grid_routes_are_rectilinear() {
    let g = grid(4, 4);
    let artifact = orthogonal_layout(&embedded_mesh(&g)).unwrap();
    assert_eq!(artifact.mode, LayoutMode::Orthogonal);
    assert_axis_aligned(&artifact);
    assert_eq!(artifact.bends, polyline_bends(&artifact));
}

#[test]
fn orthogonal_triangle_is_feasible() {
    let g = undirected(3, &[(0, 1), (1, 2), (2, 0)]);
    let artifact = orthogonal_layout(&embedded_mesh(&g)).unwrap();
    assert_axis_aligned(&artifact);
    assert_eq!(artifact.bends, polyline_bends(&artifact));
}

#[test]
fn planarization_of_k5_introduces_one_crossing() {
    let result = planarization_layout(&complete(5), PlanarizeMode::Straight).unwrap();
    assert_eq!(result.base_edges.len(), 9);
    assert_eq!(result.remaining_edges, vec![9]);
    assert_eq!(result.layout.mode, LayoutMode::PlanarizationStraight);
    assert_eq!(result.layout.crossings, 1);
    // Positions cover exactly the original vertices.
    assert_eq!(result.layout.positions.len(), 5);
    // Every edge has a route; the reinserted edge runs through the dummy.
    assert_eq!(result.layout.edge_routes.len(), 10);
    let reinserted = result
        .layout
        .edge_routes
        .iter()
        .find(|r| r.edge == (3, 4))
        .expect("the dropped edge is still drawn");
    assert!(reinserted.points.len() >= 3);
}

#[test]
fn planarization_of_a_planar_graph_adds_nothing() {
    let g = grid(3, 3);
    let result = planarization_layout(&g, PlanarizeMode::Straight).unwrap();
    assert!(result.remaining_edges.is_empty());
    assert_eq!(result.layout.crossings, 0);
    assert_eq!(result.layout.edge_routes.len(), g.edge_count());
}

#[test]
fn planarization_orthogonal_k33_is_rectilinear() {
    let mut edges = Vec::new();
    for u in 0..3 {
        for v in 3..6 {
            edges.push((u, v));
        }
    }
    let g = undirected(6, &edges);
    let result = planarization_layout(&g, PlanarizeMode::Orthogonal).unwrap();
    assert_eq!(result.layout.mode, LayoutMode::PlanarizationOrthogonal);
    assert!(result.layout.crossings >= 1);
    assert_axis_aligned(&result.layout);
}

#[test]
fn clamping_is_idempotent() {
    let g = grid(3, 3);
    let mut artifact = planar_straight_line(&embedded_mesh(&g)).unwrap();
    artifact.positions[0].1.x = f64::INFINITY;
    artifact.positions[1].1.y = f64::NAN;
    artifact.positions[2].1.x = 3e9;
    artifact.clamp();
    let once = artifact.clone();
    artifact.clamp();
    assert_eq!(artifact, once);
    assert_eq!(once.positions[0].1.x, 0.0);
    assert_eq!(once.positions[1].1.y, 0.0);
    assert_eq!(once.positions[2].1.x, COORD_LIMIT);
}
