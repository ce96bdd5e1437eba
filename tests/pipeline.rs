use crossbeam_channel::unbounded;
use planegraph::error::Error;
use planegraph::layout::LayoutMode;
use planegraph::pipeline::{
    compute_worker_result, handle_message, BoundarySelection, CancellationRegistry,
    ComputeSettings, DatasetFile, DatasetMeta, Partial, RequestMessage, Stage, WitnessKindWire,
    WorkerComputePayload, WorkerMessage,
};

fn payload(
    nodes: usize,
    edges: &[(usize, usize)],
    mode: LayoutMode,
) -> WorkerComputePayload {
    WorkerComputePayload {
        dataset_id: "test".into(),
        sample_id: "test-sample".into(),
        nodes: (0..nodes).map(|v| format!("n{v}")).collect(),
        edges: edges.to_vec(),
        geographic: None,
        settings: ComputeSettings {
            mode,
            boundary_selection: BoundarySelection::Auto,
            max_nodes: 350,
            max_edges: 1200,
            seed: 0,
            show_witness: true,
            live_solve: false,
        },
    }
}

fn run(payload: &WorkerComputePayload) -> (planegraph::pipeline::WorkerResult, Vec<WorkerMessage>) {
    let (tx, rx) = unbounded();
    let registry = CancellationRegistry::new();
    let result = compute_worker_result("req-1", payload, &tx, &registry).unwrap();
    drop(tx);
    (result, rx.into_iter().collect())
}

fn complete(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            edges.push((u, v));
        }
    }
    edges
}

fn grid_edges(rows: usize, cols: usize) -> Vec<(usize, usize)> {
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
    edges
}

#[test]
fn triangle_end_to_end() {
    let p = payload(3, &[(0, 1), (1, 2), (2, 0)], LayoutMode::PlanarStraight);
    let (result, messages) = run(&p);

    assert!(result.planarity.is_planar);
    assert!(result.planarity.embedding_available);
    assert_eq!(result.layout.mode, LayoutMode::PlanarStraight);
    assert_eq!(result.layout.crossings, 0);
    assert_eq!(result.layout.edge_routes.len(), 3);
    assert!(result.layout.edge_routes.iter().all(|r| r.points.len() == 2));
    let faces = result.report.faces.as_ref().unwrap();
    assert_eq!(faces.count, 2);
    assert_eq!(faces.sizes, vec![3, 3]);

    // Progress events arrive strictly in stage order.
    let stages: Vec<Stage> = messages
        .iter()
        .filter_map(|m| match m {
            WorkerMessage::Progress { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            Stage::Sample,
            Stage::BuildGraph,
            Stage::Planarity,
            Stage::Embedding,
            Stage::Mesh,
            Stage::Layout,
            Stage::Report,
            Stage::Serialize,
        ]
    );
    assert_eq!(result.timings_ms.len(), 8);
}

#[test]
fn k5_downgrades_to_planarization() {
    let p = payload(5, &complete(5), LayoutMode::PlanarStraight);
    let (result, messages) = run(&p);

    assert!(!result.planarity.is_planar);
    let witness = result.planarity.witness.as_ref().unwrap();
    assert_eq!(witness.kind, WitnessKindWire::K5);
    assert_eq!(witness.edge_pairs.len(), 10);
    assert_eq!(result.layout.mode, LayoutMode::PlanarizationStraight);
    assert!(result.layout.crossings >= 1);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("planarization-straight")));

    // The witness partial was emitted.
    assert!(messages.iter().any(|m| matches!(
        m,
        WorkerMessage::Partial { partial: Partial::Witness { witness_kind: WitnessKindWire::K5, .. }, .. }
    )));
}

#[test]
fn k33_orthogonal_is_rectilinear() {
    let mut edges = Vec::new();
    for u in 0..3 {
        for v in 3..6 {
            edges.push((u, v));
        }
    }
    let p = payload(6, &edges, LayoutMode::Orthogonal);
    let (result, _) = run(&p);

    assert!(!result.planarity.is_planar);
    assert_eq!(
        result.planarity.witness.as_ref().unwrap().kind,
        WitnessKindWire::K33
    );
    assert_eq!(result.layout.mode, LayoutMode::PlanarizationOrthogonal);
    for route in &result.layout.edge_routes {
        for pair in route.points.windows(2) {
            assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
        }
    }
}

#[test]
fn grid_orthogonal_reports_ten_faces() {
    let p = payload(16, &grid_edges(4, 4), LayoutMode::Orthogonal);
    let (result, _) = run(&p);
    assert!(result.planarity.is_planar);
    assert_eq!(result.layout.mode, LayoutMode::Orthogonal);
    assert_eq!(result.report.faces.as_ref().unwrap().count, 10);
}

#[test]
fn planarization_request_on_planar_input_downgrades() {
    let p = payload(3, &[(0, 1), (1, 2), (2, 0)], LayoutMode::PlanarizationStraight);
    let (result, _) = run(&p);
    assert_eq!(result.layout.mode, LayoutMode::PlanarStraight);
}

#[test]
fn shared_vertex_triangles_report() {
    let p = payload(
        5,
        &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)],
        LayoutMode::PlanarStraight,
    );
    let (result, _) = run(&p);
    assert_eq!(result.report.biconnected.blocks, 2);
    assert_eq!(result.report.biconnected.articulation_points, 1);
    assert_eq!(result.report.biconnected.bridges, 0);
    assert_eq!(result.highlights.articulation_points, Some(vec![2]));
    assert_eq!(result.highlights.bridges, Some(vec![]));
}

#[test]
fn identical_requests_are_deterministic() {
    let p = payload(16, &grid_edges(4, 4), LayoutMode::PlanarStraight);
    let (a, _) = run(&p);
    let (b, _) = run(&p);
    assert_eq!(a.sampled_graph, b.sampled_graph);
    assert_eq!(a.planarity, b.planarity);
    assert_eq!(a.layout.positions, b.layout.positions);
    assert_eq!(a.layout.edge_routes, b.layout.edge_routes);
    assert_eq!(a.highlights, b.highlights);
}

#[test]
fn node_cap_clamps_the_sample_with_a_warning() {
    let edges: Vec<(usize, usize)> = (0..49).map(|v| (v, v + 1)).collect();
    let mut p = payload(50, &edges, LayoutMode::PlanarStraight);
    p.settings.max_nodes = 5;
    let (result, _) = run(&p);
    assert_eq!(result.sampled_graph.nodes.len(), 5);
    assert_eq!(result.sampled_stats.nodes, 5);
    assert!(result.warnings.iter().any(|w| w.contains("clamped")));
}

#[test]
fn sample_visited_partials_stream_for_large_inputs() {
    let edges: Vec<(usize, usize)> = (0..99).map(|v| (v, v + 1)).collect();
    let p = payload(100, &edges, LayoutMode::PlanarStraight);
    let (_, messages) = run(&p);
    let emissions = messages
        .iter()
        .filter(|m| matches!(m, WorkerMessage::Partial { partial: Partial::SampleVisited { .. }, .. }))
        .count();
    assert!(emissions >= 4);
}

#[test]
fn sampling_starts_at_seed_mod_n() {
    let edges: Vec<(usize, usize)> = (0..9).map(|v| (v, v + 1)).collect();
    let mut p = payload(10, &edges, LayoutMode::PlanarStraight);
    p.settings.seed = 13; // 13 mod 10 = 3
    let (result, _) = run(&p);
    assert_eq!(result.sampled_graph.original_node_indices[0], 3);
}

#[test]
fn cancelled_before_start_yields_the_cancellation_error() {
    let (tx, _rx) = unbounded();
    let registry = CancellationRegistry::new();
    registry.cancel("req-9");
    let p = payload(3, &[(0, 1), (1, 2), (2, 0)], LayoutMode::PlanarStraight);
    let err = compute_worker_result("req-9", &p, &tx, &registry).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(err.to_string(), "Computation cancelled");
}

#[test]
fn handle_message_dispatches_compute_and_cancel() {
    let (tx, rx) = unbounded();
    let registry = CancellationRegistry::new();
    let p = payload(3, &[(0, 1), (1, 2), (2, 0)], LayoutMode::PlanarStraight);
    handle_message(
        RequestMessage::Compute { request_id: "req-2".into(), payload: p.clone() },
        &tx,
        &registry,
    );
    let messages: Vec<_> = rx.try_iter().collect();
    assert!(messages
        .iter()
        .any(|m| matches!(m, WorkerMessage::Result { .. })));

    // A cancelled request surfaces the distinguished error message.
    handle_message(
        RequestMessage::Cancel { request_id: "req-3".into() },
        &tx,
        &registry,
    );
    handle_message(
        RequestMessage::Compute { request_id: "req-3".into(), payload: p },
        &tx,
        &registry,
    );
    let messages: Vec<_> = rx.try_iter().collect();
    match messages.last().unwrap() {
        WorkerMessage::Error { error, .. } => {
            assert_eq!(error.message, "Computation cancelled");
        }
        other => panic!("expected an error message, got {other:?}"),
    }
    // The id left the registry when the error was delivered.
    assert!(!registry.is_cancelled("req-3"));
}

#[test]
fn live_solve_streams_positions_and_metrics() {
    let mut p = payload(16, &grid_edges(4, 4), LayoutMode::PlanarStraight);
    p.settings.live_solve = true;
    let (tx, rx) = unbounded();
    let registry = CancellationRegistry::new();
    let start = std::time::Instant::now();
    let result = compute_worker_result("req-live", &p, &tx, &registry).unwrap();
    let elapsed = start.elapsed();
    drop(tx);
    let messages: Vec<_> = rx.into_iter().collect();

    let mut iters = Vec::new();
    for m in &messages {
        if let WorkerMessage::Partial { partial: Partial::Positions { iter, .. }, .. } = m {
            iters.push(*iter);
        }
    }
    assert!(!iters.is_empty());
    // Iteration numbers are strictly increasing within the stage.
    for pair in iters.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    assert!(messages.iter().any(|m| matches!(
        m,
        WorkerMessage::Partial { partial: Partial::Metric { .. }, .. }
    )));
    // The pacing contract keeps the stream phase visible.
    assert!(elapsed.as_millis() as u64 >= planegraph::pipeline::MIN_STREAM_MILLIS / 2);
    assert_eq!(result.layout.mode, LayoutMode::PlanarStraight);
}

#[test]
fn malformed_payload_is_rejected() {
    let p = payload(3, &[(0, 9)], LayoutMode::PlanarStraight);
    let (tx, _rx) = unbounded();
    let registry = CancellationRegistry::new();
    let err = compute_worker_result("req-bad", &p, &tx, &registry).unwrap_err();
    assert!(matches!(err, Error::BadInput(_)));
}

#[test]
fn dataset_file_shape_round_trips_and_validates() {
    let file = DatasetFile {
        meta: DatasetMeta {
            id: "tri".into(),
            name: "Triangle".into(),
            source_url: "https://example.org/tri".into(),
            license_name: "CC0".into(),
            license_url: "https://example.org/cc0".into(),
            attribution: "example".into(),
            note: String::new(),
        },
        nodes: vec!["a".into(), "b".into(), "c".into()],
        edges: vec![(0, 1), (0, 2), (1, 2)],
        extras: None,
    };
    assert!(file.validate().is_ok());
    let json = serde_json::to_string(&file).unwrap();
    let back: DatasetFile = serde_json::from_str(&json).unwrap();
    assert!(back.validate().is_ok());

    let mut bad = file.clone();
    bad.edges = vec![(1, 0)];
    assert!(bad.validate().is_err());
    let mut bad = file;
    bad.edges = vec![(0, 2), (0, 1)];
    assert!(bad.validate().is_err());
}

#[test]
fn worker_messages_serialize_with_wire_tags() {
    let msg = WorkerMessage::Progress {
        request_id: "r".into(),
        stage: Stage::BuildGraph,
        detail: None,
    };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "progress");
    assert_eq!(json["requestId"], "r");
    assert_eq!(json["stage"], "build-graph");

    let msg = WorkerMessage::Partial {
        request_id: "r".into(),
        partial: Partial::Faces { face_sizes: vec![3, 3] },
    };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["partial"]["kind"], "faces");
    assert_eq!(json["partial"]["faceSizes"][0], 3);
}
