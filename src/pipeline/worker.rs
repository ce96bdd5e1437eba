//! The staged compute worker.
//!
//! `sample → build-graph → planarity → embedding → mesh → layout → report →
//! serialize`, each stage announced with a progress event and timed into
//! `timings_ms`. The worker is deterministic for a fixed payload: every
//! ordering it produces is tie-broken by id, and coordinates are clamped
//! uniformly. Cancellation is observed between stages and during solver
//! pacing sleeps.

use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use indexmap::IndexMap;
use log::{debug, warn};

use crate::algo::{biconnected_components, connected_components, BccOptions, SelfLoopPolicy};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphBuilder, Label};
use crate::layout::{
    count_crossings, planar_straight_line, planarization_layout, BBox, EdgeRoute, LayoutArtifact,
    LayoutMode, PlanarizeMode, Point, Segment,
};
use crate::layout::orthogonal_layout;
use crate::mesh::{build_half_edge_mesh, select_outer_face, FaceId, HalfEdgeMesh};
use crate::pipeline::sample::bfs_sample;
use crate::pipeline::{
    BiconnectedInfo, BoundarySelection, CancellationRegistry, ErrorPayload, FacesInfo, Highlights,
    Partial, PlanarityInfo, ReportInfo, RequestMessage, SampledGraph, SampledStats, SpqrCounts,
    SpqrInfo, Stage, WitnessInfo, WitnessKindWire, WorkerComputePayload, WorkerMessage,
    WorkerResult,
};
use crate::planarity::{test_planarity, PlanarityOptions, SelfLoops, WitnessKind};
use crate::spqr::{spqr_decompose_all, SpqrOptions};

/// Sampling never exceeds this many vertices.
pub const HARD_NODE_CAP: usize = 350;
/// Sampling never exceeds this many edges.
pub const HARD_EDGE_CAP: usize = 1200;
/// The live solver streams for at least this long, for hosts that animate.
pub const MIN_STREAM_MILLIS: u64 = 1400;

/// Streaming phase iteration cap and emission cadence.
const STREAM_ITERATIONS: usize = 60;
const STREAM_EMIT_EVERY: usize = 6;
/// Boundary size target clamp for the face-selection heuristics.
const BOUNDARY_TARGET_LOW: f64 = 6.0;
const BOUNDARY_TARGET_HIGH: f64 = 64.0;

/// Dispatches one request message: `compute` runs the pipeline and emits a
/// terminal `result` or `error`; `cancel` marks the id in the registry.
pub fn handle_message(
    msg: RequestMessage,
    sink: &Sender<WorkerMessage>,
    registry: &CancellationRegistry,
) {
    match msg {
        RequestMessage::Cancel { request_id } => registry.cancel(&request_id),
        RequestMessage::Compute { request_id, payload } => {
            match compute_worker_result(&request_id, &payload, sink, registry) {
                Ok(result) => {
                    let _ = sink.send(WorkerMessage::Result {
                        request_id: request_id.clone(),
                        result: Box::new(result),
                    });
                }
                Err(err) => {
                    // Cancellation is a control signal, not a failure; it
                    // still surfaces as the distinguished terminal error.
                    if !err.is_cancelled() {
                        warn!("compute request {request_id} failed: {err}");
                    }
                    let _ = sink.send(WorkerMessage::Error {
                        request_id: request_id.clone(),
                        error: ErrorPayload { message: err.to_string(), stack: None },
                    });
                }
            }
            registry.clear(&request_id);
        }
    }
}

/// Emission and cancellation plumbing shared by the stages.
struct Ctx<'a> {
    request_id: &'a str,
    sink: &'a Sender<WorkerMessage>,
    registry: &'a CancellationRegistry,
}

impl Ctx<'_> {
    fn progress(&self, stage: Stage, detail: Option<String>) {
        let _ = self.sink.send(WorkerMessage::Progress {
            request_id: self.request_id.to_string(),
            stage,
            detail,
        });
    }

    fn partial(&self, partial: Partial) {
        let _ = self.sink.send(WorkerMessage::Partial {
            request_id: self.request_id.to_string(),
            partial,
        });
    }

    fn check(&self) -> Result<()> {
        if self.registry.is_cancelled(self.request_id) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// One pacing sleep, bracketed by cancellation checks.
    fn pace(&self, millis: u64) -> Result<()> {
        self.check()?;
        std::thread::sleep(Duration::from_millis(millis));
        self.check()
    }
}

/// Runs the full pipeline for one request.
///
/// Callable identically inline or from a worker thread; only the channel
/// the messages land on differs.
///
/// # Example
/// ```rust
/// use crossbeam_channel::unbounded;
/// use planegraph::layout::LayoutMode;
/// use planegraph::pipeline::{
///     compute_worker_result, BoundarySelection, CancellationRegistry, ComputeSettings,
///     WorkerComputePayload,
/// };
///
/// let payload = WorkerComputePayload {
///     dataset_id: "demo".into(),
///     sample_id: "demo-1".into(),
///     nodes: vec!["a".into(), "b".into(), "c".into()],
///     edges: vec![(0, 1), (1, 2), (2, 0)],
///     geographic: None,
///     settings: ComputeSettings {
///         mode: LayoutMode::PlanarStraight,
///         boundary_selection: BoundarySelection::Auto,
///         max_nodes: 350,
///         max_edges: 1200,
///         seed: 0,
///         show_witness: false,
///         live_solve: false,
///     },
/// };
/// let (tx, rx) = unbounded();
/// let registry = CancellationRegistry::new();
/// let result = compute_worker_result("req", &payload, &tx, &registry).unwrap();
/// assert!(result.planarity.is_planar);
/// assert_eq!(result.layout.crossings, 0);
/// drop(tx);
/// assert!(rx.into_iter().count() >= 8); // one progress event per stage
/// ```
pub fn compute_worker_result(
    request_id: &str,
    payload: &WorkerComputePayload,
    sink: &Sender<WorkerMessage>,
    registry: &CancellationRegistry,
) -> Result<WorkerResult> {
    let ctx = Ctx { request_id, sink, registry };
    let mut timings: IndexMap<String, u64> = IndexMap::new();
    let mut warnings: Vec<String> = Vec::new();

    let n_input = payload.nodes.len();
    for &(u, v) in &payload.edges {
        if u >= n_input || v >= n_input {
            return Err(Error::bad_input(format!(
                "payload edge ({u}, {v}) outside 0..{n_input}"
            )));
        }
    }
    if let Some(geo) = &payload.geographic {
        if geo.x.len() != n_input || geo.y.len() != n_input {
            warnings.push("geographic arrays ignored: length mismatch".into());
        }
    }

    // --- sample ---------------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::Sample, None);
    let t = Instant::now();
    let sample = bfs_sample(
        &payload.nodes,
        &payload.edges,
        payload.settings.seed,
        payload.settings.max_nodes.max(1),
        payload.settings.max_edges.max(1),
        |visited| ctx.partial(Partial::SampleVisited { visited: visited.to_vec() }),
    );
    timings.insert(Stage::Sample.name().into(), t.elapsed().as_millis() as u64);
    if sample.nodes.len() < n_input {
        warnings.push(format!(
            "input clamped: sampled {} of {} vertices",
            sample.nodes.len(),
            n_input
        ));
        debug!("sampled {}/{} vertices", sample.nodes.len(), n_input);
    }

    // --- build-graph ----------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::BuildGraph, None);
    let t = Instant::now();
    let mut builder = GraphBuilder::with_capacity(sample.nodes.len(), sample.edges.len());
    for label in &sample.nodes {
        builder.add_vertex(Some(Label::Text(label.clone())));
    }
    for &(u, v) in &sample.edges {
        builder.add_edge(u, v, false)?;
    }
    let g = builder.build();
    timings.insert(Stage::BuildGraph.name().into(), t.elapsed().as_millis() as u64);

    // --- planarity ------------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::Planarity, None);
    let t = Instant::now();
    let planarity = test_planarity(
        &g,
        PlanarityOptions {
            treat_directed_as_undirected: true,
            self_loops: SelfLoops::Ignore,
        },
    )?;
    let witness_info = planarity.witness().map(|w| {
        let mut pairs: Vec<(usize, usize)> = w
            .edges
            .iter()
            .filter_map(|&e| g.edge(e))
            .map(|e| (e.u.min(e.v), e.u.max(e.v)))
            .collect();
        pairs.sort_unstable();
        WitnessInfo {
            kind: match w.kind {
                WitnessKind::K5 => WitnessKindWire::K5,
                WitnessKind::K33 => WitnessKindWire::K33,
            },
            edge_pairs: pairs,
            edge_ids: Some(w.edges.clone()),
        }
    });
    if let Some(info) = &witness_info {
        if payload.settings.show_witness {
            ctx.partial(Partial::Witness {
                witness_kind: info.kind,
                edges: info.edge_pairs.clone(),
            });
        }
    }
    timings.insert(Stage::Planarity.name().into(), t.elapsed().as_millis() as u64);

    // --- embedding ------------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::Embedding, None);
    let t = Instant::now();
    let embedding = planarity.embedding().cloned();
    timings.insert(Stage::Embedding.name().into(), t.elapsed().as_millis() as u64);

    // --- mesh -----------------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::Mesh, None);
    let t = Instant::now();
    let mesh = match &embedding {
        Some(rotation) => {
            let mesh = build_half_edge_mesh(&g, rotation)?;
            let mut sizes: Vec<usize> =
                (0..mesh.face_count()).map(|f| mesh.face_len(f)).collect();
            sizes.sort_unstable();
            ctx.partial(Partial::Faces { face_sizes: sizes });
            Some(mesh)
        }
        None => None,
    };
    timings.insert(Stage::Mesh.name().into(), t.elapsed().as_millis() as u64);

    // --- layout ---------------------------------------------------------
    ctx.check()?;
    let requested = payload.settings.mode;
    let effective = effective_mode(requested, planarity.is_planar());
    if effective != requested {
        warnings.push(format!(
            "layout mode rewritten from {} to {}",
            mode_name(requested),
            mode_name(effective)
        ));
    }
    ctx.progress(Stage::Layout, Some(mode_name(effective).to_string()));
    let t = Instant::now();
    let layout = run_layout(
        &ctx,
        &g,
        mesh.as_ref(),
        effective,
        payload,
        &sample.original_indices,
        &mut warnings,
    )?;
    timings.insert(Stage::Layout.name().into(), t.elapsed().as_millis() as u64);

    // --- report ---------------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::Report, None);
    let t = Instant::now();
    let bcc = biconnected_components(
        &g,
        BccOptions {
            treat_directed_as_undirected: true,
            self_loops: SelfLoopPolicy::Ignore,
        },
    )?;
    let spqr = spqr_decompose_all(
        &g,
        SpqrOptions { treat_directed_as_undirected: true, ignore_self_loops: true },
    )
    .ok()
    .map(|forest| {
        let mut counts = SpqrCounts { s: 0, p: 0, r: 0, q: 0 };
        let mut nodes = 0;
        for tree in &forest.trees {
            let (s, p, r, q) = tree.counts();
            counts.s += s;
            counts.p += p;
            counts.r += r;
            counts.q += q;
            nodes += tree.nodes.len();
        }
        SpqrInfo { nodes, counts }
    });
    let faces = mesh.as_ref().map(|mesh| {
        let mut sizes: Vec<usize> = (0..mesh.face_count()).map(|f| mesh.face_len(f)).collect();
        sizes.sort_unstable();
        FacesInfo { count: sizes.len(), sizes }
    });
    let report = ReportInfo {
        faces,
        biconnected: BiconnectedInfo {
            blocks: bcc.blocks.len(),
            articulation_points: bcc.articulation_points.len(),
            bridges: bcc.bridges.len(),
        },
        spqr,
    };
    timings.insert(Stage::Report.name().into(), t.elapsed().as_millis() as u64);

    // --- serialize ------------------------------------------------------
    ctx.check()?;
    ctx.progress(Stage::Serialize, None);
    let t = Instant::now();
    let mut layout = layout;
    layout.positions.sort_by_key(|&(v, _)| v);
    layout.clamp();
    let (components, _) = connected_components(&g);
    let max_degree = g.vertices().map(|v| g.degree(v)).max().unwrap_or(0);
    let result = WorkerResult {
        timings_ms: IndexMap::new(), // filled below, after the last timer
        sampled_graph: SampledGraph {
            nodes: sample.nodes.clone(),
            edges: sample.edges.clone(),
            original_node_indices: sample.original_indices.clone(),
        },
        sampled_stats: SampledStats {
            nodes: g.vertex_count(),
            edges: g.edge_count(),
            components,
            max_degree,
        },
        planarity: PlanarityInfo {
            is_planar: planarity.is_planar(),
            embedding_available: embedding.is_some(),
            witness: witness_info.clone(),
        },
        report,
        highlights: Highlights {
            witness_edges: witness_info.map(|w| w.edge_pairs),
            articulation_points: Some(bcc.articulation_points.clone()),
            bridges: Some(bcc.bridges.clone()),
        },
        layout,
        warnings,
    };
    timings.insert(Stage::Serialize.name().into(), t.elapsed().as_millis() as u64);
    let mut result = result;
    result.timings_ms = timings;
    Ok(result)
}

fn mode_name(mode: LayoutMode) -> &'static str {
    match mode {
        LayoutMode::PlanarStraight => "planar-straight",
        LayoutMode::Orthogonal => "orthogonal",
        LayoutMode::PlanarizationStraight => "planarization-straight",
        LayoutMode::PlanarizationOrthogonal => "planarization-orthogonal",
        LayoutMode::RawRelaxation => "raw-relaxation",
    }
}

/// Rewrites the requested mode when planarity forbids it.
fn effective_mode(requested: LayoutMode, is_planar: bool) -> LayoutMode {
    match (requested, is_planar) {
        (LayoutMode::PlanarStraight, false) => LayoutMode::PlanarizationStraight,
        (LayoutMode::Orthogonal, false) => LayoutMode::PlanarizationOrthogonal,
        (LayoutMode::PlanarizationStraight, true) => LayoutMode::PlanarStraight,
        (LayoutMode::PlanarizationOrthogonal, true) => LayoutMode::Orthogonal,
        (mode, _) => mode,
    }
}

/// Dispatches the effective layout mode with the documented fallbacks.
fn run_layout(
    ctx: &Ctx<'_>,
    g: &Graph,
    mesh: Option<&HalfEdgeMesh>,
    effective: LayoutMode,
    payload: &WorkerComputePayload,
    original_indices: &[usize],
    warnings: &mut Vec<String>,
) -> Result<LayoutArtifact> {
    match effective {
        LayoutMode::PlanarStraight => {
            let mesh = mesh.ok_or_else(|| Error::internal("planar mode without a mesh"))?;
            if payload.settings.live_solve {
                live_straight_solver(ctx, g, mesh, payload, original_indices)
            } else {
                planar_straight_line(mesh)
            }
        }
        LayoutMode::Orthogonal => {
            let mesh = mesh.ok_or_else(|| Error::internal("orthogonal mode without a mesh"))?;
            match orthogonal_layout(mesh) {
                Ok(artifact) => Ok(artifact),
                Err(Error::LayoutInfeasible(msg)) => {
                    warn!("orthogonal flow infeasible ({msg}); falling back to straight-line");
                    warnings.push("orthogonal layout infeasible; fell back to straight-line".into());
                    planar_straight_line(mesh)
                }
                Err(err) => Err(err),
            }
        }
        LayoutMode::PlanarizationStraight | LayoutMode::PlanarizationOrthogonal => {
            let mode = if effective == LayoutMode::PlanarizationOrthogonal {
                PlanarizeMode::Orthogonal
            } else {
                PlanarizeMode::Straight
            };
            match planarization_layout(g, mode) {
                Ok(result) => Ok(result.layout),
                Err(Error::LayoutInfeasible(msg)) => {
                    warn!("planarized orthogonal flow infeasible ({msg}); retrying straight");
                    warnings
                        .push("orthogonal layout infeasible; fell back to straight-line".into());
                    Ok(planarization_layout(g, PlanarizeMode::Straight)?.layout)
                }
                Err(Error::PlanarizationFailed(msg)) => {
                    warn!("planarization failed ({msg}); falling back to raw relaxation");
                    warnings.push("planarization failed; fell back to raw relaxation".into());
                    Ok(raw_relaxation_layout(g))
                }
                Err(err) => Err(err),
            }
        }
        LayoutMode::RawRelaxation => Ok(raw_relaxation_layout(g)),
    }
}

/// Boundary-face selection for the live solver: candidates of length >= 3,
/// picked by strategy against a size target of `4 * sqrt(n)` clamped.
fn choose_boundary_face(
    mesh: &HalfEdgeMesh,
    strategy: BoundarySelection,
    sample_size: usize,
    has_geo: bool,
) -> FaceId {
    let mut candidates: Vec<(FaceId, usize)> = (0..mesh.face_count())
        .map(|f| {
            let mut vs = mesh.face_vertices(f);
            vs.sort_unstable();
            vs.dedup();
            (f, vs.len())
        })
        .filter(|&(_, len)| len >= 3)
        .collect();
    if candidates.is_empty() {
        return select_outer_face(mesh, None);
    }
    let target = (4.0 * (sample_size as f64).sqrt())
        .clamp(BOUNDARY_TARGET_LOW, BOUNDARY_TARGET_HIGH);

    // Integer-valued scores keep the choice independent of float summation
    // order; ties always go to the smaller face id.
    candidates.sort_by_key(|&(f, _)| f);
    let score = |len: usize| -> i64 {
        let diff = (len as f64 - target).abs() as i64;
        let oversize = if (len as f64) > 2.0 * target {
            (len as f64 - 2.0 * target) as i64
        } else {
            0
        };
        match strategy {
            BoundarySelection::Largest => -(len as i64),
            BoundarySelection::Small => len as i64,
            BoundarySelection::Medium => diff,
            BoundarySelection::Auto => diff + oversize,
            BoundarySelection::GeoShaped => {
                if has_geo {
                    diff
                } else {
                    diff + oversize
                }
            }
        }
    };
    let mut best = candidates[0];
    for &c in &candidates[1..] {
        if score(c.1) < score(best.1) {
            best = c;
        }
    }
    best.0
}

/// Principal-axis ellipse fit of the sampled geographic coordinates:
/// returns `(center, major axis, minor axis)` as layout-space vectors.
fn fit_ellipse(points: &[(f64, f64)]) -> ((f64, f64), (f64, f64), (f64, f64)) {
    let n = points.len().max(1) as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for &(x, y) in points {
        sxx += (x - cx) * (x - cx);
        sxy += (x - cx) * (y - cy);
        syy += (y - cy) * (y - cy);
    }
    sxx /= n;
    sxy /= n;
    syy /= n;
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let half_trace = (sxx + syy) / 2.0;
    let det_part = (((sxx - syy) / 2.0).powi(2) + sxy * sxy).sqrt();
    let l1 = (half_trace + det_part).max(1e-12).sqrt();
    let l2 = (half_trace - det_part).max(1e-12).sqrt();
    let e1 = (theta.cos(), theta.sin());
    let e2 = (-theta.sin(), theta.cos());
    ((cx, cy), (l1 * e1.0, l1 * e1.1), (l2 * e2.0, l2 * e2.1))
}

/// The streaming relaxation solver: pinned boundary, mixed-position
/// interior updates, paced `positions`/`metric` partials, then a
/// non-streaming convergence pass.
fn live_straight_solver(
    ctx: &Ctx<'_>,
    g: &Graph,
    mesh: &HalfEdgeMesh,
    payload: &WorkerComputePayload,
    original_indices: &[usize],
) -> Result<LayoutArtifact> {
    let n = g.vertex_count();
    let geo = payload.geographic.as_ref().filter(|geo| {
        geo.x.len() == payload.nodes.len() && geo.y.len() == payload.nodes.len()
    });

    let outer = choose_boundary_face(
        mesh,
        payload.settings.boundary_selection,
        n,
        geo.is_some(),
    );

    let mut boundary: Vec<usize> = Vec::new();
    let mut on_boundary = vec![false; n];
    if mesh.face_count() > 0 {
        for v in mesh.face_vertices(outer) {
            if !on_boundary[v] {
                on_boundary[v] = true;
                boundary.push(v);
            }
        }
    }

    let b = boundary.len().max(1) as f64;
    let radius = 2.0 * b;
    let mut pos = vec![Point::new(0.0, 0.0); n];

    // Geographic targets in layout space (sampled vertices map back to the
    // payload through `original_indices`), and an ellipse-shaped boundary
    // when the strategy asks for it.
    let geo_points: Option<Vec<(f64, f64)>> = geo.map(|geo| {
        (0..n)
            .map(|v| {
                let original = original_indices[v];
                (geo.x[original], geo.y[original])
            })
            .collect()
    });
    let targets: Option<Vec<Point>> = geo_points.as_ref().map(|pts| {
        let ((cx, cy), _, _) = fit_ellipse(pts);
        let spread = pts
            .iter()
            .map(|&(x, y)| ((x - cx).abs()).max((y - cy).abs()))
            .fold(1e-12_f64, f64::max);
        pts.iter()
            .map(|&(x, y)| {
                Point::new((x - cx) / spread * radius, (y - cy) / spread * radius)
            })
            .collect()
    });

    let ellipse = if payload.settings.boundary_selection == BoundarySelection::GeoShaped {
        geo_points.as_ref().map(|pts| {
            let (_, major, minor) = fit_ellipse(pts);
            let scale = radius / major.0.hypot(major.1).max(1e-12);
            (major, minor, scale)
        })
    } else {
        None
    };
    for (i, &v) in boundary.iter().enumerate() {
        let angle = std::f64::consts::TAU * i as f64 / b;
        pos[v] = match &ellipse {
            Some((major, minor, scale)) => Point::new(
                (angle.cos() * major.0 + angle.sin() * minor.0) * scale,
                (angle.cos() * major.1 + angle.sin() * minor.1) * scale,
            ),
            None => Point::new(radius * angle.cos(), radius * angle.sin()),
        };
    }

    // Averaging neighbours straight off the sampled graph.
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in g.edges() {
        if e.u != e.v {
            neighbours[e.u].push(e.v);
            neighbours[e.v].push(e.u);
        }
    }
    for list in &mut neighbours {
        list.sort_unstable();
        list.dedup();
    }

    let emissions = (STREAM_ITERATIONS / STREAM_EMIT_EVERY).max(1) as u64;
    let pace_ms = MIN_STREAM_MILLIS / emissions;
    let mut residual = f64::INFINITY;
    let mut iter_counter: u64 = 0;

    for iter in 0..STREAM_ITERATIONS {
        residual = relax_step(&mut pos, &neighbours, &on_boundary, targets.as_deref());
        if (iter + 1) % STREAM_EMIT_EVERY == 0 {
            iter_counter += 1;
            ctx.partial(Partial::Positions {
                positions: (0..n).map(|v| (v, pos[v].x, pos[v].y)).collect(),
                iter: iter_counter,
            });
            ctx.partial(Partial::Metric {
                crossings: straight_crossings(g, &pos),
                residual,
            });
            ctx.pace(pace_ms)?;
        }
    }

    // Non-streaming convergence pass.
    for i in 0..500 {
        if i % 100 == 99 {
            ctx.check()?;
        }
        residual = relax_step(&mut pos, &neighbours, &on_boundary, targets.as_deref());
        if residual < 1e-4 {
            break;
        }
    }

    for p in &mut pos {
        p.x = (p.x * 10.0).round();
        p.y = (p.y * 10.0).round();
    }

    let mut routes = Vec::with_capacity(g.edge_count());
    let mut segments = Vec::with_capacity(g.edge_count());
    for e in g.edges() {
        let (a, b2) = (pos[e.u], pos[e.v]);
        routes.push(EdgeRoute { edge: (e.u, e.v), points: vec![a, b2] });
        segments.push(Segment { u: e.u, v: e.v, a, b: b2 });
    }
    let crossings = count_crossings(&segments);
    let positions: Vec<_> = (0..n).map(|v| (v, pos[v])).collect();
    let bbox = BBox::of(positions.iter().map(|&(_, p)| p));
    Ok(LayoutArtifact {
        mode: LayoutMode::PlanarStraight,
        crossings,
        bends: 0,
        positions,
        edge_routes: routes,
        bbox,
    })
}

/// One weighted relaxation sweep; returns the max L1 delta.
fn relax_step(
    pos: &mut [Point],
    neighbours: &[Vec<usize>],
    pinned: &[bool],
    targets: Option<&[Point]>,
) -> f64 {
    let mut max_delta: f64 = 0.0;
    for v in 0..pos.len() {
        if pinned[v] || neighbours[v].is_empty() {
            continue;
        }
        let mut x = 0.0;
        let mut y = 0.0;
        for &w in &neighbours[v] {
            x += pos[w].x;
            y += pos[w].y;
        }
        let k = neighbours[v].len() as f64;
        let (ax, ay) = (x / k, y / k);
        let (mut nx, mut ny) = (0.2 * pos[v].x + 0.8 * ax, 0.2 * pos[v].y + 0.8 * ay);
        if let Some(t) = targets {
            nx = 0.95 * nx + 0.05 * t[v].x;
            ny = 0.95 * ny + 0.05 * t[v].y;
        }
        max_delta = max_delta.max((nx - pos[v].x).abs() + (ny - pos[v].y).abs());
        pos[v] = Point::new(nx, ny);
    }
    max_delta
}

fn straight_crossings(g: &Graph, pos: &[Point]) -> usize {
    let segments: Vec<Segment> = g
        .edges()
        .iter()
        .filter(|e| e.u != e.v)
        .map(|e| Segment { u: e.u, v: e.v, a: pos[e.u], b: pos[e.v] })
        .collect();
    count_crossings(&segments)
}

/// Last-resort layout without a planarity guarantee: vertices seeded on a
/// circle by id, relaxed toward their neighbour averages with a weak pull
/// back to the seed so the drawing cannot collapse.
fn raw_relaxation_layout(g: &Graph) -> LayoutArtifact {
    let n = g.vertex_count();
    let radius = 2.0 * n.max(1) as f64;
    let seed: Vec<Point> = (0..n)
        .map(|v| {
            let angle = std::f64::consts::TAU * v as f64 / n.max(1) as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    let mut pos = seed.clone();

    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in g.edges() {
        if e.u != e.v {
            neighbours[e.u].push(e.v);
            neighbours[e.v].push(e.u);
        }
    }
    for list in &mut neighbours {
        list.sort_unstable();
        list.dedup();
    }

    for _ in 0..150 {
        for v in 0..n {
            if neighbours[v].is_empty() {
                continue;
            }
            let mut x = 0.0;
            let mut y = 0.0;
            for &w in &neighbours[v] {
                x += pos[w].x;
                y += pos[w].y;
            }
            let k = neighbours[v].len() as f64;
            pos[v] = Point::new(
                0.3 * pos[v].x + 0.6 * (x / k) + 0.1 * seed[v].x,
                0.3 * pos[v].y + 0.6 * (y / k) + 0.1 * seed[v].y,
            );
        }
    }
    for p in &mut pos {
        p.x = (p.x * 10.0).round();
        p.y = (p.y * 10.0).round();
    }

    let mut routes = Vec::with_capacity(g.edge_count());
    let mut segments = Vec::with_capacity(g.edge_count());
    for e in g.edges() {
        if e.u == e.v {
            continue;
        }
        let (a, b) = (pos[e.u], pos[e.v]);
        routes.push(EdgeRoute { edge: (e.u, e.v), points: vec![a, b] });
        segments.push(Segment { u: e.u, v: e.v, a, b });
    }
    let crossings = count_crossings(&segments);
    let positions: Vec<_> = (0..n).map(|v| (v, pos[v])).collect();
    let bbox = BBox::of(positions.iter().map(|&(_, p)| p));
    LayoutArtifact {
        mode: LayoutMode::RawRelaxation,
        crossings,
        bends: 0,
        positions,
        edge_routes: routes,
        bbox,
    }
}
