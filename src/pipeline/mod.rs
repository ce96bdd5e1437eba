//! The compute pipeline: message protocol, cancellation registry, input
//! sampling and the staged worker.
//!
//! The worker is synchronous and cooperative; it emits [`WorkerMessage`]s
//! on a channel and checks the shared cancellation registry at every
//! suspension point. Running it on a thread behind a channel pair gives
//! the background-worker shape; calling it inline gives the same results.

pub mod sample;
pub mod worker;

pub use sample::{bfs_sample, Sample};
pub use worker::{
    compute_worker_result, handle_message, HARD_EDGE_CAP, HARD_NODE_CAP, MIN_STREAM_MILLIS,
};

use std::sync::{Arc, Mutex};

use hashbrown::HashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutArtifact, LayoutMode};

/// Identifies one compute request on the channel.
pub type RequestId = String;

/// Process-wide registry of cancelled request ids.
///
/// The control side only ever adds ids; the compute side only checks
/// membership. An id leaves the registry when its request finishes (result
/// or error delivered).
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    inner: Arc<Mutex<HashSet<RequestId>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a request as cancelled.
    pub fn cancel(&self, request_id: &str) {
        self.inner
            .lock()
            .expect("cancellation registry lock is never poisoned")
            .insert(request_id.to_string());
    }

    /// Membership check used by the compute task.
    pub fn is_cancelled(&self, request_id: &str) -> bool {
        self.inner
            .lock()
            .expect("cancellation registry lock is never poisoned")
            .contains(request_id)
    }

    /// Removes a finished request.
    pub fn clear(&self, request_id: &str) {
        self.inner
            .lock()
            .expect("cancellation registry lock is never poisoned")
            .remove(request_id);
    }
}

/// Messages from the host to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestMessage {
    #[serde(rename_all = "camelCase")]
    Compute {
        request_id: RequestId,
        payload: WorkerComputePayload,
    },
    #[serde(rename_all = "camelCase")]
    Cancel { request_id: RequestId },
}

/// Messages from the worker to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    #[serde(rename_all = "camelCase")]
    Progress {
        request_id: RequestId,
        stage: Stage,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Partial {
        request_id: RequestId,
        partial: Partial,
    },
    #[serde(rename_all = "camelCase")]
    Result {
        request_id: RequestId,
        result: Box<WorkerResult>,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        request_id: RequestId,
        error: ErrorPayload,
    },
}

/// The fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "sample")]
    Sample,
    #[serde(rename = "build-graph")]
    BuildGraph,
    #[serde(rename = "planarity")]
    Planarity,
    #[serde(rename = "embedding")]
    Embedding,
    #[serde(rename = "mesh")]
    Mesh,
    #[serde(rename = "layout")]
    Layout,
    #[serde(rename = "report")]
    Report,
    #[serde(rename = "serialize")]
    Serialize,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Sample => "sample",
            Stage::BuildGraph => "build-graph",
            Stage::Planarity => "planarity",
            Stage::Embedding => "embedding",
            Stage::Mesh => "mesh",
            Stage::Layout => "layout",
            Stage::Report => "report",
            Stage::Serialize => "serialize",
        }
    }
}

/// Streamed partial results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Partial {
    #[serde(rename_all = "camelCase")]
    SampleVisited {
        /// Original vertex ids visited so far.
        visited: Vec<usize>,
    },
    #[serde(rename_all = "camelCase")]
    Witness {
        witness_kind: WitnessKindWire,
        /// Endpoint pairs, normalised `u < v` and sorted lexicographically.
        edges: Vec<(usize, usize)>,
    },
    #[serde(rename_all = "camelCase")]
    Faces {
        /// Face sizes, ascending.
        face_sizes: Vec<usize>,
    },
    #[serde(rename_all = "camelCase")]
    Positions {
        /// `[id, x, y]` triples sorted by id.
        positions: Vec<(usize, f64, f64)>,
        /// Monotonically increasing within one layout stage.
        iter: u64,
    },
    #[serde(rename_all = "camelCase")]
    Metric { crossings: usize, residual: f64 },
}

/// Witness kind on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WitnessKindWire {
    K5,
    K33,
    #[serde(rename = "unknown")]
    Unknown,
}

/// The error payload of a terminal error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Boundary-face selection strategies for the live solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BoundarySelection {
    #[default]
    Auto,
    Largest,
    Medium,
    Small,
    GeoShaped,
}

/// Per-request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeSettings {
    pub mode: LayoutMode,
    pub boundary_selection: BoundarySelection,
    pub max_nodes: usize,
    pub max_edges: usize,
    pub seed: u64,
    pub show_witness: bool,
    #[serde(default)]
    pub live_solve: bool,
}

/// Optional per-node geographic coordinates carried by a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geographic {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// The compute request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerComputePayload {
    pub dataset_id: String,
    pub sample_id: String,
    /// Vertex labels.
    pub nodes: Vec<String>,
    /// Vertex id pairs.
    pub edges: Vec<(usize, usize)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic: Option<Geographic>,
    pub settings: ComputeSettings,
}

/// The dataset file shape the sampler consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFile {
    pub meta: DatasetMeta,
    pub nodes: Vec<String>,
    /// `u < v`, lexicographically sorted, deduplicated, no self-loops.
    pub edges: Vec<(usize, usize)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<DatasetExtras>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    pub id: String,
    pub name: String,
    pub source_url: String,
    pub license_name: String,
    pub license_url: String,
    pub attribution: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic: Option<Geographic>,
}

impl DatasetFile {
    /// Checks the edge-list contract of the file shape.
    pub fn validate(&self) -> crate::error::Result<()> {
        let n = self.nodes.len();
        let mut prev: Option<(usize, usize)> = None;
        for &(u, v) in &self.edges {
            if u >= n || v >= n {
                return Err(crate::error::Error::bad_input(format!(
                    "dataset edge ({u}, {v}) outside 0..{n}"
                )));
            }
            if u >= v {
                return Err(crate::error::Error::bad_input(format!(
                    "dataset edge ({u}, {v}) is not normalised u < v"
                )));
            }
            if let Some(p) = prev {
                if p >= (u, v) {
                    return Err(crate::error::Error::bad_input(
                        "dataset edges are not sorted and deduplicated",
                    ));
                }
            }
            prev = Some((u, v));
        }
        if let Some(geo) = self.extras.as_ref().and_then(|e| e.geographic.as_ref()) {
            if geo.x.len() != n || geo.y.len() != n {
                return Err(crate::error::Error::bad_input(
                    "geographic arrays do not match the node count",
                ));
            }
        }
        Ok(())
    }
}

/// The sampled graph echoed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<(usize, usize)>,
    /// `original_node_indices[sampled] = original`.
    pub original_node_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledStats {
    pub nodes: usize,
    pub edges: usize,
    pub components: usize,
    pub max_degree: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessInfo {
    pub kind: WitnessKindWire,
    /// Endpoint pairs in sampled ids, normalised and sorted.
    pub edge_pairs: Vec<(usize, usize)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_ids: Option<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanarityInfo {
    pub is_planar: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<WitnessInfo>,
    pub embedding_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacesInfo {
    pub count: usize,
    /// Ascending.
    pub sizes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiconnectedInfo {
    pub blocks: usize,
    pub articulation_points: usize,
    pub bridges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpqrCounts {
    #[serde(rename = "S")]
    pub s: usize,
    #[serde(rename = "P")]
    pub p: usize,
    #[serde(rename = "R")]
    pub r: usize,
    #[serde(rename = "Q")]
    pub q: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpqrInfo {
    pub nodes: usize,
    pub counts: SpqrCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces: Option<FacesInfo>,
    pub biconnected: BiconnectedInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spqr: Option<SpqrInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness_edges: Option<Vec<(usize, usize)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articulation_points: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridges: Option<Vec<usize>>,
}

/// The terminal result of one compute request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResult {
    /// Wall-clock milliseconds per stage, in stage order.
    pub timings_ms: IndexMap<String, u64>,
    pub sampled_graph: SampledGraph,
    pub sampled_stats: SampledStats,
    pub planarity: PlanarityInfo,
    pub report: ReportInfo,
    pub layout: LayoutArtifact,
    pub highlights: Highlights,
    /// Non-fatal degradations (input clamping, layout fallbacks).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
