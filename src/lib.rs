//! **planegraph** is a topology-first graph drawing kernel.
//!
//! Given an undirected multigraph it decides planarity, producing either a
//! combinatorial embedding (a rotation system) or a Kuratowski witness
//! (K5 / K3,3 subdivision); compiles embeddings into half-edge meshes with
//! explicit faces; routes new edges through the dual graph; and synthesises
//! coordinate layouts: planar straight-line, orthogonal with bend
//! minimisation via min-cost flow, and planarised drawings of nonplanar
//! inputs with dummy crossing vertices.
//!
//! Ancillary topological analyses (biconnected decomposition, block-cut
//! trees, SPQR trees, st-numbering, bipolar orientation) are exposed both
//! for internal use and as inspectable outputs. The [`pipeline`] module
//! sequences everything behind a deterministic, cancellable, progress-
//! emitting compute worker.
//!
//! ```
//! use planegraph::graph::Graph;
//! use planegraph::mesh::build_half_edge_mesh;
//! use planegraph::planarity::{test_planarity, PlanarityOptions};
//!
//! let g = Graph::from_edge_list(3, &[(0, 1), (1, 2), (2, 0)]).unwrap();
//! let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
//! let embedding = report.embedding().unwrap();
//! let mesh = build_half_edge_mesh(&g, embedding).unwrap();
//! assert_eq!(mesh.face_count(), 2);
//! ```

pub mod algo;
pub mod dual;
pub mod error;
pub mod flow;
pub mod graph;
pub mod layout;
pub mod mesh;
pub mod ordering;
pub mod pipeline;
pub mod planarity;
pub mod spqr;

pub use error::{Error, Result};
pub use graph::{EdgeId, Graph, GraphBuilder, VertexId};
pub use mesh::{build_half_edge_mesh, rotation_from_adjacency, HalfEdgeMesh, RotationSystem};
pub use planarity::{test_planarity, Planarity, PlanarityOptions, PlanarityReport};

/// Commonly used items.
pub mod prelude {
    pub use crate::algo::{biconnected_components, build_bc_tree, tarjan_scc};
    pub use crate::dual::{route_edge_fixed_embedding, route_edge_on_graph, DualGraph};
    pub use crate::error::{Error, Result};
    pub use crate::flow::solve_min_cost_flow;
    pub use crate::graph::{Graph, GraphBuilder};
    pub use crate::layout::{
        orthogonal_layout, planar_straight_line, planarization_layout, LayoutArtifact,
    };
    pub use crate::mesh::{build_half_edge_mesh, rotation_from_adjacency, HalfEdgeMesh};
    pub use crate::ordering::{bipolar_orientation, st_numbering};
    pub use crate::pipeline::{compute_worker_result, handle_message, CancellationRegistry};
    pub use crate::planarity::{test_planarity, PlanarityOptions};
    pub use crate::spqr::{spqr_decompose, spqr_decompose_all, spqr_decompose_safe};
}
