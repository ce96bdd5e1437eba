//! The graph container: a labelled undirected/mixed multigraph with stable,
//! insertion-ordered incidence lists.
//!
//! [`Graph`] is immutable once built; construction goes through
//! [`GraphBuilder`] or one of the adapters ([`Graph::from_edge_list`],
//! [`Graph::from_adjacency_list`], [`Graph::from_json`]). Every observer
//! iterates edges and incidences in insertion order, so two graphs built
//! from the same edge list in the same order are observationally identical.
//!
//! Multi-edges and self-loops are allowed at this layer. Downstream stages
//! (planarity, mesh construction) reject or strip them according to their
//! own options.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dense non-negative vertex identifier, stable within one graph value.
pub type VertexId = usize;

/// Dense non-negative edge identifier, assigned in insertion order.
pub type EdgeId = usize;

/// An optional per-vertex label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Number(f64),
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

impl From<f64> for Label {
    fn from(n: f64) -> Self {
        Label::Number(n)
    }
}

/// Direction of an incidence record relative to its vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    Out,
    In,
    Undirected,
}

/// One entry of a vertex's incidence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incidence {
    /// The incident edge.
    pub edge: EdgeId,
    /// The opposite endpoint (equal to the vertex itself for a self-loop).
    pub to: VertexId,
    /// How the edge leaves or enters this vertex.
    pub dir: Dir,
}

/// One stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub u: VertexId,
    pub v: VertexId,
    pub directed: bool,
}

impl EdgeRecord {
    /// The endpoint opposite to `v`; `v` itself for a self-loop.
    pub fn opposite(&self, v: VertexId) -> VertexId {
        if v == self.u {
            self.v
        } else {
            self.u
        }
    }

    /// Whether this edge is a self-loop.
    pub fn is_self_loop(&self) -> bool {
        self.u == self.v
    }
}

/// An immutable labelled multigraph.
///
/// Invariants upheld by construction:
/// * every edge contributes exactly two incidence records (both on the same
///   vertex for a self-loop);
/// * incidence lists are never reordered after insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    labels: Vec<Option<Label>>,
    edges: Vec<EdgeRecord>,
    adjacency: Vec<Vec<Incidence>>,
}

/// Builder for [`Graph`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    labels: Vec<Option<Label>>,
    edges: Vec<EdgeRecord>,
    adjacency: Vec<Vec<Incidence>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates for `vertices` vertices and `edges` edges.
    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        GraphBuilder {
            labels: Vec::with_capacity(vertices),
            edges: Vec::with_capacity(edges),
            adjacency: Vec::with_capacity(vertices),
        }
    }

    /// Adds a vertex, returning its id.
    pub fn add_vertex(&mut self, label: Option<Label>) -> VertexId {
        let id = self.labels.len();
        self.labels.push(label);
        self.adjacency.push(Vec::new());
        id
    }

    /// Adds an edge between existing vertices, returning its id.
    ///
    /// Fails with [`Error::BadInput`] when either endpoint does not exist.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId, directed: bool) -> Result<EdgeId> {
        let n = self.labels.len();
        if u >= n || v >= n {
            return Err(Error::bad_input(format!(
                "edge ({u}, {v}) references a vertex outside 0..{n}"
            )));
        }
        let id = self.edges.len();
        self.edges.push(EdgeRecord { id, u, v, directed });
        if u == v {
            // A self-loop contributes two records on the same vertex.
            let dir = if directed { Dir::Out } else { Dir::Undirected };
            self.adjacency[u].push(Incidence { edge: id, to: u, dir });
            let dir = if directed { Dir::In } else { Dir::Undirected };
            self.adjacency[u].push(Incidence { edge: id, to: u, dir });
        } else if directed {
            self.adjacency[u].push(Incidence { edge: id, to: v, dir: Dir::Out });
            self.adjacency[v].push(Incidence { edge: id, to: u, dir: Dir::In });
        } else {
            self.adjacency[u].push(Incidence { edge: id, to: v, dir: Dir::Undirected });
            self.adjacency[v].push(Incidence { edge: id, to: u, dir: Dir::Undirected });
        }
        Ok(id)
    }

    /// Finishes construction. The emitted graph is immutable.
    pub fn build(self) -> Graph {
        Graph {
            labels: self.labels,
            edges: self.edges,
            adjacency: self.adjacency,
        }
    }
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        GraphBuilder::new().build()
    }

    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterator over all vertex ids in increasing order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        0..self.labels.len()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// The edge with the given id, if any.
    pub fn edge(&self, id: EdgeId) -> Option<&EdgeRecord> {
        self.edges.get(id)
    }

    /// The label of a vertex.
    pub fn label(&self, v: VertexId) -> Option<&Label> {
        self.labels.get(v).and_then(|l| l.as_ref())
    }

    /// The incidence list of `v` in insertion order.
    pub fn adjacency(&self, v: VertexId) -> &[Incidence] {
        &self.adjacency[v]
    }

    /// Opposite endpoints of all edges at `v`, in insertion order.
    ///
    /// A self-loop yields `v` twice; a parallel edge yields its endpoint once
    /// per copy.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.adjacency[v].iter().map(|inc| inc.to)
    }

    /// Incidences leaving `v`: directed-out and undirected records.
    pub fn out_edges(&self, v: VertexId) -> impl Iterator<Item = &Incidence> + '_ {
        self.adjacency[v]
            .iter()
            .filter(|inc| inc.dir != Dir::In)
    }

    /// Incidences entering `v`: directed-in and undirected records.
    pub fn in_edges(&self, v: VertexId) -> impl Iterator<Item = &Incidence> + '_ {
        self.adjacency[v]
            .iter()
            .filter(|inc| inc.dir != Dir::Out)
    }

    /// Number of incidence records at `v` (a self-loop counts twice).
    pub fn degree(&self, v: VertexId) -> usize {
        self.adjacency[v].len()
    }

    /// Whether any edge connects `u` and `v` (in either direction).
    pub fn has_edge_between(&self, u: VertexId, v: VertexId) -> bool {
        if u >= self.vertex_count() || v >= self.vertex_count() {
            return false;
        }
        self.adjacency[u].iter().any(|inc| inc.to == v)
    }

    /// Whether any edge of the graph carries a direction flag.
    pub fn has_directed_edges(&self) -> bool {
        self.edges.iter().any(|e| e.directed)
    }

    /// Whether any edge of the graph is a self-loop.
    pub fn has_self_loops(&self) -> bool {
        self.edges.iter().any(|e| e.is_self_loop())
    }

    /// Builds an undirected graph from `(u, v)` pairs over `vertex_count`
    /// unlabelled vertices.
    pub fn from_edge_list(vertex_count: usize, edges: &[(VertexId, VertexId)]) -> Result<Graph> {
        let mut b = GraphBuilder::with_capacity(vertex_count, edges.len());
        for _ in 0..vertex_count {
            b.add_vertex(None);
        }
        for &(u, v) in edges {
            b.add_edge(u, v, false)?;
        }
        Ok(b.build())
    }

    /// Builds an undirected graph from symmetric adjacency lists.
    ///
    /// Each edge `{u, v}` with `u != v` must appear in both `adj[u]` and
    /// `adj[v]` the same number of times; a self-loop appears twice in its
    /// own list. Asymmetric input fails with [`Error::BadInput`].
    pub fn from_adjacency_list(adj: &[Vec<VertexId>]) -> Result<Graph> {
        let n = adj.len();
        let mut b = GraphBuilder::with_capacity(n, 0);
        for _ in 0..n {
            b.add_vertex(None);
        }
        for (u, list) in adj.iter().enumerate() {
            let mut loops = 0usize;
            for &v in list {
                if v >= n {
                    return Err(Error::bad_input(format!(
                        "adjacency of {u} references vertex {v} outside 0..{n}"
                    )));
                }
                if v == u {
                    loops += 1;
                } else if u < v {
                    b.add_edge(u, v, false)?;
                }
            }
            if loops % 2 != 0 {
                return Err(Error::bad_input(format!(
                    "self-loop at {u} listed an odd number of times"
                )));
            }
            for _ in 0..loops / 2 {
                b.add_edge(u, u, false)?;
            }
        }
        // Symmetry check: multiset of (u, v) pairs must match in both lists.
        let built = b.build();
        for (u, list) in adj.iter().enumerate() {
            for &v in list {
                if v > u {
                    let forward = list.iter().filter(|&&w| w == v).count();
                    let backward = adj[v].iter().filter(|&&w| w == u).count();
                    if forward != backward {
                        return Err(Error::bad_input(format!(
                            "adjacency lists disagree on edge ({u}, {v}): \
                             {forward} forward vs {backward} backward"
                        )));
                    }
                }
            }
        }
        Ok(built)
    }

    /// The `(u, v)` endpoint pairs of all edges, in insertion order.
    pub fn to_edge_list(&self) -> Vec<(VertexId, VertexId)> {
        self.edges.iter().map(|e| (e.u, e.v)).collect()
    }

    /// Symmetric adjacency lists (insertion order per vertex).
    pub fn to_adjacency_list(&self) -> Vec<Vec<VertexId>> {
        self.adjacency
            .iter()
            .map(|list| list.iter().map(|inc| inc.to).collect())
            .collect()
    }

    /// Serialises the graph to its JSON shape.
    pub fn to_json(&self) -> serde_json::Value {
        let repr = GraphJson {
            nodes: self.labels.clone(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeJson { u: e.u, v: e.v, directed: e.directed })
                .collect(),
        };
        serde_json::to_value(repr).expect("graph JSON shape is always serialisable")
    }

    /// Reconstructs a graph from the shape emitted by [`Graph::to_json`].
    pub fn from_json(value: &serde_json::Value) -> Result<Graph> {
        let repr: GraphJson = serde_json::from_value(value.clone())
            .map_err(|err| Error::bad_input(format!("malformed graph JSON: {err}")))?;
        let mut b = GraphBuilder::with_capacity(repr.nodes.len(), repr.edges.len());
        for label in repr.nodes {
            b.add_vertex(label);
        }
        for e in repr.edges {
            b.add_edge(e.u, e.v, e.directed)?;
        }
        Ok(b.build())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

#[derive(Serialize, Deserialize)]
struct GraphJson {
    nodes: Vec<Option<Label>>,
    edges: Vec<EdgeJson>,
}

#[derive(Serialize, Deserialize)]
struct EdgeJson {
    u: VertexId,
    v: VertexId,
    directed: bool,
}
