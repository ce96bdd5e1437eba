//! Rotation systems and the half-edge mesh.
//!
//! A combinatorial embedding is stored per vertex as a cyclic order of
//! `{edge, to}` references ([`RotationSystem`]). Compiling it yields a
//! [`HalfEdgeMesh`]: parallel arrays of length `2·|E|` where edge `e` owns
//! half-edges `2e` (from `u`) and `2e + 1` (from `v`), `twin(h) = h ^ 1`,
//! and `next`/`prev` walk the face on the left of each half-edge.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, VertexId};

/// Identifier of a half-edge: for edge `e`, the pair is `2e` and `2e + 1`.
pub type HalfEdgeId = usize;

/// Dense face identifier into the mesh's face table.
pub type FaceId = usize;

/// One entry of a vertex's cyclic rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationRef {
    pub edge: EdgeId,
    pub to: VertexId,
}

/// Per-vertex cyclic order of outgoing edge references.
pub type RotationSystem = Vec<Vec<RotationRef>>;

/// Copies each vertex's adjacency order verbatim into a rotation system.
pub fn rotation_from_adjacency(g: &Graph) -> RotationSystem {
    g.vertices()
        .map(|v| {
            g.adjacency(v)
                .iter()
                .map(|inc| RotationRef { edge: inc.edge, to: inc.to })
                .collect()
        })
        .collect()
}

/// Health report of a validated mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshReport {
    /// Connected components containing at least one edge.
    pub components: usize,
    pub euler_ok: bool,
    pub face_count: usize,
}

/// A DCEL-style half-edge mesh over an embedded graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfEdgeMesh {
    origin: Vec<VertexId>,
    next: Vec<HalfEdgeId>,
    prev: Vec<HalfEdgeId>,
    face: Vec<FaceId>,
    faces: Vec<Vec<HalfEdgeId>>,
    vertex_count: usize,
}

impl HalfEdgeMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.origin.len() / 2
    }

    pub fn half_edge_count(&self) -> usize {
        self.origin.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The paired half-edge.
    #[inline]
    pub fn twin(&self, h: HalfEdgeId) -> HalfEdgeId {
        h ^ 1
    }

    /// The edge a half-edge belongs to.
    #[inline]
    pub fn edge_of(&self, h: HalfEdgeId) -> EdgeId {
        h >> 1
    }

    /// The vertex at the tail of `h`.
    #[inline]
    pub fn origin(&self, h: HalfEdgeId) -> VertexId {
        self.origin[h]
    }

    /// The vertex at the head of `h`.
    #[inline]
    pub fn target(&self, h: HalfEdgeId) -> VertexId {
        self.origin[h ^ 1]
    }

    /// Next half-edge around the face on the left of `h`.
    #[inline]
    pub fn next(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.next[h]
    }

    /// Previous half-edge around the face on the left of `h`.
    #[inline]
    pub fn prev(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.prev[h]
    }

    /// The face on the left of `h`.
    #[inline]
    pub fn face_of(&self, h: HalfEdgeId) -> FaceId {
        self.face[h]
    }

    /// Endpoints `(u, v)` of edge `e` such that half-edge `2e` leaves `u`.
    pub fn edge_endpoints(&self, e: EdgeId) -> (VertexId, VertexId) {
        (self.origin[2 * e], self.origin[2 * e + 1])
    }

    /// The face table: cyclic half-edge sequences, one per face.
    pub fn faces(&self) -> &[Vec<HalfEdgeId>] {
        &self.faces
    }

    /// The cyclic half-edge sequence of one face.
    pub fn face(&self, f: FaceId) -> &[HalfEdgeId] {
        &self.faces[f]
    }

    /// Number of half-edges bounding face `f`.
    pub fn face_len(&self, f: FaceId) -> usize {
        self.faces[f].len()
    }

    /// The boundary vertices of a face, in cycle order (repeats possible
    /// when the boundary touches a cut vertex twice).
    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        self.faces[f].iter().map(|&h| self.origin[h]).collect()
    }

    /// Walks the face cycle starting at `start` via `next` links.
    pub fn walk_face(&self, start: HalfEdgeId) -> Vec<HalfEdgeId> {
        let mut cycle = vec![start];
        let mut h = self.next[start];
        while h != start {
            cycle.push(h);
            h = self.next[h];
        }
        cycle
    }

    /// Outgoing half-edges of `v` in half-edge id order.
    pub fn half_edges_at(&self, v: VertexId) -> Vec<HalfEdgeId> {
        (0..self.origin.len()).filter(|&h| self.origin[h] == v).collect()
    }

    /// The distinct faces incident to `v`, ascending.
    pub fn faces_at(&self, v: VertexId) -> Vec<FaceId> {
        let mut fs: Vec<FaceId> = self
            .half_edges_at(v)
            .into_iter()
            .map(|h| self.face[h])
            .collect();
        fs.sort_unstable();
        fs.dedup();
        fs
    }

    /// Checks the structural invariants: `twin`/`next`/`prev` involutions,
    /// the face partition, and Euler's formula per connected component that
    /// carries an edge.
    pub fn validate(&self) -> Result<MeshReport> {
        let hn = self.origin.len();
        for h in 0..hn {
            if self.twin(self.twin(h)) != h {
                return Err(Error::internal(format!("twin pairing broken at {h}")));
            }
            if self.next[self.prev[h]] != h || self.prev[self.next[h]] != h {
                return Err(Error::internal(format!("next/prev inverse broken at {h}")));
            }
        }
        let mut seen = vec![false; hn];
        for (f, cycle) in self.faces.iter().enumerate() {
            for &h in cycle {
                if seen[h] {
                    return Err(Error::internal(format!(
                        "half-edge {h} appears in more than one face"
                    )));
                }
                seen[h] = true;
                if self.face[h] != f {
                    return Err(Error::internal(format!(
                        "face table disagrees with face array at {h}"
                    )));
                }
            }
        }
        if seen.iter().any(|&s| !s) {
            return Err(Error::internal("face table does not cover all half-edges"));
        }

        // Euler per component: V - E + F = 2 for every connected component
        // with at least one edge (isolated vertices are skipped).
        let mut comp = vec![usize::MAX; self.vertex_count];
        let mut adj: Vec<SmallVec<[VertexId; 4]>> = vec![SmallVec::new(); self.vertex_count];
        for e in 0..self.edge_count() {
            let (u, v) = self.edge_endpoints(e);
            adj[u].push(v);
            adj[v].push(u);
        }
        let mut components = 0;
        let mut stack = Vec::new();
        for v in 0..self.vertex_count {
            if comp[v] != usize::MAX || adj[v].is_empty() {
                continue;
            }
            comp[v] = components;
            stack.push(v);
            while let Some(x) = stack.pop() {
                for i in 0..adj[x].len() {
                    let w = adj[x][i];
                    if comp[w] == usize::MAX {
                        comp[w] = components;
                        stack.push(w);
                    }
                }
            }
            components += 1;
        }
        let mut v_of = vec![0usize; components];
        let mut e_of = vec![0usize; components];
        let mut f_of = vec![0usize; components];
        for v in 0..self.vertex_count {
            if comp[v] != usize::MAX {
                v_of[comp[v]] += 1;
            }
        }
        for e in 0..self.edge_count() {
            e_of[comp[self.origin[2 * e]]] += 1;
        }
        for cycle in &self.faces {
            f_of[comp[self.origin[cycle[0]]]] += 1;
        }
        let euler_ok = (0..components).all(|c| {
            v_of[c] as i64 - e_of[c] as i64 + f_of[c] as i64 == 2
        });
        if !euler_ok {
            return Err(Error::internal("Euler check failed for a component"));
        }
        Ok(MeshReport {
            components,
            euler_ok,
            face_count: self.faces.len(),
        })
    }
}

/// Compiles a rotation system into a half-edge mesh.
///
/// The rotation must list, for every vertex, exactly the incidences of the
/// graph (same multiset of `(edge, to)` pairs); otherwise the build fails
/// with [`Error::BadRotation`]. Self-loops and directed edges are rejected
/// with [`Error::BadInput`].
pub fn build_half_edge_mesh(g: &Graph, rotation: &RotationSystem) -> Result<HalfEdgeMesh> {
    let n = g.vertex_count();
    let m = g.edge_count();
    if rotation.len() != n {
        return Err(Error::bad_rotation(format!(
            "rotation covers {} vertices, graph has {n}",
            rotation.len()
        )));
    }
    for e in g.edges() {
        if e.is_self_loop() {
            return Err(Error::bad_input(format!(
                "self-loop at vertex {} (edge {}) cannot be meshed",
                e.u, e.id
            )));
        }
        if e.directed {
            return Err(Error::bad_input(format!(
                "directed edge {} cannot be meshed",
                e.id
            )));
        }
    }

    // Multiset check: rotation vs adjacency per vertex.
    for v in 0..n {
        let mut expected: HashMap<(EdgeId, VertexId), usize> = HashMap::new();
        for inc in g.adjacency(v) {
            *expected.entry((inc.edge, inc.to)).or_insert(0) += 1;
        }
        for r in &rotation[v] {
            match expected.get_mut(&(r.edge, r.to)) {
                Some(c) if *c > 0 => *c -= 1,
                _ => {
                    return Err(Error::bad_rotation(format!(
                        "rotation at vertex {v} lists (edge {}, to {}) more often than the graph",
                        r.edge, r.to
                    )));
                }
            }
        }
        if expected.values().any(|&c| c > 0) {
            return Err(Error::bad_rotation(format!(
                "rotation at vertex {v} misses incidences of the graph"
            )));
        }
    }

    let hn = 2 * m;
    let mut origin = vec![usize::MAX; hn];
    for e in g.edges() {
        origin[2 * e.id] = e.u;
        origin[2 * e.id + 1] = e.v;
    }

    let mut next = vec![usize::MAX; hn];
    let mut prev = vec![usize::MAX; hn];
    for (v, refs) in rotation.iter().enumerate() {
        if refs.is_empty() {
            continue;
        }
        let k = refs.len();
        // The half-edge at v for a reference is 2e when v is the stored
        // tail, 2e + 1 otherwise (self-loops were rejected above).
        let half_at = |r: &RotationRef| -> HalfEdgeId {
            let e = g.edge(r.edge).expect("rotation references existing edges");
            if e.u == v {
                2 * r.edge
            } else {
                2 * r.edge + 1
            }
        };
        for i in 0..k {
            let h = half_at(&refs[i]);
            let h_next = half_at(&refs[(i + 1) % k]);
            let t = h ^ 1;
            if next[t] != usize::MAX || prev[h_next] != usize::MAX {
                return Err(Error::bad_rotation(format!(
                    "conflicting face links around vertex {v}"
                )));
            }
            next[t] = h_next;
            prev[h_next] = t;
        }
    }
    if next.iter().any(|&h| h == usize::MAX) || prev.iter().any(|&h| h == usize::MAX) {
        return Err(Error::bad_rotation("rotation leaves dangling half-edges"));
    }

    // Walk the face cycles.
    let mut face = vec![usize::MAX; hn];
    let mut faces: Vec<Vec<HalfEdgeId>> = Vec::new();
    for start in 0..hn {
        if face[start] != usize::MAX {
            continue;
        }
        let f = faces.len();
        let mut cycle = Vec::new();
        let mut h = start;
        loop {
            if cycle.len() > hn {
                return Err(Error::internal(format!(
                    "face walk from {start} did not close within {hn} steps"
                )));
            }
            face[h] = f;
            cycle.push(h);
            h = next[h];
            if h == start {
                break;
            }
        }
        faces.push(cycle);
    }

    Ok(HalfEdgeMesh {
        origin,
        next,
        prev,
        face,
        faces,
        vertex_count: n,
    })
}

/// Picks an outer face: the face maximising signed area when positions are
/// given, otherwise the longest boundary; ties go to the smaller face id.
pub fn select_outer_face(mesh: &HalfEdgeMesh, positions: Option<&[(f64, f64)]>) -> FaceId {
    match positions {
        Some(pos) => {
            let mut best = 0;
            let mut best_area = f64::NEG_INFINITY;
            for f in 0..mesh.face_count() {
                let vs = mesh.face_vertices(f);
                let mut area = 0.0;
                for i in 0..vs.len() {
                    let (x1, y1) = pos[vs[i]];
                    let (x2, y2) = pos[vs[(i + 1) % vs.len()]];
                    area += x1 * y2 - x2 * y1;
                }
                area = area.abs();
                if area > best_area {
                    best_area = area;
                    best = f;
                }
            }
            best
        }
        None => {
            let mut best = 0;
            let mut best_len = 0;
            for f in 0..mesh.face_count() {
                let len = mesh.face_len(f);
                if len > best_len {
                    best_len = len;
                    best = f;
                }
            }
            best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///     2
    ///    / \
    ///   0---1
    /// ```
    fn triangle() -> (Graph, RotationSystem) {
        let g = Graph::from_edge_list(3, &[(0, 1), (1, 2), (2, 0)]).unwrap();
        let rot = rotation_from_adjacency(&g);
        (g, rot)
    }

    #[test]
    fn triangle_has_two_faces() {
        let (g, rot) = triangle();
        let mesh = build_half_edge_mesh(&g, &rot).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn twin_is_xor_one() {
        let (g, rot) = triangle();
        let mesh = build_half_edge_mesh(&g, &rot).unwrap();
        for h in 0..mesh.half_edge_count() {
            assert_eq!(mesh.twin(mesh.twin(h)), h);
            assert_eq!(mesh.twin(h), h ^ 1);
        }
    }

    #[test]
    fn face_walk_closes() {
        let (g, rot) = triangle();
        let mesh = build_half_edge_mesh(&g, &rot).unwrap();
        for f in 0..mesh.face_count() {
            let start = mesh.face(f)[0];
            assert_eq!(mesh.walk_face(start).len(), mesh.face_len(f));
        }
    }

    #[test]
    fn bad_rotation_is_rejected() {
        let (g, mut rot) = triangle();
        rot[0].pop();
        assert!(matches!(
            build_half_edge_mesh(&g, &rot),
            Err(Error::BadRotation(_))
        ));
    }

    #[test]
    fn self_loop_is_rejected() {
        let g = Graph::from_edge_list(2, &[(0, 1), (0, 0)]).unwrap();
        let rot = rotation_from_adjacency(&g);
        assert!(matches!(
            build_half_edge_mesh(&g, &rot),
            Err(Error::BadInput(_))
        ));
    }
}
