//! The left-right planarity criterion on a simple undirected graph.
//!
//! Works on a collapsed "simple view" of the input (parallel edges merged,
//! self-loops stripped by the caller). The three DFS passes (orientation,
//! conflict-pair testing, embedding) all run iteratively with explicit
//! frame stacks.
//!
//! Vertices are `0..n`; edges are indices into the caller's `(u, v)` slice.
//! After orientation every edge has a `src`/`tgt` direction: tree edges
//! point away from the root, back edges point at the ancestor.

/// One side of a conflict pair: a chain of back edges on the stack,
/// addressed by its lowest and highest member.
#[derive(Debug, Clone, Copy, Default)]
struct Interval {
    low: Option<usize>,
    high: Option<usize>,
}

impl Interval {
    fn is_empty(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }
}

/// A pair of edge intervals that must embed on opposite sides of the
/// spine.
#[derive(Debug, Clone, Copy, Default)]
struct ConflictPair {
    l: Interval,
    r: Interval,
}

impl ConflictPair {
    fn swap(&mut self) {
        core::mem::swap(&mut self.l, &mut self.r);
    }
}

/// Result of the check.
pub(crate) enum LrOutcome {
    /// Per-vertex cyclic neighbour order (present when an embedding was
    /// requested).
    Planar(Option<Vec<Vec<usize>>>),
    Nonplanar,
}

struct LeftRight<'a> {
    n: usize,
    edges: &'a [(usize, usize)],
    /// `(edge, to)` per vertex, in input order.
    adj: Vec<Vec<(usize, usize)>>,
    roots: Vec<usize>,

    // Orientation pass.
    height: Vec<usize>,
    parent_edge: Vec<Option<usize>>,
    oriented: Vec<bool>,
    src: Vec<usize>,
    tgt: Vec<usize>,
    lowpt: Vec<usize>,
    lowpt2: Vec<usize>,
    nesting_depth: Vec<i64>,

    // Testing pass.
    s: Vec<ConflictPair>,
    stack_bottom: Vec<usize>,
    lowpt_edge: Vec<Option<usize>>,
    ref_edge: Vec<Option<usize>>,
    side: Vec<i8>,
    /// Out-edges per vertex, ordered by nesting depth.
    ordered: Vec<Vec<usize>>,

    // Embedding pass.
    left_ref: Vec<usize>,
    right_ref: Vec<usize>,
    rotation: Vec<Vec<usize>>,
}

/// Decides planarity of the simple graph `(n, edges)`; when `want_embedding`
/// is set and the graph is planar, also returns a consistent cyclic
/// neighbour order per vertex.
///
/// All orderings are tie-broken by edge index, so identical inputs yield
/// identical embeddings.
pub(crate) fn lr_planarity(
    n: usize,
    edges: &[(usize, usize)],
    want_embedding: bool,
) -> LrOutcome {
    // Euler bound: a simple planar graph on >= 3 vertices has at most
    // 3n - 6 edges.
    if n >= 3 && edges.len() > 3 * n - 6 {
        return LrOutcome::Nonplanar;
    }

    let mut state = LeftRight::new(n, edges);
    state.orient();
    state.order_by_nesting_depth();
    if !state.test() {
        return LrOutcome::Nonplanar;
    }
    if !want_embedding {
        return LrOutcome::Planar(None);
    }
    LrOutcome::Planar(Some(state.embed()))
}

impl<'a> LeftRight<'a> {
    fn new(n: usize, edges: &'a [(usize, usize)]) -> Self {
        let m = edges.len();
        let mut adj: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
        for (e, &(u, v)) in edges.iter().enumerate() {
            debug_assert_ne!(u, v, "self-loops are stripped before the check");
            adj[u].push((e, v));
            adj[v].push((e, u));
        }
        LeftRight {
            n,
            edges,
            adj,
            roots: Vec::new(),
            height: vec![usize::MAX; n],
            parent_edge: vec![None; n],
            oriented: vec![false; m],
            src: vec![usize::MAX; m],
            tgt: vec![usize::MAX; m],
            lowpt: vec![0; m],
            lowpt2: vec![0; m],
            nesting_depth: vec![0; m],
            s: Vec::new(),
            stack_bottom: vec![0; m],
            lowpt_edge: vec![None; m],
            ref_edge: vec![None; m],
            side: vec![1; m],
            ordered: vec![Vec::new(); n],
            left_ref: vec![usize::MAX; n],
            right_ref: vec![usize::MAX; n],
            rotation: Vec::new(),
        }
    }

    /// Pass 1: orient all edges by DFS, computing `lowpt`, `lowpt2` and the
    /// nesting depth used to order the out-lists.
    fn orient(&mut self) {
        let mut frames: Vec<(usize, usize)> = Vec::new();
        for root in 0..self.n {
            if self.height[root] != usize::MAX {
                continue;
            }
            self.height[root] = 0;
            self.roots.push(root);
            frames.push((root, 0));

            while let Some(&mut (v, ref mut iter)) = frames.last_mut() {
                let mut descended = false;
                while *iter < self.adj[v].len() {
                    let (e, w) = self.adj[v][*iter];
                    *iter += 1;
                    if self.oriented[e] {
                        continue;
                    }
                    self.oriented[e] = true;
                    self.src[e] = v;
                    self.tgt[e] = w;
                    self.lowpt[e] = self.height[v];
                    self.lowpt2[e] = self.height[v];
                    if self.height[w] == usize::MAX {
                        // Tree edge; nesting depth is finalized on return.
                        self.parent_edge[w] = Some(e);
                        self.height[w] = self.height[v] + 1;
                        frames.push((w, 0));
                        descended = true;
                        break;
                    } else {
                        // Back edge.
                        self.lowpt[e] = self.height[w];
                        self.finish_orientation(e);
                    }
                }
                if descended {
                    continue;
                }
                frames.pop();
                if let Some(pe) = self.parent_edge[v] {
                    self.finish_orientation(pe);
                }
            }
        }
    }

    /// Computes the nesting depth of `e` and folds its low points into the
    /// parent edge of `src[e]`.
    fn finish_orientation(&mut self, e: usize) {
        let v = self.src[e];
        self.nesting_depth[e] = 2 * self.lowpt[e] as i64
            + if self.lowpt2[e] < self.height[v] { 1 } else { 0 };
        if let Some(pe) = self.parent_edge[v] {
            if self.lowpt[e] < self.lowpt[pe] {
                self.lowpt2[pe] = self.lowpt[pe].min(self.lowpt2[e]);
                self.lowpt[pe] = self.lowpt[e];
            } else if self.lowpt[e] > self.lowpt[pe] {
                self.lowpt2[pe] = self.lowpt2[pe].min(self.lowpt[e]);
            } else {
                self.lowpt2[pe] = self.lowpt2[pe].min(self.lowpt2[e]);
            }
        }
    }

    /// Pass 2: order each vertex's out-edges ascending by nesting depth,
    /// ties by edge index.
    fn order_by_nesting_depth(&mut self) {
        for v in 0..self.n {
            let mut out: Vec<usize> = self.adj[v]
                .iter()
                .filter(|&&(e, _)| self.oriented[e] && self.src[e] == v)
                .map(|&(e, _)| e)
                .collect();
            out.sort_by_key(|&e| (self.nesting_depth[e], e));
            self.ordered[v] = out;
        }
    }

    /// Pass 3: the conflict-pair check. Returns false iff the graph is
    /// nonplanar.
    fn test(&mut self) -> bool {
        struct Frame {
            v: usize,
            iter: usize,
            /// Tree edge we descended into, post-processed on resume.
            pending: Option<usize>,
        }

        let mut frames: Vec<Frame> = Vec::new();
        for r in 0..self.roots.len() {
            let root = self.roots[r];
            frames.push(Frame { v: root, iter: 0, pending: None });

            while let Some(frame) = frames.last_mut() {
                let v = frame.v;
                if let Some(ei) = frame.pending.take() {
                    if !self.handle_return_edges(v, ei) {
                        return false;
                    }
                    // Re-borrow: handle_return_edges does not touch frames.
                    let frame = frames.last_mut().expect("frame still on the stack");
                    frame.iter += 1;
                    continue;
                }
                let mut descended = false;
                while frame.iter < self.ordered[v].len() {
                    let ei = self.ordered[v][frame.iter];
                    let w = self.tgt[ei];
                    self.stack_bottom[ei] = self.s.len();
                    if self.parent_edge[w] == Some(ei) {
                        frame.pending = Some(ei);
                        frames.push(Frame { v: w, iter: 0, pending: None });
                        descended = true;
                        break;
                    } else {
                        self.lowpt_edge[ei] = Some(ei);
                        self.s.push(ConflictPair {
                            l: Interval::default(),
                            r: Interval { low: Some(ei), high: Some(ei) },
                        });
                        if !self.handle_return_edges(v, ei) {
                            return false;
                        }
                        frame.iter += 1;
                    }
                }
                if descended {
                    continue;
                }
                frames.pop();
                if let Some(pe) = self.parent_edge[v] {
                    self.trim_back_edges(pe);
                }
            }
        }
        true
    }

    /// Integrates the constraints of out-edge `ei` of `v` once `ei` (and its
    /// subtree, for a tree edge) has been processed.
    fn handle_return_edges(&mut self, v: usize, ei: usize) -> bool {
        if self.lowpt[ei] < self.height[v] {
            if ei == self.ordered[v][0] {
                if let Some(pe) = self.parent_edge[v] {
                    self.lowpt_edge[pe] = self.lowpt_edge[ei];
                }
            } else {
                let pe = self
                    .parent_edge[v]
                    .expect("an edge with a return edge hangs below a parent");
                if !self.add_constraints(ei, pe) {
                    return false;
                }
            }
        }
        true
    }

    fn conflicting(&self, i: &Interval, b: usize) -> bool {
        match i.high {
            Some(h) => self.lowpt[h] > self.lowpt[b],
            None => false,
        }
    }

    /// Merges the conflict pairs pushed for `ei` into one, then absorbs
    /// earlier siblings' pairs that conflict with `ei`. Returns false iff a
    /// forced swap is impossible (the graph is nonplanar).
    fn add_constraints(&mut self, ei: usize, e: usize) -> bool {
        let mut p = ConflictPair::default();

        // Merge the return edges of ei into p.r.
        loop {
            let mut q = self.s.pop().expect("ei pushed at least one pair");
            if !q.l.is_empty() {
                q.swap();
            }
            if !q.l.is_empty() {
                return false;
            }
            let q_low = q.r.low.expect("a pushed pair has a right side");
            if self.lowpt[q_low] > self.lowpt[e] {
                // Merge intervals.
                match p.r.low {
                    None => p.r.high = q.r.high,
                    Some(low) => self.ref_edge[low] = q.r.high,
                }
                p.r.low = q.r.low;
            } else {
                // Align with the lowest return edge of e.
                self.ref_edge[q_low] = self.lowpt_edge[e];
            }
            if self.s.len() == self.stack_bottom[ei] {
                break;
            }
        }

        // Merge conflicting return edges of e_1 .. e_{i-1} into p.l.
        while let Some(top) = self.s.last() {
            if !(self.conflicting(&top.l, ei) || self.conflicting(&top.r, ei)) {
                break;
            }
            let mut q = self.s.pop().expect("top exists");
            if self.conflicting(&q.r, ei) {
                q.swap();
            }
            if self.conflicting(&q.r, ei) {
                return false;
            }
            // The interval below lowpt(ei) is merged into p.r.
            if let Some(low) = p.r.low {
                self.ref_edge[low] = q.r.high;
            }
            if q.r.low.is_some() {
                p.r.low = q.r.low;
            }
            match p.l.low {
                None => p.l.high = q.l.high,
                Some(low) => self.ref_edge[low] = q.l.high,
            }
            p.l.low = q.l.low;
        }

        if !(p.l.is_empty() && p.r.is_empty()) {
            self.s.push(p);
        }
        true
    }

    fn pair_lowest(&self, p: &ConflictPair) -> usize {
        match (p.l.low, p.r.low) {
            (Some(l), Some(r)) => self.lowpt[l].min(self.lowpt[r]),
            (Some(l), None) => self.lowpt[l],
            (None, Some(r)) => self.lowpt[r],
            (None, None) => unreachable!("empty pairs are never stacked"),
        }
    }

    /// Pops and trims intervals that end at the parent of `e` once that
    /// parent's subtree is complete, then records the reference edge that
    /// decides the side of `e`.
    fn trim_back_edges(&mut self, e: usize) {
        let u = self.src[e];

        // Drop entire conflict pairs returning to u.
        while let Some(top) = self.s.last() {
            if self.pair_lowest(top) != self.height[u] {
                break;
            }
            let p = self.s.pop().expect("top exists");
            if let Some(low) = p.l.low {
                self.side[low] = -1;
            }
        }

        // Trim the topmost remaining pair on both sides.
        if let Some(mut p) = self.s.pop() {
            while let Some(h) = p.l.high {
                if self.tgt[h] == u {
                    p.l.high = self.ref_edge[h];
                } else {
                    break;
                }
            }
            if p.l.high.is_none() {
                if let Some(low) = p.l.low {
                    // Left side just emptied.
                    self.ref_edge[low] = p.r.low;
                    self.side[low] = -1;
                    p.l.low = None;
                }
            }
            while let Some(h) = p.r.high {
                if self.tgt[h] == u {
                    p.r.high = self.ref_edge[h];
                } else {
                    break;
                }
            }
            if p.r.high.is_none() {
                if let Some(low) = p.r.low {
                    self.ref_edge[low] = p.l.low;
                    self.side[low] = -1;
                    p.r.low = None;
                }
            }
            self.s.push(p);
        }

        // The side of e is the side of its highest return edge.
        if self.lowpt[e] < self.height[u] {
            if let Some(top) = self.s.last() {
                let hl = top.l.high;
                let hr = top.r.high;
                self.ref_edge[e] = match (hl, hr) {
                    (Some(l), Some(r)) => {
                        if self.lowpt[l] > self.lowpt[r] {
                            hl
                        } else {
                            hr
                        }
                    }
                    (Some(_), None) => hl,
                    _ => hr,
                };
            }
        }
    }

    /// Resolves the side of `e` by collapsing its reference chain.
    fn resolve_side(&mut self, e: usize) -> i8 {
        let mut chain = vec![e];
        while let Some(r) = self.ref_edge[*chain.last().expect("chain is non-empty")] {
            chain.push(r);
        }
        for i in (0..chain.len().saturating_sub(1)).rev() {
            self.side[chain[i]] *= self.side[chain[i + 1]];
            self.ref_edge[chain[i]] = None;
        }
        self.side[e]
    }

    /// Pass 4 + 5: apply signs to the nesting order and build the cyclic
    /// neighbour order per vertex.
    fn embed(&mut self) -> Vec<Vec<usize>> {
        for e in 0..self.edges.len() {
            if self.oriented[e] {
                let sign = self.resolve_side(e) as i64;
                self.nesting_depth[e] *= sign;
            }
        }
        for v in 0..self.n {
            self.ordered[v].sort_by_key(|&e| (self.nesting_depth[e], e));
        }

        // The initial rotation of v is its ordered out-list; incoming
        // half-edges are spliced in below.
        self.rotation = (0..self.n)
            .map(|v| self.ordered[v].iter().map(|&e| self.tgt[e]).collect())
            .collect();

        let mut frames: Vec<(usize, usize)> = Vec::new();
        for r in 0..self.roots.len() {
            let root = self.roots[r];
            frames.push((root, 0));
            while let Some(&mut (v, ref mut iter)) = frames.last_mut() {
                let mut descended = false;
                while *iter < self.ordered[v].len() {
                    let ei = self.ordered[v][*iter];
                    *iter += 1;
                    let w = self.tgt[ei];
                    if self.parent_edge[w] == Some(ei) {
                        // Tree edge: the parent becomes the first neighbour
                        // of the child and the reference on both sides.
                        self.rotation[w].insert(0, v);
                        self.left_ref[v] = w;
                        self.right_ref[v] = w;
                        frames.push((w, 0));
                        descended = true;
                        break;
                    } else if self.side[ei] == 1 {
                        // Back edge on the right: clockwise of the right
                        // reference at the ancestor.
                        let anchor = self.right_ref[w];
                        let pos = self.rotation[w]
                            .iter()
                            .position(|&x| x == anchor)
                            .expect("right reference is present in the rotation");
                        self.rotation[w].insert(pos + 1, v);
                    } else {
                        let anchor = self.left_ref[w];
                        let pos = self.rotation[w]
                            .iter()
                            .position(|&x| x == anchor)
                            .expect("left reference is present in the rotation");
                        self.rotation[w].insert(pos, v);
                        self.left_ref[w] = v;
                    }
                }
                if !descended {
                    frames.pop();
                }
            }
        }

        core::mem::take(&mut self.rotation)
    }
}
