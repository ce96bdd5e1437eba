//! Min-cost flow with lower bounds: primal-dual successive shortest paths.
//!
//! Lower bounds are shifted out of the arcs first; a super source and sink
//! absorb the resulting excesses. Potentials are initialised with one
//! Bellman-Ford sweep (bound shifting can leave negative costs) and kept
//! feasible across Dijkstra runs with reduced costs, so every augmentation
//! is a plain nonnegative shortest path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};

/// One arc of the flow network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub from: usize,
    pub to: usize,
    /// Minimum flow on this arc.
    pub lower: i64,
    /// Capacity.
    pub upper: i64,
    /// Cost per unit of flow.
    pub cost: i64,
}

/// A min-cost flow problem. Positive demand is supply, negative is demand.
#[derive(Debug, Clone, Default)]
pub struct MinCostFlowProblem {
    pub node_count: usize,
    pub arcs: Vec<Arc>,
    /// Per-node balance; empty means all zero.
    pub demands: Vec<i64>,
}

/// A feasible minimum-cost flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinCostFlow {
    /// Flow per input arc, honouring the lower bounds.
    pub flows: Vec<i64>,
    pub total_cost: i64,
}

/// Residual arcs are paired: `a ^ 1` is the reverse of `a`.
struct Residual {
    to: Vec<usize>,
    cap: Vec<i64>,
    cost: Vec<i64>,
    /// Outgoing residual arc ids per node, in insertion order.
    head: Vec<Vec<usize>>,
}

impl Residual {
    fn new(nodes: usize) -> Self {
        Residual { to: Vec::new(), cap: Vec::new(), cost: Vec::new(), head: vec![Vec::new(); nodes] }
    }

    fn add(&mut self, from: usize, to: usize, cap: i64, cost: i64) {
        let a = self.to.len();
        self.to.push(to);
        self.cap.push(cap);
        self.cost.push(cost);
        self.head[from].push(a);
        self.to.push(from);
        self.cap.push(0);
        self.cost.push(-cost);
        self.head[to].push(a + 1);
    }
}

/// Solves the problem; `Ok(None)` means the required flow cannot be routed.
///
/// # Errors
/// [`Error::BadInput`] on out-of-range arc endpoints, `lower > upper`, or a
/// demands vector of the wrong length.
///
/// # Example
/// ```rust
/// use planegraph::flow::{solve_min_cost_flow, Arc, MinCostFlowProblem};
///
/// // Two units prefer the cheap path 0 -> 1 -> 3 over 0 -> 2 -> 3.
/// let problem = MinCostFlowProblem {
///     node_count: 4,
///     arcs: vec![
///         Arc { from: 0, to: 1, lower: 0, upper: 5, cost: 1 },
///         Arc { from: 1, to: 3, lower: 0, upper: 5, cost: 1 },
///         Arc { from: 0, to: 2, lower: 0, upper: 5, cost: 4 },
///         Arc { from: 2, to: 3, lower: 0, upper: 5, cost: 4 },
///     ],
///     demands: vec![2, 0, 0, -2],
/// };
/// let solution = solve_min_cost_flow(&problem).unwrap().unwrap();
/// assert_eq!(solution.flows, vec![2, 2, 0, 0]);
/// assert_eq!(solution.total_cost, 4);
/// ```
pub fn solve_min_cost_flow(problem: &MinCostFlowProblem) -> Result<Option<MinCostFlow>> {
    let n = problem.node_count;
    if !problem.demands.is_empty() && problem.demands.len() != n {
        return Err(Error::bad_input(format!(
            "demands vector has length {}, expected {n}",
            problem.demands.len()
        )));
    }
    for (i, a) in problem.arcs.iter().enumerate() {
        if a.from >= n || a.to >= n {
            return Err(Error::bad_input(format!(
                "arc {i} references a node outside 0..{n}"
            )));
        }
        if a.lower > a.upper {
            return Err(Error::bad_input(format!(
                "arc {i} has lower bound {} above capacity {}",
                a.lower, a.upper
            )));
        }
    }

    // Shift lower bounds into node excesses.
    let mut excess = vec![0i64; n];
    for (v, &d) in problem.demands.iter().enumerate() {
        excess[v] = d;
    }
    if excess.iter().sum::<i64>() != 0 {
        return Ok(None);
    }
    for a in &problem.arcs {
        excess[a.from] -= a.lower;
        excess[a.to] += a.lower;
    }

    let source = n;
    let sink = n + 1;
    let mut res = Residual::new(n + 2);
    for a in &problem.arcs {
        res.add(a.from, a.to, a.upper - a.lower, a.cost);
    }
    let mut required = 0i64;
    for v in 0..n {
        if excess[v] > 0 {
            res.add(source, v, excess[v], 0);
            required += excess[v];
        } else if excess[v] < 0 {
            res.add(v, sink, -excess[v], 0);
        }
    }

    const INF: i64 = i64::MAX / 4;
    let nodes = n + 2;

    // Bellman-Ford from the super source tolerates the negative costs left
    // by bound shifting.
    let mut pi = vec![INF; nodes];
    pi[source] = 0;
    for _ in 0..nodes {
        let mut changed = false;
        for a in 0..res.to.len() {
            if res.cap[a] == 0 {
                continue;
            }
            let u = res.to[a ^ 1];
            let v = res.to[a];
            if pi[u] < INF && pi[u] + res.cost[a] < pi[v] {
                pi[v] = pi[u] + res.cost[a];
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut sent = 0i64;
    let mut dist = vec![INF; nodes];
    let mut parent_arc = vec![usize::MAX; nodes];
    while sent < required {
        // Dijkstra with reduced costs.
        dist.iter_mut().for_each(|d| *d = INF);
        parent_arc.iter_mut().for_each(|p| *p = usize::MAX);
        dist[source] = 0;
        let mut heap: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::new();
        heap.push(Reverse((0, source)));
        while let Some(Reverse((d, u))) = heap.pop() {
            if d > dist[u] {
                continue;
            }
            for &a in &res.head[u] {
                if res.cap[a] == 0 {
                    continue;
                }
                let v = res.to[a];
                if pi[u] >= INF || pi[v] >= INF {
                    continue;
                }
                let rc = res.cost[a] + pi[u] - pi[v];
                debug_assert!(rc >= 0, "reduced costs stay nonnegative");
                if d + rc < dist[v] {
                    dist[v] = d + rc;
                    parent_arc[v] = a;
                    heap.push(Reverse((dist[v], v)));
                }
            }
        }
        if dist[sink] >= INF {
            return Ok(None);
        }
        for v in 0..nodes {
            if dist[v] < INF && pi[v] < INF {
                pi[v] += dist[v];
            }
        }
        // Bottleneck along the augmenting path.
        let mut aug = required - sent;
        let mut v = sink;
        while v != source {
            let a = parent_arc[v];
            aug = aug.min(res.cap[a]);
            v = res.to[a ^ 1];
        }
        let mut v = sink;
        while v != source {
            let a = parent_arc[v];
            res.cap[a] -= aug;
            res.cap[a ^ 1] += aug;
            v = res.to[a ^ 1];
        }
        sent += aug;
    }

    // Per-arc flow: spent capacity plus the shifted lower bound.
    let mut flows = Vec::with_capacity(problem.arcs.len());
    let mut total_cost = 0i64;
    for (i, a) in problem.arcs.iter().enumerate() {
        let flow = (a.upper - a.lower - res.cap[2 * i]) + a.lower;
        total_cost += flow * a.cost;
        flows.push(flow);
    }
    Ok(Some(MinCostFlow { flows, total_cost }))
}
