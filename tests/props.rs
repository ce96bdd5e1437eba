use proptest::prelude::*;

use planegraph::algo::{biconnected_components, tarjan_scc, BccOptions, SelfLoopPolicy};
use planegraph::flow::{solve_min_cost_flow, Arc, MinCostFlowProblem};
use planegraph::graph::{Graph, GraphBuilder};
use planegraph::layout::clamp_coord;
use planegraph::mesh::build_half_edge_mesh;
use planegraph::planarity::{is_planar, test_planarity, PlanarityOptions, SelfLoops};

fn directed_graph(n: usize, edges: &[(usize, usize)]) -> Graph {
    let mut b = GraphBuilder::new();
    for _ in 0..n {
        b.add_vertex(None);
    }
    for &(u, v) in edges {
        b.add_edge(u, v, true).unwrap();
    }
    b.build()
}

proptest! {
    /// The condensation is acyclic: component indices (emitted in
    /// postorder) never increase along a directed edge.
    #[test]
    fn scc_condensation_is_acyclic(
        edges in proptest::collection::vec((0usize..10, 0usize..10), 0..25)
    ) {
        let g = directed_graph(10, &edges);
        let scc = tarjan_scc(&g);
        for &(u, v) in &edges {
            prop_assert!(scc.component_of[u] >= scc.component_of[v]);
        }
        // The partition covers every vertex exactly once.
        let total: usize = scc.components.iter().map(|c| c.len()).sum();
        prop_assert_eq!(total, 10);
    }

    /// Every edge lands in exactly one biconnected block.
    #[test]
    fn bcc_partitions_the_edges(
        edges in proptest::collection::vec((0usize..8, 0usize..8), 0..16)
    ) {
        let g = Graph::from_edge_list(8, &edges).unwrap();
        let bcc = biconnected_components(
            &g,
            BccOptions { self_loops: SelfLoopPolicy::Ignore, ..Default::default() },
        ).unwrap();
        let mut count = vec![0usize; g.edge_count()];
        for block in &bcc.blocks {
            for &e in block {
                count[e] += 1;
            }
        }
        prop_assert!(count.iter().all(|&c| c == 1));
    }

    /// A planar verdict always comes with an embedding that compiles into
    /// a valid mesh; a nonplanar verdict comes with a witness that is
    /// itself nonplanar.
    #[test]
    fn planarity_outcomes_are_sound(
        edges in proptest::collection::vec((0usize..8, 0usize..8), 0..14)
    ) {
        let simple: Vec<(usize, usize)> =
            edges.into_iter().filter(|&(u, v)| u != v).collect();
        let g = Graph::from_edge_list(8, &simple).unwrap();
        let report = test_planarity(&g, PlanarityOptions::default()).unwrap();
        match report.embedding() {
            Some(embedding) => {
                let mesh = build_half_edge_mesh(&g, embedding).unwrap();
                prop_assert!(mesh.validate().is_ok());
            }
            None => {
                let witness = report.witness().unwrap();
                prop_assert!(!witness.edges.is_empty());
                let sub: Vec<(usize, usize)> = witness
                    .edges
                    .iter()
                    .map(|&e| {
                        let edge = g.edge(e).unwrap();
                        (edge.u, edge.v)
                    })
                    .collect();
                let h = Graph::from_edge_list(8, &sub).unwrap();
                prop_assert!(!is_planar(&h, PlanarityOptions::default()).unwrap());
            }
        }
    }

    /// Stripping self-loops never changes the verdict.
    #[test]
    fn self_loops_do_not_affect_planarity(
        edges in proptest::collection::vec((0usize..6, 0usize..6), 0..12)
    ) {
        let with_loops = Graph::from_edge_list(6, &edges).unwrap();
        let without: Vec<(usize, usize)> =
            edges.iter().copied().filter(|&(u, v)| u != v).collect();
        let stripped = Graph::from_edge_list(6, &without).unwrap();
        let opts = PlanarityOptions { self_loops: SelfLoops::Ignore, ..Default::default() };
        prop_assert_eq!(
            is_planar(&with_loops, opts).unwrap(),
            is_planar(&stripped, PlanarityOptions::default()).unwrap()
        );
    }

    /// Clamping a coordinate twice equals clamping once.
    #[test]
    fn clamping_is_idempotent(x in proptest::num::f64::ANY) {
        let once = clamp_coord(x);
        prop_assert_eq!(clamp_coord(once), once);
        prop_assert!(once.is_finite());
    }

    /// A feasible min-cost flow honours arc bounds and node balances.
    #[test]
    fn flow_solutions_are_feasible(
        raw_arcs in proptest::collection::vec(
            (0usize..4, 0usize..4, 0i64..8, 0i64..5),
            1..10
        ),
        supplies in proptest::collection::vec(-4i64..5, 3)
    ) {
        let arcs: Vec<Arc> = raw_arcs
            .iter()
            .map(|&(from, to, upper, cost)| Arc { from, to, lower: 0, upper, cost })
            .collect();
        let mut demands = supplies.clone();
        let balance: i64 = demands.iter().sum();
        demands.push(-balance);
        let problem = MinCostFlowProblem { node_count: 4, arcs, demands: demands.clone() };
        if let Some(solution) = solve_min_cost_flow(&problem).unwrap() {
            let mut net = vec![0i64; 4];
            for (arc, &flow) in problem.arcs.iter().zip(&solution.flows) {
                prop_assert!(flow >= arc.lower && flow <= arc.upper);
                net[arc.from] += flow;
                net[arc.to] -= flow;
            }
            for v in 0..4 {
                prop_assert_eq!(net[v], demands[v]);
            }
        }
    }
}
