//! Orthogonal layout: bend counts from a min-cost flow over the face graph,
//! routed as rectilinear polylines.
//!
//! Every face must absorb a fixed rotation (`+4` quarter turns inside,
//! `-4` outside). Vertex corners supply part of it depending on degree; the
//! remainder is shipped between adjacent faces as unit-cost flow, and each
//! unit crossing a primal edge becomes one bend on that edge.

use log::debug;

use crate::error::{Error, Result};
use crate::flow::{solve_min_cost_flow, Arc, MinCostFlowProblem};
use crate::layout::straight::solve_positions;
use crate::layout::{BBox, EdgeRoute, LayoutArtifact, LayoutMode, Point};
use crate::mesh::{select_outer_face, FaceId, HalfEdgeMesh};

/// Capacity of the face-to-face arcs; effectively unbounded.
const ARC_CAPACITY: i64 = 1 << 20;

/// Computes an orthogonal drawing of the embedded graph.
///
/// Fails with [`Error::LayoutInfeasible`] when the angle/bend flow has no
/// solution (the caller is expected to fall back to the straight-line
/// layout).
pub fn orthogonal_layout(mesh: &HalfEdgeMesh) -> Result<LayoutArtifact> {
    let positions = solve_positions(mesh, None);
    let outer = select_outer_face(mesh, None);
    let bends_per_edge = solve_bends(mesh, outer)?;

    let mut routes = Vec::with_capacity(mesh.edge_count());
    let mut total_bends = 0;
    for e in 0..mesh.edge_count() {
        let (u, v) = mesh.edge_endpoints(e);
        let points = route_rectilinear(positions[u], positions[v], bends_per_edge[e]);
        total_bends += points.len().saturating_sub(2);
        routes.push(EdgeRoute { edge: (u, v), points });
    }

    let n = mesh.vertex_count();
    let positions: Vec<_> = (0..n).map(|v| (v, positions[v])).collect();
    let bbox = BBox::of(positions.iter().map(|&(_, p)| p));
    Ok(LayoutArtifact {
        mode: LayoutMode::Orthogonal,
        crossings: 0,
        bends: total_bends,
        positions,
        edge_routes: routes,
        bbox,
    })
}

/// Solves the angle/bend flow and returns the bend count per primal edge.
pub(crate) fn solve_bends(mesh: &HalfEdgeMesh, outer: FaceId) -> Result<Vec<usize>> {
    let nf = mesh.face_count();
    if nf == 0 {
        return Ok(Vec::new());
    }

    // Rotation targets in quarter turns.
    let mut demand = vec![0i64; nf];
    for f in 0..nf {
        demand[f] = if f == outer { -4 } else { 4 };
    }

    // Corner supplies. A vertex of degree d distributes 2d - 4 across its
    // corners: -2 for a pendant, 0/0 or +1/-1 for degree 2, and +1 per
    // corner otherwise with the remainder d - 3 parked on one special
    // corner (the outer one when incident, else the smallest face id).
    let mut degree = vec![0usize; mesh.vertex_count()];
    let mut corners: Vec<Vec<FaceId>> = vec![Vec::new(); mesh.vertex_count()];
    for h in 0..mesh.half_edge_count() {
        let v = mesh.origin(h);
        degree[v] += 1;
        corners[v].push(mesh.face_of(h));
    }
    for v in 0..mesh.vertex_count() {
        let d = degree[v];
        let cs = &corners[v];
        match d {
            0 => {}
            1 => demand[cs[0]] -= -2,
            2 => {
                if let Some(outer_pos) = cs.iter().position(|&f| f == outer) {
                    demand[cs[outer_pos]] -= -1;
                    demand[cs[1 - outer_pos]] -= 1;
                }
                // Interior degree-2 corners are flat on both sides.
            }
            _ => {
                let special = cs
                    .iter()
                    .position(|&f| f == outer)
                    .unwrap_or_else(|| {
                        let mut best = 0;
                        for (i, &f) in cs.iter().enumerate() {
                            if f < cs[best] {
                                best = i;
                            }
                        }
                        best
                    });
                for (i, &f) in cs.iter().enumerate() {
                    let supplied = if i == special { d as i64 - 3 } else { 1 };
                    demand[f] -= supplied;
                }
            }
        }
    }

    // Two opposing unit-cost arcs per primal edge; a bridge borders one
    // face on both sides and carries no arcs.
    let mut arcs = Vec::with_capacity(2 * mesh.edge_count());
    let mut arc_of_edge: Vec<(usize, usize)> = Vec::with_capacity(mesh.edge_count());
    for e in 0..mesh.edge_count() {
        let l = mesh.face_of(2 * e);
        let r = mesh.face_of(2 * e + 1);
        if l == r {
            arc_of_edge.push((usize::MAX, usize::MAX));
            continue;
        }
        let a = arcs.len();
        arcs.push(Arc { from: l, to: r, lower: 0, upper: ARC_CAPACITY, cost: 1 });
        arcs.push(Arc { from: r, to: l, lower: 0, upper: ARC_CAPACITY, cost: 1 });
        arc_of_edge.push((a, a + 1));
    }

    let problem = MinCostFlowProblem { node_count: nf, arcs, demands: demand };
    let solution = solve_min_cost_flow(&problem)?.ok_or_else(|| {
        debug!("orthogonal flow infeasible over {nf} faces");
        Error::LayoutInfeasible("the angle/bend flow has no solution".into())
    })?;

    Ok((0..mesh.edge_count())
        .map(|e| {
            let (a, b) = arc_of_edge[e];
            if a == usize::MAX {
                0
            } else {
                (solution.flows[a] + solution.flows[b]) as usize
            }
        })
        .collect())
}

/// Routes a rectilinear polyline with `bends` corners between two points,
/// alternating horizontal and vertical segments; the first direction is the
/// larger delta. Degenerate zero-length segments are merged away, so the
/// returned polyline may carry fewer corners than requested (and one more
/// when the endpoints are not axis-aligned and zero bends were asked).
pub(crate) fn route_rectilinear(a: Point, b: Point, bends: usize) -> Vec<Point> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx == 0.0 && dy == 0.0 {
        return vec![a, b];
    }
    let horizontal_first = dx.abs() >= dy.abs();
    if bends == 0 {
        if dx == 0.0 || dy == 0.0 {
            return vec![a, b];
        }
        // One geometric corner is unavoidable off-axis.
        let corner = if horizontal_first {
            Point::new(b.x, a.y)
        } else {
            Point::new(a.x, b.y)
        };
        return vec![a, corner, b];
    }

    let segments = bends + 1;
    let h_count = if horizontal_first { (segments + 1) / 2 } else { segments / 2 };
    let v_count = segments - h_count;
    let h_step = if h_count > 0 { dx / h_count as f64 } else { 0.0 };
    let v_step = if v_count > 0 { dy / v_count as f64 } else { 0.0 };

    let mut points = vec![a];
    let mut cur = a;
    let mut horizontal = horizontal_first;
    for _ in 0..segments {
        if horizontal {
            cur = Point::new(cur.x + h_step, cur.y);
        } else {
            cur = Point::new(cur.x, cur.y + v_step);
        }
        points.push(cur);
        horizontal = !horizontal;
    }
    // Snap the numerical tail onto the endpoint.
    *points.last_mut().expect("polyline is non-empty") = b;

    // Merge zero-length segments and collinear runs.
    let mut cleaned: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if let Some(&last) = cleaned.last() {
            if (last.x - p.x).abs() < 1e-9 && (last.y - p.y).abs() < 1e-9 {
                continue;
            }
        }
        if cleaned.len() >= 2 {
            let a2 = cleaned[cleaned.len() - 2];
            let b2 = cleaned[cleaned.len() - 1];
            let collinear = (a2.x == b2.x && b2.x == p.x) || (a2.y == b2.y && b2.y == p.y);
            if collinear {
                cleaned.pop();
            }
        }
        cleaned.push(p);
    }
    cleaned
}
