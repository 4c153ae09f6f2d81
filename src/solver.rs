//! Single-vehicle tour construction.
//!
//! The first solution comes from a path-cheapest-arc walk: start at the depot
//! (node 0) and repeatedly extend the path along the cheapest arc to an
//! unvisited node, then close the tour back at the depot. Costs are integer
//! meters. An optional 2-opt pass can tighten the result afterwards.

use serde::Serialize;
use tracing::{debug, warn};

use crate::haversine::DistanceMatrix;

/// Depot node index. Always the pickup address.
pub const DEPOT: usize = 0;

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Maximum 2-opt improvement rounds. Zero keeps the constructive tour.
    pub local_search_iterations: usize,
}

/// A closed tour: starts and ends at [`DEPOT`], every other node exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tour {
    nodes: Vec<usize>,
}

impl Tour {
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consecutive (from, to) node pairs.
    pub fn legs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Sum of leg distances in kilometers, unrounded.
    pub fn distance_km(&self, matrix: &DistanceMatrix) -> f64 {
        self.legs().map(|(from, to)| matrix.get(from, to)).sum()
    }
}

/// Builds a depot-anchored tour over `matrix`.
///
/// Returns `None` for fewer than 2 nodes or a non-square matrix.
pub fn solve(matrix: &DistanceMatrix, options: &SolveOptions) -> Option<Tour> {
    let n = matrix.len();
    if n < 2 {
        warn!(nodes = n, "solve called with fewer than 2 nodes");
        return None;
    }

    let costs = matrix.to_meters();
    if costs.iter().any(|row| row.len() != n) {
        warn!(nodes = n, "solve called with a non-square matrix");
        return None;
    }

    let Some(mut nodes) = path_cheapest_arc(&costs) else {
        warn!(nodes = n, "no tour found");
        return None;
    };

    if options.local_search_iterations > 0 {
        local_search(&mut nodes, &costs, options.local_search_iterations);
    }

    debug!(tour = ?nodes, cost_m = tour_cost(&nodes, &costs), "tour built");
    Some(Tour { nodes })
}

/// Greedy path extension from the depot. Ties go to the lower node index.
fn path_cheapest_arc(costs: &[Vec<i64>]) -> Option<Vec<usize>> {
    let n = costs.len();
    let mut visited = vec![false; n];
    let mut route = Vec::with_capacity(n + 1);

    visited[DEPOT] = true;
    route.push(DEPOT);
    let mut current = DEPOT;

    for _ in 1..n {
        let next = (0..n)
            .filter(|&node| !visited[node])
            .min_by_key(|&node| (costs[current][node], node))?;
        visited[next] = true;
        route.push(next);
        current = next;
    }

    route.push(DEPOT);
    Some(route)
}

fn tour_cost(nodes: &[usize], costs: &[Vec<i64>]) -> i64 {
    nodes.windows(2).map(|pair| costs[pair[0]][pair[1]]).sum()
}

// ============================================================================
// Local Search
// ============================================================================

/// 2-opt: Reverse an interior segment to reduce tour cost.
/// The depot at both ends never moves. Returns true if an improvement was made.
fn two_opt_improve(nodes: &mut [usize], costs: &[Vec<i64>]) -> bool {
    // Interior positions are 1..=last, the closing depot sits at last + 1.
    let last = nodes.len().saturating_sub(2);
    if last < 2 {
        return false;
    }

    let current_cost = tour_cost(nodes, costs);

    for i in 1..last {
        for j in i + 1..=last {
            let mut candidate = nodes.to_vec();
            candidate[i..=j].reverse();

            if tour_cost(&candidate, costs) < current_cost {
                nodes[i..=j].reverse();
                return true;
            }
        }
    }

    false
}

/// Run 2-opt until no more improvements or max iterations reached.
fn local_search(nodes: &mut [usize], costs: &[Vec<i64>], iterations: usize) {
    for _ in 0..iterations {
        if !two_opt_improve(nodes, costs) {
            break;
        }
    }
}
