//! Solution representation shared by the exact solvers.
//!
//! A solution stores the tour as an open city sequence starting at city 0;
//! the hop back to city 0 is implicit in the sequence but written out in
//! the path string.

use crate::exact::decision::{Choice, EdgeDecision};
use crate::instance::{CostTable, FORBIDDEN};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solution to a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of cities starting at 0 (return to 0 implicit)
    pub tour: Vec<usize>,
    /// Total tour length, infinite when no tour exists
    pub cost: f64,
    /// Whether the tour is a Hamiltonian cycle
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of search nodes explored (if applicable)
    pub nodes_explored: Option<usize>,
}

impl Solution {
    /// Create a new empty (infeasible) solution
    pub fn new() -> Self {
        Solution {
            tour: Vec::new(),
            cost: FORBIDDEN,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            nodes_explored: None,
        }
    }

    /// Create a solution from a tour
    pub fn from_tour(table: &CostTable, tour: Vec<usize>, algorithm: &str) -> Self {
        let cost = table.tour_cost(&tour);
        let mut solution = Solution {
            tour,
            cost,
            feasible: false,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            nodes_explored: None,
        };
        solution.feasible = solution.is_complete(table) && cost.is_finite();
        solution
    }

    /// Create a solution by following the included edges from city 0.
    pub fn from_decisions(table: &CostTable, decisions: &[EdgeDecision], algorithm: &str) -> Self {
        if decisions.is_empty() {
            return Solution {
                algorithm: algorithm.to_string(),
                ..Solution::new()
            };
        }

        let mut tour = follow_included(decisions, table.size());
        // the walk ends on the closing city 0 when it gets back to the origin
        if tour.len() > 1 && tour.last() == Some(&0) {
            tour.pop();
        }
        Self::from_tour(table, tour, algorithm)
    }

    /// Check if all cities are visited exactly once, starting at city 0
    pub fn is_complete(&self, table: &CostTable) -> bool {
        if self.tour.len() != table.size() || self.tour[0] != 0 {
            return false;
        }

        let unique: HashSet<usize> = self.tour.iter().cloned().collect();
        unique.len() == table.size() && self.tour.iter().all(|&c| c < table.size())
    }

    /// Format the tour as `"0 -> c1 -> ... -> 0"`; an empty tour is `"0"`.
    pub fn path(&self) -> String {
        if self.tour.is_empty() {
            return "0".to_string();
        }
        let mut path = self.tour[0].to_string();
        for city in self.tour.iter().skip(1).chain(std::iter::once(&self.tour[0])) {
            path.push_str(" -> ");
            path.push_str(&city.to_string());
        }
        path
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(nodes) = self.nodes_explored {
            writeln!(f, "  Nodes explored: {}", nodes)?;
        }
        writeln!(f, "  Path: {}", self.path())
    }
}

/// Walk the included edges from city 0 for at most `size` hops.
///
/// The returned sequence starts with 0 and holds every city reached,
/// including the closing 0 if the walk gets back to the origin. The walk
/// stops early at a city with no outgoing included edge.
pub fn follow_included(decisions: &[EdgeDecision], size: usize) -> Vec<usize> {
    let mut successor = vec![None; size];
    for decision in decisions.iter().filter(|d| d.choice == Choice::Include) {
        if decision.from < size {
            successor[decision.from] = Some(decision.to);
        }
    }

    let mut walk = vec![0];
    let mut current = 0;
    for _ in 0..size {
        match successor[current] {
            Some(next) if next < size => {
                walk.push(next);
                current = next;
                if current == 0 {
                    break;
                }
            }
            _ => break,
        }
    }
    walk
}

/// Path string built directly from a decision sequence.
pub fn path_from_decisions(decisions: &[EdgeDecision], size: usize) -> String {
    follow_included(decisions, size)
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
