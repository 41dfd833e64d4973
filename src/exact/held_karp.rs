//! Held-Karp dynamic programming over subsets of visited cities.
//!
//! Used as an independent oracle for the branch-and-bound solver. Memory is
//! `2^n * n` entries, so tables are limited to [`MAX_CITIES`].

use std::time::Instant;

use super::ExactSolver;
use crate::error::{TspError, TspResult};
use crate::instance::{CostTable, FORBIDDEN};
use crate::solution::Solution;

/// Largest table the DP accepts
pub const MAX_CITIES: usize = 16;

/// Memoized completion costs indexed by `(visited set, current city)`.
struct Memo<'a> {
    table: &'a CostTable,
    full: u32,
    costs: Vec<Option<f64>>,
}

impl<'a> Memo<'a> {
    fn new(table: &'a CostTable) -> Self {
        let n = table.size();
        Memo {
            table,
            full: (1u32 << n) - 1,
            costs: vec![None; (1usize << n) * n],
        }
    }

    /// Cheapest way to visit every city outside `visited`, starting at
    /// `current`, then return to city 0.
    fn complete(&mut self, visited: u32, current: usize) -> f64 {
        let n = self.table.size();
        let slot = visited as usize * n + current;
        if let Some(cost) = self.costs[slot] {
            return cost;
        }

        let cost = if visited == self.full {
            self.table.cost(current, 0)
        } else {
            let mut best = FORBIDDEN;
            for next in 0..n {
                if visited & (1 << next) == 0 {
                    let step = self.table.cost(current, next);
                    if step.is_finite() {
                        best = best.min(step + self.complete(visited | (1 << next), next));
                    }
                }
            }
            best
        };

        self.costs[slot] = Some(cost);
        cost
    }

    /// Follow the memoized minima from city 0 to rebuild one optimal tour.
    fn tour(&mut self) -> Vec<usize> {
        let n = self.table.size();
        let mut tour = vec![0];
        let mut visited = 1u32;
        let mut current = 0;

        while visited != self.full {
            let target = self.complete(visited, current);
            let next = (0..n).filter(|&c| visited & (1 << c) == 0).find(|&c| {
                let step = self.table.cost(current, c);
                step.is_finite() && step + self.complete(visited | (1 << c), c) == target
            });
            match next {
                Some(city) => {
                    tour.push(city);
                    visited |= 1 << city;
                    current = city;
                }
                None => return Vec::new(),
            }
        }
        tour
    }
}

fn check_size(table: &CostTable) -> TspResult<()> {
    if table.size() > MAX_CITIES {
        return Err(TspError::TooManyCities {
            solver: "HeldKarp".to_string(),
            size: table.size(),
            max: MAX_CITIES,
        });
    }
    Ok(())
}

/// Optimal tour length from city 0, infinite if no tour exists.
pub fn solve_exact(table: &CostTable) -> TspResult<f64> {
    check_size(table)?;
    Ok(Memo::new(table).complete(1, 0))
}

/// Held-Karp solver producing a full [`Solution`].
#[derive(Debug, Clone, Default)]
pub struct HeldKarp;

impl HeldKarp {
    pub fn new() -> Self {
        HeldKarp
    }

    pub fn solve(&self, table: &CostTable) -> TspResult<Solution> {
        check_size(table)?;
        let start = Instant::now();

        let mut memo = Memo::new(table);
        let value = memo.complete(1, 0);
        let mut solution = if value.is_finite() {
            Solution::from_tour(table, memo.tour(), "HeldKarp")
        } else {
            Solution {
                algorithm: "HeldKarp".to_string(),
                ..Solution::new()
            }
        };
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.nodes_explored = Some(memo.costs.iter().filter(|c| c.is_some()).count());
        Ok(solution)
    }
}

impl ExactSolver for HeldKarp {
    fn name(&self) -> &str {
        "HeldKarp"
    }

    fn solve_table(&self, table: &CostTable) -> TspResult<Solution> {
        self.solve(table)
    }
}
