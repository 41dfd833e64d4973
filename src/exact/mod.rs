//! Exact solvers module.
//!
//! The branch-and-bound solver is the main entry point; the Held-Karp DP
//! is kept as an independent oracle for checking its results.

pub mod branch_and_bound;
pub mod decision;
pub mod held_karp;
pub mod reduction;

pub use branch_and_bound::{
    is_hamiltonian_cycle, BranchAndBound, BranchAndBoundConfig, BranchAndBoundSolver,
    SearchOutcome, SearchStats,
};
pub use decision::{Choice, EdgeDecision};
pub use held_karp::{solve_exact, HeldKarp};
pub use reduction::{reduce, Reduction, WorkingTable};

use crate::error::TspResult;
use crate::instance::CostTable;
use crate::solution::Solution;

/// An algorithm that returns a proven optimal tour for a cost table.
pub trait ExactSolver {
    fn name(&self) -> &str;
    fn solve_table(&self, table: &CostTable) -> TspResult<Solution>;
}
