//! Little TSP Solver Library
//!
//! Exact solver for small Traveling Salesman instances given as a full
//! directed cost table.
//!
//! # Features
//!
//! - Branch-and-bound with row/column matrix-reduction bounds (Little's algorithm)
//! - Held-Karp dynamic programming baseline used as an oracle
//! - CSV/JSON cost table loading and seeded random instance generation
//! - Benchmarking tools comparing both solvers
//!
//! # Example
//!
//! ```
//! use little_tsp::instance::CostTable;
//! use little_tsp::exact::BranchAndBound;
//!
//! let solver = BranchAndBound::new(CostTable::example());
//! let (length, path) = solver.solve();
//!
//! assert_eq!(length, 110.0);
//! println!("{} via {}", length, path);
//! ```

pub mod benchmark;
pub mod error;
pub mod exact;
pub mod instance;
pub mod solution;

pub use error::{TspError, TspResult};
pub use instance::CostTable;
pub use solution::Solution;
