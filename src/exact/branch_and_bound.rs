//! Little's branch-and-bound for the TSP.
//!
//! The search keeps two lists: `pending` holds decision sequences that
//! have not been bounded yet, `scored` holds bounded search nodes waiting
//! to be expanded. Each round prunes `scored` against the incumbent,
//! bounds everything in `pending` (pushing the new nodes at the front of
//! `scored`) and then expands the better of the two frontmost scored nodes.
//!
//! Expanding a node either branches on its cheapest open edge (one child
//! includes it, the other excludes it) or, once only a 2×2 table is left,
//! completes the tour and checks that it is a single cycle through every
//! city.

use std::collections::VecDeque;
use std::time::Instant;

use super::decision::{DecisionArena, DecisionPath, EdgeDecision};
use super::reduction::{reduce, Reduction, WorkingTable};
use super::ExactSolver;
use crate::error::TspResult;
use crate::instance::{CostTable, FORBIDDEN};
use crate::solution::{follow_included, path_from_decisions, Solution};

/// Branch-and-bound configuration
#[derive(Debug, Clone)]
pub struct BranchAndBoundConfig {
    /// Drop scored nodes whose bound is not below the incumbent
    pub prune: bool,
    /// Log a summary when the search finishes
    pub verbose: bool,
}

impl Default for BranchAndBoundConfig {
    fn default() -> Self {
        BranchAndBoundConfig {
            prune: true,
            verbose: false,
        }
    }
}

/// A bounded node of the search tree. Owns its working table.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub path: DecisionPath,
    /// Table after the node's decisions, before reduction
    pub table: WorkingTable,
    /// Lower bound on every tour extending the node's decisions
    pub bound: f64,
}

/// Best tour found so far
#[derive(Debug, Clone)]
pub struct BestSolution {
    pub value: f64,
    pub decisions: Vec<EdgeDecision>,
}

impl Default for BestSolution {
    fn default() -> Self {
        BestSolution {
            value: FORBIDDEN,
            decisions: Vec::new(),
        }
    }
}

/// Counters collected during one search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Decision sequences run through the reduction
    pub nodes_scored: usize,
    /// Nodes taken from the scored list and expanded
    pub nodes_expanded: usize,
    /// Scored nodes dropped against the incumbent
    pub nodes_pruned: usize,
    /// Nodes left with a fully forbidden row or column
    pub dead_ends: usize,
    /// Completions that were not a single Hamiltonian cycle
    pub tours_rejected: usize,
    /// Valid completions, improving or not
    pub tours_accepted: usize,
}

/// Full result of a search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Optimal tour length, infinite if no tour exists
    pub value: f64,
    /// `"0 -> c1 -> ... -> 0"`, or `"0"` if no tour exists
    pub path: String,
    pub decisions: Vec<EdgeDecision>,
    pub solution: Solution,
    /// Reduction bound of the empty decision sequence
    pub root_bound: f64,
    pub stats: SearchStats,
}

/// What expanding one node produced
#[derive(Debug)]
enum Expansion {
    Branch([DecisionPath; 2]),
    Finalize,
    DeadEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Seeding,
    Expanding,
    Selecting,
    Done,
}

/// Exact solver bound to one cost table.
pub struct BranchAndBound {
    table: CostTable,
    config: BranchAndBoundConfig,
}

impl BranchAndBound {
    pub fn new(table: CostTable) -> Self {
        Self::with_config(table, BranchAndBoundConfig::default())
    }

    pub fn with_config(table: CostTable, config: BranchAndBoundConfig) -> Self {
        BranchAndBound { table, config }
    }

    /// Validate `rows` and build a solver for them.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> TspResult<Self> {
        Ok(Self::new(CostTable::new(rows)?))
    }

    pub fn table(&self) -> &CostTable {
        &self.table
    }

    pub fn config(&self) -> &BranchAndBoundConfig {
        &self.config
    }

    /// Optimal length and path. Repeated calls return the same answer.
    pub fn solve(&self) -> (f64, String) {
        let outcome = self.run();
        (outcome.value, outcome.path)
    }

    /// Run the search and return everything it found.
    pub fn run(&self) -> SearchOutcome {
        let start = Instant::now();
        let root_bound = reduce(&self.table, &[]).bound;

        let mut search = Search::new(&self.table, &self.config);
        search.run();
        let Search { best, stats, .. } = search;

        let mut solution = Solution::from_decisions(&self.table, &best.decisions, "BranchAndBound");
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.nodes_explored = Some(stats.nodes_expanded);

        if self.config.verbose {
            log::info!(
                "{}: value={} root_bound={} scored={} expanded={} pruned={} rejected={} in {:.4}s",
                self.table.name(),
                best.value,
                root_bound,
                stats.nodes_scored,
                stats.nodes_expanded,
                stats.nodes_pruned,
                stats.tours_rejected,
                solution.computation_time
            );
        }

        SearchOutcome {
            value: best.value,
            path: path_from_decisions(&best.decisions, self.table.size()),
            decisions: best.decisions,
            solution,
            root_bound,
            stats,
        }
    }
}

/// Reusable branch-and-bound entry point for [`ExactSolver`] callers.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBoundSolver {
    pub config: BranchAndBoundConfig,
}

impl ExactSolver for BranchAndBoundSolver {
    fn name(&self) -> &str {
        "BranchAndBound"
    }

    fn solve_table(&self, table: &CostTable) -> TspResult<Solution> {
        let solver = BranchAndBound::with_config(table.clone(), self.config.clone());
        Ok(solver.run().solution)
    }
}

/// State of one search run. `best` is written only by `finalize`.
struct Search<'a> {
    table: &'a CostTable,
    config: &'a BranchAndBoundConfig,
    arena: DecisionArena,
    pending: VecDeque<DecisionPath>,
    scored: VecDeque<SearchNode>,
    best: BestSolution,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    fn new(table: &'a CostTable, config: &'a BranchAndBoundConfig) -> Self {
        Search {
            table,
            config,
            arena: DecisionArena::new(),
            pending: VecDeque::new(),
            scored: VecDeque::new(),
            best: BestSolution::default(),
            stats: SearchStats::default(),
        }
    }

    fn run(&mut self) {
        let mut phase = Phase::Seeding;
        while phase != Phase::Done {
            phase = match phase {
                Phase::Seeding => {
                    self.seed();
                    Phase::Expanding
                }
                Phase::Expanding => {
                    self.prune();
                    self.drain_pending();
                    Phase::Selecting
                }
                Phase::Selecting => match self.select() {
                    Some(node) => {
                        self.expand(node);
                        Phase::Expanding
                    }
                    None => Phase::Done,
                },
                Phase::Done => Phase::Done,
            };
        }
    }

    /// Prime the pending list with the first branch point.
    fn seed(&mut self) {
        let root = DecisionPath::root();
        if self.table.size() == 2 {
            // already a 2x2 table: nothing to branch on
            self.pending.push_back(root);
            return;
        }

        match WorkingTable::from_table(self.table).select_minimum() {
            Some((from, to)) => {
                log::debug!("seeding with edge {} -> {}", from, to);
                let children = self.arena.branch(root, from, to);
                self.pending.extend(children);
            }
            None => log::debug!("no finite edge in {}, nothing to search", self.table.name()),
        }
    }

    fn prune(&mut self) {
        if !self.config.prune || !self.best.value.is_finite() {
            return;
        }
        let incumbent = self.best.value;
        let before = self.scored.len();
        self.scored.retain(|node| node.bound < incumbent);
        self.stats.nodes_pruned += before - self.scored.len();
    }

    fn drain_pending(&mut self) {
        while let Some(path) = self.pending.pop_front() {
            let decisions = self.arena.decisions(path);
            let Reduction { bound, table } = reduce(self.table, &decisions);
            self.stats.nodes_scored += 1;
            self.scored.push_front(SearchNode { path, table, bound });
        }
    }

    /// Take the front node unless the second one has a strictly lower bound.
    fn select(&mut self) -> Option<SearchNode> {
        let index = match (self.scored.front(), self.scored.get(1)) {
            (None, _) => return None,
            (Some(_), None) => 0,
            (Some(first), Some(second)) => {
                if first.bound <= second.bound {
                    0
                } else {
                    1
                }
            }
        };
        self.scored.remove(index)
    }

    fn expand(&mut self, node: SearchNode) {
        self.stats.nodes_expanded += 1;
        log::trace!(
            "expanding node depth={} bound={} dimension={}",
            node.path.len(),
            node.bound,
            node.table.dimension()
        );

        match self.branch(&node) {
            Expansion::Branch(children) => self.pending.extend(children),
            Expansion::Finalize => self.finalize(&node),
            Expansion::DeadEnd => {
                self.stats.dead_ends += 1;
                log::debug!("dead end at depth {}", node.path.len());
            }
        }
    }

    fn branch(&mut self, node: &SearchNode) -> Expansion {
        // some city can no longer be left or entered
        if node.table.has_blocked_line() {
            return Expansion::DeadEnd;
        }

        match node.table.dimension() {
            2 => Expansion::Finalize,
            d if d > 2 => match node.table.select_minimum() {
                Some((from, to)) => Expansion::Branch(self.arena.branch(node.path, from, to)),
                None => Expansion::DeadEnd,
            },
            _ => Expansion::DeadEnd,
        }
    }

    /// Close a 2×2 node into full tours and keep the best valid one.
    ///
    /// The completion through the cheapest residual edge is tried first,
    /// then the crossing one; each must be a single Hamiltonian cycle with
    /// finite edges. The incumbent changes only on strict improvement.
    fn finalize(&mut self, node: &SearchNode) {
        let prefix = self.arena.decisions(node.path);

        let completions = match completions(&node.table) {
            Some(completions) => completions,
            None => {
                self.stats.tours_rejected += 1;
                log::debug!("residual table fully forbidden at depth {}", prefix.len());
                return;
            }
        };

        for [first, last] in completions {
            let closing = [
                EdgeDecision::include(first.0, first.1),
                EdgeDecision::include(last.0, last.1),
            ];
            // a closing edge overrides an earlier exclude of the same edge
            let mut decisions: Vec<EdgeDecision> = prefix
                .iter()
                .filter(|d| {
                    d.is_include() || !closing.iter().any(|c| c.from == d.from && c.to == d.to)
                })
                .copied()
                .collect();
            decisions.extend(closing);

            let length = included_length(self.table, &decisions);
            if !length.is_finite() || !is_hamiltonian_cycle(&decisions, self.table.size()) {
                self.stats.tours_rejected += 1;
                continue;
            }

            self.stats.tours_accepted += 1;
            if length < self.best.value {
                log::debug!(
                    "new incumbent {} (bound {}): {}",
                    length,
                    node.bound,
                    path_from_decisions(&decisions, self.table.size())
                );
                self.best = BestSolution {
                    value: length,
                    decisions,
                };
            }
        }
    }
}

/// The two ways to close a 2×2 table, the one through its cheapest finite
/// entry first. `None` if every entry is forbidden.
fn completions(table: &WorkingTable) -> Option<[[(usize, usize); 2]; 2]> {
    let (from, to) = table.select_minimum()?;
    let other_row = *table.rows().iter().find(|&&r| r != from)?;
    let other_col = *table.cols().iter().find(|&&c| c != to)?;

    Some([
        [(from, to), (other_row, other_col)],
        [(from, other_col), (other_row, to)],
    ])
}

/// Sum of the original costs of all included edges.
fn included_length(table: &CostTable, decisions: &[EdgeDecision]) -> f64 {
    decisions
        .iter()
        .filter(|d| d.is_include())
        .map(|d| table.cost(d.from, d.to))
        .sum()
}

/// True if the included edges, walked from city 0, return to city 0 after
/// exactly `size` steps. A walk that closes early (a sub-cycle) or runs out
/// of edges is rejected.
pub fn is_hamiltonian_cycle(decisions: &[EdgeDecision], size: usize) -> bool {
    let walk = follow_included(decisions, size);
    walk.len() == size + 1 && walk.last() == Some(&0)
}
