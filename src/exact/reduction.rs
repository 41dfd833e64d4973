//! Working tables, row/column reduction and minimum-edge selection.
//!
//! A working table is the part of the cost table still open after a
//! sequence of edge decisions: including `i -> j` removes row `i` and
//! column `j`, excluding it marks the entry forbidden. Rows and columns
//! keep their city labels and their ascending city order.

use super::decision::{Choice, EdgeDecision};
use crate::instance::{CostTable, FORBIDDEN};

/// A shrinking copy of the cost table, indexed by city labels.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingTable {
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl WorkingTable {
    /// Full copy of a cost table
    pub fn from_table(table: &CostTable) -> Self {
        let n = table.size();
        WorkingTable {
            rows: (0..n).collect(),
            cols: (0..n).collect(),
            values: table.rows().flat_map(|row| row.iter().copied()).collect(),
        }
    }

    /// Cities whose outgoing edge is still undecided
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Cities whose incoming edge is still undecided
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// Number of remaining rows (always equal to the number of columns)
    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    fn position(&self, from: usize, to: usize) -> Option<(usize, usize)> {
        let r = self.rows.iter().position(|&c| c == from)?;
        let c = self.cols.iter().position(|&c| c == to)?;
        Some((r, c))
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> f64 {
        self.values[r * self.cols.len() + c]
    }

    /// Cost of `from -> to`, or `None` once its row or column is gone.
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.position(from, to).map(|(r, c)| self.at(r, c))
    }

    /// Mark `from -> to` forbidden. Returns false if the entry no longer exists.
    pub fn forbid(&mut self, from: usize, to: usize) -> bool {
        match self.position(from, to) {
            Some((r, c)) => {
                let width = self.cols.len();
                self.values[r * width + c] = FORBIDDEN;
                true
            }
            None => false,
        }
    }

    /// Drop row `from` and column `to`.
    pub fn remove(&mut self, from: usize, to: usize) {
        let row = self.rows.iter().position(|&c| c == from);
        let col = self.cols.iter().position(|&c| c == to);
        let width = self.cols.len();

        let values = self
            .values
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(i / width) != row && Some(i % width) != col)
            .map(|(_, &v)| v)
            .collect();

        self.values = values;
        if let Some(r) = row {
            self.rows.remove(r);
        }
        if let Some(c) = col {
            self.cols.remove(c);
        }
    }

    /// Apply one edge decision.
    ///
    /// Including `i -> j` also forbids `j -> i` while it is still present, so
    /// the two cities cannot be closed into a round trip.
    pub fn apply(&mut self, decision: &EdgeDecision) {
        match decision.choice {
            Choice::Include => {
                self.forbid(decision.to, decision.from);
                self.remove(decision.from, decision.to);
            }
            Choice::Exclude => {
                // the entry may already be gone with an included edge's row or column
                self.forbid(decision.from, decision.to);
            }
        }
    }

    /// Cheapest finite entry as `(from, to)`.
    ///
    /// Each row proposes its first minimal column; the smallest proposal
    /// wins and ties go to the earliest row. Rows with no finite entry
    /// propose nothing; `None` means the whole table is forbidden.
    pub fn select_minimum(&self) -> Option<(usize, usize)> {
        let width = self.cols.len();
        let mut best: Option<(f64, usize, usize)> = None;

        for r in 0..self.rows.len() {
            let row = &self.values[r * width..(r + 1) * width];
            let mut row_min: Option<(f64, usize)> = None;
            for (c, &value) in row.iter().enumerate() {
                if value.is_finite() && row_min.map_or(true, |(m, _)| value < m) {
                    row_min = Some((value, c));
                }
            }
            if let Some((value, c)) = row_min {
                if best.map_or(true, |(m, _, _)| value < m) {
                    best = Some((value, r, c));
                }
            }
        }

        best.map(|(_, r, c)| (self.rows[r], self.cols[c]))
    }

    /// Subtract each row's finite minimum from the row, then each column's
    /// from the column, returning the total subtracted. A row or column
    /// with no finite entry contributes nothing.
    pub fn reduce_in_place(&mut self) -> f64 {
        let height = self.rows.len();
        let width = self.cols.len();
        let mut total = 0.0;

        for r in 0..height {
            let row = &mut self.values[r * width..(r + 1) * width];
            let min = row.iter().copied().fold(FORBIDDEN, f64::min);
            if min.is_finite() {
                row.iter_mut().for_each(|v| *v -= min);
                total += min;
            }
        }

        for c in 0..width {
            let min = (0..height).map(|r| self.at(r, c)).fold(FORBIDDEN, f64::min);
            if min.is_finite() {
                for r in 0..height {
                    self.values[r * width + c] -= min;
                }
                total += min;
            }
        }

        total
    }

    /// True if some row or column has no finite entry left.
    pub fn has_blocked_line(&self) -> bool {
        let width = self.cols.len();
        let blocked_row = (0..self.rows.len())
            .any(|r| (0..width).all(|c| !self.at(r, c).is_finite()));
        let blocked_col = (0..width)
            .any(|c| (0..self.rows.len()).all(|r| !self.at(r, c).is_finite()));
        blocked_row || blocked_col
    }
}

/// Lower bound and post-decision table for one decision sequence.
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Included edge costs plus the row/column reduction total
    pub bound: f64,
    /// The table after the decisions, before reduction
    pub table: WorkingTable,
}

/// Replay `decisions` on a fresh copy of `base` and bound the result.
pub fn reduce(base: &CostTable, decisions: &[EdgeDecision]) -> Reduction {
    let mut table = WorkingTable::from_table(base);
    let mut included = 0.0;

    for decision in decisions {
        if decision.is_include() {
            included += table
                .get(decision.from, decision.to)
                .unwrap_or_else(|| base.cost(decision.from, decision.to));
        }
        table.apply(decision);
    }

    let mut scratch = table.clone();
    let reduction = scratch.reduce_in_place();

    Reduction {
        bound: included + reduction,
        table,
    }
}
