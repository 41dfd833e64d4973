//! Module for building, loading and describing cost tables.
//!
//! A cost table is a square N×N matrix of directed edge costs. Entry
//! `(i, j)` is the cost of travelling from city `i` to city `j`; an
//! infinite entry marks a forbidden edge. The diagonal is always forbidden.
//!
//! Tables can be loaded from CSV (one row per line, `inf`, `-` or `x` for
//! forbidden cells) or JSON (`{"name": ..., "costs": [[..], ..]}` with
//! `null` for forbidden cells).

use crate::error::{TspError, TspResult};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Sentinel cost of a forbidden edge
pub const FORBIDDEN: f64 = f64::INFINITY;

/// On-disk shape of a table: forbidden cells are `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableFile {
    #[serde(default)]
    name: String,
    costs: Vec<Vec<Option<f64>>>,
}

/// A validated square table of directed edge costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableFile", into = "TableFile")]
pub struct CostTable {
    name: String,
    size: usize,
    costs: Vec<f64>,
}

impl CostTable {
    /// Build a table from rows, checking that it is square, has at least two
    /// cities, a forbidden diagonal and no negative or NaN costs.
    pub fn new(rows: Vec<Vec<f64>>) -> TspResult<Self> {
        Self::from_named_rows("unnamed", rows)
    }

    pub fn from_named_rows(name: &str, rows: Vec<Vec<f64>>) -> TspResult<Self> {
        let size = rows.len();
        if size < 2 {
            return Err(TspError::TooFewCities { size });
        }

        let mut costs = Vec::with_capacity(size * size);
        for (from, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(TspError::NotSquare {
                    row: from,
                    len: row.len(),
                    expected: size,
                });
            }
            for (to, value) in row.into_iter().enumerate() {
                if value.is_nan() {
                    return Err(TspError::NanCost { from, to });
                }
                if from == to {
                    if value != FORBIDDEN {
                        return Err(TspError::DiagonalNotForbidden { city: from, value });
                    }
                } else if value < 0.0 {
                    return Err(TspError::NegativeCost { from, to, value });
                }
                costs.push(value);
            }
        }

        Ok(CostTable {
            name: name.to_string(),
            size,
            costs,
        })
    }

    /// The shipped 5-city symmetric example; its optimal tour has length 110.
    pub fn example() -> Self {
        let inf = FORBIDDEN;
        let rows = vec![
            vec![inf, 30.0, 30.0, 25.0, 10.0],
            vec![30.0, inf, 30.0, 45.0, 20.0],
            vec![30.0, 30.0, inf, 25.0, 20.0],
            vec![25.0, 45.0, 25.0, inf, 30.0],
            vec![10.0, 20.0, 20.0, 30.0, inf],
        ];
        CostTable {
            name: "example-5".to_string(),
            size: 5,
            costs: rows.into_iter().flatten().collect(),
        }
    }

    /// Generate a symmetric table with integer costs in `[1, max_cost]`.
    /// Deterministic for a given seed.
    pub fn random_symmetric(size: usize, max_cost: u32, seed: u64) -> TspResult<Self> {
        if size < 2 {
            return Err(TspError::TooFewCities { size });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let upper = max_cost.max(1);
        let mut rows = vec![vec![FORBIDDEN; size]; size];
        for i in 0..size {
            for j in i + 1..size {
                let cost = rng.gen_range(1..=upper) as f64;
                rows[i][j] = cost;
                rows[j][i] = cost;
            }
        }

        Self::from_named_rows(&format!("random-n{}-s{}", size, seed), rows)
    }

    /// Load a table from a `.json` or `.csv` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> TspResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let reader = BufReader::new(File::open(path)?);
        match extension.as_str() {
            "json" => {
                let mut table: CostTable = serde_json::from_reader(reader)?;
                if table.name.is_empty() {
                    table.name = name;
                }
                Ok(table)
            }
            "csv" | "txt" => Self::from_csv_reader(&name, reader),
            other => Err(TspError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse a headerless CSV table. Lines starting with `#` are skipped.
    pub fn from_csv_reader<R: Read>(name: &str, reader: R) -> TspResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            // file line, counting the skipped comment lines
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1);
            let row = record
                .iter()
                .enumerate()
                .map(|(column, token)| {
                    parse_cost(token).ok_or_else(|| TspError::Parse {
                        line,
                        column: column + 1,
                        token: token.to_string(),
                    })
                })
                .collect::<TspResult<Vec<f64>>>()?;
            rows.push(row);
        }

        Self::from_named_rows(name, rows)
    }

    /// Write the table as JSON or CSV, chosen by extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TspResult<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => {
                let json = serde_json::to_string_pretty(self)?;
                std::fs::write(path, json)?;
            }
            "csv" | "txt" => {
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_path(path)?;
                for row in self.rows() {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|&c| if c == FORBIDDEN { "inf".to_string() } else { c.to_string() })
                        .collect();
                    writer.write_record(&cells)?;
                }
                writer.flush()?;
            }
            other => return Err(TspError::UnsupportedFormat(other.to_string())),
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of cities
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cost of the directed edge `from -> to`
    #[inline]
    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.costs[from * self.size + to]
    }

    #[inline]
    pub fn is_forbidden(&self, from: usize, to: usize) -> bool {
        self.cost(from, to) == FORBIDDEN
    }

    /// Rows of the table, in city order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.costs.chunks(self.size)
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self.cost(i, j) == self.cost(j, i)))
    }

    /// Length of a closed tour given as a city sequence; the return hop to
    /// the first city is implicit. Forbidden edges make the length infinite.
    pub fn tour_cost(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for pair in tour.windows(2) {
            length += self.cost(pair[0], pair[1]);
        }
        length += self.cost(tour[tour.len() - 1], tour[0]);

        length
    }

    /// Get statistics about the table
    pub fn statistics(&self) -> TableStatistics {
        let finite: Vec<f64> = self.costs.iter().copied().filter(|c| c.is_finite()).collect();
        let forbidden_edges = self.size * (self.size - 1) - finite.len();

        let min_cost = finite.iter().copied().map(OrderedFloat).min().map_or(FORBIDDEN, |c| c.0);
        let max_cost = finite.iter().copied().map(OrderedFloat).max().map_or(FORBIDDEN, |c| c.0);
        let avg_cost = if finite.is_empty() {
            FORBIDDEN
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };

        TableStatistics {
            name: self.name.clone(),
            size: self.size,
            finite_edges: finite.len(),
            forbidden_edges,
            min_cost,
            max_cost,
            avg_cost,
            symmetric: self.is_symmetric(),
        }
    }
}

impl TryFrom<TableFile> for CostTable {
    type Error = TspError;

    fn try_from(file: TableFile) -> TspResult<Self> {
        let rows = file
            .costs
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.unwrap_or(FORBIDDEN)).collect())
            .collect();
        Self::from_named_rows(&file.name, rows)
    }
}

impl From<CostTable> for TableFile {
    fn from(table: CostTable) -> Self {
        let costs = table
            .rows()
            .map(|row| row.iter().map(|&c| c.is_finite().then_some(c)).collect())
            .collect();
        TableFile {
            name: table.name,
            costs,
        }
    }
}

/// Parse one table cell: a number, `inf`/`infinity`, `-`, `x` or `∞`.
pub fn parse_cost(token: &str) -> Option<f64> {
    match token.trim() {
        "-" | "x" | "X" | "∞" => Some(FORBIDDEN),
        t => t.parse::<f64>().ok(),
    }
}

/// Statistics about a cost table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatistics {
    pub name: String,
    pub size: usize,
    pub finite_edges: usize,
    /// Off-diagonal edges marked forbidden
    pub forbidden_edges: usize,
    pub min_cost: f64,
    pub max_cost: f64,
    pub avg_cost: f64,
    pub symmetric: bool,
}

impl std::fmt::Display for TableStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Table: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.size)?;
        writeln!(f, "  Finite edges: {}", self.finite_edges)?;
        writeln!(f, "  Forbidden edges (off-diagonal): {}", self.forbidden_edges)?;
        writeln!(f, "  Symmetric: {}", self.symmetric)?;
        writeln!(f, "  Min cost: {:.2}", self.min_cost)?;
        writeln!(f, "  Avg cost: {:.2}", self.avg_cost)?;
        writeln!(f, "  Max cost: {:.2}", self.max_cost)
    }
}
