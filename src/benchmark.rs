//! Benchmarking module for the exact solvers.
//!
//! Runs branch-and-bound (and Held-Karp as an oracle) over generated or
//! loaded cost tables, collects timing statistics and checks that both
//! solvers agree on the optimal length.

use crate::error::TspResult;
use crate::exact::held_karp::MAX_CITIES;
use crate::exact::{BranchAndBoundConfig, BranchAndBoundSolver, ExactSolver, HeldKarp};
use crate::instance::CostTable;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Max, Min};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Result of running a single algorithm on a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Algorithm name
    pub algorithm: String,
    /// Table name
    pub instance: String,
    /// Number of cities
    pub size: usize,
    /// Optimal length found (infinite if no tour)
    pub cost: f64,
    /// Whether a tour was found
    pub feasible: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Search nodes expanded or DP states filled
    pub nodes: Option<usize>,
    /// Agreement with the Held-Karp length, when it was run
    pub matches_oracle: Option<bool>,
}

/// Aggregated statistics for one algorithm at one table size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub size: usize,
    pub num_runs: usize,
    pub num_feasible: usize,
    pub avg_time: f64,
    pub std_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub total_time: f64,
    pub avg_nodes: Option<f64>,
    /// Runs whose length differed from the oracle
    pub mismatches: usize,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Table sizes to generate
    pub sizes: Vec<usize>,
    /// Random tables per size
    pub instances_per_size: usize,
    /// Upper bound of generated edge costs
    pub max_cost: u32,
    /// Base seed; table `k` of a size uses `seed + k`
    pub seed: u64,
    /// Solve tables in parallel (each search stays single-threaded)
    pub parallel: bool,
    /// Run Held-Karp as an oracle on tables it supports
    pub run_held_karp: bool,
    /// Branch-and-bound settings
    pub solver: BranchAndBoundConfig,
    /// Show a progress bar
    pub show_progress: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            sizes: vec![4, 6, 8, 10],
            instances_per_size: 5,
            max_cost: 100,
            seed: 42,
            parallel: true,
            run_held_karp: true,
            solver: BranchAndBoundConfig::default(),
            show_progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Generate the seeded random symmetric tables described by `config`.
pub fn generate_instances(config: &BenchmarkConfig) -> TspResult<Vec<CostTable>> {
    let mut tables = Vec::with_capacity(config.sizes.len() * config.instances_per_size);
    for &size in &config.sizes {
        for k in 0..config.instances_per_size {
            tables.push(CostTable::random_symmetric(size, config.max_cost, config.seed + k as u64)?);
        }
    }
    Ok(tables)
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    records: Vec<BenchmarkRecord>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            records: Vec::new(),
        }
    }

    /// Run every configured solver on each table
    pub fn run_on_tables(&mut self, tables: &[CostTable]) {
        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(tables.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let config = &self.config;
        let run = |table: &CostTable| {
            let records = run_table(config, table);
            progress.inc(1);
            records
        };

        let batches: Vec<Vec<BenchmarkRecord>> = if config.parallel {
            tables.par_iter().map(run).collect()
        } else {
            tables.iter().map(run).collect()
        };

        progress.finish_and_clear();
        self.records.extend(batches.into_iter().flatten());
    }

    /// Compute statistics for each (algorithm, size) pair
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut groups: HashMap<(String, usize), Vec<&BenchmarkRecord>> = HashMap::new();
        for record in &self.records {
            groups
                .entry((record.algorithm.clone(), record.size))
                .or_default()
                .push(record);
        }

        let mut statistics: Vec<AlgorithmStatistics> = groups
            .into_iter()
            .map(|((algorithm, size), records)| {
                let times: Vec<f64> = records.iter().map(|r| r.time).collect();
                let total_time = times.iter().sum::<f64>();
                let data = Data::new(times);

                let nodes: Vec<f64> = records.iter().filter_map(|r| r.nodes).map(|n| n as f64).collect();
                let avg_nodes = (!nodes.is_empty()).then(|| nodes.iter().sum::<f64>() / nodes.len() as f64);

                AlgorithmStatistics {
                    algorithm,
                    size,
                    num_runs: records.len(),
                    num_feasible: records.iter().filter(|r| r.feasible).count(),
                    avg_time: data.mean().unwrap_or(0.0),
                    std_time: data.std_dev().filter(|s| s.is_finite()).unwrap_or(0.0),
                    min_time: data.min(),
                    max_time: data.max(),
                    total_time,
                    avg_nodes,
                    mismatches: records.iter().filter(|r| r.matches_oracle == Some(false)).count(),
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.algorithm.cmp(&b.algorithm).then(a.size.cmp(&b.size)));
        statistics
    }

    /// Records where branch-and-bound disagreed with Held-Karp
    pub fn disagreements(&self) -> Vec<&BenchmarkRecord> {
        self.records
            .iter()
            .filter(|r| r.matches_oracle == Some(false))
            .collect()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for record in &self.records {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Exact TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str(&format!(
            "{:<16} {:>5} {:>9} {:>12} {:>12} {:>12} {:>10}\n",
            "Algorithm", "Size", "Feasible", "Avg Time", "Std Time", "Avg Nodes", "Mismatch"
        ));
        report.push_str("-".repeat(82).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            let nodes = stat
                .avg_nodes
                .map(|n| format!("{:.1}", n))
                .unwrap_or_else(|| "-".to_string());
            report.push_str(&format!(
                "{:<16} {:>5} {:>9} {:>12.6} {:>12.6} {:>12} {:>10}\n",
                stat.algorithm,
                stat.size,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.avg_time,
                stat.std_time,
                nodes,
                stat.mismatches
            ));
        }

        report.push_str("-".repeat(82).as_str());
        report.push('\n');

        let disagreements = self.disagreements();
        if disagreements.is_empty() {
            report.push_str("\nAll branch-and-bound results match the Held-Karp oracle.\n");
        } else {
            report.push_str("\nDisagreements with the Held-Karp oracle:\n");
            for record in disagreements {
                report.push_str(&format!("  {}: {:.2}\n", record.instance, record.cost));
            }
        }

        report
    }

    /// Write `results.csv`, `statistics.csv` and `report.txt` into the
    /// configured output directory, creating it if needed.
    pub fn save_results(&self) -> TspResult<PathBuf> {
        let dir = PathBuf::from(&self.config.output_dir);
        std::fs::create_dir_all(&dir)?;

        self.export_to_csv(dir.join("results.csv"))?;
        self.export_statistics_csv(dir.join("statistics.csv"))?;
        std::fs::write(dir.join("report.txt"), self.generate_report())?;

        log::info!("Benchmark results written to {:?}", dir);
        Ok(dir)
    }

    /// Get all records
    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }
}

/// Solve one table with branch-and-bound and, if enabled, Held-Karp.
pub fn run_table(config: &BenchmarkConfig, table: &CostTable) -> Vec<BenchmarkRecord> {
    log::info!("Running benchmark on table: {} (n={})", table.name(), table.size());

    let bnb = BranchAndBoundSolver {
        config: config.solver.clone(),
    };
    let mut records = Vec::new();

    let bnb_solution = match bnb.solve_table(table) {
        Ok(solution) => solution,
        Err(e) => {
            log::error!("{} failed on {}: {}", bnb.name(), table.name(), e);
            return records;
        }
    };
    let mut bnb_record = record(table, &bnb_solution);

    if config.run_held_karp && table.size() <= MAX_CITIES {
        match HeldKarp::new().solve_table(table) {
            Ok(oracle) => {
                let matches = oracle.cost == bnb_solution.cost;
                if !matches {
                    log::warn!(
                        "{}: branch-and-bound found {} but Held-Karp found {}",
                        table.name(),
                        bnb_solution.cost,
                        oracle.cost
                    );
                }
                bnb_record.matches_oracle = Some(matches);
                records.push(record(table, &oracle));
            }
            Err(e) => log::error!("Held-Karp failed on {}: {}", table.name(), e),
        }
    }

    records.insert(0, bnb_record);
    records
}

fn record(table: &CostTable, solution: &Solution) -> BenchmarkRecord {
    BenchmarkRecord {
        algorithm: solution.algorithm.clone(),
        instance: table.name().to_string(),
        size: table.size(),
        cost: solution.cost,
        feasible: solution.feasible,
        time: solution.computation_time,
        nodes: solution.nodes_explored,
        matches_oracle: None,
    }
}

/// Helper function to load tables from a directory
pub fn load_tables_from_dir<P: AsRef<Path>>(dir: P) -> Vec<CostTable> {
    let mut tables = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let supported = path
                .extension()
                .map(|e| e == "csv" || e == "json")
                .unwrap_or(false);
            if !supported {
                continue;
            }
            match CostTable::from_file(&path) {
                Ok(table) => tables.push(table),
                Err(e) => log::warn!("Skipping {:?}: {}", path, e),
            }
        }
    }

    // Sort by size
    tables.sort_by_key(|t| t.size());

    tables
}
