//! Little TSP Solver - Command Line Interface
//!
//! Exact Traveling Salesman solver for small directed cost tables.

use clap::{Parser, Subcommand};
use little_tsp::benchmark::{generate_instances, load_tables_from_dir, Benchmark, BenchmarkConfig};
use little_tsp::exact::{solve_exact, BranchAndBound, BranchAndBoundConfig, HeldKarp};
use little_tsp::instance::CostTable;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "little-tsp")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Exact TSP solver using Little's branch-and-bound")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a cost table (defaults to the built-in 5-city example)
    Solve {
        /// Cost table file (.csv or .json)
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Disable pruning against the incumbent
        #[arg(long)]
        no_prune: bool,

        /// Output solution to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Solve with branch-and-bound and Held-Karp and compare
    Compare {
        /// Cost table file (.csv or .json)
        #[arg(short, long)]
        instance: Option<PathBuf>,
    },

    /// Analyze a cost table
    Analyze {
        /// Cost table file (.csv or .json)
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Generate a random symmetric cost table
    Generate {
        /// Number of cities
        #[arg(short = 'n', long)]
        size: usize,

        /// Largest edge cost
        #[arg(long, default_value = "100")]
        max_cost: u32,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run benchmarks on generated or loaded tables
    Benchmark {
        /// Table sizes to generate
        #[arg(long, value_delimiter = ',', default_value = "4,6,8,10")]
        sizes: Vec<usize>,

        /// Random tables per size
        #[arg(long, default_value = "5")]
        per_size: usize,

        /// Load tables from this directory instead of generating them
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Skip the Held-Karp oracle
        #[arg(long)]
        no_held_karp: bool,

        /// Solve tables one at a time
        #[arg(long)]
        sequential: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { instance, no_prune, output, verbose } => {
            solve_table(instance.as_deref(), !no_prune, output, verbose);
        }

        Commands::Compare { instance } => {
            compare_solvers(instance.as_deref());
        }

        Commands::Analyze { instance } => {
            analyze_table(&instance);
        }

        Commands::Generate { size, max_cost, seed, output } => {
            generate_table(size, max_cost, seed, &output);
        }

        Commands::Benchmark { sizes, per_size, dir, output, seed, no_held_karp, sequential } => {
            run_benchmark(sizes, per_size, dir, &output, seed, !no_held_karp, !sequential);
        }
    }
}

fn load_table(path: Option<&Path>) -> CostTable {
    let Some(path) = path else {
        return CostTable::example();
    };

    println!("Loading cost table from {:?}...", path);
    match CostTable::from_file(path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error loading cost table: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_table(path: Option<&Path>, prune: bool, output: Option<PathBuf>, verbose: bool) {
    let table = load_table(path);

    if verbose {
        println!("{}", table.statistics());
    }

    let config = BranchAndBoundConfig { prune, verbose };
    let solver = BranchAndBound::with_config(table, config);
    let outcome = solver.run();

    println!("{}", outcome.value);
    println!("{}", outcome.path);

    if verbose {
        let stats = &outcome.stats;
        println!("\n========== Search ==========");
        println!("Root bound: {:.2}", outcome.root_bound);
        println!("Nodes scored: {}", stats.nodes_scored);
        println!("Nodes expanded: {}", stats.nodes_expanded);
        println!("Nodes pruned: {}", stats.nodes_pruned);
        println!("Dead ends: {}", stats.dead_ends);
        println!("Tours accepted/rejected: {}/{}", stats.tours_accepted, stats.tours_rejected);
        println!("Time: {:.4}s", outcome.solution.computation_time);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&outcome.solution).expect("Failed to serialize solution");
        std::fs::write(&out_path, json).expect("Failed to write output");
        println!("\nSolution saved to {:?}", out_path);
    }
}

fn compare_solvers(path: Option<&Path>) {
    let table = load_table(path);

    println!("Comparing solvers on {} (n={})...\n", table.name(), table.size());

    let start = Instant::now();
    let bnb = BranchAndBound::new(table.clone()).run();
    let bnb_time = start.elapsed().as_secs_f64();

    let held_karp = match HeldKarp::new().solve(&table) {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("Held-Karp failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("{:<16} {:>10} {:>10}  {}", "Algorithm", "Length", "Time", "Path");
    println!("{}", "-".repeat(70));
    println!("{:<16} {:>10.2} {:>10.4}  {}", "BranchAndBound", bnb.value, bnb_time, bnb.path);
    println!(
        "{:<16} {:>10.2} {:>10.4}  {}",
        "HeldKarp",
        held_karp.cost,
        held_karp.computation_time,
        held_karp.path()
    );

    if bnb.value == held_karp.cost {
        println!("\nBoth solvers agree.");
    } else {
        println!("\nMISMATCH: {} vs {}", bnb.value, held_karp.cost);
        std::process::exit(2);
    }
}

fn analyze_table(path: &Path) {
    let table = load_table(Some(path));

    println!("========== Table Analysis ==========\n");
    println!("{}", table.statistics());

    let root = little_tsp::exact::reduce(&table, &[]);
    println!("Root reduction bound: {:.2}", root.bound);

    match solve_exact(&table) {
        Ok(value) => println!("Held-Karp optimum: {:.2}", value),
        Err(e) => println!("Held-Karp skipped: {}", e),
    }
}

fn generate_table(size: usize, max_cost: u32, seed: u64, output: &Path) {
    let table = match CostTable::random_symmetric(size, max_cost, seed) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error generating table: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = table.save(output) {
        eprintln!("Error writing table: {}", e);
        std::process::exit(1);
    }
    println!("Table {} saved to {:?}", table.name(), output);
}

fn run_benchmark(
    sizes: Vec<usize>,
    per_size: usize,
    dir: Option<PathBuf>,
    output: &Path,
    seed: u64,
    held_karp: bool,
    parallel: bool,
) {
    let config = BenchmarkConfig {
        sizes,
        instances_per_size: per_size,
        seed,
        parallel,
        run_held_karp: held_karp,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let tables = match &dir {
        Some(dir) => {
            println!("Loading tables from {:?}...", dir);
            load_tables_from_dir(dir)
        }
        None => match generate_instances(&config) {
            Ok(tables) => tables,
            Err(e) => {
                eprintln!("Error generating tables: {}", e);
                std::process::exit(1);
            }
        },
    };

    println!("Found {} tables", tables.len());

    if tables.is_empty() {
        eprintln!("No tables found!");
        return;
    }

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_tables(&tables);

    println!("\n{}", benchmark.generate_report());

    match benchmark.save_results() {
        Ok(dir) => println!("Results, statistics and report saved to {:?}", dir),
        Err(e) => {
            eprintln!("Error writing results: {}", e);
            std::process::exit(1);
        }
    }
}
