//! Scenario tests for the exact solvers.

use little_tsp::exact::{
    is_hamiltonian_cycle, solve_exact, BranchAndBound, BranchAndBoundConfig, EdgeDecision,
};
use little_tsp::instance::{CostTable, FORBIDDEN};
use little_tsp::TspError;
use std::io::Write;
use tempfile::TempDir;

const INF: f64 = FORBIDDEN;

/// Parse `"0 -> a -> b -> 0"` back into city indices.
fn parse_path(path: &str) -> Vec<usize> {
    path.split(" -> ").map(|c| c.parse().unwrap()).collect()
}

/// Two directed 3-cycles of cost 1 each edge, joined only by cost-100 edges.
fn two_triangles() -> CostTable {
    let mut rows = vec![vec![100.0; 6]; 6];
    for (i, row) in rows.iter_mut().enumerate() {
        row[i] = INF;
    }
    for &(from, to) in &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)] {
        rows[from][to] = 1.0;
    }
    CostTable::new(rows).unwrap()
}

#[test]
fn example_table_solves_to_brute_force_optimum() {
    let table = CostTable::example();
    let (length, path) = BranchAndBound::new(table.clone()).solve();

    assert_eq!(length, 110.0);

    let cities = parse_path(&path);
    assert_eq!(cities.len(), 6);
    assert_eq!(cities.first(), Some(&0));
    assert_eq!(cities.last(), Some(&0));
    let mut visited = cities[..5].to_vec();
    visited.sort_unstable();
    assert_eq!(visited, vec![0, 1, 2, 3, 4]);
    assert_eq!(table.tour_cost(&cities[..5]), 110.0);
}

#[test]
fn solve_is_idempotent() {
    let solver = BranchAndBound::new(CostTable::example());
    let first = solver.solve();
    let second = solver.solve();
    assert_eq!(first, second);
}

#[test]
fn two_cities_finalize_without_branching() {
    let solver = BranchAndBound::from_rows(vec![vec![INF, 8.0], vec![3.0, INF]]).unwrap();
    let outcome = solver.run();

    assert_eq!(outcome.value, 11.0);
    assert_eq!(outcome.path, "0 -> 1 -> 0");
    assert_eq!(outcome.stats.nodes_scored, 1);
    assert_eq!(outcome.stats.nodes_pruned, 0);
}

#[test]
fn cheap_subcycles_are_never_returned() {
    let table = two_triangles();
    let outcome = BranchAndBound::new(table.clone()).run();

    assert_eq!(outcome.value, 204.0);
    assert_eq!(solve_exact(&table).unwrap(), 204.0);
    assert!(is_hamiltonian_cycle(&outcome.decisions, 6));
    let stats = &outcome.stats;
    assert!(stats.tours_rejected + stats.nodes_pruned + stats.dead_ends > 0);

    let subcycles: Vec<EdgeDecision> = [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]
        .iter()
        .map(|&(from, to)| EdgeDecision::include(from, to))
        .collect();
    assert!(!is_hamiltonian_cycle(&subcycles, 6));
}

#[test]
fn table_without_tour_returns_sentinel() {
    // city 3 cannot be left
    let solver = BranchAndBound::from_rows(vec![
        vec![INF, 1.0, 2.0, 3.0],
        vec![1.0, INF, 2.0, 3.0],
        vec![2.0, 2.0, INF, 3.0],
        vec![INF, INF, INF, INF],
    ])
    .unwrap();

    let (length, path) = solver.solve();
    assert_eq!(length, INF);
    assert_eq!(path, "0");
}

#[test]
fn forbidden_edges_are_respected() {
    // only 0 -> 2 -> 1 -> 3 -> 0 avoids every forbidden edge
    let table = CostTable::new(vec![
        vec![INF, INF, 5.0, INF],
        vec![INF, INF, INF, 5.0],
        vec![INF, 5.0, INF, INF],
        vec![5.0, INF, INF, INF],
    ])
    .unwrap();

    let (length, path) = BranchAndBound::new(table).solve();
    assert_eq!(length, 20.0);
    assert_eq!(path, "0 -> 2 -> 1 -> 3 -> 0");
}

#[test]
fn pruning_does_not_change_the_optimum() {
    for seed in 0..5 {
        let table = CostTable::random_symmetric(6, 40, seed).unwrap();
        let pruned = BranchAndBound::new(table.clone()).run();
        let exhaustive = BranchAndBound::with_config(
            table,
            BranchAndBoundConfig {
                prune: false,
                ..Default::default()
            },
        )
        .run();

        assert_eq!(pruned.value, exhaustive.value);
        assert_eq!(exhaustive.stats.nodes_pruned, 0);
        assert!(pruned.stats.nodes_scored <= exhaustive.stats.nodes_scored);
    }
}

#[test]
fn malformed_tables_fail_construction() {
    assert!(matches!(
        BranchAndBound::from_rows(vec![vec![INF, 1.0, 2.0], vec![1.0, INF, 2.0]]),
        Err(TspError::NotSquare { .. })
    ));
    assert!(matches!(
        BranchAndBound::from_rows(vec![vec![INF]]),
        Err(TspError::TooFewCities { size: 1 })
    ));
    assert!(matches!(
        BranchAndBound::from_rows(vec![vec![INF, 1.0], vec![1.0, 0.0]]),
        Err(TspError::DiagonalNotForbidden { city: 1, .. })
    ));
}

#[test]
fn loads_csv_and_json_tables() {
    let dir = TempDir::new().unwrap();

    let csv_path = dir.path().join("example.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "inf,30,30,25,10").unwrap();
    writeln!(file, "30,inf,30,45,20").unwrap();
    writeln!(file, "30,30,-,25,20").unwrap();
    writeln!(file, "25,45,25,x,30").unwrap();
    writeln!(file, "10,20,20,30,inf").unwrap();
    drop(file);

    let from_csv = CostTable::from_file(&csv_path).unwrap();
    assert_eq!(from_csv.name(), "example");
    assert_eq!(BranchAndBound::new(from_csv.clone()).solve().0, 110.0);

    let json_path = dir.path().join("example.json");
    from_csv.save(&json_path).unwrap();
    let from_json = CostTable::from_file(&json_path).unwrap();
    assert_eq!(from_json, from_csv);

    let bad_path = dir.path().join("example.xml");
    std::fs::write(&bad_path, "<table/>").unwrap();
    assert!(matches!(
        CostTable::from_file(&bad_path),
        Err(TspError::UnsupportedFormat(_))
    ));
}

#[test]
fn csv_parse_errors_name_the_cell() {
    let text = "inf,1\n1,oops\n";
    match CostTable::from_csv_reader("bad", text.as_bytes()) {
        Err(TspError::Parse { line, column, token }) => {
            assert_eq!((line, column), (2, 2));
            assert_eq!(token, "oops");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn csv_parse_errors_count_comment_lines() {
    let text = "# two cities\n# second comment\ninf,1\n1,oops\n";
    match CostTable::from_csv_reader("commented", text.as_bytes()) {
        Err(TspError::Parse { line, column, token }) => {
            assert_eq!((line, column), (4, 2));
            assert_eq!(token, "oops");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}
