//! Property-based tests for the branch-and-bound solver.
//!
//! Uses proptest to compare against Held-Karp and brute force on many
//! random tables.

use little_tsp::exact::{
    reduce, solve_exact, BranchAndBound, BranchAndBoundConfig, EdgeDecision, WorkingTable,
};
use little_tsp::instance::{CostTable, FORBIDDEN};
use proptest::prelude::*;

// ============================================================================
// Table Generation Strategies
// ============================================================================

/// Symmetric table with integer costs and 2..=max_n cities
fn symmetric_table(max_n: usize) -> impl Strategy<Value = CostTable> {
    (2usize..=max_n).prop_flat_map(|n| {
        prop::collection::vec(1u32..50, n * n).prop_map(move |cells| {
            let mut rows = vec![vec![FORBIDDEN; n]; n];
            for i in 0..n {
                for j in i + 1..n {
                    let cost = cells[i * n + j] as f64;
                    rows[i][j] = cost;
                    rows[j][i] = cost;
                }
            }
            CostTable::new(rows).unwrap()
        })
    })
}

/// Directed table where roughly one edge in five is forbidden
fn directed_table(max_n: usize) -> impl Strategy<Value = CostTable> {
    directed_table_between(2, max_n)
}

fn directed_table_between(min_n: usize, max_n: usize) -> impl Strategy<Value = CostTable> {
    (min_n..=max_n).prop_flat_map(|n| {
        prop::collection::vec(prop::option::weighted(0.8, 1u32..50), n * n).prop_map(move |cells| {
            let rows = (0..n)
                .map(|i| {
                    (0..n)
                        .map(|j| match cells[i * n + j] {
                            Some(cost) if i != j => cost as f64,
                            _ => FORBIDDEN,
                        })
                        .collect()
                })
                .collect();
            CostTable::new(rows).unwrap()
        })
    })
}

// ============================================================================
// Brute Force Helpers
// ============================================================================

fn permutations(items: &mut Vec<usize>, k: usize, out: &mut Vec<Vec<usize>>) {
    if k == items.len() {
        out.push(items.clone());
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permutations(items, k + 1, out);
        items.swap(k, i);
    }
}

/// Every Hamiltonian cycle from city 0 with its length
fn all_tours(table: &CostTable) -> Vec<(Vec<usize>, f64)> {
    let mut rest: Vec<usize> = (1..table.size()).collect();
    let mut orders = Vec::new();
    permutations(&mut rest, 0, &mut orders);

    orders
        .into_iter()
        .map(|order| {
            let mut tour = vec![0];
            tour.extend(order);
            let length = table.tour_cost(&tour);
            (tour, length)
        })
        .collect()
}

fn uses_edge(tour: &[usize], from: usize, to: usize) -> bool {
    (0..tour.len()).any(|i| tour[i] == from && tour[(i + 1) % tour.len()] == to)
}

/// Cheapest tour that agrees with every decision, infinite if none does
fn best_consistent(tours: &[(Vec<usize>, f64)], decisions: &[EdgeDecision]) -> f64 {
    tours
        .iter()
        .filter(|(tour, _)| {
            decisions
                .iter()
                .all(|d| uses_edge(tour, d.from, d.to) == d.is_include())
        })
        .map(|(_, length)| *length)
        .fold(FORBIDDEN, f64::min)
}

/// Follow the cheapest-edge rule for up to `n - 2` steps, including or
/// excluding the chosen edge as `choices` says.
fn walk_decisions(table: &CostTable, choices: &[bool]) -> Vec<EdgeDecision> {
    let mut working = WorkingTable::from_table(table);
    let mut decisions = Vec::new();

    for &include in choices.iter().take(table.size() - 2) {
        if working.dimension() <= 2 {
            break;
        }
        let Some((from, to)) = working.select_minimum() else {
            break;
        };
        let decision = if include {
            EdgeDecision::include(from, to)
        } else {
            EdgeDecision::exclude(from, to)
        };
        working.apply(&decision);
        decisions.push(decision);
    }

    decisions
}

// ============================================================================
// Optimality Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_matches_held_karp_on_symmetric_tables(table in symmetric_table(8)) {
        let (length, _) = BranchAndBound::new(table.clone()).solve();
        prop_assert_eq!(length, solve_exact(&table).unwrap());
    }

    #[test]
    fn prop_matches_held_karp_on_directed_tables(table in directed_table(7)) {
        let (length, path) = BranchAndBound::new(table.clone()).solve();
        let expected = solve_exact(&table).unwrap();
        prop_assert_eq!(length, expected);
        if expected == FORBIDDEN {
            prop_assert_eq!(path, "0");
        }
    }

    #[test]
    fn prop_path_realizes_length(table in directed_table(6)) {
        let outcome = BranchAndBound::new(table.clone()).run();
        if outcome.value.is_finite() {
            prop_assert!(outcome.solution.feasible);
            prop_assert_eq!(outcome.solution.tour.len(), table.size());
            prop_assert_eq!(table.tour_cost(&outcome.solution.tour), outcome.value);
            prop_assert_eq!(outcome.solution.path(), outcome.path);
            for d in outcome.decisions.iter().filter(|d| d.is_include()) {
                prop_assert!(!outcome.decisions.contains(&EdgeDecision::exclude(d.from, d.to)));
            }
        } else {
            prop_assert!(!outcome.solution.feasible);
        }
    }

    #[test]
    fn prop_pruning_is_only_an_optimisation(table in directed_table(6)) {
        let pruned = BranchAndBound::new(table.clone()).solve();
        let exhaustive = BranchAndBound::with_config(
            table,
            BranchAndBoundConfig { prune: false, ..Default::default() },
        )
        .solve();
        prop_assert_eq!(pruned.0, exhaustive.0);
    }

    #[test]
    fn prop_solve_is_idempotent(table in symmetric_table(7)) {
        let solver = BranchAndBound::new(table);
        prop_assert_eq!(solver.solve(), solver.solve());
    }
}

// ============================================================================
// Bound Soundness Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_root_bound_is_a_lower_bound(table in directed_table(6)) {
        let root = reduce(&table, &[]);
        let optimum = all_tours(&table)
            .into_iter()
            .map(|(_, length)| length)
            .fold(FORBIDDEN, f64::min);
        prop_assert!(root.bound <= optimum);
    }

    #[test]
    fn prop_branch_bounds_are_lower_bounds(table in symmetric_table(6)) {
        prop_assume!(table.size() >= 3);
        let tours = all_tours(&table);

        for from in 0..table.size() {
            for to in 0..table.size() {
                if from == to {
                    continue;
                }
                let with_edge = tours
                    .iter()
                    .filter(|(tour, _)| uses_edge(tour, from, to))
                    .map(|(_, length)| *length)
                    .fold(FORBIDDEN, f64::min);
                let without_edge = tours
                    .iter()
                    .filter(|(tour, _)| !uses_edge(tour, from, to))
                    .map(|(_, length)| *length)
                    .fold(FORBIDDEN, f64::min);

                let include = reduce(&table, &[EdgeDecision::include(from, to)]);
                let exclude = reduce(&table, &[EdgeDecision::exclude(from, to)]);
                prop_assert!(include.bound <= with_edge);
                prop_assert!(exclude.bound <= without_edge);
            }
        }
    }

    #[test]
    fn prop_deep_bounds_are_lower_bounds(
        table in directed_table_between(4, 7),
        choices in prop::collection::vec(any::<bool>(), 5),
    ) {
        let decisions = walk_decisions(&table, &choices);
        prop_assume!(decisions.len() >= 2);

        let tours = all_tours(&table);
        for depth in 2..=decisions.len() {
            let prefix = &decisions[..depth];
            let bound = reduce(&table, prefix).bound;
            prop_assert!(
                bound <= best_consistent(&tours, prefix),
                "bound {} after {:?}",
                bound,
                prefix
            );
        }
    }
}
