//! Error types for cost table construction and loading.

use thiserror::Error;

/// Errors that can occur while building, loading or solving a cost table.
///
/// Infeasibility is not an error: a table without any Hamiltonian cycle
/// solves to an infinite length and the degenerate path `"0"`.
#[derive(Error, Debug)]
pub enum TspError {
    /// Fewer than two cities
    #[error("cost table needs at least 2 cities, got {size}")]
    TooFewCities { size: usize },

    /// More cities than a solver supports
    #[error("{solver} supports at most {max} cities, got {size}")]
    TooManyCities {
        solver: String,
        size: usize,
        max: usize,
    },

    /// A row whose length differs from the number of rows
    #[error("cost table is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// Self-loop with a finite cost
    #[error("diagonal entry ({city}, {city}) must be forbidden, found {value}")]
    DiagonalNotForbidden { city: usize, value: f64 },

    /// Negative edge cost
    #[error("edge ({from}, {to}) has negative cost {value}")]
    NegativeCost { from: usize, to: usize, value: f64 },

    /// NaN edge cost
    #[error("edge ({from}, {to}) has a NaN cost")]
    NanCost { from: usize, to: usize },

    /// Unreadable cell in a text table
    #[error("cannot parse cost {token:?} at line {line}, column {column}")]
    Parse {
        line: usize,
        column: usize,
        token: String,
    },

    /// File extension not recognised
    #[error("unsupported table format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for table and solver operations.
pub type TspResult<T> = Result<T, TspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TspError::NotSquare { row: 2, len: 3, expected: 4 };
        assert_eq!(
            err.to_string(),
            "cost table is not square: row 2 has 3 entries, expected 4"
        );

        let err = TspError::TooFewCities { size: 1 };
        assert!(err.to_string().contains("at least 2"));
    }
}
