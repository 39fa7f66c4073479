use thiserror::Error;

/// Result alias for `canopy`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by feature selection, evaluation and partitioning.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Row length did not match the matrix width.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Malformed sweep of candidate cluster counts.
    #[error("invalid candidate range: {reason}")]
    InvalidCandidateRange {
        /// What was wrong with the sweep.
        reason: String,
    },

    /// A fit produced fewer non-empty clusters than requested, so the
    /// quality signals are undefined.
    #[error("degenerate clustering at k={k}: only {non_empty} non-empty clusters")]
    DegenerateClustering {
        /// Requested cluster count.
        k: usize,
        /// Clusters that actually received points.
        non_empty: usize,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A required column is absent from the input table or a record.
    #[error("missing column '{0}'")]
    MissingColumn(String),

    /// Operator input could not be understood.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration failed to parse or validate.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV read or write failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
