use thiserror::Error;

/// Errors that can occur while preparing or running an experiment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    // Domain errors surfaced to the user
    #[error("Cannot perform statistical experimentation: the dataset needs at least one numeric column and either a second numeric column or a categorical column (found {categorical} categorical, {numerical} numerical)")]
    DomainInsufficiency { categorical: usize, numerical: usize },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Degenerate sample: {0}")]
    DegenerateSample(String),

    #[error("Undefined statistic: {test} for {subject} cannot be determined")]
    UndefinedStatistic { test: &'static str, subject: String },

    // Selection validation errors
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column '{column}' cannot be used as a {expected} variable")]
    RoleMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("Experiment design '{0}' is not available for this dataset")]
    DesignUnavailable(&'static str),

    // Input validation errors
    #[error("Dimension mismatch: column '{column}' has {len} rows, expected {expected}")]
    DimensionMismatch {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatchMsg(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Insufficient data: {0}")]
    InsufficientDataMsg(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Numerical errors
    #[error("Distribution error: {0}")]
    DistributionError(String),
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;

