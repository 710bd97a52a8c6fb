use serde::{Deserialize, Serialize};

/// Significance level used by every test and assumption check
pub const ALPHA: f64 = 0.05;

/// Maximum number of distinct values for a column to be offered as categorical
pub const MAX_CATEGORICAL_CARDINALITY: usize = 8;

/// Smallest sample size a user may request for a resampled experiment
pub const MIN_SAMPLE_SIZE: usize = 10;

/// Number of decimal digits p-values are rounded to in verdict records
pub const P_VALUE_DIGITS: i32 = 10;

/// Options for running an experiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentOptions {
    /// Rows drawn per group (or once for paired designs) before testing.
    /// `None` uses every available row. Requests larger than the available
    /// rows are capped.
    pub sample_size: Option<usize>,
    /// Seed for the sampling RNG. `None` draws a fresh random subsample on
    /// every run, so repeated runs over the same data may disagree.
    pub seed: Option<u64>,
}

impl Default for ExperimentOptions {
    fn default() -> Self {
        Self {
            sample_size: Some(100),
            seed: None,
        }
    }
}

/// Observations sharing one label: a categorical value, a combination of two
/// values, or a measurement column in a paired design
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
}

impl Group {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ExperimentOptions {
    /// Use every row, no sampling
    pub fn all_rows() -> Self {
        Self {
            sample_size: None,
            seed: None,
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
