//! Column classification
//!
//! Splits dataset columns into the roles an experiment can use them in.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::types::MAX_CATEGORICAL_CARDINALITY;

/// Role a column can play in an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Categorical,
    Numerical,
    Ignored,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Categorical => "categorical",
            ColumnRole::Numerical => "interval/ratio",
            ColumnRole::Ignored => "ignored",
        }
    }
}

/// Categorical and numerical column names, each in dataset column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnRoles {
    pub categorical: Vec<String>,
    pub numerical: Vec<String>,
}

impl ColumnRoles {
    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name)
    }

    pub fn is_numerical(&self, name: &str) -> bool {
        self.numerical.iter().any(|c| c == name)
    }

    /// Every role the column qualifies for; `[Ignored]` when it qualifies for none
    pub fn roles_of(&self, name: &str) -> Vec<ColumnRole> {
        let mut roles = Vec::with_capacity(2);
        if self.is_categorical(name) {
            roles.push(ColumnRole::Categorical);
        }
        if self.is_numerical(name) {
            roles.push(ColumnRole::Numerical);
        }
        if roles.is_empty() {
            roles.push(ColumnRole::Ignored);
        }
        roles
    }
}

/// Classify every column of a snapshot.
///
/// A column is categorical when it has at most
/// [`MAX_CATEGORICAL_CARDINALITY`] distinct non-missing values, whatever its
/// storage type, and numerical when it is stored as integers or floats. A
/// low-cardinality numeric column is both.
pub fn classify(dataset: &Dataset) -> ColumnRoles {
    let mut roles = ColumnRoles::default();

    for col in dataset.columns() {
        if col.data.distinct_count() <= MAX_CATEGORICAL_CARDINALITY {
            roles.categorical.push(col.name.clone());
        }
        if col.data.is_numeric() {
            roles.numerical.push(col.name.clone());
        }
    }

    roles
}
