//! Normality and variance-homogeneity checks
//!
//! Each group gets a D'Agostino-Pearson omnibus test; all groups together get
//! a median-centred Levene test. The parametric path is taken only when every
//! check fails to reject at [`ALPHA`].

use serde::Serialize;

use crate::errors::{StatsError, StatsResult};
use crate::tests::distributional::{dagostino_k_squared, MIN_OBSERVATIONS};
use crate::tests::parametric::levene;
use crate::tests::{Subject, TestResult};
use crate::types::{Group, ALPHA};

/// Normality result for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityCheck {
    pub label: String,
    /// K-squared statistic
    pub statistic: f64,
    pub p_value: f64,
    pub n: usize,
}

impl NormalityCheck {
    /// Fails to reject normality at [`ALPHA`]
    pub fn is_normal(&self) -> bool {
        self.p_value > ALPHA
    }
}

/// Outcome of the assumption checks for one set of groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssumptionVerdict {
    /// One entry per group, in group order
    pub normality: Vec<NormalityCheck>,
    /// Levene test across all groups
    pub variance: TestResult,
    /// Every group normal and variances homogeneous
    pub is_parametric: bool,
}

impl AssumptionVerdict {
    pub fn equal_variances(&self) -> bool {
        self.variance.p_value > ALPHA
    }
}

/// Run normality and variance-homogeneity checks on `groups`
///
/// A check whose p-value is NaN (a constant group, or all groups constant for
/// Levene) is recorded as is and sends the caller down the non-parametric path.
///
/// # Errors
/// * `DegenerateSample` - fewer than 2 groups, a group below the normality
///   test's minimum size, or a group with fewer than 2 observations for Levene
pub fn check(groups: &[Group]) -> StatsResult<AssumptionVerdict> {
    if groups.len() < 2 {
        return Err(StatsError::DegenerateSample(format!(
            "assumption checks need at least 2 groups, got {}",
            groups.len()
        )));
    }

    let mut normality = Vec::with_capacity(groups.len());
    for group in groups {
        let result = dagostino_k_squared(&group.values).map_err(|e| match e {
            StatsError::InsufficientDataMsg(_) => StatsError::DegenerateSample(format!(
                "'{}' has {} observations; the normality test needs at least {}",
                group.label,
                group.values.iter().filter(|x| !x.is_nan()).count(),
                MIN_OBSERVATIONS
            )),
            other => other,
        })?;

        if result.p_value.is_nan() {
            tracing::warn!(group = %group.label, "normality cannot be determined for a constant group");
        }
        tracing::debug!(
            group = %group.label,
            n = result.n,
            p_value = result.p_value,
            "normality check"
        );
        normality.push(NormalityCheck {
            label: group.label.clone(),
            statistic: result.statistic,
            p_value: result.p_value,
            n: result.n,
        });
    }

    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let values: Vec<Vec<f64>> = groups.iter().map(|g| g.values.clone()).collect();
    let variance = levene(&values)
        .map_err(|e| match e {
            StatsError::InsufficientDataMsg(msg) => StatsError::DegenerateSample(msg),
            other => other,
        })?
        .with_subject(Subject::Groups {
            labels: labels.clone(),
        });

    if variance.p_value.is_nan() {
        tracing::warn!(groups = %labels.join(", "), "variance homogeneity cannot be determined");
    }

    // An undetermined check (NaN p-value) never passes
    let is_parametric = normality.iter().all(NormalityCheck::is_normal) && variance.p_value > ALPHA;
    tracing::debug!(
        is_parametric,
        levene_p = variance.p_value,
        "assumption checks complete"
    );

    Ok(AssumptionVerdict {
        normality,
        variance,
        is_parametric,
    })
}
