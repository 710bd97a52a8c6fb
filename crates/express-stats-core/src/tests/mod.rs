//! Statistical hypothesis testing
//!
//! The test primitives the experiment runner chooses between. The classical
//! tests wrap `anofox_tests`; the two-way ANOVA is fitted in-house.
//! Every test drops NaN observations on entry and reports undersized inputs
//! as [`StatsError::InsufficientDataMsg`].

pub mod posthoc;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::types::ALPHA;
use crate::StatsError;
use crate::StatsResult;

/// Which test produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    PairedT,
    StudentT,
    WelchT,
    WilcoxonSignedRank,
    MannWhitneyU,
    OneWayAnova,
    KruskalWallis,
    TwoWayAnova,
    Levene,
    DAgostinoPearson,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::PairedT => "Paired t-test",
            TestKind::StudentT => "Independent t-test",
            TestKind::WelchT => "Welch t-test",
            TestKind::WilcoxonSignedRank => "Wilcoxon Signed Rank test",
            TestKind::MannWhitneyU => "Mann-Whitney U test",
            TestKind::OneWayAnova => "One-way ANOVA",
            TestKind::KruskalWallis => "Kruskal-Wallis H test",
            TestKind::TwoWayAnova => "Two-way ANOVA",
            TestKind::Levene => "Levene's test",
            TestKind::DAgostinoPearson => "D'Agostino and Pearson's test",
        }
    }

    pub fn is_parametric(&self) -> bool {
        matches!(
            self,
            TestKind::PairedT
                | TestKind::StudentT
                | TestKind::WelchT
                | TestKind::OneWayAnova
                | TestKind::TwoWayAnova
        )
    }
}

/// What a test result is about, used to phrase its conclusion
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    /// Bare samples with no labels attached
    #[default]
    Samples,
    /// Named groups or measurements being compared
    Groups { labels: Vec<String> },
    /// Effect of a factor (or an interaction) on a response
    Factor { factor: String, response: String },
}

/// Generic test result structure for all statistical tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    /// Test statistic (t, U, W, H, F, K²)
    pub statistic: f64,
    /// Two-sided p-value; NaN when it cannot be determined
    pub p_value: f64,
    /// Degrees of freedom, if the reference distribution has any
    pub df: Option<f64>,
    /// Total sample size
    pub n: usize,
    /// Test method
    pub method: TestKind,
    /// What was compared
    pub subject: Subject,
}

impl TestResult {
    pub(crate) fn new(method: TestKind, statistic: f64, p_value: f64, df: Option<f64>, n: usize) -> Self {
        Self {
            statistic,
            p_value,
            df,
            n,
            method,
            subject: Subject::Samples,
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = subject;
        self
    }

    pub fn test_name(&self) -> &'static str {
        self.method.name()
    }

    /// `p < 0.05`, or `UndefinedStatistic` when the p-value is NaN
    pub fn significance(&self) -> StatsResult<bool> {
        if self.p_value.is_nan() {
            let subject = match &self.subject {
                Subject::Samples => "samples".to_string(),
                Subject::Groups { labels } => labels.join(", "),
                Subject::Factor { factor, .. } => factor.clone(),
            };
            return Err(StatsError::UndefinedStatistic {
                test: self.test_name(),
                subject,
            });
        }
        Ok(self.p_value < ALPHA)
    }

    /// `Some(p < 0.05)`, or `None` when the p-value is undefined
    pub fn reject_null(&self) -> Option<bool> {
        self.significance().ok()
    }
}

/// Extended test result for one-way ANOVA
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaResult {
    /// F statistic
    pub f_statistic: f64,
    /// p-value
    pub p_value: f64,
    /// Between-groups degrees of freedom
    pub df_between: usize,
    /// Within-groups degrees of freedom
    pub df_within: usize,
    /// Between-groups sum of squares
    pub ss_between: f64,
    /// Within-groups sum of squares
    pub ss_within: f64,
    /// Number of groups
    pub n_groups: usize,
    /// Total sample size
    pub n: usize,
}

impl From<&AnovaResult> for TestResult {
    fn from(r: &AnovaResult) -> Self {
        TestResult::new(
            TestKind::OneWayAnova,
            r.f_statistic,
            r.p_value,
            Some(r.df_between as f64),
            r.n,
        )
    }
}

/// Convert an anofox_tests error into a crate error
fn convert_error(e: anofox_tests::StatError) -> StatsError {
    StatsError::InvalidInput(e.to_string())
}

/// Filter NaN values from a slice
fn filter_nan(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| !x.is_nan()).collect()
}

/// All values equal (an empty slice counts as constant)
fn is_constant(data: &[f64]) -> bool {
    data.windows(2).all(|w| w[0] == w[1])
}

// Non-finite statistics short-circuit before reaching statrs: NaN stays NaN
// and +inf has zero tail mass.
fn tail(x: f64, sf: impl FnOnce(f64) -> f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x == f64::INFINITY {
        0.0
    } else if x == f64::NEG_INFINITY {
        1.0
    } else {
        sf(x)
    }
}

/// Upper-tail p-value of an F statistic
fn f_upper_tail(f: f64, df1: f64, df2: f64) -> StatsResult<f64> {
    let dist = FisherSnedecor::new(df1, df2)
        .map_err(|e| StatsError::DistributionError(e.to_string()))?;
    Ok(tail(f, |x| dist.sf(x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_null_undefined_for_nan() {
        let r = TestResult::new(TestKind::TwoWayAnova, f64::NAN, f64::NAN, None, 10);
        assert_eq!(r.reject_null(), None);
        let r = TestResult::new(TestKind::StudentT, 3.0, 0.01, Some(8.0), 10);
        assert_eq!(r.reject_null(), Some(true));
    }

    #[test]
    fn test_undefined_significance_names_the_factor() {
        let r = TestResult::new(TestKind::TwoWayAnova, f64::NAN, f64::NAN, None, 8).with_subject(
            Subject::Factor {
                factor: "dose".into(),
                response: "yield".into(),
            },
        );
        match r.significance() {
            Err(StatsError::UndefinedStatistic { test, subject }) => {
                assert_eq!(test, "Two-way ANOVA");
                assert_eq!(subject, "dose");
            }
            other => panic!("expected UndefinedStatistic, got {other:?}"),
        }
    }

    #[test]
    fn test_rank_and_omnibus_kinds_are_not_parametric() {
        assert!(TestKind::PairedT.is_parametric());
        assert!(TestKind::OneWayAnova.is_parametric());
        assert!(!TestKind::MannWhitneyU.is_parametric());
        assert!(!TestKind::KruskalWallis.is_parametric());
        assert!(!TestKind::WilcoxonSignedRank.is_parametric());
    }

    #[test]
    fn test_is_constant() {
        assert!(is_constant(&[2.0, 2.0, 2.0]));
        assert!(is_constant(&[]));
        assert!(!is_constant(&[2.0, 2.0, 2.5]));
    }

    #[test]
    fn test_f_tail_of_non_finite_statistics() {
        assert_eq!(f_upper_tail(f64::INFINITY, 1.0, 4.0).unwrap(), 0.0);
        assert!(f_upper_tail(f64::NAN, 1.0, 4.0).unwrap().is_nan());
        assert!((f_upper_tail(3.0, 2.0, 6.0).unwrap() - 0.125).abs() < 1e-9);
    }
}
