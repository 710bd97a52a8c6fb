//! Verdict records for the shell to render
//!
//! Formatting never alters the numbers it is given: every record keeps the raw
//! statistic and p-value next to the rounded p-value and the prose.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::design::Selection;
use crate::diagnostics::{AssumptionVerdict, NormalityCheck};
use crate::errors::StatsResult;
use crate::experiment::{run_experiment, ExperimentOutcome};
use crate::tests::posthoc::PostHocMatrix;
use crate::tests::{Subject, TestKind, TestResult};
use crate::types::{ExperimentOptions, ALPHA, P_VALUE_DIGITS};

/// Outcome of comparing a p-value with [`ALPHA`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Reject,
    FailToReject,
    /// The p-value is NaN
    Undetermined,
}

impl Decision {
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value.is_nan() {
            Decision::Undetermined
        } else if p_value < ALPHA {
            Decision::Reject
        } else {
            Decision::FailToReject
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Reject => "Reject null hypothesis",
            Decision::FailToReject => "Fail to reject null hypothesis",
            Decision::Undetermined => "Significance cannot be determined",
        }
    }
}

/// Formatted primary test result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub test_name: &'static str,
    pub statistic: f64,
    pub p_value: f64,
    /// p-value rounded to [`P_VALUE_DIGITS`] decimals
    pub p_value_rounded: f64,
    pub decision: Decision,
    pub label: &'static str,
    pub conclusion: String,
}

/// Null and alternative hypotheses of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hypotheses {
    pub null: &'static str,
    pub alternative: &'static str,
}

/// One formatted assumption-check line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssumptionLine {
    pub test_name: &'static str,
    /// Group label for normality lines; `None` for the variance line
    pub subject: Option<String>,
    pub p_value: f64,
    pub p_value_rounded: f64,
    pub decision: Decision,
    pub text: String,
}

/// Everything the shell needs to render one experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub design: &'static str,
    pub assumptions: Vec<AssumptionLine>,
    /// `None` for designs that skip the assumption checks
    pub is_parametric: Option<bool>,
    /// Why the primary test was chosen
    pub selection_note: String,
    pub hypotheses: Hypotheses,
    pub verdicts: Vec<Verdict>,
    pub post_hoc: Option<PostHocMatrix>,
}

pub fn round_p_value(p_value: f64) -> f64 {
    let scale = 10f64.powi(P_VALUE_DIGITS);
    (p_value * scale).round() / scale
}

/// Format one test result into a verdict
pub fn format_result(result: &TestResult) -> Verdict {
    let decision = Decision::from_p_value(result.p_value);
    Verdict {
        test_name: result.test_name(),
        statistic: result.statistic,
        p_value: result.p_value,
        p_value_rounded: round_p_value(result.p_value),
        decision,
        label: decision.label(),
        conclusion: conclusion(&result.subject, decision),
    }
}

fn conclusion(subject: &Subject, decision: Decision) -> String {
    match subject {
        Subject::Factor { factor, response } => match decision {
            Decision::Reject => format!("Factor '{factor}' has a significant effect on '{response}'."),
            Decision::FailToReject => {
                format!("Factor '{factor}' has no significant effect on '{response}'.")
            }
            Decision::Undetermined => format!(
                "Significance of factor '{factor}' on '{response}' cannot be determined."
            ),
        },
        Subject::Groups { labels } if labels.len() > 2 => match decision {
            Decision::Reject => "There is a significant difference between the groups.".into(),
            Decision::FailToReject => "There is no significant difference between the groups.".into(),
            Decision::Undetermined => "Significance cannot be determined.".into(),
        },
        Subject::Groups { .. } | Subject::Samples => match decision {
            Decision::Reject => "There is a significant difference between the two groups.".into(),
            Decision::FailToReject => {
                "There is no significant difference between the two groups.".into()
            }
            Decision::Undetermined => "Significance cannot be determined.".into(),
        },
    }
}

pub fn format_normality(check: &NormalityCheck) -> AssumptionLine {
    let decision = Decision::from_p_value(check.p_value);
    let finding = match decision {
        Decision::Reject => "The data is not normally distributed",
        Decision::FailToReject => "The data is normally distributed",
        Decision::Undetermined => "Normality cannot be determined",
    };
    AssumptionLine {
        test_name: TestKind::DAgostinoPearson.name(),
        subject: Some(check.label.clone()),
        p_value: check.p_value,
        p_value_rounded: round_p_value(check.p_value),
        decision,
        text: format!(
            "p-value for {}: {:.10} >> {} ({finding})",
            check.label,
            check.p_value,
            decision.label()
        ),
    }
}

pub fn format_variance(result: &TestResult) -> AssumptionLine {
    let decision = Decision::from_p_value(result.p_value);
    let finding = match decision {
        Decision::Reject => "The variances of the samples are different",
        Decision::FailToReject => "The variances of the samples are the same",
        Decision::Undetermined => "Variance homogeneity cannot be determined",
    };
    AssumptionLine {
        test_name: result.test_name(),
        subject: None,
        p_value: result.p_value,
        p_value_rounded: round_p_value(result.p_value),
        decision,
        text: format!(
            "p-value: {:.10} >> {} ({finding})",
            result.p_value,
            decision.label()
        ),
    }
}

/// Hypotheses stated for each test
pub fn hypotheses(kind: TestKind) -> Hypotheses {
    let (null, alternative) = match kind {
        TestKind::PairedT | TestKind::WilcoxonSignedRank => (
            "The true mean difference is zero.",
            "The true mean difference is greater or less than zero.",
        ),
        TestKind::StudentT | TestKind::WelchT => (
            "The means of the two groups are equal.",
            "The means of the two groups are different.",
        ),
        TestKind::MannWhitneyU => (
            "The two groups come from the same distribution.",
            "One group tends to have larger values than the other.",
        ),
        TestKind::OneWayAnova => (
            "The means of all groups are equal.",
            "At least one group mean is different.",
        ),
        TestKind::KruskalWallis => (
            "All groups come from the same distribution.",
            "At least one group tends to have larger values than the others.",
        ),
        TestKind::TwoWayAnova => (
            "Neither factor nor their interaction has an effect on the response.",
            "At least one factor or the interaction has an effect on the response.",
        ),
        TestKind::Levene => (
            "The variances of the samples are the same.",
            "The variances of the samples are different.",
        ),
        TestKind::DAgostinoPearson => (
            "The data is normally distributed.",
            "The data is not normally distributed.",
        ),
    };
    Hypotheses { null, alternative }
}

fn assumption_lines(verdict: &AssumptionVerdict) -> Vec<AssumptionLine> {
    verdict
        .normality
        .iter()
        .map(format_normality)
        .chain(std::iter::once(format_variance(&verdict.variance)))
        .collect()
}

/// Format a whole experiment outcome
pub fn format_outcome(outcome: &ExperimentOutcome) -> ExperimentReport {
    let primary = outcome.primary_results();
    let method = primary
        .first()
        .map(|r| r.method)
        .unwrap_or(TestKind::TwoWayAnova);

    let selection_note = match outcome.assumptions() {
        Some(_) if method.is_parametric() => {
            format!("Assumptions are satisfied, performing {}", method.name())
        }
        Some(_) => format!("Assumptions are not satisfied, performing {}", method.name()),
        None => format!("Performing {}", method.name()),
    };

    ExperimentReport {
        design: outcome.design().name(),
        assumptions: outcome.assumptions().map(assumption_lines).unwrap_or_default(),
        is_parametric: outcome.assumptions().map(|a| a.is_parametric),
        selection_note,
        hypotheses: hypotheses(method),
        verdicts: primary.into_iter().map(format_result).collect(),
        post_hoc: outcome.post_hoc().cloned(),
    }
}

/// Run an experiment and format its outcome
pub fn analyze(
    dataset: &Dataset,
    selection: &Selection,
    options: &ExperimentOptions,
) -> StatsResult<ExperimentReport> {
    run_experiment(dataset, selection, options).map(|outcome| format_outcome(&outcome))
}
