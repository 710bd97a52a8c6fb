//! Test selection and execution
//!
//! [`run_experiment`] validates a [`Selection`] against the snapshot's column
//! roles, prepares the groups (missing rows dropped, optional resampling),
//! runs the assumption checks and dispatches to the primary test:
//!
//! | design      | groups | parametric                 | non-parametric          |
//! |-------------|--------|----------------------------|-------------------------|
//! | paired      | 2      | paired t-test              | Wilcoxon signed-rank    |
//! | independent | 2      | Student t-test             | Mann-Whitney U          |
//! | independent | 3+     | one-way ANOVA + t post-hoc | Kruskal-Wallis + U post-hoc |
//! | two-way     | cells  | two-way ANOVA + U post-hoc over factor-level cells | |

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::Serialize;

use crate::classify::classify;
use crate::dataset::{Column, Dataset, Value};
use crate::design::{ExperimentDesign, Selection};
use crate::diagnostics::{check, AssumptionVerdict};
use crate::errors::{StatsError, StatsResult};
use crate::tests::factorial::{two_way_anova, AnovaTerm, TwoWayAnovaTable};
use crate::tests::nonparametric::{
    kruskal_wallis, mann_whitney_u, wilcoxon_signed_rank, MannWhitneyOptions, WilcoxonOptions,
};
use crate::tests::parametric::{one_way_anova, t_test, TTestOptions};
use crate::tests::posthoc::{pairwise_mann_whitney, pairwise_t_tests, PostHocMatrix};
use crate::tests::{Subject, TestKind, TestResult};
use crate::types::{ExperimentOptions, Group, MIN_SAMPLE_SIZE};

/// Everything one experiment run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "design", rename_all = "snake_case")]
pub enum ExperimentOutcome {
    Paired {
        first: String,
        second: String,
        assumptions: AssumptionVerdict,
        test: TestResult,
    },
    Independent {
        factor: String,
        response: String,
        assumptions: AssumptionVerdict,
        test: TestResult,
        /// Present when three or more groups were compared
        post_hoc: Option<PostHocMatrix>,
    },
    TwoWay {
        factor_a: String,
        factor_b: String,
        response: String,
        table: TwoWayAnovaTable,
        /// Factor A, factor B and interaction as test results, in that order
        effects: Vec<TestResult>,
        /// Pairwise comparison of the observed factor-level cells; absent
        /// when fewer than two cells were observed
        post_hoc: Option<PostHocMatrix>,
    },
}

impl ExperimentOutcome {
    pub fn design(&self) -> ExperimentDesign {
        match self {
            ExperimentOutcome::Paired { .. } => ExperimentDesign::Paired,
            ExperimentOutcome::Independent { .. } => ExperimentDesign::IndependentTwoPlusGroup,
            ExperimentOutcome::TwoWay { .. } => ExperimentDesign::TwoWayFactorial,
        }
    }

    /// Primary test results, excluding assumption checks and post-hoc comparisons
    pub fn primary_results(&self) -> Vec<&TestResult> {
        match self {
            ExperimentOutcome::Paired { test, .. } | ExperimentOutcome::Independent { test, .. } => {
                vec![test]
            }
            ExperimentOutcome::TwoWay { effects, .. } => effects.iter().collect(),
        }
    }

    pub fn assumptions(&self) -> Option<&AssumptionVerdict> {
        match self {
            ExperimentOutcome::Paired { assumptions, .. }
            | ExperimentOutcome::Independent { assumptions, .. } => Some(assumptions),
            ExperimentOutcome::TwoWay { .. } => None,
        }
    }

    pub fn post_hoc(&self) -> Option<&PostHocMatrix> {
        match self {
            ExperimentOutcome::Paired { .. } => None,
            ExperimentOutcome::Independent { post_hoc, .. }
            | ExperimentOutcome::TwoWay { post_hoc, .. } => post_hoc.as_ref(),
        }
    }
}

/// Run the experiment described by `selection` on a dataset snapshot
///
/// # Errors
/// * `DomainInsufficiency`, `DesignUnavailable`, `UnknownColumn`,
///   `RoleMismatch`, `InvalidSelection` - the selection does not fit the snapshot
/// * `InvalidSelection` - a requested sample size below [`MIN_SAMPLE_SIZE`]
/// * `DegenerateSample` - too few groups or observations for a test
pub fn run_experiment(
    dataset: &Dataset,
    selection: &Selection,
    options: &ExperimentOptions,
) -> StatsResult<ExperimentOutcome> {
    for name in selection.columns() {
        dataset.require(name)?;
    }
    let roles = classify(dataset);
    selection.validate(&roles)?;
    let mut sampler = Sampler::new(options)?;

    tracing::debug!(
        design = selection.design().name(),
        rows = dataset.n_rows(),
        sample_size = ?options.sample_size,
        seed = ?options.seed,
        "running experiment"
    );

    match selection {
        Selection::Paired { first, second } => run_paired(dataset, first, second, &mut sampler),
        Selection::Independent { factor, response } => {
            run_independent(dataset, factor, response, &mut sampler)
        }
        Selection::TwoWay {
            factor_a,
            factor_b,
            response,
        } => run_two_way(dataset, factor_a, factor_b, response),
    }
}

fn run_paired(
    dataset: &Dataset,
    first: &str,
    second: &str,
    sampler: &mut Sampler,
) -> StatsResult<ExperimentOutcome> {
    let col_a = dataset.require(first)?;
    let col_b = dataset.require(second)?;
    let rows = dataset.complete_rows(&[first, second])?;
    let picked: Vec<usize> = sampler.draw(rows.len()).into_iter().map(|i| rows[i]).collect();
    tracing::debug!(complete = rows.len(), sampled = picked.len(), "paired rows");

    let a = picked
        .iter()
        .map(|&row| numeric_at(col_a, row))
        .collect::<StatsResult<Vec<_>>>()?;
    let b = picked
        .iter()
        .map(|&row| numeric_at(col_b, row))
        .collect::<StatsResult<Vec<_>>>()?;

    let groups = [Group::new(first, a), Group::new(second, b)];
    let assumptions = check(&groups)?;

    let test = if assumptions.is_parametric {
        t_test(&groups[0].values, &groups[1].values, &TTestOptions::paired())
    } else {
        wilcoxon_signed_rank(
            &groups[0].values,
            &groups[1].values,
            &WilcoxonOptions::default(),
        )
    }
    .map_err(degenerate)?
    .with_subject(Subject::Groups {
        labels: vec![first.to_string(), second.to_string()],
    });
    log_primary(&test);

    Ok(ExperimentOutcome::Paired {
        first: first.to_string(),
        second: second.to_string(),
        assumptions,
        test,
    })
}

fn run_independent(
    dataset: &Dataset,
    factor: &str,
    response: &str,
    sampler: &mut Sampler,
) -> StatsResult<ExperimentOutcome> {
    let groups = group_by_factor(dataset, factor, response, sampler)?;
    if groups.len() < 2 {
        return Err(StatsError::DegenerateSample(format!(
            "'{factor}' has {} group(s) with values of '{response}'; at least 2 are needed",
            groups.len()
        )));
    }

    let assumptions = check(&groups)?;
    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let values: Vec<Vec<f64>> = groups.into_iter().map(|g| g.values).collect();

    let (test, post_hoc) = match (values.len(), assumptions.is_parametric) {
        (2, true) => (
            t_test(&values[0], &values[1], &TTestOptions::default()).map_err(degenerate)?,
            None,
        ),
        (2, false) => (
            mann_whitney_u(&values[0], &values[1], &MannWhitneyOptions::default())
                .map_err(degenerate)?,
            None,
        ),
        (_, true) => (
            TestResult::from(&one_way_anova(&values).map_err(degenerate)?),
            Some(pairwise_t_tests(&labels, &values).map_err(degenerate)?),
        ),
        (_, false) => (
            kruskal_wallis(&values).map_err(degenerate)?,
            Some(pairwise_mann_whitney(&labels, &values).map_err(degenerate)?),
        ),
    };
    let test = test.with_subject(Subject::Groups { labels });
    log_primary(&test);

    Ok(ExperimentOutcome::Independent {
        factor: factor.to_string(),
        response: response.to_string(),
        assumptions,
        test,
        post_hoc,
    })
}

fn run_two_way(
    dataset: &Dataset,
    factor_a: &str,
    factor_b: &str,
    response: &str,
) -> StatsResult<ExperimentOutcome> {
    let col_a = dataset.require(factor_a)?;
    let col_b = dataset.require(factor_b)?;
    let col_y = dataset.require(response)?;
    let rows = dataset.complete_rows(&[factor_a, factor_b, response])?;
    tracing::debug!(complete = rows.len(), "two-way rows");

    let (levels_a, labels_a) = level_indices(col_a, &rows)?;
    let (levels_b, labels_b) = level_indices(col_b, &rows)?;
    let y = rows
        .iter()
        .map(|&row| numeric_at(col_y, row))
        .collect::<StatsResult<Vec<_>>>()?;

    let table = two_way_anova(&y, &levels_a, &levels_b).map_err(degenerate)?;

    let interaction = format!("{factor_a}:{factor_b}");
    let effects: Vec<TestResult> = [
        (&table.factor_a, factor_a),
        (&table.factor_b, factor_b),
        (&table.interaction, interaction.as_str()),
    ]
    .into_iter()
    .map(|(term, name)| effect_result(term, name, response, table.n))
    .collect();

    for effect in &effects {
        log_primary(effect);
    }

    // Cells in (A level, B level) order
    let mut cells: Vec<((usize, usize), Vec<f64>)> = Vec::new();
    for ((&a, &b), &value) in levels_a.iter().zip(&levels_b).zip(&y) {
        match cells.binary_search_by(|(key, _)| key.cmp(&(a, b))) {
            Ok(pos) => cells[pos].1.push(value),
            Err(pos) => cells.insert(pos, ((a, b), vec![value])),
        }
    }

    let post_hoc = if cells.len() >= 2 {
        let labels: Vec<String> = cells
            .iter()
            .map(|((a, b), _)| format!("({}, {})", labels_a[*a], labels_b[*b]))
            .collect();
        let values: Vec<Vec<f64>> = cells.into_iter().map(|(_, v)| v).collect();
        Some(pairwise_mann_whitney(&labels, &values)?)
    } else {
        tracing::warn!("fewer than 2 factor-level cells observed, skipping post-hoc comparisons");
        None
    };

    Ok(ExperimentOutcome::TwoWay {
        factor_a: factor_a.to_string(),
        factor_b: factor_b.to_string(),
        response: response.to_string(),
        table,
        effects,
        post_hoc,
    })
}

fn effect_result(term: &AnovaTerm, factor: &str, response: &str, n: usize) -> TestResult {
    TestResult::new(
        TestKind::TwoWayAnova,
        term.f_statistic,
        term.p_value,
        Some(term.df as f64),
        n,
    )
    .with_subject(Subject::Factor {
        factor: factor.to_string(),
        response: response.to_string(),
    })
}

/// Group `response` values by the distinct values of `factor`, in natural
/// value order, then subsample each group
fn group_by_factor(
    dataset: &Dataset,
    factor: &str,
    response: &str,
    sampler: &mut Sampler,
) -> StatsResult<Vec<Group>> {
    let col_f = dataset.require(factor)?;
    let col_y = dataset.require(response)?;
    let rows = dataset.complete_rows(&[factor, response])?;
    tracing::debug!(complete = rows.len(), "independent rows");

    let mut keyed = rows
        .iter()
        .map(|&row| -> StatsResult<_> { Ok((value_at(col_f, row)?, numeric_at(col_y, row)?)) })
        .collect::<StatsResult<Vec<_>>>()?;
    // stable: rows keep dataset order within a group
    keyed.sort_by(|a, b| a.0.natural_cmp(&b.0));

    let mut grouped: Vec<(Value<'_>, Vec<f64>)> = Vec::new();
    for (key, value) in keyed {
        match grouped.last_mut() {
            Some((last, values)) if last.natural_cmp(&key) == Ordering::Equal => values.push(value),
            _ => grouped.push((key, vec![value])),
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(key, values)| {
            let picked: Vec<f64> = sampler.draw(values.len()).into_iter().map(|i| values[i]).collect();
            tracing::debug!(group = %key, available = values.len(), sampled = picked.len(), "group");
            Group::new(key.to_string(), picked)
        })
        .collect())
}

/// Map each row to the index of its value among the column's sorted distinct values
fn level_indices(column: &Column, rows: &[usize]) -> StatsResult<(Vec<usize>, Vec<String>)> {
    let values = rows
        .iter()
        .map(|&row| value_at(column, row))
        .collect::<StatsResult<Vec<_>>>()?;

    let mut levels = values.clone();
    levels.sort_by(|a, b| a.natural_cmp(b));
    levels.dedup_by(|a, b| a.natural_cmp(b) == Ordering::Equal);

    let indices = values
        .iter()
        .map(|v| {
            levels
                .binary_search_by(|level| level.natural_cmp(v))
                .map_err(|_| StatsError::InvalidInput(format!("value {v} of '{}' has no level", column.name)))
        })
        .collect::<StatsResult<Vec<_>>>()?;

    Ok((indices, levels.iter().map(|v| v.to_string()).collect()))
}

fn value_at(column: &Column, row: usize) -> StatsResult<Value<'_>> {
    column
        .data
        .value(row)
        .ok_or_else(|| StatsError::InvalidInput(format!("'{}' is missing at row {row}", column.name)))
}

fn numeric_at(column: &Column, row: usize) -> StatsResult<f64> {
    column.data.numeric(row).ok_or_else(|| StatsError::RoleMismatch {
        column: column.name.clone(),
        expected: "interval/ratio",
    })
}

/// A test that cannot run on the prepared groups is a degenerate sample
fn degenerate(e: StatsError) -> StatsError {
    match e {
        StatsError::InsufficientDataMsg(msg) => StatsError::DegenerateSample(msg),
        other => other,
    }
}

fn log_primary(test: &TestResult) {
    if test.p_value.is_nan() {
        tracing::warn!(test = test.test_name(), subject = ?test.subject, "significance cannot be determined");
    } else {
        tracing::info!(
            test = test.test_name(),
            statistic = test.statistic,
            p_value = test.p_value,
            "primary test complete"
        );
    }
}

/// Uniform sampling without replacement
struct Sampler {
    size: Option<usize>,
    rng: StdRng,
}

impl Sampler {
    fn new(options: &ExperimentOptions) -> StatsResult<Self> {
        if let Some(size) = options.sample_size {
            if size < MIN_SAMPLE_SIZE {
                return Err(StatsError::InvalidSelection(format!(
                    "sample size must be at least {MIN_SAMPLE_SIZE}, got {size}"
                )));
            }
        }
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            size: options.sample_size,
            rng,
        })
    }

    /// Ascending positions in `0..len`; all of them when no smaller sample was requested
    fn draw(&mut self, len: usize) -> Vec<usize> {
        match self.size {
            Some(size) if size < len => {
                let mut picked = index::sample(&mut self.rng, len, size).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..len).collect(),
        }
    }
}
