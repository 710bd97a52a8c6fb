//! Post-hoc pairwise comparisons
//!
//! - Bonferroni correction
//! - Pairwise Student t-tests
//! - Pairwise Mann-Whitney U tests

use serde::Serialize;

use super::nonparametric::{mann_whitney_u, MannWhitneyOptions};
use super::parametric::{t_test, TTestOptions};
use super::TestKind;
use crate::{StatsError, StatsResult};

/// Bonferroni correction: each p-value times the number of comparisons, capped at 1
///
/// NaN entries stay NaN and still count as a comparison.
pub fn bonferroni(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len() as f64;
    p_values.iter().map(|&p| (p * m).min(1.0)).collect()
}

/// Square, symmetric matrix of corrected pairwise p-values indexed by group label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHocMatrix {
    /// Test run on each pair
    pub method: TestKind,
    /// Group labels, in row/column order
    pub labels: Vec<String>,
    /// Number of unordered pairs the correction was applied over
    pub comparisons: usize,
    /// Row-major corrected p-values; the diagonal holds NaN
    values: Vec<f64>,
}

impl PostHocMatrix {
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Corrected p-value by position; `None` on the diagonal or out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let k = self.size();
        if i == j || i >= k || j >= k {
            return None;
        }
        Some(self.values[i * k + j])
    }

    /// Corrected p-value by group label; `None` on the diagonal or for unknown labels
    pub fn get_by_label(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.get(i, j)
    }

    /// Each unordered pair once, in row order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        let k = self.size();
        (0..k).flat_map(move |i| {
            ((i + 1)..k).map(move |j| {
                (
                    self.labels[i].as_str(),
                    self.labels[j].as_str(),
                    self.values[i * k + j],
                )
            })
        })
    }

    /// Rows of the matrix with `None` on the diagonal
    pub fn rows(&self) -> Vec<Vec<Option<f64>>> {
        let k = self.size();
        (0..k)
            .map(|i| (0..k).map(|j| self.get(i, j)).collect())
            .collect()
    }
}

/// Run `test` on every unordered pair of groups and Bonferroni-correct the results
///
/// A pair the test cannot evaluate gets a NaN entry.
fn pairwise<F>(
    method: TestKind,
    labels: &[String],
    groups: &[Vec<f64>],
    test: F,
) -> StatsResult<PostHocMatrix>
where
    F: Fn(&[f64], &[f64]) -> StatsResult<f64>,
{
    if labels.len() != groups.len() {
        return Err(StatsError::DimensionMismatchMsg(format!(
            "{} labels for {} groups",
            labels.len(),
            groups.len()
        )));
    }
    if groups.len() < 2 {
        return Err(StatsError::InsufficientDataMsg(
            "Post-hoc comparisons require at least 2 groups".into(),
        ));
    }

    let k = groups.len();
    let mut pairs = Vec::with_capacity(k * (k - 1) / 2);
    let mut raw = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let p = match test(&groups[i], &groups[j]) {
                Ok(p) => p,
                Err(StatsError::InsufficientDataMsg(msg)) => {
                    tracing::warn!(
                        first = %labels[i],
                        second = %labels[j],
                        "post-hoc pair cannot be tested: {msg}"
                    );
                    f64::NAN
                }
                Err(e) => return Err(e),
            };
            pairs.push((i, j));
            raw.push(p);
        }
    }

    let corrected = bonferroni(&raw);
    let mut values = vec![f64::NAN; k * k];
    for ((i, j), p) in pairs.into_iter().zip(corrected) {
        values[i * k + j] = p;
        values[j * k + i] = p;
    }

    Ok(PostHocMatrix {
        method,
        labels: labels.to_vec(),
        comparisons: raw.len(),
        values,
    })
}

/// Pairwise Student t-tests with Bonferroni correction
pub fn pairwise_t_tests(labels: &[String], groups: &[Vec<f64>]) -> StatsResult<PostHocMatrix> {
    let options = TTestOptions::default();
    pairwise(TestKind::StudentT, labels, groups, |a, b| {
        t_test(a, b, &options).map(|r| r.p_value)
    })
}

/// Pairwise Mann-Whitney U tests with Bonferroni correction
pub fn pairwise_mann_whitney(labels: &[String], groups: &[Vec<f64>]) -> StatsResult<PostHocMatrix> {
    let options = MannWhitneyOptions::default();
    pairwise(TestKind::MannWhitneyU, labels, groups, |a, b| {
        mann_whitney_u(a, b, &options).map(|r| r.p_value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bonferroni_caps_at_one() {
        assert_eq!(bonferroni(&[0.01, 0.2, 0.5]), vec![0.03, 0.6000000000000001, 1.0]);
        assert!(bonferroni(&[f64::NAN, 0.1])[0].is_nan());
    }

    #[test]
    fn test_three_group_t_matrix() {
        let groups = vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![2.0, 4.0, 6.0, 8.0, 10.0],
            vec![11.0, 12.0, 13.0, 14.0, 15.0],
        ];
        let m = pairwise_t_tests(&labels(&["a", "b", "c"]), &groups).unwrap();

        assert_eq!(m.size(), 3);
        assert_eq!(m.comparisons, 3);
        assert_eq!(m.get(0, 0), None);

        let raw = t_test(&groups[0], &groups[1], &TTestOptions::default())
            .unwrap()
            .p_value;
        let corrected = m.get_by_label("a", "b").unwrap();
        assert!((corrected - (raw * 3.0).min(1.0)).abs() < 1e-15);
        assert_eq!(m.get_by_label("b", "a"), Some(corrected));
        assert_eq!(m.pairs().count(), 3);
    }

    #[test]
    fn test_untestable_pair_is_nan() {
        let groups = vec![vec![1.0], vec![2.0, 3.0], vec![4.0, 5.0]];
        let m = pairwise_t_tests(&labels(&["a", "b", "c"]), &groups).unwrap();
        assert!(m.get(0, 1).unwrap().is_nan());
        assert!(!m.get(1, 2).unwrap().is_nan());
    }

    #[test]
    fn test_tied_cells_are_never_significant() {
        let groups = vec![vec![5.0, 5.0], vec![5.0, 5.0], vec![1.0, 9.0]];
        let m = pairwise_mann_whitney(&labels(&["a", "b", "c"]), &groups).unwrap();

        assert!(m.get(0, 1).unwrap().is_nan());
        assert_eq!(m.get(0, 2), Some(1.0));
        assert_eq!(m.get(1, 2), Some(1.0));
    }

    #[test]
    fn test_label_count_must_match() {
        let groups = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert!(pairwise_mann_whitney(&labels(&["a"]), &groups).is_err());
    }

    proptest! {
        #[test]
        fn prop_matrix_is_symmetric(
            groups in proptest::collection::vec(
                proptest::collection::vec(-100.0f64..100.0, 2..12),
                2..6,
            )
        ) {
            let names: Vec<String> = (0..groups.len()).map(|i| format!("g{i}")).collect();
            let m = pairwise_mann_whitney(&names, &groups).unwrap();
            let k = m.size();
            prop_assert_eq!(m.comparisons, k * (k - 1) / 2);
            for i in 0..k {
                prop_assert_eq!(m.get(i, i), None);
                for j in 0..k {
                    if i != j {
                        let (a, b) = (m.get(i, j).unwrap(), m.get(j, i).unwrap());
                        prop_assert!(a == b || (a.is_nan() && b.is_nan()));
                    }
                }
            }
        }
    }
}
