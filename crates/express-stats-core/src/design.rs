//! Experiment designs and the user's variable selection

use serde::Serialize;

use crate::classify::{ColumnRole, ColumnRoles};
use crate::errors::{StatsError, StatsResult};

/// Experiment designs the engine can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentDesign {
    /// Two numeric measurements taken on the same rows
    Paired,
    /// One numeric response split by one categorical factor (2 or more groups)
    IndependentTwoPlusGroup,
    /// One numeric response crossed by two categorical factors
    TwoWayFactorial,
}

/// Column roles a design needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRequirement {
    pub categorical: usize,
    pub numerical: usize,
}

impl ExperimentDesign {
    pub const ALL: [ExperimentDesign; 3] = [
        ExperimentDesign::Paired,
        ExperimentDesign::IndependentTwoPlusGroup,
        ExperimentDesign::TwoWayFactorial,
    ];

    pub fn required_roles(&self) -> RoleRequirement {
        match self {
            ExperimentDesign::Paired => RoleRequirement {
                categorical: 0,
                numerical: 2,
            },
            ExperimentDesign::IndependentTwoPlusGroup => RoleRequirement {
                categorical: 1,
                numerical: 1,
            },
            ExperimentDesign::TwoWayFactorial => RoleRequirement {
                categorical: 2,
                numerical: 1,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExperimentDesign::Paired => "Paired samples test",
            ExperimentDesign::IndependentTwoPlusGroup => "Independent samples test",
            ExperimentDesign::TwoWayFactorial => "Two-way ANOVA test",
        }
    }

    /// Menu text shown by the shell
    pub fn description(&self) -> &'static str {
        match self {
            ExperimentDesign::Paired => {
                "Paired samples test (requires 2 similar interval/ratio variables from all rows)"
            }
            ExperimentDesign::IndependentTwoPlusGroup => {
                "Independent samples test (requires 1 categorical variable and 1 interval/ratio variable)"
            }
            ExperimentDesign::TwoWayFactorial => {
                "Two-way ANOVA test (requires 2 categorical variables and 1 interval/ratio variable)"
            }
        }
    }

    /// Whether the classified columns satisfy this design's requirement
    pub fn is_available(&self, roles: &ColumnRoles) -> bool {
        let req = self.required_roles();
        roles.categorical.len() >= req.categorical && roles.numerical.len() >= req.numerical
    }
}

/// Designs offered for the current classification, in menu order.
///
/// Returns [`StatsError::DomainInsufficiency`] rather than an empty menu.
pub fn available_designs(roles: &ColumnRoles) -> StatsResult<Vec<ExperimentDesign>> {
    let designs: Vec<ExperimentDesign> = ExperimentDesign::ALL
        .into_iter()
        .filter(|d| d.is_available(roles))
        .collect();

    if designs.is_empty() {
        return Err(StatsError::DomainInsufficiency {
            categorical: roles.categorical.len(),
            numerical: roles.numerical.len(),
        });
    }

    Ok(designs)
}

/// A design together with the columns chosen for its slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "design", rename_all = "snake_case")]
pub enum Selection {
    Paired {
        first: String,
        second: String,
    },
    Independent {
        factor: String,
        response: String,
    },
    TwoWay {
        factor_a: String,
        factor_b: String,
        response: String,
    },
}

impl Selection {
    pub fn paired(first: impl Into<String>, second: impl Into<String>) -> Self {
        Selection::Paired {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn independent(factor: impl Into<String>, response: impl Into<String>) -> Self {
        Selection::Independent {
            factor: factor.into(),
            response: response.into(),
        }
    }

    pub fn two_way(
        factor_a: impl Into<String>,
        factor_b: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Selection::TwoWay {
            factor_a: factor_a.into(),
            factor_b: factor_b.into(),
            response: response.into(),
        }
    }

    pub fn design(&self) -> ExperimentDesign {
        match self {
            Selection::Paired { .. } => ExperimentDesign::Paired,
            Selection::Independent { .. } => ExperimentDesign::IndependentTwoPlusGroup,
            Selection::TwoWay { .. } => ExperimentDesign::TwoWayFactorial,
        }
    }

    /// Chosen column names, in slot order
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Selection::Paired { first, second } => vec![first.as_str(), second.as_str()],
            Selection::Independent { factor, response } => vec![factor.as_str(), response.as_str()],
            Selection::TwoWay {
                factor_a,
                factor_b,
                response,
            } => vec![factor_a.as_str(), factor_b.as_str(), response.as_str()],
        }
    }

    /// Check the selection against a classification of the current snapshot
    pub fn validate(&self, roles: &ColumnRoles) -> StatsResult<()> {
        // A repeated column is rejected whatever the snapshot offers
        match self {
            Selection::Paired { first, second } if first == second => {
                return Err(StatsError::InvalidSelection(
                    "the two interval/ratio columns must be different".into(),
                ));
            }
            Selection::TwoWay {
                factor_a, factor_b, ..
            } if factor_a == factor_b => {
                return Err(StatsError::InvalidSelection(
                    "the two categorical columns must be different".into(),
                ));
            }
            _ => {}
        }

        let design = self.design();
        if !design.is_available(roles) {
            return Err(StatsError::DesignUnavailable(design.name()));
        }

        match self {
            Selection::Paired { first, second } => {
                require_role(roles, first, ColumnRole::Numerical)?;
                require_role(roles, second, ColumnRole::Numerical)?;
            }
            Selection::Independent { factor, response } => {
                require_role(roles, factor, ColumnRole::Categorical)?;
                require_role(roles, response, ColumnRole::Numerical)?;
            }
            Selection::TwoWay {
                factor_a,
                factor_b,
                response,
            } => {
                require_role(roles, factor_a, ColumnRole::Categorical)?;
                require_role(roles, factor_b, ColumnRole::Categorical)?;
                require_role(roles, response, ColumnRole::Numerical)?;
            }
        }

        Ok(())
    }
}

fn require_role(roles: &ColumnRoles, column: &str, role: ColumnRole) -> StatsResult<()> {
    let roles_of = roles.roles_of(column);
    if roles_of.contains(&role) {
        return Ok(());
    }
    Err(StatsError::RoleMismatch {
        column: column.to_string(),
        expected: role.as_str(),
    })
}
